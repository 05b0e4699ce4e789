use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::metrics_middleware;
use super::state::AppState;
use super::v1;

/// Create a minimal router without state (liveness only)
pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .layer(TraceLayer::new_for_http())
}

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Workflow API
        .nest("/v1", v1::create_v1_router())
        // Add state and middleware
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::auth::AuthContext;
    use crate::domain::storage::mock::MockStorage;
    use crate::domain::workflow::Workflow;
    use crate::infrastructure::auth::StaticTokenAuthService;
    use crate::infrastructure::services::WorkflowService;
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::infrastructure::workflow::TracingTestDispatcher;

    const TOKEN: &str = "tok-user-1";

    fn test_state() -> AppState {
        state_with_storage(Arc::new(InMemoryStorage::<Workflow>::new()))
    }

    fn state_with_storage(
        storage: Arc<dyn crate::domain::storage::Storage<Workflow>>,
    ) -> AppState {
        let workflow_service = Arc::new(WorkflowService::new(
            storage,
            Arc::new(TracingTestDispatcher::new()),
        ));
        let auth_service = Arc::new(
            StaticTokenAuthService::default().with_token(TOKEN, AuthContext::new("user-1")),
        );
        AppState::new(workflow_service, auth_service)
    }

    fn authed(request: axum::http::request::Builder) -> axum::http::request::Builder {
        request
            .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
            .header(header::CONTENT_TYPE, "application/json")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_workflow(app: &Router, body: Value) -> axum::response::Response {
        app.clone()
            .oneshot(
                authed(Request::builder().method("POST").uri("/v1/workflows"))
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_requires_authentication() {
        let app = create_router_with_state(test_state());

        let response = app
            .oneshot(Request::builder().uri("/v1/workflows").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "authentication_error");
    }

    #[tokio::test]
    async fn test_create_empty_name_returns_400() {
        let app = create_router_with_state(test_state());

        let response = create_workflow(
            &app,
            json!({"name": "", "trigger": {"type": "manual"}}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("name cannot be empty"));
    }

    #[tokio::test]
    async fn test_create_schedule_with_empty_config_returns_400() {
        let app = create_router_with_state(test_state());

        let response = create_workflow(
            &app,
            json!({"name": "Nightly", "trigger": {"type": "schedule", "config": {}}}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]["message"].is_string());
    }

    #[tokio::test]
    async fn test_create_missing_trigger_returns_400() {
        let app = create_router_with_state(test_state());

        let response = create_workflow(&app, json!({"name": "No trigger"})).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["param"], "trigger");
    }

    #[tokio::test]
    async fn test_create_valid_workflow_returns_201() {
        let app = create_router_with_state(test_state());

        let response = create_workflow(
            &app,
            json!({
                "name": "Invoice chaser",
                "trigger": {"type": "manual"},
                "steps": [
                    {"id": "s1", "type": "action", "action": "create_invoice"}
                ]
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert!(body["id"].as_str().unwrap().starts_with("wf-"));
        assert_eq!(body["name"], "Invoice chaser");
        assert_eq!(body["status"], "draft");
        assert_eq!(body["is_active"], false);
        assert_eq!(body["steps"][0]["order"], 0);
    }

    #[tokio::test]
    async fn test_create_invalid_email_step_returns_400() {
        let app = create_router_with_state(test_state());

        let response = create_workflow(
            &app,
            json!({
                "name": "Mailer",
                "trigger": {"type": "manual"},
                "steps": [
                    {"id": "s1", "type": "email", "to": "not-an-email"}
                ]
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_storage_failure_returns_500_with_message() {
        let storage: Arc<MockStorage<Workflow>> =
            Arc::new(MockStorage::new().with_error("Database error"));
        let app = create_router_with_state(state_with_storage(storage));

        let response = app
            .oneshot(
                authed(Request::builder().uri("/v1/workflows"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Database error"));
    }

    #[tokio::test]
    async fn test_get_unknown_workflow_returns_404() {
        let app = create_router_with_state(test_state());

        let response = app
            .oneshot(
                authed(Request::builder().uri("/v1/workflows/no-such-flow"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reorder_via_step_ops_and_version_conflict() {
        let app = create_router_with_state(test_state());

        let created = body_json(
            create_workflow(
                &app,
                json!({
                    "name": "Three steps",
                    "trigger": {"type": "manual"},
                    "steps": [
                        {"id": "s1", "type": "action", "action": "a"},
                        {"id": "s2", "type": "action", "action": "b"},
                        {"id": "s3", "type": "action", "action": "c"}
                    ]
                }),
            )
            .await,
        )
        .await;

        let id = created["id"].as_str().unwrap();
        let version = created["version"].as_u64().unwrap();

        let response = app
            .clone()
            .oneshot(
                authed(
                    Request::builder()
                        .method("POST")
                        .uri(format!("/v1/workflows/{}/steps/ops", id)),
                )
                .body(Body::from(
                    json!({
                        "base_version": version,
                        "ops": [{"op": "move", "step_id": "s3", "to_index": 0}]
                    })
                    .to_string(),
                ))
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["steps"][0]["id"], "s3");
        assert_eq!(body["steps"][0]["order"], 0);
        assert_eq!(body["steps"][1]["order"], 1);

        // Replaying against the stale version is now rejected
        let stale = app
            .oneshot(
                authed(
                    Request::builder()
                        .method("POST")
                        .uri(format!("/v1/workflows/{}/steps/ops", id)),
                )
                .body(Body::from(
                    json!({
                        "base_version": version,
                        "ops": [{"op": "delete", "step_id": "s1"}]
                    })
                    .to_string(),
                ))
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(stale.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_dispatching_test_run() {
        let app = create_router_with_state(test_state());

        let created = body_json(
            create_workflow(
                &app,
                json!({
                    "name": "Testable",
                    "trigger": {"type": "manual"},
                    "steps": [
                        {"id": "s1", "type": "action", "action": "a", "timeout_secs": 30},
                        {"id": "s2", "type": "action", "action": "b", "timeout_secs": 60}
                    ]
                }),
            )
            .await,
        )
        .await;

        let id = created["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(
                authed(
                    Request::builder()
                        .method("POST")
                        .uri(format!("/v1/workflows/{}/test", id)),
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert!(body["run_id"].as_str().unwrap().starts_with("run-"));
        assert_eq!(body["estimated_duration_secs"], 90);

        // Counters were recorded
        let after = app
            .oneshot(
                authed(Request::builder().uri(format!("/v1/workflows/{}", id)))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let after = body_json(after).await;
        assert_eq!(after["execution_count"], 1);
        assert_eq!(after["success_count"], 1);
    }

    #[tokio::test]
    async fn test_testing_empty_workflow_returns_400() {
        let app = create_router_with_state(test_state());

        let created = body_json(
            create_workflow(&app, json!({"name": "Empty", "trigger": {"type": "manual"}})).await,
        )
        .await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .oneshot(
                authed(
                    Request::builder()
                        .method("POST")
                        .uri(format!("/v1/workflows/{}/test", id)),
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_filtered_list() {
        let app = create_router_with_state(test_state());

        let created = body_json(
            create_workflow(&app, json!({"name": "Flow", "trigger": {"type": "manual"}})).await,
        )
        .await;
        let id = created["id"].as_str().unwrap();

        // Activate it
        let response = app
            .clone()
            .oneshot(
                authed(
                    Request::builder()
                        .method("PUT")
                        .uri(format!("/v1/workflows/{}", id)),
                )
                .body(Body::from(json!({"status": "active"}).to_string()))
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let active = body_json(
            app.clone()
                .oneshot(
                    authed(Request::builder().uri("/v1/workflows?status=active"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(active.as_array().unwrap().len(), 1);
        assert_eq!(active[0]["is_active"], true);

        let inactive = body_json(
            app.oneshot(
                authed(Request::builder().uri("/v1/workflows?status=inactive"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap(),
        )
        .await;
        assert_eq!(inactive.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = create_router_with_state(test_state());

        for uri in ["/health", "/live", "/ready"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "endpoint {}", uri);
        }
    }

    #[tokio::test]
    async fn test_stateless_router_liveness() {
        let app = create_router();

        let response = app
            .oneshot(Request::builder().uri("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
