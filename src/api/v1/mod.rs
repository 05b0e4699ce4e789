//! Versioned API endpoints

pub mod workflows;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/workflows",
            get(workflows::list_workflows).post(workflows::create_workflow),
        )
        .route(
            "/workflows/{workflow_id}",
            get(workflows::get_workflow)
                .put(workflows::update_workflow)
                .delete(workflows::delete_workflow),
        )
        .route(
            "/workflows/{workflow_id}/steps/ops",
            post(workflows::apply_step_ops),
        )
        .route("/workflows/{workflow_id}/test", post(workflows::test_workflow))
}
