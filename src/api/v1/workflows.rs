//! Workflow management endpoints

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::workflow::{
    StepCondition, StepOp, TriggerConfig, Workflow, WorkflowStatus, WorkflowStep,
};
use crate::infrastructure::services::{
    ActiveFilter, CreateWorkflowRequest, UpdateWorkflowRequest,
};

/// Request to create a new workflow
///
/// Field aliases accept the payload shape of the legacy dashboard client.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkflowApiRequest {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, alias = "organizationId")]
    pub organization_id: Option<String>,

    #[serde(default, alias = "triggerConfig")]
    pub trigger: Option<TriggerConfig>,

    #[serde(default, alias = "actions")]
    pub steps: Vec<WorkflowStep>,

    #[serde(default)]
    pub conditions: Vec<StepCondition>,

    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Request to update a workflow
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorkflowApiRequest {
    pub name: Option<String>,

    /// Outer option: whether to change; inner option: clearing
    #[serde(default, with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, alias = "triggerConfig")]
    pub trigger: Option<TriggerConfig>,

    #[serde(default, alias = "actions")]
    pub steps: Option<Vec<WorkflowStep>>,

    #[serde(default)]
    pub conditions: Option<Vec<StepCondition>>,

    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_json::Value>>,

    #[serde(default)]
    pub status: Option<WorkflowStatus>,
}

/// Serde helper distinguishing an absent field from an explicit null
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Structural step edits with a concurrency token
#[derive(Debug, Clone, Deserialize)]
pub struct StepOpsRequest {
    /// Workflow version the client based its edits on
    pub base_version: u32,

    pub ops: Vec<StepOp>,
}

/// Workflow response body
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResponse {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: WorkflowStatus,
    pub is_active: bool,
    pub trigger: TriggerConfig,
    pub steps: Vec<WorkflowStep>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<StepCondition>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    pub version: u32,
    pub execution_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Workflow> for WorkflowResponse {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id().as_str().to_string(),
            user_id: workflow.user_id().to_string(),
            organization_id: workflow.organization_id().map(String::from),
            name: workflow.name().to_string(),
            description: workflow.description().map(String::from),
            status: workflow.status(),
            is_active: workflow.is_active(),
            trigger: workflow.trigger().clone(),
            steps: workflow.steps().to_vec(),
            conditions: workflow.conditions().to_vec(),
            metadata: workflow.metadata().clone(),
            version: workflow.version(),
            execution_count: workflow.execution_count(),
            success_count: workflow.success_count(),
            failure_count: workflow.failure_count(),
            created_at: workflow.created_at().to_rfc3339(),
            updated_at: workflow.updated_at().to_rfc3339(),
        }
    }
}

/// Query parameters for the list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListWorkflowsParams {
    pub status: Option<String>,
}

/// Test dispatch acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct TestWorkflowResponse {
    pub run_id: String,
    pub dispatched_at: DateTime<Utc>,
    pub estimated_duration_secs: u64,
}

/// GET /v1/workflows
pub async fn list_workflows(
    State(state): State<AppState>,
    RequireUser(ctx): RequireUser,
    Query(params): Query<ListWorkflowsParams>,
) -> Result<Json<Vec<WorkflowResponse>>, ApiError> {
    let filter = params
        .status
        .as_deref()
        .map(ActiveFilter::parse)
        .transpose()
        .map_err(ApiError::from)?;

    debug!(user_id = %ctx.user_id, filter = ?params.status, "Listing workflows");

    let workflows = state
        .workflow_service
        .list(&ctx, filter)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(workflows.iter().map(WorkflowResponse::from).collect()))
}

/// POST /v1/workflows
pub async fn create_workflow(
    State(state): State<AppState>,
    RequireUser(ctx): RequireUser,
    Json(request): Json<CreateWorkflowApiRequest>,
) -> Result<Response, ApiError> {
    let trigger = request
        .trigger
        .ok_or_else(|| ApiError::bad_request("Trigger configuration is required").with_param("trigger"))?;

    debug!(user_id = %ctx.user_id, name = %request.name, "Creating workflow");

    let create_request = CreateWorkflowRequest {
        name: request.name,
        description: request.description,
        organization_id: request.organization_id,
        trigger,
        steps: request.steps,
        conditions: request.conditions,
        metadata: request.metadata,
    };

    let workflow = state
        .workflow_service
        .create(&ctx, create_request)
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(WorkflowResponse::from(&workflow)),
    )
        .into_response())
}

/// GET /v1/workflows/{workflow_id}
pub async fn get_workflow(
    State(state): State<AppState>,
    RequireUser(ctx): RequireUser,
    Path(workflow_id): Path<String>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let workflow = state
        .workflow_service
        .get(&ctx, &workflow_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Workflow '{}' not found", workflow_id)))?;

    Ok(Json(WorkflowResponse::from(&workflow)))
}

/// PUT /v1/workflows/{workflow_id}
pub async fn update_workflow(
    State(state): State<AppState>,
    RequireUser(ctx): RequireUser,
    Path(workflow_id): Path<String>,
    Json(request): Json<UpdateWorkflowApiRequest>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    debug!(user_id = %ctx.user_id, workflow_id = %workflow_id, "Updating workflow");

    let update_request = UpdateWorkflowRequest {
        name: request.name,
        description: request.description,
        trigger: request.trigger,
        steps: request.steps,
        conditions: request.conditions,
        metadata: request.metadata,
        status: request.status,
    };

    let workflow = state
        .workflow_service
        .update(&ctx, &workflow_id, update_request)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(WorkflowResponse::from(&workflow)))
}

/// DELETE /v1/workflows/{workflow_id}
pub async fn delete_workflow(
    State(state): State<AppState>,
    RequireUser(ctx): RequireUser,
    Path(workflow_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    debug!(user_id = %ctx.user_id, workflow_id = %workflow_id, "Deleting workflow");

    let deleted = state
        .workflow_service
        .delete(&ctx, &workflow_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(serde_json::json!({
        "deleted": deleted,
        "id": workflow_id
    })))
}

/// POST /v1/workflows/{workflow_id}/steps/ops
pub async fn apply_step_ops(
    State(state): State<AppState>,
    RequireUser(ctx): RequireUser,
    Path(workflow_id): Path<String>,
    Json(request): Json<StepOpsRequest>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    debug!(
        user_id = %ctx.user_id,
        workflow_id = %workflow_id,
        base_version = request.base_version,
        op_count = request.ops.len(),
        "Applying step edits"
    );

    let workflow = state
        .workflow_service
        .apply_step_ops(&ctx, &workflow_id, request.base_version, &request.ops)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(WorkflowResponse::from(&workflow)))
}

/// POST /v1/workflows/{workflow_id}/test
pub async fn test_workflow(
    State(state): State<AppState>,
    RequireUser(ctx): RequireUser,
    Path(workflow_id): Path<String>,
) -> Result<Response, ApiError> {
    debug!(user_id = %ctx.user_id, workflow_id = %workflow_id, "Dispatching test run");

    let result = state
        .workflow_service
        .dispatch_test(&ctx, &workflow_id)
        .await
        .map_err(ApiError::from)?;

    let response = TestWorkflowResponse {
        run_id: result.run.run_id,
        dispatched_at: result.run.dispatched_at,
        estimated_duration_secs: result.estimated_duration_secs,
    };

    Ok((StatusCode::ACCEPTED, Json(response)).into_response())
}
