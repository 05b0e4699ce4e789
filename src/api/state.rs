//! Application state for shared services

use std::sync::Arc;

use crate::domain::auth::AuthService;
use crate::infrastructure::services::WorkflowService;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow_service: Arc<WorkflowService>,
    pub auth_service: Arc<dyn AuthService>,
}

impl AppState {
    pub fn new(workflow_service: Arc<WorkflowService>, auth_service: Arc<dyn AuthService>) -> Self {
        Self {
            workflow_service,
            auth_service,
        }
    }
}
