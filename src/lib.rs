//! Financbase Workflows
//!
//! The workflow-automation service of the Financbase platform:
//! - Workflow records: trigger + ordered, kind-tagged steps
//! - Step editing: reorder, selection, deletion, structural edits
//! - A thin management API with per-caller scoping
//!
//! Execution is out of scope; test runs cross the [`domain::workflow::TestDispatcher`]
//! seam and counters are plain stored fields.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::collections::HashMap;
use std::sync::Arc;

use api::state::AppState;
use domain::auth::AuthContext;
use domain::workflow::Workflow;
use domain::DomainError;
use infrastructure::auth::StaticTokenAuthService;
use infrastructure::services::WorkflowService;
use infrastructure::storage::{StorageConfig, StorageFactory};
use infrastructure::workflow::TracingTestDispatcher;

/// Table name for workflow rows in the postgres backend
const WORKFLOWS_TABLE: &str = "workflows";

/// Build application state from configuration
pub async fn create_app_state(config: &AppConfig) -> Result<AppState, DomainError> {
    let storage_config = StorageConfig::from_backend_name(
        &config.storage.backend,
        config.storage.database_url.as_deref(),
    )?;

    let storage = StorageFactory::create::<Workflow>(&storage_config, WORKFLOWS_TABLE).await?;

    let workflow_service = Arc::new(WorkflowService::new(
        storage,
        Arc::new(TracingTestDispatcher::new()),
    ));

    let tokens: HashMap<String, AuthContext> = config
        .auth
        .tokens
        .iter()
        .map(|(token, identity)| {
            let mut ctx = AuthContext::new(&identity.user_id).with_role(identity.role);
            if let Some(ref org) = identity.organization_id {
                ctx = ctx.with_organization(org);
            }
            (token.clone(), ctx)
        })
        .collect();

    let auth_service = Arc::new(StaticTokenAuthService::new(tokens));

    Ok(AppState::new(workflow_service, auth_service))
}
