//! Test-run dispatch seam
//!
//! "Testing" a workflow is delegated across this boundary; no execution,
//! retry scheduling, or durable run log lives in this service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Workflow;
use crate::domain::auth::AuthContext;
use crate::domain::DomainError;

/// Acknowledgement that a test run was handed off
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestRun {
    pub run_id: String,
    pub dispatched_at: DateTime<Utc>,
}

/// Boundary to whatever runs test executions
#[async_trait]
pub trait TestDispatcher: Send + Sync + std::fmt::Debug {
    async fn dispatch(
        &self,
        workflow: &Workflow,
        ctx: &AuthContext,
    ) -> Result<TestRun, DomainError>;
}
