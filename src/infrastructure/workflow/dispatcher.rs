//! Test dispatcher implementation

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::domain::auth::AuthContext;
use crate::domain::workflow::{TestDispatcher, TestRun, Workflow};
use crate::domain::DomainError;

/// Dispatcher that hands a test run off as a structured log event
///
/// The execution runtime lives outside this service; this implementation
/// acknowledges the hand-off and assigns the run id the caller polls with.
#[derive(Debug, Default)]
pub struct TracingTestDispatcher;

impl TracingTestDispatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TestDispatcher for TracingTestDispatcher {
    async fn dispatch(
        &self,
        workflow: &Workflow,
        ctx: &AuthContext,
    ) -> Result<TestRun, DomainError> {
        let run_id = format!("run-{}", uuid::Uuid::new_v4());

        info!(
            run_id = %run_id,
            workflow_id = %workflow.id(),
            user_id = %ctx.user_id,
            trigger = workflow.trigger().trigger_type(),
            step_count = workflow.step_count(),
            "Dispatching workflow test run"
        );

        Ok(TestRun {
            run_id,
            dispatched_at: Utc::now(),
        })
    }
}
