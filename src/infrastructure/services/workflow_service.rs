//! Workflow service - validation, CRUD, and editing operations

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::auth::AuthContext;
use crate::domain::storage::Storage;
use crate::domain::workflow::{
    apply_ops, StepCondition, StepEditor, StepOp, TestDispatcher, TestRun, TriggerConfig,
    Workflow, WorkflowId, WorkflowStatus, WorkflowStep, MAX_NAME_LENGTH,
};
use crate::domain::DomainError;

/// Request to create a new workflow
#[derive(Debug, Clone)]
pub struct CreateWorkflowRequest {
    pub name: String,
    pub description: Option<String>,
    pub organization_id: Option<String>,
    pub trigger: TriggerConfig,
    pub steps: Vec<WorkflowStep>,
    pub conditions: Vec<StepCondition>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl CreateWorkflowRequest {
    pub fn new(name: impl Into<String>, trigger: TriggerConfig) -> Self {
        Self {
            name: name.into(),
            description: None,
            organization_id: None,
            trigger,
            steps: Vec::new(),
            conditions: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_steps(mut self, steps: Vec<WorkflowStep>) -> Self {
        self.steps = steps;
        self
    }
}

/// Request to update an existing workflow
///
/// `description` uses the double-Option pattern: the outer level says whether
/// the field changes, the inner level allows clearing it.
#[derive(Debug, Clone, Default)]
pub struct UpdateWorkflowRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub trigger: Option<TriggerConfig>,
    pub steps: Option<Vec<WorkflowStep>>,
    pub conditions: Option<Vec<StepCondition>>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub status: Option<WorkflowStatus>,
}

impl UpdateWorkflowRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_steps(mut self, steps: Vec<WorkflowStep>) -> Self {
        self.steps = Some(steps);
        self
    }

    pub fn with_status(mut self, status: WorkflowStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Status filter accepted by the list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveFilter {
    Active,
    Inactive,
}

impl ActiveFilter {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(DomainError::validation(format!(
                "Unknown status filter '{}': expected 'active' or 'inactive'",
                other
            ))),
        }
    }

    fn matches(self, workflow: &Workflow) -> bool {
        match self {
            Self::Active => workflow.is_active(),
            Self::Inactive => !workflow.is_active(),
        }
    }
}

/// Outcome of a test dispatch
#[derive(Debug, Clone)]
pub struct TestDispatchResult {
    pub run: TestRun,

    /// Naive upper bound: the sum of all step timeouts
    pub estimated_duration_secs: u64,
}

/// Workflow service for CRUD and editing operations
pub struct WorkflowService {
    storage: Arc<dyn Storage<Workflow>>,
    dispatcher: Arc<dyn TestDispatcher>,
}

impl std::fmt::Debug for WorkflowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowService").finish()
    }
}

impl WorkflowService {
    pub fn new(storage: Arc<dyn Storage<Workflow>>, dispatcher: Arc<dyn TestDispatcher>) -> Self {
        Self {
            storage,
            dispatcher,
        }
    }

    /// List workflows visible to the caller, newest edits first
    pub async fn list(
        &self,
        ctx: &AuthContext,
        filter: Option<ActiveFilter>,
    ) -> Result<Vec<Workflow>, DomainError> {
        let mut workflows: Vec<Workflow> = self
            .storage
            .list()
            .await?
            .into_iter()
            .filter(|w| ctx.can_access(w.user_id()))
            .filter(|w| filter.map_or(true, |f| f.matches(w)))
            .collect();

        workflows.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        Ok(workflows)
    }

    /// Get one workflow. Rows owned by other users read as absent so ids do
    /// not leak across tenants.
    pub async fn get(&self, ctx: &AuthContext, id: &str) -> Result<Option<Workflow>, DomainError> {
        let workflow_id = parse_id(id)?;

        match self.storage.get(&workflow_id).await? {
            Some(workflow) if ctx.can_access(workflow.user_id()) => Ok(Some(workflow)),
            Some(_) => Ok(None),
            None => Ok(None),
        }
    }

    /// Create a new workflow owned by the caller
    pub async fn create(
        &self,
        ctx: &AuthContext,
        request: CreateWorkflowRequest,
    ) -> Result<Workflow, DomainError> {
        validate_name(&request.name)?;
        request.trigger.validate()?;
        validate_steps(&request.steps)?;

        let mut workflow = Workflow::new(WorkflowId::generate(), &ctx.user_id, request.name)
            .with_trigger(request.trigger)
            .with_steps(request.steps)
            .with_conditions(request.conditions)
            .with_metadata(request.metadata);

        if let Some(description) = request.description {
            workflow = workflow.with_description(description);
        }

        if let Some(organization_id) = request.organization_id.or(ctx.organization_id.clone()) {
            workflow = workflow.with_organization(organization_id);
        }

        let created = self.storage.create(workflow).await?;

        info!(
            workflow_id = %created.id(),
            user_id = %ctx.user_id,
            trigger = created.trigger().trigger_type(),
            "Created workflow"
        );

        Ok(created)
    }

    /// Apply a partial update
    pub async fn update(
        &self,
        ctx: &AuthContext,
        id: &str,
        request: UpdateWorkflowRequest,
    ) -> Result<Workflow, DomainError> {
        let mut workflow = self.get_owned(ctx, id).await?;

        if let Some(name) = request.name {
            validate_name(&name)?;
            workflow.set_name(name);
        }

        if let Some(description) = request.description {
            workflow.set_description(description);
        }

        if let Some(trigger) = request.trigger {
            trigger.validate()?;
            workflow.set_trigger(trigger);
        }

        if let Some(steps) = request.steps {
            validate_steps(&steps)?;
            workflow.set_steps(steps);
        }

        if let Some(conditions) = request.conditions {
            workflow.set_conditions(conditions);
        }

        if let Some(metadata) = request.metadata {
            workflow.set_metadata(metadata);
        }

        if let Some(status) = request.status {
            workflow.set_status(status)?;
        }

        self.storage.update(workflow).await
    }

    /// Delete one workflow
    pub async fn delete(&self, ctx: &AuthContext, id: &str) -> Result<bool, DomainError> {
        let workflow = self.get_owned(ctx, id).await?;

        debug!(workflow_id = %workflow.id(), user_id = %ctx.user_id, "Deleting workflow");
        self.storage.delete(workflow.id()).await
    }

    /// Replay structural step edits against the stored step list
    ///
    /// `base_version` is the version the client last saw; a mismatch means
    /// another editor changed the steps in between and the edit is rejected
    /// instead of silently overwriting it.
    pub async fn apply_step_ops(
        &self,
        ctx: &AuthContext,
        id: &str,
        base_version: u32,
        ops: &[StepOp],
    ) -> Result<Workflow, DomainError> {
        let mut workflow = self.get_owned(ctx, id).await?;

        if workflow.version() != base_version {
            return Err(DomainError::conflict(format!(
                "Workflow '{}' is at version {}, edit was based on version {}",
                id,
                workflow.version(),
                base_version
            )));
        }

        let steps = apply_ops(workflow.steps(), ops)?;
        workflow.set_steps(steps);

        self.storage.update(workflow).await
    }

    /// Hand a test run to the dispatcher and record the outcome
    pub async fn dispatch_test(
        &self,
        ctx: &AuthContext,
        id: &str,
    ) -> Result<TestDispatchResult, DomainError> {
        let mut workflow = self.get_owned(ctx, id).await?;

        if !workflow.has_steps() {
            return Err(DomainError::validation(
                "Cannot test a workflow with no steps",
            ));
        }

        if workflow.status() == WorkflowStatus::Archived {
            return Err(DomainError::validation(
                "Cannot test an archived workflow",
            ));
        }

        let summary = StepEditor::new(workflow.steps().to_vec()).summary();

        match self.dispatcher.dispatch(&workflow, ctx).await {
            Ok(run) => {
                workflow.record_execution(true);
                self.storage.update(workflow).await?;

                Ok(TestDispatchResult {
                    run,
                    estimated_duration_secs: summary.estimated_duration_secs,
                })
            }
            Err(e) => {
                warn!(workflow_id = %id, error = %e, "Test dispatch failed");
                workflow.record_execution(false);
                self.storage.update(workflow).await?;
                Err(e)
            }
        }
    }

    /// Readiness probe: one cheap round-trip to the backing store
    pub async fn probe(&self) -> Result<usize, DomainError> {
        self.storage.count().await
    }

    /// Fetch a workflow the caller may mutate, or NotFound
    async fn get_owned(&self, ctx: &AuthContext, id: &str) -> Result<Workflow, DomainError> {
        self.get(ctx, id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Workflow '{}' not found", id)))
    }
}

fn parse_id(id: &str) -> Result<WorkflowId, DomainError> {
    WorkflowId::new(id)
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("Workflow name cannot be empty"));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(DomainError::validation(format!(
            "Workflow name too long (max {} characters)",
            MAX_NAME_LENGTH
        )));
    }

    Ok(())
}

/// Validate a step list: unique ids plus each step's own payload.
/// An empty list is allowed; the canvas creates workflows before any step
/// has been added.
fn validate_steps(steps: &[WorkflowStep]) -> Result<(), DomainError> {
    let mut seen_ids = HashSet::new();

    for step in steps {
        if !seen_ids.insert(step.id.as_str()) {
            return Err(DomainError::validation(format!(
                "Duplicate step id: '{}'",
                step.id
            )));
        }
    }

    for step in steps {
        step.validate()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::UserRole;
    use crate::domain::storage::mock::MockStorage;
    use crate::domain::workflow::dispatch::mock::MockDispatcher;
    use crate::domain::workflow::{
        ActionStepConfig, EmailStepConfig, StepConfig,
    };
    use serde_json::json;

    fn action_step(id: &str) -> WorkflowStep {
        WorkflowStep::new(
            id,
            StepConfig::Action(ActionStepConfig {
                action: "create_invoice".to_string(),
                parameters: Default::default(),
            }),
        )
    }

    fn service() -> WorkflowService {
        WorkflowService::new(
            Arc::new(MockStorage::<Workflow>::new()),
            Arc::new(MockDispatcher::new()),
        )
    }

    fn service_with(
        storage: MockStorage<Workflow>,
        dispatcher: MockDispatcher,
    ) -> WorkflowService {
        WorkflowService::new(Arc::new(storage), Arc::new(dispatcher))
    }

    fn ctx() -> AuthContext {
        AuthContext::new("user-1")
    }

    #[tokio::test]
    async fn test_create_with_defaults() {
        let service = service();

        let created = service
            .create(
                &ctx(),
                CreateWorkflowRequest::new("Invoice chaser", TriggerConfig::manual())
                    .with_steps(vec![action_step("s1")]),
            )
            .await
            .unwrap();

        assert_eq!(created.name(), "Invoice chaser");
        assert_eq!(created.user_id(), "user-1");
        assert_eq!(created.status(), WorkflowStatus::Draft);
        assert!(!created.is_active());
        assert_eq!(created.execution_count(), 0);
        assert_eq!(created.version(), 1);
        assert_eq!(created.steps()[0].order, 0);
    }

    #[tokio::test]
    async fn test_create_empty_name_rejected() {
        let service = service();

        let err = service
            .create(&ctx(), CreateWorkflowRequest::new("", TriggerConfig::manual()))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(err.to_string().contains("name cannot be empty"));
    }

    #[tokio::test]
    async fn test_create_schedule_trigger_needs_config() {
        let service = service();
        let trigger: TriggerConfig =
            serde_json::from_value(json!({"type": "schedule", "config": {}})).unwrap();

        let err = service
            .create(&ctx(), CreateWorkflowRequest::new("Nightly sync", trigger))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_invalid_email_step_rejected() {
        let service = service();
        let bad_email = WorkflowStep::new(
            "s1",
            StepConfig::Email(EmailStepConfig {
                to: "not-an-email".to_string(),
                ..Default::default()
            }),
        );

        let err = service
            .create(
                &ctx(),
                CreateWorkflowRequest::new("Mailer", TriggerConfig::manual())
                    .with_steps(vec![bad_email]),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("invalid recipient address"));
    }

    #[tokio::test]
    async fn test_create_duplicate_step_ids_rejected() {
        let service = service();

        let err = service
            .create(
                &ctx(),
                CreateWorkflowRequest::new("Dup", TriggerConfig::manual())
                    .with_steps(vec![action_step("s1"), action_step("s1")]),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Duplicate step id"));
    }

    #[tokio::test]
    async fn test_list_scopes_to_owner_and_sorts() {
        let service = service();
        let other = AuthContext::new("user-2");

        service
            .create(&ctx(), CreateWorkflowRequest::new("Mine A", TriggerConfig::manual()))
            .await
            .unwrap();
        service
            .create(&other, CreateWorkflowRequest::new("Theirs", TriggerConfig::manual()))
            .await
            .unwrap();
        service
            .create(&ctx(), CreateWorkflowRequest::new("Mine B", TriggerConfig::manual()))
            .await
            .unwrap();

        let mine = service.list(&ctx(), None).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|w| w.user_id() == "user-1"));

        let admin = AuthContext::new("admin").with_role(UserRole::Admin);
        let all = service.list(&admin, None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_list_active_filter() {
        let service = service();

        let created = service
            .create(&ctx(), CreateWorkflowRequest::new("Draft flow", TriggerConfig::manual()))
            .await
            .unwrap();
        service
            .update(
                &ctx(),
                created.id().as_str(),
                UpdateWorkflowRequest::new().with_status(WorkflowStatus::Active),
            )
            .await
            .unwrap();
        service
            .create(&ctx(), CreateWorkflowRequest::new("Still draft", TriggerConfig::manual()))
            .await
            .unwrap();

        let active = service.list(&ctx(), Some(ActiveFilter::Active)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name(), "Draft flow");

        let inactive = service
            .list(&ctx(), Some(ActiveFilter::Inactive))
            .await
            .unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].name(), "Still draft");
    }

    #[tokio::test]
    async fn test_list_storage_failure_surfaces_message() {
        let service = service_with(
            MockStorage::new().with_error("Database error"),
            MockDispatcher::new(),
        );

        let err = service.list(&ctx(), None).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage { .. }));
        assert!(err.to_string().contains("Database error"));
    }

    #[tokio::test]
    async fn test_get_hides_foreign_workflows() {
        let service = service();

        let created = service
            .create(&ctx(), CreateWorkflowRequest::new("Private", TriggerConfig::manual()))
            .await
            .unwrap();

        let other = AuthContext::new("user-2");
        let hidden = service.get(&other, created.id().as_str()).await.unwrap();
        assert!(hidden.is_none());

        let admin = AuthContext::new("admin").with_role(UserRole::Admin);
        assert!(service.get(&admin, created.id().as_str()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_steps_bumps_version() {
        let service = service();

        let created = service
            .create(&ctx(), CreateWorkflowRequest::new("Flow", TriggerConfig::manual()))
            .await
            .unwrap();
        assert_eq!(created.version(), 1);

        let updated = service
            .update(
                &ctx(),
                created.id().as_str(),
                UpdateWorkflowRequest::new().with_steps(vec![action_step("s1")]),
            )
            .await
            .unwrap();

        assert_eq!(updated.version(), 2);
        assert_eq!(updated.step_count(), 1);
    }

    #[tokio::test]
    async fn test_apply_step_ops_version_conflict() {
        let service = service();

        let created = service
            .create(
                &ctx(),
                CreateWorkflowRequest::new("Flow", TriggerConfig::manual())
                    .with_steps(vec![action_step("s1"), action_step("s2")]),
            )
            .await
            .unwrap();

        let err = service
            .apply_step_ops(
                &ctx(),
                created.id().as_str(),
                99,
                &[StepOp::Delete {
                    step_id: "s1".to_string(),
                }],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_apply_step_ops_moves_and_bumps_version() {
        let service = service();

        let created = service
            .create(
                &ctx(),
                CreateWorkflowRequest::new("Flow", TriggerConfig::manual())
                    .with_steps(vec![action_step("s1"), action_step("s2"), action_step("s3")]),
            )
            .await
            .unwrap();

        let updated = service
            .apply_step_ops(
                &ctx(),
                created.id().as_str(),
                created.version(),
                &[StepOp::Move {
                    step_id: "s3".to_string(),
                    to_index: 0,
                }],
            )
            .await
            .unwrap();

        let ids: Vec<&str> = updated.steps().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s3", "s1", "s2"]);
        assert_eq!(updated.steps()[0].order, 0);
        assert_eq!(updated.version(), created.version() + 1);
    }

    #[tokio::test]
    async fn test_dispatch_test_requires_steps() {
        let service = service();

        let created = service
            .create(&ctx(), CreateWorkflowRequest::new("Empty", TriggerConfig::manual()))
            .await
            .unwrap();

        let err = service
            .dispatch_test(&ctx(), created.id().as_str())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no steps"));
    }

    #[tokio::test]
    async fn test_dispatch_test_updates_counters() {
        let dispatcher = Arc::new(MockDispatcher::new());
        let service = WorkflowService::new(
            Arc::new(MockStorage::<Workflow>::new()),
            dispatcher.clone(),
        );

        let created = service
            .create(
                &ctx(),
                CreateWorkflowRequest::new("Flow", TriggerConfig::manual()).with_steps(vec![
                    action_step("s1").with_timeout_secs(30),
                    action_step("s2").with_timeout_secs(60),
                ]),
            )
            .await
            .unwrap();

        let result = service
            .dispatch_test(&ctx(), created.id().as_str())
            .await
            .unwrap();
        assert_eq!(result.estimated_duration_secs, 90);
        assert_eq!(dispatcher.calls(), 1);

        let after = service
            .get(&ctx(), created.id().as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.execution_count(), 1);
        assert_eq!(after.success_count(), 1);
        assert_eq!(after.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_failure_counts_and_propagates() {
        let service = service_with(
            MockStorage::new(),
            MockDispatcher::new().with_error("runner offline"),
        );

        let created = service
            .create(
                &ctx(),
                CreateWorkflowRequest::new("Flow", TriggerConfig::manual())
                    .with_steps(vec![action_step("s1")]),
            )
            .await
            .unwrap();

        let err = service
            .dispatch_test(&ctx(), created.id().as_str())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("runner offline"));

        let after = service
            .get(&ctx(), created.id().as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.execution_count(), 1);
        assert_eq!(after.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_archived_workflow_cannot_be_tested_or_reactivated() {
        let service = service();

        let created = service
            .create(
                &ctx(),
                CreateWorkflowRequest::new("Flow", TriggerConfig::manual())
                    .with_steps(vec![action_step("s1")]),
            )
            .await
            .unwrap();

        service
            .update(
                &ctx(),
                created.id().as_str(),
                UpdateWorkflowRequest::new().with_status(WorkflowStatus::Archived),
            )
            .await
            .unwrap();

        let err = service
            .dispatch_test(&ctx(), created.id().as_str())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("archived"));

        let err = service
            .update(
                &ctx(),
                created.id().as_str(),
                UpdateWorkflowRequest::new().with_status(WorkflowStatus::Active),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Archived"));
    }

    #[tokio::test]
    async fn test_delete_scoped_to_owner() {
        let service = service();

        let created = service
            .create(&ctx(), CreateWorkflowRequest::new("Mine", TriggerConfig::manual()))
            .await
            .unwrap();

        let other = AuthContext::new("user-2");
        let err = service
            .delete(&other, created.id().as_str())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        assert!(service.delete(&ctx(), created.id().as_str()).await.unwrap());
    }

    #[test]
    fn test_active_filter_parsing() {
        assert_eq!(ActiveFilter::parse("active").unwrap(), ActiveFilter::Active);
        assert_eq!(
            ActiveFilter::parse("inactive").unwrap(),
            ActiveFilter::Inactive
        );
        assert!(ActiveFilter::parse("archived").is_err());
    }
}
