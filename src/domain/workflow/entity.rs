//! Workflow domain entity

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::step::{StepCondition, WorkflowStep};
use super::trigger::TriggerConfig;
use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Maximum length for workflow IDs
pub const MAX_ID_LENGTH: usize = 50;

/// Maximum length for workflow names
pub const MAX_NAME_LENGTH: usize = 120;

/// Regex pattern for valid workflow IDs: alphanumeric and hyphens
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]$|^[a-zA-Z0-9]$").unwrap());

/// Validated workflow identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Create a new validated workflow ID
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        validate_workflow_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh random ID
    pub fn generate() -> Self {
        Self(format!("wf-{}", uuid::Uuid::new_v4()))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkflowId> for String {
    fn from(id: WorkflowId) -> Self {
        id.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for WorkflowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl StorageKey for WorkflowId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validate a workflow ID string
pub fn validate_workflow_id(id: &str) -> Result<(), DomainError> {
    if id.is_empty() {
        return Err(DomainError::invalid_id("Workflow ID cannot be empty"));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(DomainError::invalid_id(format!(
            "Workflow ID exceeds maximum length of {} characters",
            MAX_ID_LENGTH
        )));
    }

    if !ID_PATTERN.is_match(id) {
        return Err(DomainError::invalid_id(format!(
            "Invalid workflow ID '{}': must be alphanumeric with hyphens, start and end with alphanumeric",
            id
        )));
    }

    Ok(())
}

/// Lifecycle status of a workflow record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Archived,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Archived => "archived",
        }
    }
}

/// A user-owned automation record: a trigger plus an ordered list of steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    id: WorkflowId,

    /// Owning user (identity-provider id)
    user_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    organization_id: Option<String>,

    name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    status: WorkflowStatus,

    /// Boolean projection of `status == Active`; never set independently
    is_active: bool,

    trigger: TriggerConfig,

    /// Ordered steps; `order` fields are kept dense 0..n-1
    steps: Vec<WorkflowStep>,

    /// Workflow-level guard conditions. Stored only; nothing in this
    /// service evaluates them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    conditions: Vec<StepCondition>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    metadata: HashMap<String, serde_json::Value>,

    /// Incremented on every step-list change; concurrency token for
    /// structural edits
    version: u32,

    execution_count: u64,
    success_count: u64,
    failure_count: u64,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(id: WorkflowId, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: user_id.into(),
            organization_id: None,
            name: name.into(),
            description: None,
            status: WorkflowStatus::Draft,
            is_active: false,
            trigger: TriggerConfig::default(),
            steps: Vec::new(),
            conditions: Vec::new(),
            metadata: HashMap::new(),
            version: 1,
            execution_count: 0,
            success_count: 0,
            failure_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    // Builder methods

    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerConfig) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_steps(mut self, steps: Vec<WorkflowStep>) -> Self {
        self.steps = steps;
        self.normalize_order();
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<StepCondition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    // Getters

    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn trigger(&self) -> &TriggerConfig {
        &self.trigger
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn conditions(&self) -> &[StepCondition] {
        &self.conditions
    }

    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn has_steps(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn get_step(&self, step_id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    // Setters (mutate and update timestamp)

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    pub fn set_trigger(&mut self, trigger: TriggerConfig) {
        self.trigger = trigger;
        self.touch();
    }

    pub fn set_conditions(&mut self, conditions: Vec<StepCondition>) {
        self.conditions = conditions;
        self.touch();
    }

    pub fn set_metadata(&mut self, metadata: HashMap<String, serde_json::Value>) {
        self.metadata = metadata;
        self.touch();
    }

    /// Replace the step list; order is renormalized and the version bumped
    pub fn set_steps(&mut self, steps: Vec<WorkflowStep>) {
        self.steps = steps;
        self.normalize_order();
        self.increment_version();
    }

    /// Change lifecycle status. Archived is terminal; `is_active` always
    /// tracks the projection of the new status.
    pub fn set_status(&mut self, status: WorkflowStatus) -> Result<(), DomainError> {
        if self.status == WorkflowStatus::Archived && status != WorkflowStatus::Archived {
            return Err(DomainError::validation(
                "Archived workflows cannot change status",
            ));
        }

        self.status = status;
        self.is_active = status == WorkflowStatus::Active;
        self.touch();
        Ok(())
    }

    /// Record a dispatched test run
    pub fn record_execution(&mut self, success: bool) {
        self.execution_count += 1;
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.touch();
    }

    /// Rewrite every step's `order` to its positional index
    fn normalize_order(&mut self) {
        for (index, step) in self.steps.iter_mut().enumerate() {
            step.order = index as u32;
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn increment_version(&mut self) {
        self.version += 1;
        self.touch();
    }
}

impl StorageEntity for Workflow {
    type Key = WorkflowId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}
