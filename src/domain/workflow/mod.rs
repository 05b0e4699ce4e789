//! Workflow domain module
//!
//! A workflow is a user-owned automation record: a trigger plus an ordered
//! list of kind-tagged steps. This module owns the record itself, the step
//! editor (reorder, selection, deletion, test gating), structural step edits,
//! and the dispatch seam a test run crosses. Nothing here executes steps.

pub mod dispatch;
mod editor;
mod entity;
mod ops;
mod step;
mod trigger;

pub use dispatch::{TestDispatcher, TestRun};
pub use editor::{EditorSummary, StepEditor};
pub use entity::{
    validate_workflow_id, Workflow, WorkflowId, WorkflowStatus, MAX_ID_LENGTH, MAX_NAME_LENGTH,
};
pub use ops::{apply_ops, StepOp};
pub use step::{
    ActionStepConfig, ConditionOperator, ConditionStepConfig, DelayStepConfig, EmailStepConfig,
    GptStepConfig, HttpMethod, NotificationChannel, NotificationStepConfig, StepCondition,
    StepConfig, StepKind, WebhookStepConfig, WorkflowStep, DEFAULT_STEP_TIMEOUT_SECS,
};
pub use trigger::TriggerConfig;
