//! Domain layer - Core business logic and entities

pub mod auth;
pub mod error;
pub mod storage;
pub mod workflow;

pub use auth::{AuthContext, AuthService, UserRole};
pub use error::DomainError;
pub use storage::{Storage, StorageEntity, StorageKey};
pub use workflow::{
    StepConfig, StepEditor, StepKind, StepOp, TestDispatcher, TestRun, TriggerConfig, Workflow,
    WorkflowId, WorkflowStatus, WorkflowStep,
};
