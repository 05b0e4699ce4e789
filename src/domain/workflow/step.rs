//! Workflow step model
//!
//! A step's configuration is a closed, kind-tagged union: every place that
//! reads a configuration matches exhaustively, so an invalid kind/config
//! pairing cannot be represented.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::ValidateEmail;

use crate::domain::DomainError;

/// Default timeout for a freshly added step, in seconds
pub const DEFAULT_STEP_TIMEOUT_SECS: u32 = 30;

/// The closed set of step kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Action,
    Condition,
    Delay,
    Webhook,
    Email,
    Notification,
    Gpt,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Condition => "condition",
            Self::Delay => "delay",
            Self::Webhook => "webhook",
            Self::Email => "email",
            Self::Notification => "notification",
            Self::Gpt => "gpt",
        }
    }
}

/// Kind-specific step configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepConfig {
    /// Run a platform action (create invoice, update lead, ...)
    Action(ActionStepConfig),

    /// Evaluate conditions and decide whether later steps run
    Condition(ConditionStepConfig),

    /// Pause the workflow for a fixed interval
    Delay(DelayStepConfig),

    /// Call an external HTTP endpoint
    Webhook(WebhookStepConfig),

    /// Send a templated email through the delivery collaborator
    Email(EmailStepConfig),

    /// Send an in-platform notification
    Notification(NotificationStepConfig),

    /// Ask an LLM for a completion
    Gpt(GptStepConfig),
}

impl StepConfig {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Action(_) => StepKind::Action,
            Self::Condition(_) => StepKind::Condition,
            Self::Delay(_) => StepKind::Delay,
            Self::Webhook(_) => StepKind::Webhook,
            Self::Email(_) => StepKind::Email,
            Self::Notification(_) => StepKind::Notification,
            Self::Gpt(_) => StepKind::Gpt,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// An empty configuration skeleton for the given kind. The editor adds
    /// steps in this shape; the user fills them in before the workflow is
    /// persisted.
    pub fn default_for(kind: StepKind) -> Self {
        match kind {
            StepKind::Action => Self::Action(ActionStepConfig::default()),
            StepKind::Condition => Self::Condition(ConditionStepConfig::default()),
            StepKind::Delay => Self::Delay(DelayStepConfig::default()),
            StepKind::Webhook => Self::Webhook(WebhookStepConfig::default()),
            StepKind::Email => Self::Email(EmailStepConfig::default()),
            StepKind::Notification => Self::Notification(NotificationStepConfig::default()),
            StepKind::Gpt => Self::Gpt(GptStepConfig::default()),
        }
    }

    /// Validate the kind-specific payload
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::Action(config) => {
                if config.action.is_empty() {
                    return Err(DomainError::validation("Action step requires an action name"));
                }
                Ok(())
            }
            Self::Condition(_) => Ok(()),
            Self::Delay(config) => {
                if config.delay_secs == 0 {
                    return Err(DomainError::validation(
                        "Delay step requires a delay of at least 1 second",
                    ));
                }
                Ok(())
            }
            Self::Webhook(config) => {
                if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
                    return Err(DomainError::validation(format!(
                        "Webhook step URL must be http(s), got '{}'",
                        config.url
                    )));
                }
                Ok(())
            }
            Self::Email(config) => {
                if !config.to.validate_email() {
                    return Err(DomainError::validation(format!(
                        "Email step has an invalid recipient address '{}'",
                        config.to
                    )));
                }
                Ok(())
            }
            Self::Notification(config) => {
                if config.message.is_empty() {
                    return Err(DomainError::validation("Notification step requires a message"));
                }
                Ok(())
            }
            Self::Gpt(config) => {
                if config.prompt.is_empty() {
                    return Err(DomainError::validation("GPT step requires a prompt"));
                }
                Ok(())
            }
        }
    }
}

/// Platform action invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ActionStepConfig {
    /// Action name, e.g. "create_invoice"
    #[serde(default)]
    pub action: String,

    /// Action parameters, passed through as-is
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

/// Conditional gate over later steps
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConditionStepConfig {
    /// Evaluated in order; all must hold for the gate to pass
    #[serde(default)]
    pub conditions: Vec<StepCondition>,
}

/// Fixed pause
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DelayStepConfig {
    pub delay_secs: u32,
}

impl Default for DelayStepConfig {
    fn default() -> Self {
        Self { delay_secs: 60 }
    }
}

/// Outbound HTTP call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookStepConfig {
    pub url: String,

    #[serde(default)]
    pub method: HttpMethod,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl Default for WebhookStepConfig {
    fn default() -> Self {
        Self {
            url: "https://".to_string(),
            method: HttpMethod::default(),
            headers: HashMap::new(),
        }
    }
}

/// HTTP method for webhook steps
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Delete,
}

/// Templated email send
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EmailStepConfig {
    /// Recipient address; must be a syntactically valid email
    #[serde(default)]
    pub to: String,

    #[serde(default)]
    pub subject: String,

    /// Template name resolved by the delivery collaborator
    #[serde(default)]
    pub template: String,
}

/// In-platform notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NotificationStepConfig {
    #[serde(default)]
    pub channel: NotificationChannel,

    #[serde(default)]
    pub message: String,
}

/// Delivery channel for notification steps
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    #[default]
    InApp,
    Push,
    Sms,
}

/// LLM completion request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GptStepConfig {
    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub prompt: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A single condition attached to a step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepCondition {
    /// Field to evaluate, e.g. "invoice.total"
    pub field: String,

    pub operator: ConditionOperator,

    #[serde(default)]
    pub value: Value,
}

/// Comparison operator for step conditions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Eq,
    Ne,
    Gt,
    Lt,
    Contains,
    Exists,
}

/// One unit of work within a workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowStep {
    /// Client-generated id, unique within the owning workflow
    pub id: String,

    /// Kind-specific configuration, tagged by `type`
    #[serde(flatten)]
    pub config: StepConfig,

    /// Extra guard conditions; an empty list means the step always applies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<StepCondition>,

    /// Upper bound on step runtime, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,

    #[serde(default)]
    pub retry_count: u32,

    /// Position within the owning workflow; dense 0..n-1
    #[serde(default)]
    pub order: u32,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_timeout() -> u32 {
    DEFAULT_STEP_TIMEOUT_SECS
}

fn default_active() -> bool {
    true
}

impl WorkflowStep {
    pub fn new(id: impl Into<String>, config: StepConfig) -> Self {
        Self {
            id: id.into(),
            config,
            conditions: Vec::new(),
            timeout_secs: DEFAULT_STEP_TIMEOUT_SECS,
            retry_count: 0,
            order: 0,
            is_active: true,
        }
    }

    /// A freshly defaulted step of the given kind with a generated id
    pub fn default_of_kind(kind: StepKind) -> Self {
        Self::new(
            format!("step-{}", uuid::Uuid::new_v4()),
            StepConfig::default_for(kind),
        )
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u32) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<StepCondition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn kind(&self) -> StepKind {
        self.config.kind()
    }

    /// Validate the step: non-empty id plus the kind-specific payload
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.is_empty() {
            return Err(DomainError::validation("Step id cannot be empty"));
        }
        self.config.validate()
    }
}
