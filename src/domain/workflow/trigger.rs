//! Workflow trigger configuration
//!
//! Only the data shape is owned here; the mechanism that would fire a trigger
//! lives outside this service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::DomainError;

/// How a workflow would be started
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerConfig {
    /// Started explicitly by a user
    Manual,

    /// Started on a schedule (cron expression, interval, ...)
    Schedule {
        #[serde(default)]
        config: Map<String, Value>,
    },

    /// Started by a platform event (invoice created, lead converted, ...)
    Event {
        #[serde(default)]
        config: Map<String, Value>,
    },

    /// Started by an inbound webhook call
    Webhook {
        #[serde(default)]
        config: Map<String, Value>,
    },
}

impl TriggerConfig {
    pub fn manual() -> Self {
        Self::Manual
    }

    /// The tag used in serialized form and in log fields
    pub fn trigger_type(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Schedule { .. } => "schedule",
            Self::Event { .. } => "event",
            Self::Webhook { .. } => "webhook",
        }
    }

    /// A schedule trigger must say when it fires; an empty config is rejected.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Self::Schedule { config } = self {
            if config.is_empty() {
                return Err(DomainError::validation(
                    "Schedule trigger requires a non-empty config",
                ));
            }
        }
        Ok(())
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self::Manual
    }
}
