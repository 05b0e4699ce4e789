//! Structural step edits
//!
//! Clients describe edits as operations (move, insert, delete) that the
//! server replays against its own copy, instead of overwriting the whole
//! array. Combined with the workflow's version token this closes the
//! silent last-write-wins window between two concurrent editors.

use serde::{Deserialize, Serialize};

use super::step::WorkflowStep;
use crate::domain::DomainError;

/// One structural edit to a workflow's step list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepOp {
    /// Move an existing step to a new index (clamped to the list length)
    Move { step_id: String, to_index: usize },

    /// Insert a new step at an index (clamped to the list length)
    Insert { index: usize, step: WorkflowStep },

    /// Delete a step by id
    Delete { step_id: String },
}

/// Replay `ops` in order against `steps`, returning the new list.
///
/// Each op validates against the state the previous ops produced. `order`
/// fields are rewritten to positional indices afterwards.
pub fn apply_ops(
    steps: &[WorkflowStep],
    ops: &[StepOp],
) -> Result<Vec<WorkflowStep>, DomainError> {
    let mut result: Vec<WorkflowStep> = steps.to_vec();

    for op in ops {
        match op {
            StepOp::Move { step_id, to_index } => {
                let from = position(&result, step_id)?;
                let step = result.remove(from);
                let to = (*to_index).min(result.len());
                result.insert(to, step);
            }
            StepOp::Insert { index, step } => {
                step.validate()?;
                if result.iter().any(|s| s.id == step.id) {
                    return Err(DomainError::validation(format!(
                        "Step '{}' already exists in this workflow",
                        step.id
                    )));
                }
                let at = (*index).min(result.len());
                result.insert(at, step.clone());
            }
            StepOp::Delete { step_id } => {
                let at = position(&result, step_id)?;
                result.remove(at);
            }
        }
    }

    for (index, step) in result.iter_mut().enumerate() {
        step.order = index as u32;
    }

    Ok(result)
}

fn position(steps: &[WorkflowStep], step_id: &str) -> Result<usize, DomainError> {
    steps
        .iter()
        .position(|s| s.id == step_id)
        .ok_or_else(|| {
            DomainError::validation(format!("Step '{}' not found in this workflow", step_id))
        })
}
