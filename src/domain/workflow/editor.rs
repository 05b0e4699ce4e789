//! Step editor state for one workflow being edited
//!
//! The canvas counterpart on the server side: an ordered step list with
//! selection, drag-reorder, deletion, and test gating. Pure and synchronous;
//! persistence and execution belong to the caller. A test run is delegated to
//! a caller-supplied callback and never interpreted here.

use super::step::{StepKind, WorkflowStep};

/// Derived display values for the canvas header; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSummary {
    pub step_count: usize,
    pub active_steps: usize,
    pub inactive_steps: usize,

    /// Sum of all step timeouts. A naive upper bound: ignores branching,
    /// retries, and any parallelism a future engine might have.
    pub estimated_duration_secs: u64,
}

/// In-memory editing state for one workflow's step list
#[derive(Debug, Default)]
pub struct StepEditor {
    steps: Vec<WorkflowStep>,
    selected: Option<String>,
    is_executing: bool,
}

impl StepEditor {
    pub fn new(steps: Vec<WorkflowStep>) -> Self {
        let mut editor = Self {
            steps,
            selected: None,
            is_executing: false,
        };
        editor.normalize_order();
        editor
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<WorkflowStep> {
        self.steps
    }

    pub fn selected(&self) -> Option<&WorkflowStep> {
        let id = self.selected.as_deref()?;
        self.steps.iter().find(|s| s.id == id)
    }

    /// Caller-supplied flag: a test run is currently in flight
    pub fn set_executing(&mut self, is_executing: bool) {
        self.is_executing = is_executing;
    }

    /// Move the dragged step to the position of the step it was dropped onto.
    ///
    /// Remove-and-reinsert, not a swap: everything between the two positions
    /// shifts by one. Afterwards every step's `order` equals its index.
    /// Returns whether the list changed; unknown ids and `active == over` are
    /// no-ops.
    pub fn reorder(&mut self, active_id: &str, over_id: &str) -> bool {
        if active_id == over_id {
            return false;
        }

        let Some(from) = self.index_of(active_id) else {
            return false;
        };
        let Some(to) = self.index_of(over_id) else {
            return false;
        };

        let step = self.steps.remove(from);
        self.steps.insert(to, step);
        self.normalize_order();
        true
    }

    /// Mark a step as selected for the configuration side panel
    pub fn select(&mut self, step_id: &str) -> bool {
        if self.index_of(step_id).is_none() {
            return false;
        }
        self.selected = Some(step_id.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Remove one step by id; relative order of the rest is unchanged
    pub fn delete_step(&mut self, step_id: &str) -> bool {
        let Some(index) = self.index_of(step_id) else {
            return false;
        };

        self.steps.remove(index);
        self.normalize_order();

        if self.selected.as_deref() == Some(step_id) {
            self.selected = None;
        }
        true
    }

    /// Append a freshly defaulted step of the given kind. The empty-state
    /// affordance always asks for `action`.
    pub fn add_step(&mut self, kind: StepKind) -> &WorkflowStep {
        self.steps.push(WorkflowStep::default_of_kind(kind));
        self.normalize_order();
        self.steps.last().expect("step was just pushed")
    }

    /// Test is non-invocable while the list is empty or a run is in flight
    pub fn can_test(&self) -> bool {
        !self.steps.is_empty() && !self.is_executing
    }

    /// Invoke the caller's test callback if permitted. Returns whether the
    /// callback ran; it runs at most once per call.
    pub fn test_workflow<F>(&self, callback: F) -> bool
    where
        F: FnOnce(&[WorkflowStep]),
    {
        if !self.can_test() {
            return false;
        }
        callback(&self.steps);
        true
    }

    pub fn summary(&self) -> EditorSummary {
        let active_steps = self.steps.iter().filter(|s| s.is_active).count();
        EditorSummary {
            step_count: self.steps.len(),
            active_steps,
            inactive_steps: self.steps.len() - active_steps,
            estimated_duration_secs: self
                .steps
                .iter()
                .map(|s| u64::from(s.timeout_secs))
                .sum(),
        }
    }

    fn index_of(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    fn normalize_order(&mut self) {
        for (index, step) in self.steps.iter_mut().enumerate() {
            step.order = index as u32;
        }
    }
}
