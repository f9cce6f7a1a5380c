//! Step-by-step record of a single evaluation.

use crate::domain::entities::{AppliedGlobalRule, GlobalRuleKind, StepKind, TraceStep};

/// Collects trace steps and applied global rules while the pipeline runs.
#[derive(Debug, Default)]
pub struct Tracer {
    steps: Vec<TraceStep>,
    applied: Vec<AppliedGlobalRule>,
}

impl Tracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: StepKind, description: impl Into<String>, before: &str, after: &str) {
        self.steps.push(TraceStep {
            description: description.into(),
            url_before: before.to_string(),
            url_after: after.to_string(),
            changed: before != after,
            kind,
        });
    }

    /// Records a global entry once, however many times it fired.
    pub fn apply_global(&mut self, id: &str, kind: GlobalRuleKind, description: impl Into<String>) {
        if self.applied.iter().any(|a| a.id == id && a.kind == kind) {
            return;
        }
        self.applied.push(AppliedGlobalRule {
            id: id.to_string(),
            kind,
            description: description.into(),
        });
    }

    /// Drops global records, used when the evaluation fails closed.
    pub fn clear_globals(&mut self) {
        self.applied.clear();
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn applied_global_rules(&self) -> &[AppliedGlobalRule] {
        &self.applied
    }

    pub fn into_parts(self) -> (Vec<TraceStep>, Vec<AppliedGlobalRule>) {
        (self.steps, self.applied)
    }
}
