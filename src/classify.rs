//! Field-change classification.
//!
//! Lock/unlock and workflow-state transitions touch exactly four system
//! fields each. Recognizing those two shapes is what lets the gatekeeper
//! avoid redundant publish-queue entries.

use serde::{Deserialize, Serialize};

use crate::model::{FieldChangeSet, FieldId, fields};

/// Fields written by a lock or unlock and nothing else.
pub const LOCK_TOGGLE_FIELDS: [FieldId; 4] = [
    fields::LOCK,
    fields::REVISION,
    fields::UPDATED,
    fields::UPDATED_BY,
];

/// Fields written by a workflow-state transition and nothing else.
pub const WORKFLOW_STATE_FIELDS: [FieldId; 4] = [
    fields::WORKFLOW_STATE,
    fields::REVISION,
    fields::UPDATED,
    fields::UPDATED_BY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeClass {
    LockToggleOnly,
    WorkflowStateOnly,
    General,
}

impl ChangeClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeClass::LockToggleOnly => "lock_toggle_only",
            ChangeClass::WorkflowStateOnly => "workflow_state_only",
            ChangeClass::General => "general",
        }
    }
}

impl std::fmt::Display for ChangeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a save by the fields it changed.
pub fn classify(changes: &FieldChangeSet) -> ChangeClass {
    if is_exactly(changes, &LOCK_TOGGLE_FIELDS) {
        ChangeClass::LockToggleOnly
    } else if is_exactly(changes, &WORKFLOW_STATE_FIELDS) {
        ChangeClass::WorkflowStateOnly
    } else {
        ChangeClass::General
    }
}

fn is_exactly(changes: &FieldChangeSet, expected: &[FieldId]) -> bool {
    changes.len() == expected.len() && expected.iter().all(|f| changes.contains(f))
}
