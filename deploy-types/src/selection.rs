// SPDX-License-Identifier: GPL-3.0-only

//! Disk selection step configuration
//!
//! Task sequences describe which disk to install onto as an ordered
//! list of steps, each a predicate plus an action. Steps come from
//! task-sequence JSON, are immutable once applied, and are not
//! persisted after use.

use serde::{Deserialize, Serialize};

/// Named built-in predicate of a selection step.
///
/// `None` means the step carries a free-form `condition` expression
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BuiltInCondition {
    HasLinuxPartition,
    HasMicrosoftPartition,
    IsEfiSystemDisk,
    IsEmpty,
    IsLargest,
    IsMbrBootDisk,
    IsReadOnly,
    IsSmallest,
    IsUninitialised,
    #[default]
    None,
}

/// What a step does with the disks its predicate matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SelectionAction {
    /// Result is the matched set; empty is allowed (logged)
    Include,
    /// Result is input minus matched; empty is allowed (logged)
    Exclude,
    /// Result is the matched set, falling back to the unfiltered
    /// input when nothing matched
    Prefer,
    /// Result is input minus matched, falling back to the unfiltered
    /// input when that would remove every disk
    Avoid,
    /// Step disabled; result is the unfiltered input
    #[default]
    None,
}

/// One declarative filter+action unit in the disk-selection pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiskSelectionStep {
    /// Built-in predicate; `None` selects the expression path
    #[serde(default)]
    pub built_in: BuiltInCondition,

    /// Free-form boolean expression over disk properties, evaluated
    /// only when `built_in` is `None`
    #[serde(default)]
    pub condition: Option<String>,

    /// Action applied to the matched set
    #[serde(default)]
    pub action: SelectionAction,
}

impl DiskSelectionStep {
    pub fn built_in(built_in: BuiltInCondition, action: SelectionAction) -> Self {
        Self {
            built_in,
            condition: None,
            action,
        }
    }

    pub fn expression(condition: impl Into<String>, action: SelectionAction) -> Self {
        Self {
            built_in: BuiltInCondition::None,
            condition: Some(condition.into()),
            action,
        }
    }
}
