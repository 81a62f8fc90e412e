//! Sub-label removal.
//!
//! Turns the attribute matrix into removal decisions and blanks the
//! sub-labels that contradict a more trusted label, so stale labels never
//! reach training.

mod apply;
mod conditions;

pub use apply::{apply_removals, RemovalSummary};
pub use conditions::{evaluate_removal_conditions, RemovalAction, RemovalDecisions, RemovalRule, REMOVAL_RULES};
