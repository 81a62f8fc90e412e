use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, LabelResult};
use crate::removal::RemovalDecisions;
use crate::table::LabelTable;

/// What a removal pass did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalSummary {
    /// Records inspected.
    pub records: usize,
    /// Records whose camera and sensor labels were both blanked.
    pub both_removed: usize,
    /// Records whose camera label alone was blanked.
    pub camera_removed: usize,
    /// Records whose sensor label alone was blanked.
    pub sensor_removed: usize,
    /// Cells that actually changed from non-empty to `""`.
    pub cells_cleared: usize,
}

impl RemovalSummary {
    /// Records touched by any removal action.
    #[must_use]
    pub const fn records_touched(&self) -> usize {
        self.both_removed + self.camera_removed + self.sensor_removed
    }
}

/// Blank sub-labels in place according to `decisions`.
///
/// Passes run in a fixed order:
/// 1. `removeBoth` blanks camera and sensor.
/// 2. `removeCamera` blanks camera on records pass 1 did not claim.
/// 3. `removeSensor` blanks sensor on records neither earlier pass claimed.
///
/// The manual column is never touched. Re-applying the same decisions to
/// the result changes nothing.
///
/// # Errors
/// `ShapeMismatch` if the decisions do not cover exactly the table's records.
pub fn apply_removals(table: &mut LabelTable, decisions: &RemovalDecisions) -> LabelResult<RemovalSummary> {
    decisions.validate()?;
    ensure_len("removal decisions", table.len(), decisions.len())?;

    let mut summary = RemovalSummary {
        records: table.len(),
        ..RemovalSummary::default()
    };
    let both = decisions.remove_both();
    let camera_only = decisions.remove_camera();
    let sensor_only = decisions.remove_sensor();
    let (sensor, camera) = table.sub_label_columns_mut();

    for ((s, c), _) in sensor.iter_mut().zip(camera.iter_mut()).zip(both).filter(|(_, &b)| b) {
        summary.both_removed += 1;
        summary.cells_cleared += clear(s) + clear(c);
    }

    for ((c, _), _) in camera.iter_mut().zip(both).zip(camera_only).filter(|((_, &b), &hit)| hit && !b) {
        summary.camera_removed += 1;
        summary.cells_cleared += clear(c);
    }

    for (((s, _), _), _) in sensor
        .iter_mut()
        .zip(both)
        .zip(camera_only)
        .zip(sensor_only)
        .filter(|(((_, &b), &c), &hit)| hit && !b && !c)
    {
        summary.sensor_removed += 1;
        summary.cells_cleared += clear(s);
    }

    tracing::debug!(
        records = summary.records,
        both_removed = summary.both_removed,
        camera_removed = summary.camera_removed,
        sensor_removed = summary.sensor_removed,
        cells_cleared = summary.cells_cleared,
        "removed contradicting sub-labels"
    );
    Ok(summary)
}

impl LabelTable {
    /// Owned variant of [`apply_removals`].
    pub fn with_removals(mut self, decisions: &RemovalDecisions) -> LabelResult<(Self, RemovalSummary)> {
        let summary = apply_removals(&mut self, decisions)?;
        Ok((self, summary))
    }
}

fn clear(cell: &mut String) -> usize {
    if cell.is_empty() {
        0
    } else {
        cell.clear();
        1
    }
}
