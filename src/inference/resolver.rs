use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, LabelError, LabelResult, ValidationError};
use crate::inference::LabelPriority;
use crate::source::LabelSource;
use crate::table::{LabelColumns, LabelTable};

/// Presence and agreement flags for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRow {
    /// Camera label is non-empty.
    pub camera_indices: bool,
    /// Manual label is non-empty.
    pub manual_indices: bool,
    /// Camera label equals sensor label.
    pub camera_sensor_match: bool,
    /// Manual label equals sensor label.
    pub manual_sensor_match: bool,
    /// Manual label equals camera label.
    pub manual_camera_match: bool,
}

/// Per-record presence/agreement matrix derived from a table.
///
/// Columns are derived together and are never edited independently; build
/// one with [`resolve`] or, for tests and replay, [`AttributeMatrix::from_rows`].
/// Comparisons are plain string equality on the original columns, so two
/// empty labels count as a match.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMatrix {
    camera_indices: Vec<bool>,
    manual_indices: Vec<bool>,
    camera_sensor_match: Vec<bool>,
    manual_sensor_match: Vec<bool>,
    manual_camera_match: Vec<bool>,
}

impl AttributeMatrix {
    /// Derives the matrix from column views.
    fn derive(columns: &LabelColumns<'_>) -> Self {
        let sensor = columns.column(LabelSource::Sensor);
        let camera = columns.column(LabelSource::Camera);
        let manual = columns.column(LabelSource::Manual);

        Self {
            camera_indices: camera.iter().map(|c| !c.is_empty()).collect(),
            manual_indices: manual.iter().map(|m| !m.is_empty()).collect(),
            camera_sensor_match: sensor.iter().zip(camera).map(|(s, c)| s == c).collect(),
            manual_sensor_match: sensor.iter().zip(manual).map(|(s, m)| s == m).collect(),
            manual_camera_match: camera.iter().zip(manual).map(|(c, m)| c == m).collect(),
        }
    }

    /// Builds a matrix from per-record rows.
    #[must_use]
    pub fn from_rows(rows: &[AttributeRow]) -> Self {
        Self {
            camera_indices: rows.iter().map(|r| r.camera_indices).collect(),
            manual_indices: rows.iter().map(|r| r.manual_indices).collect(),
            camera_sensor_match: rows.iter().map(|r| r.camera_sensor_match).collect(),
            manual_sensor_match: rows.iter().map(|r| r.manual_sensor_match).collect(),
            manual_camera_match: rows.iter().map(|r| r.manual_camera_match).collect(),
        }
    }

    /// Validates that every column has the same length.
    ///
    /// Matrices built by this crate always pass; deserialized ones may not.
    pub fn validate(&self) -> LabelResult<()> {
        let len = self.camera_indices.len();
        ensure_len("manualIndices", len, self.manual_indices.len())?;
        ensure_len("cameraSensorMatch", len, self.camera_sensor_match.len())?;
        ensure_len("manualSensorMatch", len, self.manual_sensor_match.len())?;
        ensure_len("manualCameraMatch", len, self.manual_camera_match.len())?;
        Ok(())
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.camera_indices.len()
    }

    /// Returns true if the matrix holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.camera_indices.is_empty()
    }

    /// Camera label present, per record.
    #[must_use]
    pub fn camera_indices(&self) -> &[bool] {
        &self.camera_indices
    }

    /// Manual label present, per record.
    #[must_use]
    pub fn manual_indices(&self) -> &[bool] {
        &self.manual_indices
    }

    /// Camera equals sensor, per record.
    #[must_use]
    pub fn camera_sensor_match(&self) -> &[bool] {
        &self.camera_sensor_match
    }

    /// Manual equals sensor, per record.
    #[must_use]
    pub fn manual_sensor_match(&self) -> &[bool] {
        &self.manual_sensor_match
    }

    /// Manual equals camera, per record.
    #[must_use]
    pub fn manual_camera_match(&self) -> &[bool] {
        &self.manual_camera_match
    }

    /// Returns the flags for one record.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<AttributeRow> {
        Some(AttributeRow {
            camera_indices: *self.camera_indices.get(index)?,
            manual_indices: *self.manual_indices.get(index)?,
            camera_sensor_match: *self.camera_sensor_match.get(index)?,
            manual_sensor_match: *self.manual_sensor_match.get(index)?,
            manual_camera_match: *self.manual_camera_match.get(index)?,
        })
    }

    /// Appends another matrix's records.
    pub(crate) fn append(&mut self, mut other: Self) {
        self.camera_indices.append(&mut other.camera_indices);
        self.manual_indices.append(&mut other.manual_indices);
        self.camera_sensor_match.append(&mut other.camera_sensor_match);
        self.manual_sensor_match.append(&mut other.manual_sensor_match);
        self.manual_camera_match.append(&mut other.manual_camera_match);
    }
}

/// Output of the resolver: one label per record plus the attribute matrix.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolvedLabels {
    /// Winning label per record, aligned with the input table.
    pub labels: Vec<String>,

    /// Presence/agreement flags, aligned with the input table.
    pub matrix: AttributeMatrix,
}

impl ResolvedLabels {
    /// Splits into `(labels, matrix)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, AttributeMatrix) {
        (self.labels, self.matrix)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub(crate) fn append(&mut self, mut other: Self) {
        self.labels.append(&mut other.labels);
        self.matrix.append(other.matrix);
    }
}

/// Resolve one label per record using the default manual > camera > sensor
/// priority.
///
/// The table is only read. Missing optional labels were already normalized
/// to `""` when the table was built.
///
/// # Errors
/// `EmptyResolvedLabel` if every source of a record is empty.
pub fn resolve(table: &LabelTable) -> LabelResult<ResolvedLabels> {
    resolve_with_priority(table, &LabelPriority::default())
}

/// Resolve one label per record using a custom priority list.
///
/// The lowest-priority source seeds every label; each higher source then
/// overwrites wherever it is non-empty, most trusted last. The attribute
/// matrix is derived from the original columns and does not depend on the
/// priority.
pub fn resolve_with_priority(table: &LabelTable, priority: &LabelPriority) -> LabelResult<ResolvedLabels> {
    let resolved = resolve_columns(&table.columns(), priority)?;
    tracing::debug!(
        records = resolved.len(),
        camera_present = count(resolved.matrix.camera_indices()),
        manual_present = count(resolved.matrix.manual_indices()),
        priority = %priority.describe(),
        "resolved training labels"
    );
    Ok(resolved)
}

pub(crate) fn resolve_columns(columns: &LabelColumns<'_>, priority: &LabelPriority) -> LabelResult<ResolvedLabels> {
    let mut labels: Vec<String> = columns.column(priority.base()).to_vec();
    for source in priority.overlays() {
        for (label, candidate) in labels.iter_mut().zip(columns.column(source)) {
            if !candidate.is_empty() {
                label.clone_from(candidate);
            }
        }
    }

    if let Some(idx) = labels.iter().position(String::is_empty) {
        let row = columns.offset() + idx;
        tracing::warn!(row, "rejecting record with an empty resolved label");
        return Err(LabelError::from(ValidationError::EmptyResolvedLabel { row }));
    }

    Ok(ResolvedLabels {
        labels,
        matrix: AttributeMatrix::derive(columns),
    })
}

fn count(column: &[bool]) -> usize {
    column.iter().filter(|v| **v).count()
}
