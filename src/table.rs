//! The in-memory record table.
//!
//! `LabelTable` stores the three label columns side by side so resolution
//! and removal can run as one pass per column. The table is always owned by
//! the caller; the resolver only borrows it and the remover blanks cells in
//! place.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, LabelError, LabelResult, ValidationError};
use crate::source::LabelSource;
use crate::value::LabelCell;

/// One normalized record.
///
/// Optional sources are stored as `""` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRecord {
    /// Sensor label. Required.
    pub sensor_label: String,
    /// Camera label, `""` when absent.
    #[serde(default)]
    pub camera_label: String,
    /// Manual label, `""` when absent.
    #[serde(default)]
    pub manual_label: String,
}

impl LabelRecord {
    /// Creates a record carrying only a sensor label.
    #[must_use]
    pub fn new(sensor_label: impl Into<String>) -> Self {
        Self {
            sensor_label: sensor_label.into(),
            camera_label: String::new(),
            manual_label: String::new(),
        }
    }

    /// Sets the camera label.
    #[must_use]
    pub fn with_camera(mut self, camera_label: impl Into<String>) -> Self {
        self.camera_label = camera_label.into();
        self
    }

    /// Sets the manual label.
    #[must_use]
    pub fn with_manual(mut self, manual_label: impl Into<String>) -> Self {
        self.manual_label = manual_label.into();
        self
    }

    /// Returns the label held for `source`.
    #[must_use]
    pub fn label(&self, source: LabelSource) -> &str {
        match source {
            LabelSource::Manual => &self.manual_label,
            LabelSource::Camera => &self.camera_label,
            LabelSource::Sensor => &self.sensor_label,
        }
    }
}

/// A record as it arrives from upstream ingestion, before normalization.
///
/// Absent JSON keys deserialize as `LabelCell::Null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLabelRecord {
    /// Sensor cell.
    #[serde(default)]
    pub sensor_label: LabelCell,
    /// Camera cell.
    #[serde(default)]
    pub camera_label: LabelCell,
    /// Manual cell.
    #[serde(default)]
    pub manual_label: LabelCell,
}

impl RawLabelRecord {
    /// Creates a raw record from three cells.
    pub fn new(
        sensor_label: impl Into<LabelCell>,
        camera_label: impl Into<LabelCell>,
        manual_label: impl Into<LabelCell>,
    ) -> Self {
        Self {
            sensor_label: sensor_label.into(),
            camera_label: camera_label.into(),
            manual_label: manual_label.into(),
        }
    }

    fn cell(&self, source: LabelSource) -> &LabelCell {
        match source {
            LabelSource::Manual => &self.manual_label,
            LabelSource::Camera => &self.camera_label,
            LabelSource::Sensor => &self.sensor_label,
        }
    }
}

/// Borrowed view over a contiguous range of a table's columns.
///
/// `offset` is the absolute index of the first row, so errors raised while
/// working on a shard still name the caller's row.
#[derive(Debug, Clone, Copy)]
pub struct LabelColumns<'a> {
    pub(crate) sensor: &'a [String],
    pub(crate) camera: &'a [String],
    pub(crate) manual: &'a [String],
    pub(crate) offset: usize,
}

impl<'a> LabelColumns<'a> {
    /// Number of records in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sensor.len()
    }

    /// Returns true if the view holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sensor.is_empty()
    }

    /// Returns the column for `source`.
    #[must_use]
    pub fn column(&self, source: LabelSource) -> &'a [String] {
        match source {
            LabelSource::Manual => self.manual,
            LabelSource::Camera => self.camera,
            LabelSource::Sensor => self.sensor,
        }
    }

    /// Absolute index of the first record.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

/// Columnar table of normalized label records.
///
/// All three columns always have the same length. Missing optional labels
/// are stored as `""`; missing sensor labels are rejected at construction.
///
/// Serializes as a JSON array of camelCase records. Deserialization accepts
/// raw cells and runs the same normalization as [`LabelTable::try_from_raw`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "Vec<LabelRecord>", try_from = "Vec<RawLabelRecord>")]
pub struct LabelTable {
    sensor_label: Vec<String>,
    camera_label: Vec<String>,
    manual_label: Vec<String>,
}

impl LabelTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with room for `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sensor_label: Vec::with_capacity(capacity),
            camera_label: Vec::with_capacity(capacity),
            manual_label: Vec::with_capacity(capacity),
        }
    }

    /// Builds a table from three columns.
    ///
    /// # Errors
    /// - `ShapeMismatch` if the columns differ in length.
    /// - `MissingField` for the first `None` in the sensor column.
    pub fn from_columns(
        sensor_label: Vec<Option<String>>,
        camera_label: Vec<Option<String>>,
        manual_label: Vec<Option<String>>,
    ) -> LabelResult<Self> {
        let len = sensor_label.len();
        ensure_len(LabelSource::Camera.column_name(), len, camera_label.len())?;
        ensure_len(LabelSource::Manual.column_name(), len, manual_label.len())?;

        let sensor_label = sensor_label
            .into_iter()
            .enumerate()
            .map(|(row, v)| v.ok_or_else(|| missing_sensor(row)))
            .collect::<LabelResult<Vec<_>>>()?;

        Ok(Self {
            sensor_label,
            camera_label: camera_label.into_iter().map(Option::unwrap_or_default).collect(),
            manual_label: manual_label.into_iter().map(Option::unwrap_or_default).collect(),
        })
    }

    /// Normalizes raw records into a table.
    ///
    /// Missing camera and manual cells become `""`; non-string cells are
    /// coerced where possible.
    ///
    /// # Errors
    /// - `MissingField` if any sensor cell is missing.
    /// - `TypeMismatch` if a cell cannot be coerced to a string.
    pub fn try_from_raw(records: Vec<RawLabelRecord>) -> LabelResult<Self> {
        let mut table = Self::with_capacity(records.len());
        for (row, raw) in records.iter().enumerate() {
            let sensor = coerce_cell(raw, LabelSource::Sensor, row)?.ok_or_else(|| missing_sensor(row))?;
            let camera = coerce_cell(raw, LabelSource::Camera, row)?.unwrap_or_default();
            let manual = coerce_cell(raw, LabelSource::Manual, row)?.unwrap_or_default();
            table.sensor_label.push(sensor);
            table.camera_label.push(camera);
            table.manual_label.push(manual);
        }
        Ok(table)
    }

    /// Parses a JSON array of raw records.
    pub fn from_json(s: &str) -> LabelResult<Self> {
        let raw = serde_json::from_str::<Vec<RawLabelRecord>>(s)
            .map_err(|e| LabelError::internal(format!("deserialize label table: {e}")))?;
        Self::try_from_raw(raw)
    }

    /// Serializes the table as a pretty JSON array of records.
    pub fn to_json_pretty(&self) -> LabelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LabelError::internal(format!("serialize label table: {e}")))
    }

    /// Appends a normalized record.
    pub fn push(&mut self, record: LabelRecord) {
        self.sensor_label.push(record.sensor_label);
        self.camera_label.push(record.camera_label);
        self.manual_label.push(record.manual_label);
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sensor_label.len()
    }

    /// Returns true if the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sensor_label.is_empty()
    }

    /// Returns the column for `source`.
    #[must_use]
    pub fn column(&self, source: LabelSource) -> &[String] {
        match source {
            LabelSource::Manual => &self.manual_label,
            LabelSource::Camera => &self.camera_label,
            LabelSource::Sensor => &self.sensor_label,
        }
    }

    /// Returns a copy of the record at `row`.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<LabelRecord> {
        Some(LabelRecord {
            sensor_label: self.sensor_label.get(row)?.clone(),
            camera_label: self.camera_label.get(row)?.clone(),
            manual_label: self.manual_label.get(row)?.clone(),
        })
    }

    /// Iterates over records as `(sensor, camera, manual)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> + '_ {
        self.sensor_label
            .iter()
            .zip(&self.camera_label)
            .zip(&self.manual_label)
            .map(|((s, c), m)| (s.as_str(), c.as_str(), m.as_str()))
    }

    /// Copies the table out as records.
    #[must_use]
    pub fn to_records(&self) -> Vec<LabelRecord> {
        self.iter()
            .map(|(s, c, m)| LabelRecord {
                sensor_label: s.to_string(),
                camera_label: c.to_string(),
                manual_label: m.to_string(),
            })
            .collect()
    }

    /// Borrows every record as a column view.
    #[must_use]
    pub fn columns(&self) -> LabelColumns<'_> {
        LabelColumns {
            sensor: &self.sensor_label,
            camera: &self.camera_label,
            manual: &self.manual_label,
            offset: 0,
        }
    }

    /// Borrows a record range as a column view.
    ///
    /// Returns `None` if `range` is out of bounds.
    #[must_use]
    pub fn view(&self, range: Range<usize>) -> Option<LabelColumns<'_>> {
        Some(LabelColumns {
            sensor: self.sensor_label.get(range.clone())?,
            camera: self.camera_label.get(range.clone())?,
            manual: self.manual_label.get(range.clone())?,
            offset: range.start,
        })
    }

    /// Stable blake3 fingerprint of the table contents.
    ///
    /// Every cell is length-prefixed so `["ab", ""]` and `["a", "b"]` hash
    /// differently.
    #[must_use]
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.len() as u64).to_le_bytes());
        for source in LabelSource::ALL {
            hasher.update(source.column_name().as_bytes());
            for cell in self.column(source) {
                hasher.update(&(cell.len() as u64).to_le_bytes());
                hasher.update(cell.as_bytes());
            }
        }
        hasher.finalize()
    }

    /// Mutable access to the sub-label columns as `(sensor, camera)`.
    ///
    /// The manual column is never handed out mutably.
    pub(crate) fn sub_label_columns_mut(&mut self) -> (&mut [String], &mut [String]) {
        (&mut self.sensor_label, &mut self.camera_label)
    }
}

impl From<LabelTable> for Vec<LabelRecord> {
    fn from(table: LabelTable) -> Self {
        table
            .sensor_label
            .into_iter()
            .zip(table.camera_label)
            .zip(table.manual_label)
            .map(|((sensor_label, camera_label), manual_label)| LabelRecord {
                sensor_label,
                camera_label,
                manual_label,
            })
            .collect()
    }
}

impl TryFrom<Vec<RawLabelRecord>> for LabelTable {
    type Error = LabelError;

    fn try_from(records: Vec<RawLabelRecord>) -> Result<Self, Self::Error> {
        Self::try_from_raw(records)
    }
}

impl FromIterator<LabelRecord> for LabelTable {
    fn from_iter<I: IntoIterator<Item = LabelRecord>>(iter: I) -> Self {
        let mut table = Self::new();
        for record in iter {
            table.push(record);
        }
        table
    }
}

fn coerce_cell(raw: &RawLabelRecord, source: LabelSource, row: usize) -> LabelResult<Option<String>> {
    raw.cell(source).coerce(source, row).map_err(|e| {
        tracing::warn!(row, column = source.column_name(), "rejecting uncoercible label cell");
        LabelError::from(e)
    })
}

fn missing_sensor(row: usize) -> LabelError {
    tracing::warn!(row, "rejecting record without a sensor label");
    ValidationError::MissingField {
        field: LabelSource::Sensor.column_name().to_string(),
        row,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_normalizes_optional_labels() {
        let table = LabelTable::from_columns(
            vec![Some("dog".to_string()), Some("cat".to_string())],
            vec![None, Some("cat".to_string())],
            vec![Some("bird".to_string()), None],
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.column(LabelSource::Camera), ["", "cat"]);
        assert_eq!(table.column(LabelSource::Manual), ["bird", ""]);
    }

    #[test]
    fn test_from_columns_rejects_missing_sensor() {
        let err = LabelTable::from_columns(
            vec![Some("dog".to_string()), None],
            vec![None, None],
            vec![None, None],
        )
        .unwrap_err();

        match err {
            LabelError::Validation(ValidationError::MissingField { field, row }) => {
                assert_eq!(field, "sensorLabel");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_columns_rejects_ragged_columns() {
        let err = LabelTable::from_columns(vec![Some("dog".to_string())], vec![], vec![None]).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_try_from_raw_coerces_cells() {
        let table = LabelTable::try_from_raw(vec![
            RawLabelRecord::new(3_i64, LabelCell::Null, f64::NAN),
            RawLabelRecord::new("dog", true, "bird"),
        ])
        .unwrap();

        assert_eq!(table.get(0).unwrap(), LabelRecord::new("3"));
        assert_eq!(
            table.get(1).unwrap(),
            LabelRecord::new("dog").with_camera("true").with_manual("bird")
        );
    }

    #[test]
    fn test_try_from_raw_rejects_nan_sensor() {
        let err = LabelTable::try_from_raw(vec![RawLabelRecord::new(f64::NAN, "cat", LabelCell::Null)]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_json_missing_keys_and_nulls() {
        let json = r#"[
            {"sensorLabel": "dog", "cameraLabel": null},
            {"sensorLabel": "dog", "cameraLabel": "cat", "manualLabel": "bird"}
        ]"#;
        let table = LabelTable::from_json(json).unwrap();
        assert_eq!(table.get(0).unwrap(), LabelRecord::new("dog"));
        assert_eq!(table.column(LabelSource::Manual), ["", "bird"]);
    }

    #[test]
    fn test_json_rejects_missing_sensor_key() {
        let err = LabelTable::from_json(r#"[{"cameraLabel": "cat"}]"#).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_serde_roundtrip_as_records() {
        let table: LabelTable = vec![LabelRecord::new("dog").with_camera("cat")].into_iter().collect();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"[{"sensorLabel":"dog","cameraLabel":"cat","manualLabel":""}]"#);

        let decoded: LabelTable = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn test_view_carries_offset() {
        let table: LabelTable = ["a", "b", "c", "d"].into_iter().map(LabelRecord::new).collect();
        let view = table.view(1..3).unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view.offset(), 1);
        assert_eq!(view.column(LabelSource::Sensor), ["b", "c"]);
    }

    #[test]
    fn test_view_out_of_range_is_none() {
        let table: LabelTable = ["a", "b"].into_iter().map(LabelRecord::new).collect();
        assert!(table.view(1..3).is_none());
        assert!(table.view(5..5).is_none());
        assert!(table.view(2..2).is_some_and(|v| v.is_empty()));
    }

    #[test]
    fn test_fingerprint_is_content_sensitive() {
        let a: LabelTable = vec![LabelRecord::new("ab")].into_iter().collect();
        let b: LabelTable = vec![LabelRecord::new("a").with_camera("b")].into_iter().collect();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }
}
