use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, LabelResult};
use crate::inference::AttributeMatrix;

/// What the remover does to one record.
///
/// Variants are ordered by aggressiveness, so the action for a record with
/// several flags set is the maximum of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalAction {
    /// Leave the record alone.
    #[default]
    Keep,
    /// Blank the sensor label.
    RemoveSensor,
    /// Blank the camera label.
    RemoveCamera,
    /// Blank both the camera and the sensor label.
    RemoveBoth,
}

impl RemovalAction {
    /// Returns true if this action blanks the sensor label.
    #[must_use]
    pub const fn clears_sensor(&self) -> bool {
        matches!(self, Self::RemoveSensor | Self::RemoveBoth)
    }

    /// Returns true if this action blanks the camera label.
    #[must_use]
    pub const fn clears_camera(&self) -> bool {
        matches!(self, Self::RemoveCamera | Self::RemoveBoth)
    }
}

/// One row of the removal decision table.
#[derive(Clone, Copy)]
pub struct RemovalRule {
    /// Stable rule name for logging.
    pub name: &'static str,
    /// Decision vector this rule feeds.
    pub action: RemovalAction,
    condition: fn(&AttributeMatrix) -> Vec<bool>,
}

impl std::fmt::Debug for RemovalRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemovalRule")
            .field("name", &self.name)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

impl RemovalRule {
    /// Evaluates the rule over every record in one columnar pass.
    #[must_use]
    pub fn evaluate(&self, matrix: &AttributeMatrix) -> Vec<bool> {
        (self.condition)(matrix)
    }
}

/// The removal decision table, evaluated top to bottom.
///
/// Each rule's column is OR-ed into the vector of its action. All rules
/// always run; precedence between vectors is settled by
/// [`RemovalDecisions::action`] and by the remover applying `RemoveBoth`
/// first.
pub const REMOVAL_RULES: [RemovalRule; 4] = [
    RemovalRule {
        name: "manual_contradicts_sensor",
        action: RemovalAction::RemoveSensor,
        condition: manual_contradicts_sensor,
    },
    RemovalRule {
        name: "camera_contradicts_sensor_without_manual",
        action: RemovalAction::RemoveSensor,
        condition: camera_contradicts_sensor_without_manual,
    },
    RemovalRule {
        name: "manual_contradicts_camera",
        action: RemovalAction::RemoveCamera,
        condition: manual_contradicts_camera,
    },
    RemovalRule {
        name: "manual_contradicts_both",
        action: RemovalAction::RemoveBoth,
        condition: manual_contradicts_both,
    },
];

// manualIndices & ~manualSensorMatch
fn manual_contradicts_sensor(m: &AttributeMatrix) -> Vec<bool> {
    m.manual_indices()
        .iter()
        .zip(m.manual_sensor_match())
        .map(|(&manual, &agrees)| manual && !agrees)
        .collect()
}

// ~manualIndices & cameraIndices & ~cameraSensorMatch
fn camera_contradicts_sensor_without_manual(m: &AttributeMatrix) -> Vec<bool> {
    m.manual_indices()
        .iter()
        .zip(m.camera_indices())
        .zip(m.camera_sensor_match())
        .map(|((&manual, &camera), &agrees)| !manual && camera && !agrees)
        .collect()
}

// manualIndices & ~manualCameraMatch
fn manual_contradicts_camera(m: &AttributeMatrix) -> Vec<bool> {
    m.manual_indices()
        .iter()
        .zip(m.manual_camera_match())
        .map(|(&manual, &agrees)| manual && !agrees)
        .collect()
}

// manualIndices & ~manualSensorMatch & ~manualCameraMatch
fn manual_contradicts_both(m: &AttributeMatrix) -> Vec<bool> {
    m.manual_indices()
        .iter()
        .zip(m.manual_sensor_match())
        .zip(m.manual_camera_match())
        .map(|((&manual, &sensor_agrees), &camera_agrees)| manual && !sensor_agrees && !camera_agrees)
        .collect()
}

/// Three aligned decision vectors produced by the evaluator.
///
/// Any combination of flags is accepted. When several are set on the same
/// record the most aggressive one wins, see [`RemovalDecisions::action`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalDecisions {
    remove_sensor: Vec<bool>,
    remove_camera: Vec<bool>,
    remove_both: Vec<bool>,
}

impl RemovalDecisions {
    /// Builds decisions from explicit vectors.
    ///
    /// # Errors
    /// `ShapeMismatch` if the vectors differ in length.
    pub fn new(remove_sensor: Vec<bool>, remove_camera: Vec<bool>, remove_both: Vec<bool>) -> LabelResult<Self> {
        let decisions = Self {
            remove_sensor,
            remove_camera,
            remove_both,
        };
        decisions.validate()?;
        Ok(decisions)
    }

    /// Decisions that keep `len` records untouched.
    #[must_use]
    pub fn keep_all(len: usize) -> Self {
        Self {
            remove_sensor: vec![false; len],
            remove_camera: vec![false; len],
            remove_both: vec![false; len],
        }
    }

    /// Validates that all three vectors have the same length.
    pub fn validate(&self) -> LabelResult<()> {
        let len = self.remove_sensor.len();
        ensure_len("removeCamera", len, self.remove_camera.len())?;
        ensure_len("removeBoth", len, self.remove_both.len())?;
        Ok(())
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.remove_sensor.len()
    }

    /// Returns true if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remove_sensor.is_empty()
    }

    /// Sensor-only removal flags.
    #[must_use]
    pub fn remove_sensor(&self) -> &[bool] {
        &self.remove_sensor
    }

    /// Camera-only removal flags.
    #[must_use]
    pub fn remove_camera(&self) -> &[bool] {
        &self.remove_camera
    }

    /// Remove-both flags.
    #[must_use]
    pub fn remove_both(&self) -> &[bool] {
        &self.remove_both
    }

    /// Effective action for one record: RemoveBoth > RemoveCamera >
    /// RemoveSensor > Keep.
    #[must_use]
    pub fn action(&self, index: usize) -> Option<RemovalAction> {
        let flags = [
            (*self.remove_sensor.get(index)?, RemovalAction::RemoveSensor),
            (*self.remove_camera.get(index)?, RemovalAction::RemoveCamera),
            (*self.remove_both.get(index)?, RemovalAction::RemoveBoth),
        ];
        Some(
            flags
                .into_iter()
                .filter_map(|(set, action)| set.then_some(action))
                .max()
                .unwrap_or_default(),
        )
    }

    /// Effective action for every record, in order.
    pub fn actions(&self) -> impl Iterator<Item = RemovalAction> + '_ {
        (0..self.len()).map(|i| self.action(i).unwrap_or_default())
    }

    fn flags_mut(&mut self, action: RemovalAction) -> Option<&mut Vec<bool>> {
        match action {
            RemovalAction::Keep => None,
            RemovalAction::RemoveSensor => Some(&mut self.remove_sensor),
            RemovalAction::RemoveCamera => Some(&mut self.remove_camera),
            RemovalAction::RemoveBoth => Some(&mut self.remove_both),
        }
    }

    pub(crate) fn append(&mut self, mut other: Self) {
        self.remove_sensor.append(&mut other.remove_sensor);
        self.remove_camera.append(&mut other.remove_camera);
        self.remove_both.append(&mut other.remove_both);
    }
}

/// Reduce an attribute matrix to removal decision vectors.
///
/// Runs every rule of [`REMOVAL_RULES`] as one pass over the whole matrix.
/// All applicable vectors are emitted, so a record that contradicts both
/// sub-labels carries `removeSensor`, `removeCamera` and `removeBoth`;
/// the remover resolves that overlap in favour of `removeBoth`.
///
/// # Errors
/// `ShapeMismatch` if the matrix columns differ in length.
pub fn evaluate_removal_conditions(matrix: &AttributeMatrix) -> LabelResult<RemovalDecisions> {
    matrix.validate()?;

    let mut decisions = RemovalDecisions::keep_all(matrix.len());
    for rule in &REMOVAL_RULES {
        let column = rule.evaluate(matrix);
        let Some(target) = decisions.flags_mut(rule.action) else {
            continue;
        };
        for (flag, hit) in target.iter_mut().zip(column) {
            *flag |= hit;
        }
    }

    tracing::debug!(
        records = decisions.len(),
        remove_sensor = decisions.remove_sensor.iter().filter(|v| **v).count(),
        remove_camera = decisions.remove_camera.iter().filter(|v| **v).count(),
        remove_both = decisions.remove_both.iter().filter(|v| **v).count(),
        "evaluated removal conditions"
    );
    Ok(decisions)
}
