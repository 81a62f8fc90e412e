//! Label source types.
//!
//! Every label in a training table comes from one of three origins. Knowing
//! which one is what lets the resolver rank them by trust.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Origin of a training label.
///
/// # Examples
///
/// ```
/// use kyrolabel::LabelSource;
///
/// assert_eq!(LabelSource::Manual.column_name(), "manualLabel");
/// assert!(LabelSource::Sensor.is_required());
/// assert!(!LabelSource::Camera.is_required());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    /// Label assigned by a human reviewer.
    Manual,

    /// Label produced by the camera classifier.
    Camera,

    /// Label reported by the sensor feed. Always present.
    Sensor,
}

impl LabelSource {
    /// All sources, highest trust first.
    pub const ALL: [Self; 3] = [Self::Manual, Self::Camera, Self::Sensor];

    /// Column name used by tabular records.
    #[must_use]
    pub const fn column_name(&self) -> &'static str {
        match self {
            Self::Manual => "manualLabel",
            Self::Camera => "cameraLabel",
            Self::Sensor => "sensorLabel",
        }
    }

    /// Returns true if every record must carry a value for this source.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self, Self::Sensor)
    }

    /// Returns a short stable identifier suitable for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Camera => "camera",
            Self::Sensor => "sensor",
        }
    }
}

impl fmt::Display for LabelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
