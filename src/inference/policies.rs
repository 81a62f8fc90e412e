use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::source::LabelSource;

/// A non-empty, order-preserving, deduplicated list of label sources.
///
/// Earlier entries are trusted more. The last entry is the base layer the
/// resolver starts from.
///
/// - Empty lists are rejected.
/// - Duplicate sources are ignored (first occurrence wins).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LabelPriority(Vec<LabelSource>);

impl LabelPriority {
    /// Construct a validated priority list.
    ///
    /// # Validation
    /// - Returns an error if `priority` is empty.
    /// - Deduplicates entries while preserving order.
    pub fn new(priority: Vec<LabelSource>) -> Result<Self, ValidationError> {
        if priority.is_empty() {
            return Err(ValidationError::InvalidPriority {
                reason: "priority list cannot be empty".to_string(),
            });
        }

        let mut seen: HashSet<LabelSource> = HashSet::with_capacity(priority.len());
        let mut deduped: Vec<LabelSource> = Vec::with_capacity(priority.len());
        for source in priority {
            if seen.insert(source) {
                deduped.push(source);
            }
        }

        Ok(Self(deduped))
    }

    /// Returns the list as a slice, highest trust first.
    #[must_use]
    pub fn as_slice(&self) -> &[LabelSource] {
        &self.0
    }

    /// The least trusted source; its column seeds every resolved label.
    #[must_use]
    pub fn base(&self) -> LabelSource {
        // Non-empty by construction.
        self.0[self.0.len() - 1]
    }

    /// Sources that overwrite the base layer, in the order they are applied
    /// (least trusted first, so the most trusted source lands last).
    pub fn overlays(&self) -> impl Iterator<Item = LabelSource> + '_ {
        self.0[..self.0.len() - 1].iter().rev().copied()
    }

    /// Position of `source` in the list (0 = most trusted).
    #[must_use]
    pub fn rank(&self, source: LabelSource) -> Option<usize> {
        self.0.iter().position(|s| *s == source)
    }

    /// Returns a short stable description suitable for logging.
    #[must_use]
    pub fn describe(&self) -> String {
        self.0.iter().map(LabelSource::name).collect::<Vec<_>>().join(">")
    }
}

impl Default for LabelPriority {
    /// manual > camera > sensor.
    fn default() -> Self {
        Self(LabelSource::ALL.to_vec())
    }
}

impl<'de> Deserialize<'de> for LabelPriority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Vec::<LabelSource>::deserialize(deserializer)?;
        LabelPriority::new(raw).map_err(serde::de::Error::custom)
    }
}
