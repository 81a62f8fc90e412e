//! End-to-end label processing.
//!
//! Runs the resolver, the removal-condition evaluator and the remover in
//! that order over a caller-owned table, and returns everything the
//! training step needs along with an audit report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LabelError, LabelResult, ValidationError};
use crate::inference::{AttributeMatrix, LabelPriority};
use crate::removal::{apply_removals, RemovalDecisions, RemovalSummary};
use crate::shard::{resolve_and_evaluate_sharded, ShardConfig};
use crate::table::LabelTable;

/// Pipeline configuration.
///
/// Every field has a default, so `{}` is a valid configuration. The
/// pipeline always resolves with the default manual > camera > sensor
/// priority because the removal rules are defined by that order; use
/// [`crate::resolve_with_priority`] directly for other orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Record-range sharding for resolve + evaluate.
    pub shards: ShardConfig,
}

impl PipelineConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.shards.validate()
    }

    /// Parse and validate a configuration from JSON.
    pub fn from_json(s: &str) -> LabelResult<Self> {
        let config = serde_json::from_str::<Self>(s)
            .map_err(|e| LabelError::internal(format!("deserialize pipeline config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON.
    pub fn to_json_pretty(&self) -> LabelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LabelError::internal(format!("serialize pipeline config: {e}")))
    }
}

/// Audit record for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// When the run finished.
    pub processed_at: DateTime<Utc>,
    /// Records processed.
    pub records: usize,
    /// Shards resolve + evaluate ran on.
    pub shards: usize,
    /// blake3 hex digest of the table before removal.
    pub input_fingerprint: String,
    /// What the remover did.
    pub removals: RemovalSummary,
}

/// Output of a pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessedLabels {
    /// Training label per record.
    pub labels: Vec<String>,
    /// Attribute matrix the decisions were derived from.
    pub matrix: AttributeMatrix,
    /// Removal decisions applied to the table.
    pub decisions: RemovalDecisions,
    /// Audit report.
    pub report: ResolutionReport,
}

/// Resolve → evaluate → remove, under one configuration.
#[derive(Debug, Clone, Default)]
pub struct LabelPipeline {
    config: PipelineConfig,
}

impl LabelPipeline {
    /// Creates a pipeline after validating `config`.
    pub fn new(config: PipelineConfig) -> LabelResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process `table` in place.
    ///
    /// On success the table has its contradicting sub-labels blanked. On
    /// error the table is left untouched: every failure happens before the
    /// remover runs.
    pub fn run(&self, table: &mut LabelTable) -> LabelResult<ProcessedLabels> {
        let input_fingerprint = table.fingerprint().to_hex().to_string();
        let shards = self.config.shards.plan(table.len()).len();

        let (resolved, decisions) = resolve_and_evaluate_sharded(table, &LabelPriority::default(), &self.config.shards)?;
        let removals = apply_removals(table, &decisions)?;

        let report = ResolutionReport {
            run_id: Uuid::new_v4(),
            processed_at: Utc::now(),
            records: table.len(),
            shards,
            input_fingerprint,
            removals,
        };

        tracing::info!(
            run_id = %report.run_id,
            records = report.records,
            shards = report.shards,
            records_touched = removals.records_touched(),
            cells_cleared = removals.cells_cleared,
            "processed training labels"
        );

        let (labels, matrix) = resolved.into_parts();
        Ok(ProcessedLabels {
            labels,
            matrix,
            decisions,
            report,
        })
    }
}

/// Process `table` in place with the default configuration.
pub fn process_labels(table: &mut LabelTable) -> LabelResult<ProcessedLabels> {
    LabelPipeline::default().run(table)
}
