//! Record-range sharding for large tables.
//!
//! Resolution and evaluation never look across records, so a table can be
//! split into contiguous ranges that are processed on separate threads and
//! stitched back together in range order. Removal write-back stays on the
//! calling thread.

use std::ops::Range;
use std::thread;

use crossbeam_channel::bounded;
use serde::{Deserialize, Serialize};

use crate::error::{ExecutionError, LabelError, LabelResult, ValidationError};
use crate::inference::{resolve_columns, LabelPriority, ResolvedLabels};
use crate::removal::{evaluate_removal_conditions, RemovalDecisions};
use crate::table::{LabelColumns, LabelTable};

/// Sharding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShardConfig {
    /// Maximum number of worker threads. `1` runs everything inline.
    pub workers: usize,
    /// Tables are only split when every shard gets at least this many records.
    pub min_records_per_shard: usize,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            min_records_per_shard: 16 * 1024,
        }
    }
}

impl ShardConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.workers == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "shards.workers must be at least 1".to_string(),
            });
        }
        if self.min_records_per_shard == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "shards.min_records_per_shard must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Splits `len` records into contiguous, disjoint ranges covering `0..len`.
    ///
    /// Always returns at least one range; an empty table yields `[0..0]`.
    #[must_use]
    pub fn plan(&self, len: usize) -> Vec<Range<usize>> {
        let by_size = len / self.min_records_per_shard.max(1);
        let shards = self.workers.min(by_size).max(1);
        let chunk = len.div_ceil(shards).max(1);

        let mut ranges = Vec::with_capacity(shards);
        let mut start = 0;
        while start < len {
            let end = (start + chunk).min(len);
            ranges.push(start..end);
            start = end;
        }
        if ranges.is_empty() {
            ranges.push(0..0);
        }
        ranges
    }
}

type ShardOutput = (ResolvedLabels, RemovalDecisions);

/// Resolve labels and evaluate removal conditions, sharded by record range.
///
/// Results are identical to running [`crate::resolve_with_priority`] and
/// [`crate::evaluate_removal_conditions`] over the whole table. When several
/// shards fail, the error of the lowest range is returned, so row numbers
/// are stable across worker counts.
pub fn resolve_and_evaluate_sharded(
    table: &LabelTable,
    priority: &LabelPriority,
    config: &ShardConfig,
) -> LabelResult<(ResolvedLabels, RemovalDecisions)> {
    config.validate()?;
    let ranges = config.plan(table.len());
    if ranges.len() == 1 {
        return run_shard(&table.columns(), priority);
    }

    let shard_count = ranges.len();
    let (tx, rx) = bounded::<(usize, LabelResult<ShardOutput>)>(shard_count);

    let mut slots: Vec<Option<LabelResult<ShardOutput>>> = (0..shard_count).map(|_| None).collect();
    let mut failure: Option<LabelError> = None;

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(shard_count);
        for (idx, range) in ranges.into_iter().enumerate() {
            let Some(columns) = table.view(range.clone()) else {
                failure = Some(LabelError::internal(format!(
                    "shard range {range:?} outside table of {} records",
                    table.len()
                )));
                break;
            };
            let tx = tx.clone();
            let spawned = thread::Builder::new()
                .name(worker_name(idx))
                .spawn_scoped(scope, move || {
                    tracing::trace!(
                        shard = idx,
                        offset = columns.offset(),
                        records = columns.len(),
                        "processing shard"
                    );
                    if tx.send((idx, run_shard(&columns, priority))).is_err() {
                        tracing::trace!(shard = idx, "result receiver closed before shard finished");
                    }
                });
            match spawned {
                Ok(handle) => handles.push((idx, handle)),
                Err(e) => {
                    failure = Some(LabelError::internal(format!("spawn {}: {e}", worker_name(idx))));
                    break;
                }
            }
        }
        // Close our sender so the receive loop ends once every worker is done.
        drop(tx);

        for (idx, result) in rx.iter() {
            slots[idx] = Some(result);
        }

        for (idx, handle) in handles {
            if handle.join().is_err() && failure.is_none() {
                failure = Some(ExecutionError::WorkerDisconnected { worker: worker_name(idx) }.into());
            }
        }
    });

    if let Some(err) = failure {
        return Err(err);
    }

    let mut merged: ShardOutput = Default::default();
    for (idx, slot) in slots.into_iter().enumerate() {
        let (resolved, decisions) =
            slot.ok_or_else(|| LabelError::from(ExecutionError::WorkerDisconnected { worker: worker_name(idx) }))??;
        merged.0.append(resolved);
        merged.1.append(decisions);
    }
    Ok(merged)
}

fn run_shard(columns: &LabelColumns<'_>, priority: &LabelPriority) -> LabelResult<ShardOutput> {
    let resolved = resolve_columns(columns, priority)?;
    let decisions = evaluate_removal_conditions(&resolved.matrix)?;
    Ok((resolved, decisions))
}

fn worker_name(idx: usize) -> String {
    format!("kyrolabel-shard-{idx}")
}
