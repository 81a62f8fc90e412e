//! # kyrolabel - Trust-ordered training label resolution
//!
//! Training tables often carry several labels per record from sources of
//! different trust. kyrolabel picks one training label per record and
//! strips the lower-trust sub-labels that contradict a more trusted one, so
//! stale labels cannot poison the next training run.
//!
//! ## Core Concepts
//!
//! - **Label source**: manual, camera or sensor; manual is trusted most
//! - **Resolved label**: the most trusted non-empty label of a record
//! - **Attribute matrix**: per-record presence and agreement flags
//! - **Removal decisions**: which sub-labels to blank, derived from the matrix
//!
//! Control flow is linear: [`resolve`] → [`evaluate_removal_conditions`] →
//! [`apply_removals`]. [`LabelPipeline`] runs all three.
//!
//! ## Usage
//!
//! ```
//! use kyrolabel::{apply_removals, evaluate_removal_conditions, resolve, LabelRecord, LabelTable};
//!
//! let mut table: LabelTable = vec![
//!     LabelRecord::new("dog").with_camera("cat"),
//!     LabelRecord::new("dog").with_camera("cat").with_manual("bird"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let resolved = resolve(&table)?;
//! assert_eq!(resolved.labels, vec!["cat", "bird"]);
//!
//! let decisions = evaluate_removal_conditions(&resolved.matrix)?;
//! apply_removals(&mut table, &decisions)?;
//!
//! assert_eq!(table.get(0).unwrap(), LabelRecord::new("").with_camera("cat"));
//! assert_eq!(table.get(1).unwrap(), LabelRecord::new("").with_manual("bird"));
//! # Ok::<(), kyrolabel::LabelError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod source;
pub mod table;
pub mod value;

pub mod inference;
pub mod pipeline;
pub mod removal;
pub mod shard;

// Re-export primary types at crate root for convenience
pub use error::{ExecutionError, LabelError, LabelResult, ValidationError};
pub use source::LabelSource;
pub use table::{LabelColumns, LabelRecord, LabelTable, RawLabelRecord};
pub use value::LabelCell;

pub use inference::{resolve, resolve_with_priority, AttributeMatrix, AttributeRow, LabelPriority, ResolvedLabels};
pub use pipeline::{process_labels, LabelPipeline, PipelineConfig, ProcessedLabels, ResolutionReport};
pub use removal::{
    apply_removals, evaluate_removal_conditions, RemovalAction, RemovalDecisions, RemovalRule, RemovalSummary,
    REMOVAL_RULES,
};
pub use shard::{resolve_and_evaluate_sharded, ShardConfig};
