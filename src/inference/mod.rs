//! Label resolution.
//!
//! Picks one training label per record by source trust and derives the
//! attribute matrix the removal stage works from. Everything here is pure:
//! the caller's table is only read.

mod policies;
mod resolver;

pub use policies::LabelPriority;
pub use resolver::{resolve, resolve_with_priority, AttributeMatrix, AttributeRow, ResolvedLabels};

pub(crate) use resolver::resolve_columns;
