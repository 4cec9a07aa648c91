//! Merge engine for docsplice.
//!
//! Ties the markdown helpers and the document store together: each section
//! definition is located in the source guide, normalized, merged into its
//! destination with the configured strategy and written back, producing a
//! [`RunReport`](report::RunReport).

pub mod merge;
pub mod pipeline;
pub mod report;
pub mod resolver;

pub use merge::{DegradedReason, MergeOutcome};
pub use pipeline::{
    BoundaryCheck, ProgressReporter, RunOptions, SilentProgress, check_boundaries, extract, run,
};
pub use report::{RunReport, SectionOutcome, SectionStatus};
pub use resolver::{ExistingDocument, read_header_and_preamble};
