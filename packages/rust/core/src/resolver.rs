//! Destination resolver: read the document a section will be merged into.
//!
//! Header and preamble are split out by the merge strategies themselves
//! (`split_document`), so the resolver only distinguishes "absent" from
//! "present" and propagates storage faults.

use docsplice_shared::Result;
use docsplice_storage::DocumentStore;
use tracing::debug;

/// A destination document that already exists in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingDocument {
    /// Full document text as read.
    pub content: String,
}

/// Read the destination at `path`.
///
/// `Ok(None)` when no document exists. Storage faults propagate.
pub fn read_header_and_preamble(
    store: &dyn DocumentStore,
    path: &str,
) -> Result<Option<ExistingDocument>> {
    let doc = store
        .read(path)?
        .map(|content| ExistingDocument { content });
    debug!(path, exists = doc.is_some(), "resolved destination");
    Ok(doc)
}
