//! Markdown structure helpers for docsplice.
//!
//! Locates heading-bounded sections in a source guide, rewrites quoted notes
//! into callout directives, and splits destination documents into their
//! frontmatter header, import preamble and body.

mod callouts;
mod frontmatter;
mod lines;
mod locate;

use tracing::{debug, instrument};

pub use callouts::Severity;
pub use frontmatter::{DocumentParts, build_header, split_document};
pub use lines::{Line, heading_level, join_blocks, scan_lines, trim_blank_lines};
pub use locate::locate;

/// Normalize an extracted section for the target site.
///
/// Runs the rewrite passes in order. Headings, prose and fenced code pass
/// through unchanged, and normalizing already-normalized content is a no-op.
#[instrument(skip_all, fields(len = raw.len()))]
pub fn normalize(raw: &str) -> String {
    let result = callouts::rewrite_callouts(raw);
    let result = trim_blank_lines(&result).to_string();

    debug!(final_len = result.len(), "section normalized");
    result
}
