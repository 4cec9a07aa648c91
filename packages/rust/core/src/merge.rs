//! Merge strategies.
//!
//! Each strategy is a pure function of the existing destination text (if
//! any), the normalized section and the definition's metadata. Applying a
//! strategy to its own output with the same section yields the same bytes.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::warn;

use docsplice_markdown::{Line, build_header, heading_level, join_blocks, scan_lines, split_document};
use docsplice_shared::{PageMetadata, Strategy};

/// Why a section could not be placed precisely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DegradedReason {
    /// The destination did not exist; a new document was generated.
    MissingDestination,
    /// The subsection marker was not found; the section was appended.
    MarkerNotFound,
    /// The marker was not found, but the section text is already present.
    AlreadyPresent,
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingDestination => "destination does not exist",
            Self::MarkerNotFound => "subsection marker not found",
            Self::AlreadyPresent => "marker not found but section text already present",
        };
        f.write_str(s)
    }
}

/// Result of applying a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Full new document, section placed where it belongs.
    Placed(String),
    /// The destination must be left as it is.
    Untouched,
    /// Expected structure was missing. `content` is the fallback document,
    /// or `None` when there is nothing safe to write.
    Degraded {
        content: Option<String>,
        reason: DegradedReason,
    },
}

/// Dispatch to the strategy selected by a section definition.
pub fn apply(
    strategy: &Strategy,
    existing: Option<&str>,
    section: &str,
    metadata: &PageMetadata,
) -> MergeOutcome {
    match strategy {
        Strategy::Replace => MergeOutcome::Placed(replace(existing, section, metadata)),
        Strategy::CreateIfAbsent => create_if_absent(existing, section, metadata)
            .map_or(MergeOutcome::Untouched, MergeOutcome::Placed),
        Strategy::MergeIntoSubsection { marker } => {
            merge_into_subsection(existing, section, metadata, marker)
        }
    }
}

// ---------------------------------------------------------------------------
// Replace / CreateIfAbsent
// ---------------------------------------------------------------------------

/// Replace the whole body, keeping an existing header and preamble.
///
/// Without an existing header one is generated from `metadata`.
pub fn replace(existing: Option<&str>, section: &str, metadata: &PageMetadata) -> String {
    let parts = existing.map(split_document);

    let header: Option<Cow<'_, str>> = parts
        .and_then(|p| p.header)
        .map(Cow::Borrowed)
        .or_else(|| build_header(metadata).map(Cow::Owned));
    let preamble = parts.and_then(|p| p.preamble);

    join_blocks([header.as_deref(), preamble, Some(section)].into_iter().flatten())
}

/// Create the document when absent. `None` means leave the existing one alone.
pub fn create_if_absent(
    existing: Option<&str>,
    section: &str,
    metadata: &PageMetadata,
) -> Option<String> {
    match existing {
        Some(_) => None,
        None => Some(replace(None, section, metadata)),
    }
}

// ---------------------------------------------------------------------------
// MergeIntoSubsection
// ---------------------------------------------------------------------------

/// Replace only the region opened by `marker`.
///
/// The region runs from the marker heading to the next heading of the same
/// or higher rank. Text before and after it is kept byte-for-byte, and any
/// further regions opened by the same marker are dropped so the output holds
/// the marker heading exactly once.
pub fn merge_into_subsection(
    existing: Option<&str>,
    section: &str,
    metadata: &PageMetadata,
    marker: &str,
) -> MergeOutcome {
    let marker = marker.trim();
    let section = with_marker_first(section, marker);

    let Some(text) = existing else {
        return MergeOutcome::Degraded {
            content: Some(replace(None, &section, metadata)),
            reason: DegradedReason::MissingDestination,
        };
    };

    let body_start = split_document(text).body_start;
    let level = heading_level(marker).unwrap_or(6);

    let Some((marker_start, marker_end)) =
        find_marker(text, body_start, marker).map(|line| (line.start, line.end()))
    else {
        if already_present(text, &section) {
            return MergeOutcome::Degraded {
                content: None,
                reason: DegradedReason::AlreadyPresent,
            };
        }
        return MergeOutcome::Degraded {
            content: Some(join_blocks([text, section.as_ref()])),
            reason: DegradedReason::MarkerNotFound,
        };
    };

    // Headings the section itself brings at the marker's rank stay inside
    // the region, whatever text surrounds them in the old copy.
    let owned = owned_headings(&section, marker, level);
    let region_end = next_heading(text, marker_end, level, &owned).unwrap_or(text.len());

    let before = &text[..marker_start];
    let tail = strip_marker_regions(&text[region_end..], marker, level, &owned);

    MergeOutcome::Placed(join_blocks([before, section.as_ref(), tail.as_ref()]))
}

/// Make sure the section opens with the marker heading.
fn with_marker_first<'a>(section: &'a str, marker: &str) -> Cow<'a, str> {
    let first = section.lines().next().unwrap_or("").trim();
    if first == marker {
        Cow::Borrowed(section)
    } else {
        Cow::Owned(format!("{marker}\n\n{section}"))
    }
}

/// First marker line at or after `from`, outside code fences.
fn find_marker<'a>(text: &'a str, from: usize, marker: &str) -> Option<Line<'a>> {
    scan_lines(text).find(|line| line.start >= from && !line.in_code && line.text.trim() == marker)
}

/// Heading lines of rank `<= level` inside the section, marker excluded.
fn owned_headings<'a>(section: &'a str, marker: &str, level: usize) -> HashSet<&'a str> {
    scan_lines(section)
        .filter(|line| !line.in_code && heading_level(line.text).is_some_and(|l| l <= level))
        .map(|line| line.text.trim())
        .filter(|heading| *heading != marker)
        .collect()
}

/// Start of the first heading of rank `<= level` at or after `from` that is
/// not one of the `owned` headings.
fn next_heading(text: &str, from: usize, level: usize, owned: &HashSet<&str>) -> Option<usize> {
    scan_lines(text)
        .find(|line| {
            line.start >= from
                && !line.in_code
                && heading_level(line.text).is_some_and(|l| l <= level)
                && !owned.contains(line.text.trim())
        })
        .map(|line| line.start)
}

/// Remove every region in `tail` that is opened by `marker`.
fn strip_marker_regions<'a>(
    tail: &'a str,
    marker: &str,
    level: usize,
    owned: &HashSet<&str>,
) -> Cow<'a, str> {
    let mut tail = Cow::Borrowed(tail);

    while let Some((start, marker_end)) =
        find_marker(&tail, 0, marker).map(|line| (line.start, line.end()))
    {
        let end = next_heading(&tail, marker_end, level, owned).unwrap_or(tail.len());
        warn!(marker, removed = end - start, "dropping duplicate subsection region");
        let mut rest = String::with_capacity(tail.len() - (end - start));
        rest.push_str(&tail[..start]);
        rest.push_str(&tail[end..]);
        tail = Cow::Owned(rest);
    }

    tail
}

/// The section's content below its heading already appears in `text` as a
/// run of whole lines (blank lines and indentation ignored).
fn already_present(text: &str, section: &str) -> bool {
    let body: Vec<&str> = section
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if body.is_empty() {
        return false;
    }

    let existing: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    existing.windows(body.len()).any(|window| window == body.as_slice())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
