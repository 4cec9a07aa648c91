//! Core domain types for section extraction and merging.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DocspliceError, Result};

// ---------------------------------------------------------------------------
// Boundary
// ---------------------------------------------------------------------------

/// A heading-line pattern marking the start or end of a section.
///
/// Patterns are always anchored to a whole line: `## Install` matches the
/// line `## Install` but not `## Installation` or prose mentioning it.
#[derive(Debug, Clone)]
pub struct Boundary {
    pattern: String,
    regex: Regex,
}

impl Boundary {
    /// Compile a boundary from a regex pattern, anchoring it to a full line.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            DocspliceError::Pattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Build a boundary that matches one literal heading line.
    pub fn heading(line: &str) -> Self {
        let escaped = regex::escape(line.trim());
        let regex = Regex::new(&format!("^(?:{escaped})$")).expect("escaped literal is valid");
        Self {
            pattern: line.trim().to_string(),
            regex,
        }
    }

    /// Test a single line (trailing whitespace and `\r` ignored).
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line.trim_end())
    }

    /// The pattern as written by the author.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// How a located section is combined with its destination document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Replace the whole body, keeping any existing header and preamble.
    Replace,
    /// Create the destination once; never touch it afterwards.
    CreateIfAbsent,
    /// Own only the region opened by `marker` inside the destination.
    MergeIntoSubsection {
        /// Literal heading line delimiting the owned region.
        marker: String,
    },
}

impl Strategy {
    /// The untagged kind, as written in project config.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Replace => StrategyKind::Replace,
            Self::CreateIfAbsent => StrategyKind::CreateIfAbsent,
            Self::MergeIntoSubsection { .. } => StrategyKind::MergeIntoSubsection,
        }
    }

    /// The subsection marker, present only for [`Strategy::MergeIntoSubsection`].
    pub fn marker(&self) -> Option<&str> {
        match self {
            Self::MergeIntoSubsection { marker } => Some(marker),
            _ => None,
        }
    }
}

/// Strategy name as it appears in `docsplice.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Replace,
    CreateIfAbsent,
    MergeIntoSubsection,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Replace => "replace",
            Self::CreateIfAbsent => "create-if-absent",
            Self::MergeIntoSubsection => "merge-into-subsection",
        };
        f.write_str(s)
    }
}

/// What to do when a merge cannot place a section precisely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DegradedPolicy {
    /// Append the section at the end of the destination and flag it.
    #[default]
    Append,
    /// Leave the destination untouched and flag it.
    Skip,
    /// Abort the run.
    Fail,
}

// ---------------------------------------------------------------------------
// Section definitions
// ---------------------------------------------------------------------------

/// Title/description used when generating a header for a new destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// One-line page description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PageMetadata {
    /// True when there is nothing to put in a generated header.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// Static rule describing one chunk of the source and where it goes.
#[derive(Debug, Clone)]
pub struct SectionDefinition {
    /// Human label, unique within a run.
    pub name: String,
    /// Heading that opens the section.
    pub start: Boundary,
    /// Heading that closes the section; `None` runs to end of source.
    pub end: Option<Boundary>,
    /// Destination document path, relative to the store root.
    pub target: String,
    /// How the section is combined with the destination.
    pub strategy: Strategy,
    /// Header fields for newly created destinations.
    pub metadata: PageMetadata,
}

impl SectionDefinition {
    /// Convenience constructor used by tests and programmatic callers.
    pub fn new(
        name: impl Into<String>,
        start: Boundary,
        end: Option<Boundary>,
        target: impl Into<String>,
        strategy: Strategy,
    ) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            target: target.into(),
            strategy,
            metadata: PageMetadata::default(),
        }
    }

    /// Attach header metadata.
    pub fn with_metadata(mut self, metadata: PageMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Result of locating one definition against the source text.
#[derive(Debug, Clone)]
pub struct ExtractedSection<'a> {
    /// The definition this section was extracted for.
    pub definition: &'a SectionDefinition,
    /// Located content, trimmed. Empty when the start boundary was not found.
    pub raw_content: String,
}

impl ExtractedSection<'_> {
    /// True when the start boundary never matched.
    pub fn is_empty(&self) -> bool {
        self.raw_content.is_empty()
    }
}

/// Check the cross-definition rules: unique names, and no subsection marker
/// claimed twice for the same target.
pub fn validate_definitions(definitions: &[SectionDefinition]) -> Result<()> {
    let mut names = HashSet::new();
    let mut markers = HashSet::new();

    for def in definitions {
        if def.name.trim().is_empty() {
            return Err(DocspliceError::config("section name must not be empty"));
        }
        if !names.insert(def.name.as_str()) {
            return Err(DocspliceError::config(format!(
                "duplicate section name '{}'",
                def.name
            )));
        }
        if def.target.trim().is_empty() {
            return Err(DocspliceError::config(format!(
                "section '{}' has an empty target",
                def.name
            )));
        }
        if let Some(marker) = def.strategy.marker() {
            if !markers.insert((def.target.as_str(), marker.trim())) {
                return Err(DocspliceError::config(format!(
                    "section '{}' claims marker '{}' in {} which is already claimed",
                    def.name, marker, def.target
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_matches_whole_line_only() {
        let b = Boundary::new("## Install").unwrap();
        assert!(b.is_match("## Install"));
        assert!(b.is_match("## Install  \r"));
        assert!(!b.is_match("## Installation"));
        assert!(!b.is_match("See ## Install for details"));
    }

    #[test]
    fn boundary_accepts_explicit_anchors() {
        let b = Boundary::new("^## A$").unwrap();
        assert!(b.is_match("## A"));
        assert!(!b.is_match("## AB"));
    }

    #[test]
    fn boundary_invalid_pattern_is_error() {
        let err = Boundary::new("## (unclosed").unwrap_err();
        assert!(matches!(err, DocspliceError::Pattern { .. }));
    }

    #[test]
    fn heading_boundary_escapes_regex_chars() {
        let b = Boundary::heading("## What's new (v2.0)?");
        assert!(b.is_match("## What's new (v2.0)?"));
        assert!(!b.is_match("## What's new v2.0"));
    }

    #[test]
    fn strategy_marker_only_for_merge() {
        assert_eq!(Strategy::Replace.marker(), None);
        assert_eq!(Strategy::CreateIfAbsent.marker(), None);
        let merge = Strategy::MergeIntoSubsection {
            marker: "## Upgrading".into(),
        };
        assert_eq!(merge.marker(), Some("## Upgrading"));
        assert_eq!(merge.kind().to_string(), "merge-into-subsection");
    }

    fn def(name: &str, target: &str, strategy: Strategy) -> SectionDefinition {
        SectionDefinition::new(name, Boundary::heading("## A"), None, target, strategy)
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let defs = vec![
            def("A", "x.md", Strategy::Replace),
            def("A", "y.md", Strategy::Replace),
        ];
        let err = validate_definitions(&defs).unwrap_err();
        assert!(err.to_string().contains("duplicate section name"));
    }

    #[test]
    fn validate_rejects_marker_claimed_twice() {
        let merge = || Strategy::MergeIntoSubsection {
            marker: "## Notes".into(),
        };
        let defs = vec![def("A", "x.md", merge()), def("B", "x.md", merge())];
        assert!(validate_definitions(&defs).is_err());

        // Same marker in a different target is fine.
        let defs = vec![def("A", "x.md", merge()), def("B", "y.md", merge())];
        assert!(validate_definitions(&defs).is_ok());
    }

    #[test]
    fn validate_allows_shared_target_across_strategies() {
        let defs = vec![
            def("A", "x.md", Strategy::Replace),
            def(
                "B",
                "x.md",
                Strategy::MergeIntoSubsection {
                    marker: "## B".into(),
                },
            ),
        ];
        assert!(validate_definitions(&defs).is_ok());
    }
}
