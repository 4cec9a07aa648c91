//! Run report: one outcome per section definition.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use docsplice_shared::StrategyKind;

use crate::merge::DegradedReason;

/// What happened to one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionStatus {
    /// Destination written with new content.
    Written,
    /// Merged output equals the existing document; no write.
    Unchanged,
    /// Start boundary not found in the source; nothing written.
    SkippedEmpty,
    /// `create-if-absent` target already exists; left alone.
    SkippedExists,
    /// Degraded merge, fallback content written.
    DegradedAppended,
    /// Degraded merge, nothing written.
    DegradedSkipped,
}

impl SectionStatus {
    pub fn is_degraded(self) -> bool {
        matches!(self, Self::DegradedAppended | Self::DegradedSkipped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::Unchanged => "unchanged",
            Self::SkippedEmpty => "skipped-empty",
            Self::SkippedExists => "skipped-exists",
            Self::DegradedAppended => "degraded-appended",
            Self::DegradedSkipped => "degraded-skipped",
        }
    }
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for a single section definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionOutcome {
    pub name: String,
    pub target: String,
    pub strategy: StrategyKind,
    pub status: SectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DegradedReason>,
    /// Size of the document written (0 when nothing was written).
    pub bytes: usize,
    /// SHA-256 of the written document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub outcomes: Vec<SectionOutcome>,
}

impl RunReport {
    /// Empty report stamped with a fresh run id.
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            started_at: Utc::now(),
            dry_run,
            outcomes: Vec::new(),
        }
    }

    /// Outcomes that wrote a document (degraded appends included).
    pub fn written(&self) -> impl Iterator<Item = &SectionOutcome> {
        self.outcomes.iter().filter(|o| {
            matches!(
                o.status,
                SectionStatus::Written | SectionStatus::DegradedAppended
            )
        })
    }

    pub fn degraded(&self) -> impl Iterator<Item = &SectionOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_degraded())
    }

    pub fn has_degraded(&self) -> bool {
        self.degraded().next().is_some()
    }

    /// Number of outcomes with the given status.
    pub fn count(&self, status: SectionStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Hex SHA-256 of a document.
pub(crate) fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, status: SectionStatus) -> SectionOutcome {
        SectionOutcome {
            name: name.into(),
            target: format!("{name}.md"),
            strategy: StrategyKind::Replace,
            status,
            reason: None,
            bytes: 0,
            content_hash: None,
        }
    }

    #[test]
    fn helpers_filter_by_status() {
        let mut report = RunReport::new(false);
        report.outcomes = vec![
            outcome("a", SectionStatus::Written),
            outcome("b", SectionStatus::Unchanged),
            outcome("c", SectionStatus::DegradedAppended),
            outcome("d", SectionStatus::DegradedSkipped),
            outcome("e", SectionStatus::SkippedEmpty),
        ];

        let written: Vec<_> = report.written().map(|o| o.name.as_str()).collect();
        assert_eq!(written, vec!["a", "c"]);
        assert_eq!(report.degraded().count(), 2);
        assert!(report.has_degraded());
        assert_eq!(report.count(SectionStatus::SkippedEmpty), 1);
    }

    #[test]
    fn empty_report_is_clean() {
        let report = RunReport::new(true);
        assert!(!report.has_degraded());
        assert_eq!(report.written().count(), 0);
        assert!(report.dry_run);
    }

    #[test]
    fn serializes_kebab_case() {
        let mut o = outcome("x", SectionStatus::DegradedSkipped);
        o.reason = Some(DegradedReason::AlreadyPresent);
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["status"], "degraded-skipped");
        assert_eq!(json["reason"], "already-present");
        assert_eq!(json["strategy"], "replace");
        assert!(json.get("content_hash").is_none());
    }

    #[test]
    fn hash_is_stable_hex() {
        let h = content_hash("abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn status_display_matches_serde() {
        for status in [
            SectionStatus::Written,
            SectionStatus::SkippedExists,
            SectionStatus::DegradedAppended,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.to_string());
        }
    }
}
