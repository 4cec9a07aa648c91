//! Pipeline driver: source guide → locate → normalize → resolve → merge → store.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use docsplice_markdown::{locate, normalize, scan_lines};
use docsplice_shared::{
    DegradedPolicy, DocspliceError, ExtractedSection, Result, SectionDefinition,
    validate_definitions,
};
use docsplice_storage::{DocumentStore, validate_target};

use crate::merge::{self, MergeOutcome};
use crate::report::{RunReport, SectionOutcome, SectionStatus, content_hash};
use crate::resolver::read_header_and_preamble;

/// Options for a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// What to do with degraded merges.
    pub on_degraded: DegradedPolicy,
    /// Stamped on the report. The caller is responsible for handing in a
    /// store that does not commit (see `DryRunStore`).
    pub dry_run: bool,
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each section is processed.
    fn section_done(&self, outcome: &SectionOutcome, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn section_done(&self, _outcome: &SectionOutcome, _current: usize, _total: usize) {}
    fn done(&self, _report: &RunReport) {}
}

/// Locate one definition in the source text.
pub fn extract<'a>(source: &str, definition: &'a SectionDefinition) -> ExtractedSection<'a> {
    ExtractedSection {
        definition,
        raw_content: locate(source, &definition.start, definition.end.as_ref()),
    }
}

/// Run every definition against `source`, strictly in order.
///
/// Definitions and target paths are validated before the store is touched.
/// A storage fault aborts the run; writes made by earlier definitions stay.
#[instrument(skip_all, fields(sections = definitions.len(), dry_run = options.dry_run))]
pub fn run(
    source: &str,
    definitions: &[SectionDefinition],
    store: &mut dyn DocumentStore,
    options: &RunOptions,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();

    progress.phase("Validating definitions");
    validate_definitions(definitions)?;
    for def in definitions {
        validate_target(&def.target)?;
    }

    let mut report = RunReport::new(options.dry_run);
    info!(run_id = %report.run_id, "starting run");

    progress.phase("Merging sections");
    let total = definitions.len();
    for (i, def) in definitions.iter().enumerate() {
        let outcome = process_section(source, def, store, options.on_degraded)?;
        progress.section_done(&outcome, i + 1, total);
        report.outcomes.push(outcome);
    }

    progress.done(&report);

    info!(
        run_id = %report.run_id,
        written = report.count(SectionStatus::Written),
        unchanged = report.count(SectionStatus::Unchanged),
        skipped = report.count(SectionStatus::SkippedEmpty) + report.count(SectionStatus::SkippedExists),
        degraded = report.degraded().count(),
        elapsed_ms = start.elapsed().as_millis(),
        "run complete"
    );

    Ok(report)
}

#[instrument(skip_all, fields(section = %def.name, target = %def.target))]
fn process_section(
    source: &str,
    def: &SectionDefinition,
    store: &mut dyn DocumentStore,
    policy: DegradedPolicy,
) -> Result<SectionOutcome> {
    let mut outcome = SectionOutcome {
        name: def.name.clone(),
        target: def.target.clone(),
        strategy: def.strategy.kind(),
        status: SectionStatus::SkippedEmpty,
        reason: None,
        bytes: 0,
        content_hash: None,
    };

    let extracted = extract(source, def);
    if extracted.is_empty() {
        warn!(start = %def.start, "start boundary not found in source, nothing written");
        return Ok(outcome);
    }

    let section = normalize(&extracted.raw_content);
    let existing = read_header_and_preamble(store, &def.target)?;
    let existing = existing.as_ref().map(|doc| doc.content.as_str());

    match merge::apply(&def.strategy, existing, &section, &def.metadata) {
        MergeOutcome::Placed(content) => {
            if write_if_changed(store, &def.target, existing, &content)? {
                info!(bytes = content.len(), "section written");
                outcome.status = SectionStatus::Written;
                record_write(&mut outcome, &content);
            } else {
                debug!("destination already up to date");
                outcome.status = SectionStatus::Unchanged;
            }
        }
        MergeOutcome::Untouched => {
            debug!("destination exists, left alone");
            outcome.status = SectionStatus::SkippedExists;
        }
        MergeOutcome::Degraded { content, reason } => {
            if policy == DegradedPolicy::Fail {
                return Err(DocspliceError::DegradedMerge {
                    section: def.name.clone(),
                    target: def.target.clone(),
                    reason: reason.to_string(),
                });
            }
            outcome.reason = Some(reason);

            match content.filter(|_| policy == DegradedPolicy::Append) {
                Some(content) => {
                    warn!(%reason, "degraded merge, writing fallback content");
                    write_if_changed(store, &def.target, existing, &content)?;
                    outcome.status = SectionStatus::DegradedAppended;
                    record_write(&mut outcome, &content);
                }
                None => {
                    warn!(%reason, "degraded merge, destination left unchanged");
                    outcome.status = SectionStatus::DegradedSkipped;
                }
            }
        }
    }

    Ok(outcome)
}

/// Write unless the store already holds exactly `content`.
fn write_if_changed(
    store: &mut dyn DocumentStore,
    target: &str,
    existing: Option<&str>,
    content: &str,
) -> Result<bool> {
    if existing == Some(content) {
        return Ok(false);
    }
    store.write(target, content)?;
    Ok(true)
}

fn record_write(outcome: &mut SectionOutcome, content: &str) {
    outcome.bytes = content.len();
    outcome.content_hash = Some(content_hash(content));
}

// ---------------------------------------------------------------------------
// Boundary check
// ---------------------------------------------------------------------------

/// Whether a definition's boundaries are present in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundaryCheck {
    pub name: String,
    pub start_found: bool,
    /// `None` when the definition has no end boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_found: Option<bool>,
    /// Length of the section that would be extracted.
    pub bytes: usize,
}

/// Check every definition's boundaries against `source` without touching
/// any destination.
pub fn check_boundaries(
    source: &str,
    definitions: &[SectionDefinition],
) -> Result<Vec<BoundaryCheck>> {
    validate_definitions(definitions)?;

    let lines: Vec<_> = scan_lines(source).filter(|line| !line.in_code).collect();

    Ok(definitions
        .iter()
        .map(|def| {
            let start_at = lines.iter().position(|line| def.start.is_match(line.text));
            let end_found = def.end.as_ref().map(|end| {
                start_at.is_some_and(|s| lines[s + 1..].iter().any(|line| end.is_match(line.text)))
            });
            BoundaryCheck {
                name: def.name.clone(),
                start_found: start_at.is_some(),
                end_found,
                bytes: extract(source, def).raw_content.len(),
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
