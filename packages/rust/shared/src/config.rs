//! Project configuration for docsplice.
//!
//! A project is described by a `docsplice.toml` next to the source guide.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocspliceError, Result};
use crate::types::{
    Boundary, DegradedPolicy, PageMetadata, SectionDefinition, Strategy, StrategyKind,
    validate_definitions,
};

/// Default project file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "docsplice.toml";

/// Starter file written by `docsplice config init`.
const STARTER_CONFIG: &str = r###"# docsplice project file.
#
# Paths are relative to this file.
source = "MIGRATION.md"
content_root = "docs"

# What to do when a merge target is missing its subsection marker:
# "append" (flag and append), "skip" (flag and leave untouched) or "fail".
on_degraded = "append"

[[sections]]
name = "Installation"
start = "^## Installation$"
end = "^## Configuration$"
target = "getting-started/installation.md"
strategy = "replace"
title = "Installation"
description = "Install and verify the tool"

[[sections]]
name = "Upgrade notes"
start = "^## Upgrading$"
target = "reference/changelog.md"
strategy = "merge-into-subsection"
marker = "## Upgrading"
"###;

// ---------------------------------------------------------------------------
// Config structs (matching docsplice.toml schema)
// ---------------------------------------------------------------------------

/// Top-level project config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// The long-form authoring document to split.
    pub source: PathBuf,

    /// Root directory that section targets are relative to.
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,

    /// Handling of merges that cannot be placed precisely.
    #[serde(default)]
    pub on_degraded: DegradedPolicy,

    /// Section definitions, applied in order.
    #[serde(default)]
    pub sections: Vec<SectionEntry>,
}

fn default_content_root() -> PathBuf {
    PathBuf::from("docs")
}

/// `[[sections]]` entry, as written by the author.
///
/// Converted into a typed [`SectionDefinition`] with [`SectionEntry::to_definition`];
/// the loose `strategy` + `marker` pair becomes a single [`Strategy`] variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionEntry {
    /// Unique human label.
    pub name: String,
    /// Pattern for the opening heading.
    pub start: String,
    /// Pattern for the closing heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Destination path relative to `content_root`.
    pub target: String,
    /// Merge strategy.
    pub strategy: StrategyKind,
    /// Subsection heading; required for `merge-into-subsection` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    /// Title for a generated header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description for a generated header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SectionEntry {
    /// Compile patterns and enforce the strategy/marker invariant.
    pub fn to_definition(&self) -> Result<SectionDefinition> {
        let strategy = match (self.strategy, &self.marker) {
            (StrategyKind::MergeIntoSubsection, Some(marker)) => {
                let marker = marker.trim();
                if !marker.starts_with('#') {
                    return Err(DocspliceError::config(format!(
                        "section '{}': marker '{marker}' is not a heading line",
                        self.name
                    )));
                }
                Strategy::MergeIntoSubsection {
                    marker: marker.to_string(),
                }
            }
            (StrategyKind::MergeIntoSubsection, None) => {
                return Err(DocspliceError::config(format!(
                    "section '{}': strategy merge-into-subsection requires a marker",
                    self.name
                )));
            }
            (kind, Some(_)) => {
                return Err(DocspliceError::config(format!(
                    "section '{}': marker is only valid for merge-into-subsection, not {kind}",
                    self.name
                )));
            }
            (StrategyKind::Replace, None) => Strategy::Replace,
            (StrategyKind::CreateIfAbsent, None) => Strategy::CreateIfAbsent,
        };

        Ok(SectionDefinition {
            name: self.name.clone(),
            start: Boundary::new(&self.start)?,
            end: self.end.as_deref().map(Boundary::new).transpose()?,
            target: self.target.clone(),
            strategy,
            metadata: PageMetadata {
                title: self.title.clone(),
                description: self.description.clone(),
            },
        })
    }
}

impl ProjectConfig {
    /// Convert and validate every `[[sections]]` entry, preserving order.
    pub fn definitions(&self) -> Result<Vec<SectionDefinition>> {
        let definitions = self
            .sections
            .iter()
            .map(SectionEntry::to_definition)
            .collect::<Result<Vec<_>>>()?;
        validate_definitions(&definitions)?;
        Ok(definitions)
    }

    /// Resolve relative `source` and `content_root` against `base_dir`.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        if self.source.is_relative() {
            self.source = base_dir.join(&self.source);
        }
        if self.content_root.is_relative() {
            self.content_root = base_dir.join(&self.content_root);
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path of the project file in the current working directory.
pub fn default_config_path() -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| DocspliceError::io(".", e))?;
    Ok(cwd.join(CONFIG_FILE_NAME))
}

/// Load the project config, falling back to `./docsplice.toml`.
///
/// Relative paths inside the file are resolved against its directory.
pub fn load_config(path: Option<&Path>) -> Result<ProjectConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        return Err(DocspliceError::config(format!(
            "{} not found (run `docsplice config init` to create one)",
            path.display()
        )));
    }

    let mut config = load_config_from(&path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base_dir);
    tracing::debug!(?path, sections = config.sections.len(), "loaded project config");

    Ok(config)
}

/// Parse a project config from a specific file path without resolving paths.
pub fn load_config_from(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocspliceError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DocspliceError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write the starter project file. Refuses to overwrite an existing file.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Err(DocspliceError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| DocspliceError::io(dir, e))?;
    }

    std::fs::write(path, STARTER_CONFIG).map_err(|e| DocspliceError::io(path, e))?;
    tracing::info!(?path, "created starter project file");

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> ProjectConfig {
        toml::from_str(toml_str).expect("parse")
    }

    #[test]
    fn starter_config_parses_and_validates() {
        let config = parse(STARTER_CONFIG);
        assert_eq!(config.on_degraded, DegradedPolicy::Append);
        let defs = config.definitions().expect("valid definitions");
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].strategy, Strategy::Replace);
        assert_eq!(defs[1].strategy.marker(), Some("## Upgrading"));
        assert_eq!(defs[0].metadata.title.as_deref(), Some("Installation"));
    }

    #[test]
    fn defaults_apply() {
        let config = parse("source = \"GUIDE.md\"\n");
        assert_eq!(config.content_root, PathBuf::from("docs"));
        assert_eq!(config.on_degraded, DegradedPolicy::Append);
        assert!(config.sections.is_empty());
    }

    #[test]
    fn merge_without_marker_is_rejected() {
        let config = parse(
            r###"
source = "GUIDE.md"

[[sections]]
name = "Notes"
start = "^## Notes$"
target = "notes.md"
strategy = "merge-into-subsection"
"###,
        );
        let err = config.definitions().unwrap_err();
        assert!(err.to_string().contains("requires a marker"));
    }

    #[test]
    fn marker_on_replace_is_rejected() {
        let config = parse(
            r###"
source = "GUIDE.md"

[[sections]]
name = "Notes"
start = "^## Notes$"
target = "notes.md"
strategy = "replace"
marker = "## Notes"
"###,
        );
        let err = config.definitions().unwrap_err();
        assert!(err.to_string().contains("only valid for merge-into-subsection"));
    }

    #[test]
    fn marker_must_be_heading() {
        let config = parse(
            r###"
source = "GUIDE.md"

[[sections]]
name = "Notes"
start = "^## Notes$"
target = "notes.md"
strategy = "merge-into-subsection"
marker = "Notes"
"###,
        );
        assert!(config.definitions().is_err());
    }

    #[test]
    fn unknown_strategy_fails_to_parse() {
        let result: std::result::Result<ProjectConfig, _> = toml::from_str(
            r###"
source = "GUIDE.md"

[[sections]]
name = "Notes"
start = "^## Notes$"
target = "notes.md"
strategy = "append"
"###,
        );
        assert!(result.is_err());
    }

    #[test]
    fn resolve_paths_joins_relative_only() {
        let mut config = parse("source = \"GUIDE.md\"\ncontent_root = \"/srv/site\"\n");
        config.resolve_paths(Path::new("/work/project"));
        assert_eq!(config.source, PathBuf::from("/work/project/GUIDE.md"));
        assert_eq!(config.content_root, PathBuf::from("/srv/site"));
    }

    #[test]
    fn config_roundtrip() {
        let config = parse(STARTER_CONFIG);
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: ProjectConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.sections.len(), 2);
        assert_eq!(parsed.sections[1].marker.as_deref(), Some("## Upgrading"));
    }

    #[test]
    fn fixture_config_validates() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/docsplice.toml");
        let config = load_config(Some(&path)).expect("load fixture config");
        let defs = config.definitions().expect("fixture definitions");
        assert!(defs.len() >= 3);
        assert!(config.source.ends_with("migration-guide.md"));
        assert!(config.source.exists());
    }

    #[test]
    fn missing_config_mentions_init() {
        let err = load_config(Some(Path::new("/nonexistent/docsplice.toml"))).unwrap_err();
        assert!(err.to_string().contains("config init"));
    }
}
