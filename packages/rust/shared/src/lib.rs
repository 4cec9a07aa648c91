//! Shared types, error model, and configuration for docsplice.
//!
//! This crate is the foundation depended on by all other docsplice crates.
//! It provides:
//! - [`DocspliceError`]: the unified error type
//! - Domain types ([`SectionDefinition`], [`Strategy`], [`Boundary`], [`PageMetadata`])
//! - Project configuration ([`ProjectConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    CONFIG_FILE_NAME, ProjectConfig, SectionEntry, default_config_path, init_config, load_config,
    load_config_from,
};
pub use error::{DocspliceError, Result};
pub use types::{
    Boundary, DegradedPolicy, ExtractedSection, PageMetadata, SectionDefinition, Strategy,
    StrategyKind, validate_definitions,
};
