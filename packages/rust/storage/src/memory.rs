//! In-memory stores.

use std::collections::BTreeMap;

use docsplice_shared::Result;

use crate::{DocumentStore, validate_target};

/// Documents held in a sorted map. Counts writes so tests can assert that a
/// run left a document alone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document (builder style).
    pub fn with_document(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.docs.insert(path.into(), content.into());
        self
    }

    /// Current content at `path`.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.docs.get(path).map(String::as_str)
    }

    /// Number of successful writes since creation.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True when no documents are stored.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, path: &str) -> Result<Option<String>> {
        validate_target(path)?;
        Ok(self.docs.get(path).cloned())
    }

    fn write(&mut self, path: &str, content: &str) -> Result<()> {
        validate_target(path)?;
        self.docs.insert(path.to_string(), content.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Overlay that reads through to an inner store and keeps writes in memory.
///
/// Later reads of a captured path see the captured content, so a dry run
/// behaves exactly like a real run with respect to ordering.
pub struct DryRunStore<'a, S: DocumentStore + ?Sized> {
    inner: &'a S,
    pending: BTreeMap<String, String>,
}

impl<'a, S: DocumentStore + ?Sized> DryRunStore<'a, S> {
    /// Wrap `inner` without ever writing to it.
    pub fn new(inner: &'a S) -> Self {
        Self {
            inner,
            pending: BTreeMap::new(),
        }
    }

    /// Captured writes, sorted by path.
    pub fn changes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pending.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for DryRunStore<'_, S> {
    fn read(&self, path: &str) -> Result<Option<String>> {
        match self.pending.get(path) {
            Some(content) => Ok(Some(content.clone())),
            None => self.inner.read(path),
        }
    }

    fn write(&mut self, path: &str, content: &str) -> Result<()> {
        validate_target(path)?;
        self.pending.insert(path.to_string(), content.to_string());
        Ok(())
    }
}
