//! Destination document storage.
//!
//! The merge engine only ever needs two operations, `read(path)` and
//! `write(path, content)`, so storage sits behind the [`DocumentStore`] trait:
//! - [`FsStore`]: documents under a content root on disk
//! - [`MemoryStore`]: in-memory map for tests and embedding
//! - [`DryRunStore`]: overlay that captures writes without committing them
//!
//! **Access rules:** paths are `/`-separated and relative to the store root;
//! absolute paths and `..` components are rejected.

mod memory;

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use docsplice_shared::{DocspliceError, Result};
use tracing::{debug, instrument};
use uuid::Uuid;

pub use memory::{DryRunStore, MemoryStore};

/// Read/write access to destination documents.
pub trait DocumentStore {
    /// Read a document. `Ok(None)` when nothing exists at `path`.
    fn read(&self, path: &str) -> Result<Option<String>>;

    /// Write a document, replacing any existing content.
    fn write(&mut self, path: &str, content: &str) -> Result<()>;
}

/// Reject paths that would escape the store root.
pub fn validate_target(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(DocspliceError::validation("target path is empty"));
    }
    let p = Path::new(path);
    let escapes = p
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(DocspliceError::validation(format!(
            "target path '{path}' must be relative and stay inside the content root"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Filesystem store
// ---------------------------------------------------------------------------

/// Documents stored as files under a content root.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    readonly: bool,
}

impl FsStore {
    /// Open a store rooted at `root` in read-write mode.
    ///
    /// The root does not need to exist yet; it is created on first write.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            readonly: false,
        }
    }

    /// Open a store that rejects writes (used by `docsplice check`).
    pub fn open_readonly(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            readonly: true,
        }
    }

    /// The content root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a target path to a file under the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        validate_target(path)?;
        Ok(self.root.join(path))
    }

    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(DocspliceError::storage(format!(
                "store at {} is opened in read-only mode",
                self.root.display()
            )));
        }
        Ok(())
    }
}

impl DocumentStore for FsStore {
    fn read(&self, path: &str) -> Result<Option<String>> {
        let file = self.resolve(path)?;
        match std::fs::read_to_string(&file) {
            Ok(content) => {
                debug!(path = %file.display(), len = content.len(), "read document");
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DocspliceError::io(file, e)),
        }
    }

    /// Write atomically: write to a temp file beside the target, then rename.
    #[instrument(skip(self, content), fields(len = content.len()))]
    fn write(&mut self, path: &str, content: &str) -> Result<()> {
        self.check_writable()?;
        let file = self.resolve(path)?;

        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocspliceError::io(parent, e))?;
        }

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| DocspliceError::validation(format!("'{path}' has no file name")))?;
        let temp = file.with_file_name(format!(".{file_name}.{}.tmp", Uuid::now_v7()));

        std::fs::write(&temp, content).map_err(|e| DocspliceError::io(&temp, e))?;
        std::fs::rename(&temp, &file).map_err(|e| {
            let _ = std::fs::remove_file(&temp);
            DocspliceError::io(&file, e)
        })?;

        debug!(path = %file.display(), "wrote document");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docsplice-store-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn read_missing_is_none() {
        let tmp = temp_dir();
        let store = FsStore::open(&tmp);
        assert!(store.read("nope.md").unwrap().is_none());
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn write_creates_parents_and_reads_back() {
        let tmp = temp_dir();
        let mut store = FsStore::open(&tmp);

        store.write("guide/deep/page.mdx", "# Page\n").unwrap();
        assert_eq!(
            store.read("guide/deep/page.mdx").unwrap().as_deref(),
            Some("# Page\n")
        );
        assert!(tmp.join("guide/deep/page.mdx").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn write_leaves_no_temp_files() {
        let tmp = temp_dir();
        let mut store = FsStore::open(&tmp);
        store.write("a.md", "one").unwrap();
        store.write("a.md", "two").unwrap();

        for entry in std::fs::read_dir(&tmp).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }
        assert_eq!(store.read("a.md").unwrap().as_deref(), Some("two"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn readonly_rejects_writes() {
        let tmp = temp_dir();
        let mut store = FsStore::open_readonly(&tmp);
        let err = store.write("a.md", "x").unwrap_err();
        assert!(err.to_string().contains("read-only"));
        assert!(err.is_storage_fault());
        assert!(!tmp.join("a.md").exists());
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn resolve_joins_under_root() {
        let store = FsStore::open_readonly("/srv/site");
        assert_eq!(store.root(), Path::new("/srv/site"));
        assert_eq!(
            store.resolve("guide/a.md").unwrap(),
            Path::new("/srv/site/guide/a.md")
        );
    }

    #[test]
    fn rejects_escaping_paths() {
        let store = FsStore::open("/tmp/docsplice-root");
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("").is_err());
        assert!(store.resolve("./ok/page.md").is_ok());
    }

    #[test]
    fn read_directory_is_storage_fault() {
        let tmp = temp_dir();
        std::fs::create_dir_all(tmp.join("dir.md")).unwrap();
        let store = FsStore::open(&tmp);
        let err = store.read("dir.md").unwrap_err();
        assert!(err.is_storage_fault());
        let _ = std::fs::remove_dir_all(&tmp);
    }
}
