use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::traits::DocumentStore;

/// A document stored as a single file on disk.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so the file is always either the old document or the
/// new one, never a mix.
///
/// # Example
///
/// ```
/// use article_store::{DocumentStore, FileStore};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut store = FileStore::new(dir.path().join("articles.json"));
/// assert_eq!(store.load().unwrap(), None);
///
/// store.replace(br#"{"version":4,"articles":{"list":[]}}"#).unwrap();
/// assert!(store.exists().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    keep_backup: bool,
    sync: bool,
}

/// Error type for the file backend.
#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to back up {} to {}: {source}", path.display(), backup.display())]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        source: io::Error,
    },
}

impl FileStore {
    /// Create a store for the file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keep_backup: false,
            sync: true,
        }
    }

    /// Copy the previous content to `<file>.bak` before each replacement.
    pub fn keep_backup(mut self, keep: bool) -> Self {
        self.keep_backup = keep;
        self
    }

    /// Flush written data to disk before the rename (default: on).
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Path of the document file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path the previous content is copied to when backups are on.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn write_error(&self, source: io::Error) -> FileStoreError {
        FileStoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl DocumentStore for FileStore {
    type Error = FileStoreError;

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FileStoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn replace(&mut self, contents: &[u8]) -> Result<(), Self::Error> {
        let dir = self.parent_dir();
        let mut staged = tempfile::Builder::new()
            .prefix(".article-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| self.write_error(e))?;

        staged
            .write_all(contents)
            .map_err(|e| self.write_error(e))?;
        if self.sync {
            staged
                .as_file()
                .sync_all()
                .map_err(|e| self.write_error(e))?;
        }

        if self.keep_backup && self.path.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup).map_err(|source| FileStoreError::Backup {
                path: self.path.clone(),
                backup: backup.clone(),
                source,
            })?;
            debug!(backup = %backup.display(), "kept previous document");
        }

        // The replacement keeps the permissions of the file it replaces.
        match fs::metadata(&self.path) {
            Ok(meta) => staged
                .as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| self.write_error(e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.write_error(e)),
        }

        staged
            .persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        // The document is already replaced; a failed directory sync is not an error.
        #[cfg(unix)]
        if self.sync {
            if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
                warn!(dir = %dir.display(), error = %e, "directory sync failed after replace");
            }
        }

        debug!(path = %self.path.display(), bytes = contents.len(), "replaced document");
        Ok(())
    }

    fn exists(&self) -> Result<bool, Self::Error> {
        self.path.try_exists().map_err(|source| FileStoreError::Read {
            path: self.path.clone(),
            source,
        })
    }
}
