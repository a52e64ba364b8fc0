//! The append-only marker file that gives every synthesized commit a change

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Handle to the marker file inside a workspace
#[derive(Debug, Clone)]
pub struct MarkerFile {
    workdir: PathBuf,
    relative: PathBuf,
}

impl MarkerFile {
    /// Create a handle for `relative` under `workdir`
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            relative: relative.into(),
        }
    }

    /// Path relative to the repository root, as staged in the index
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative
    }

    /// Absolute path on disk
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.workdir.join(&self.relative)
    }

    /// Whether the file is currently on disk
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Append one line, creating the file (and parent directories) if absent
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn append(&self, line: &str) -> io::Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }

    /// Read the whole file, or an empty string if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn read(&self) -> io::Result<String> {
        match fs::read_to_string(self.path()) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    /// Delete the file; returns whether it existed
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn remove(&self) -> io::Result<bool> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
