//! Directory payloads with scoped ownership.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// A directory-valued artifact payload.
///
/// A directory is either *owned* (a temporary directory created during the
/// run, removed when the value is dropped) or *borrowed* (an existing
/// directory that stagehand never deletes). Moving and removing both consume
/// the value, so the underlying resource is released at most once.
#[derive(Debug)]
pub struct Directory {
    path: PathBuf,
    temp: Option<TempDir>,
}

impl Directory {
    /// Wraps an existing directory without taking ownership of its contents.
    #[must_use]
    pub fn borrowed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temp: None,
        }
    }

    /// Creates a fresh temporary directory owned by the returned value.
    pub fn temporary() -> io::Result<Self> {
        let temp = tempfile::Builder::new().prefix("stagehand-").tempdir()?;
        Ok(Self {
            path: temp.path().to_path_buf(),
            temp: Some(temp),
        })
    }

    /// Returns the directory location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the directory is removed when this value is dropped.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.temp.is_some()
    }

    /// Moves the directory to `dest`.
    ///
    /// Falls back to copy-and-remove when a rename is not possible (for
    /// example across filesystems). An owned directory stays guarded until
    /// the move succeeds, so a failed move still removes it on drop.
    pub fn move_to(mut self, dest: &Path) -> io::Result<()> {
        debug!(from = %self.path.display(), to = %dest.display(), "Moving directory");
        match self.temp.take() {
            Some(temp) => {
                if fs::rename(temp.path(), dest).is_ok() {
                    let _ = temp.keep();
                    return Ok(());
                }
                copy_dir_all(temp.path(), dest)?;
                temp.close()
            }
            None => {
                if fs::rename(&self.path, dest).is_ok() {
                    return Ok(());
                }
                copy_dir_all(&self.path, dest)?;
                fs::remove_dir_all(&self.path)
            }
        }
    }

    /// Releases the directory now instead of at drop time.
    ///
    /// Borrowed directories are left untouched.
    pub fn remove(mut self) -> io::Result<()> {
        match self.temp.take() {
            Some(temp) => temp.close(),
            None => Ok(()),
        }
    }
}

fn copy_dir_all(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)?;
        } else {
            warn!(path = %entry.path().display(), "Skipping special file while copying directory");
        }
    }
    Ok(())
}
