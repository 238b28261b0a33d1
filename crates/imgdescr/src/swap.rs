//! Temporary in-place substitution of a description by its resolved form
//!
//! External build tools read the description from its usual location, so the
//! resolved document is written there while the original waits next to it as
//! `<name>.orig`. The original comes back on [`Substitution::restore`] or when
//! the guard is dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info, instrument};

use crate::error::{Error, ErrorKind, Result, Span};

const BACKUP_SUFFIX: &str = "orig";

/// Guard holding a substituted description
#[derive(Debug)]
pub struct Substitution {
    path: PathBuf,
    backup: PathBuf,
    restored: bool,
}

impl Substitution {
    /// Move `path` aside and write `resolved` in its place
    #[instrument(skip(resolved))]
    pub fn apply(path: &Path, resolved: &str) -> Result<Self> {
        let backup = backup_path(path)?;
        if backup.exists() {
            return Err(Error::with_message(
                ErrorKind::DocumentAccess {
                    path: backup.clone(),
                },
                Span::empty(),
                format!("backup {} already present", backup.display()),
            ));
        }

        fs::rename(path, &backup).map_err(|err| Error::access(path, &err))?;
        let mut content = resolved.to_string();
        if !content.ends_with('\n') {
            content.push('\n');
        }
        if let Err(err) = fs::write(path, content) {
            let err = Error::access(path, &err);
            if let Err(undo) = fs::rename(&backup, path) {
                error!("Unable to move {} back: {undo}", backup.display());
            }
            return Err(err);
        }

        info!("Substituted {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            backup,
            restored: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup(&self) -> &Path {
        &self.backup
    }

    /// Put the original description back
    pub fn restore(mut self) -> Result<()> {
        self.put_back()
    }

    fn put_back(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        fs::rename(&self.backup, &self.path).map_err(|err| Error::access(&self.path, &err))?;
        info!("Restored {}", self.path.display());
        Ok(())
    }
}

impl Drop for Substitution {
    fn drop(&mut self) {
        if let Err(err) = self.put_back() {
            error!("{err}");
        }
    }
}

fn backup_path(path: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        Error::access(
            path,
            &io::Error::new(io::ErrorKind::InvalidInput, "not a file path"),
        )
    })?;
    let mut name = name.to_os_string();
    name.push(".");
    name.push(BACKUP_SUFFIX);
    Ok(path.with_file_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| Error::access(path, &e))
    }

    #[test]
    fn test_apply_and_restore() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| Error::access(Path::new("tmp"), &e))?;
        let path = dir.path().join("config.xml");
        fs::write(&path, "<image/>").map_err(|e| Error::access(&path, &e))?;

        let guard = Substitution::apply(&path, "<image name=\"resolved\"/>")?;
        assert_eq!(guard.backup(), dir.path().join("config.xml.orig"));
        assert_eq!(read(&path)?, "<image name=\"resolved\"/>\n");
        assert_eq!(read(guard.backup())?, "<image/>");

        guard.restore()?;
        assert_eq!(read(&path)?, "<image/>");
        assert!(!dir.path().join("config.xml.orig").exists());
        Ok(())
    }

    #[test]
    fn test_drop_restores() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| Error::access(Path::new("tmp"), &e))?;
        let path = dir.path().join("config.xml");
        fs::write(&path, "<image/>").map_err(|e| Error::access(&path, &e))?;
        {
            let _guard = Substitution::apply(&path, "<image name=\"resolved\"/>")?;
        }
        assert_eq!(read(&path)?, "<image/>");
        Ok(())
    }

    #[test]
    fn test_second_apply_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| Error::access(Path::new("tmp"), &e))?;
        let path = dir.path().join("config.xml");
        fs::write(&path, "<image/>").map_err(|e| Error::access(&path, &e))?;

        let _guard = Substitution::apply(&path, "<image/>")?;
        let err = Substitution::apply(&path, "<image/>");
        assert!(matches!(err, Err(e) if matches!(e.kind(), ErrorKind::DocumentAccess { .. })));
        Ok(())
    }
}
