//! Finding the description inside an appliance directory

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// File name looked up first
pub const DEFAULT_NAME: &str = "config.xml";

/// Path of the description in `path`
///
/// A file is returned unchanged. In a directory `config.xml` wins, then the
/// first `*.kiwi` file, then the first `*.xml` file, both in name order.
pub fn find_description(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    let default = path.join(DEFAULT_NAME);
    if default.is_file() {
        return Ok(default);
    }

    let mut files = fs::read_dir(path)
        .map_err(|err| Error::access(path, &err))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect::<Vec<_>>();
    files.sort();

    let with_ext = |ext: &str| {
        files
            .iter()
            .find(|p| p.extension().is_some_and(|e| e == ext))
            .cloned()
    };
    let found = with_ext("kiwi").or_else(|| with_ext("xml"));
    if let Some(found) = &found {
        debug!("Found description {}", found.display());
    }
    found.ok_or_else(|| {
        Error::access(
            path,
            &io::Error::new(io::ErrorKind::NotFound, "no appliance description found"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn touch(dir: &Path, name: &str) -> Result<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, "<image/>").map_err(|e| Error::access(&path, &e))?;
        Ok(path)
    }

    #[test]
    fn test_precedence() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| Error::access(Path::new("tmp"), &e))?;
        touch(dir.path(), "b.xml")?;
        touch(dir.path(), "a.xml")?;
        assert_eq!(find_description(dir.path())?, dir.path().join("a.xml"));

        let kiwi = touch(dir.path(), "z.kiwi")?;
        assert_eq!(find_description(dir.path())?, kiwi);

        let config = touch(dir.path(), DEFAULT_NAME)?;
        assert_eq!(find_description(dir.path())?, config);
        assert_eq!(find_description(&kiwi)?, kiwi);
        Ok(())
    }

    #[test]
    fn test_nothing_found() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| Error::access(Path::new("tmp"), &e))?;
        touch(dir.path(), "notes.txt")?;
        let err = find_description(dir.path());
        assert!(matches!(err, Err(e) if matches!(e.kind(), ErrorKind::DocumentAccess { .. })));
        Ok(())
    }
}
