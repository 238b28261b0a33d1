//! One merge step: a derived description folded onto its base

pub mod ops;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::xml::{from_str, to_pretty_string, Element};

pub use ops::Operation;

/// Tag of the inheritance reference
pub const INHERIT: &str = "inherit";

/// A derived description applied to its target tree
#[derive(Clone, Debug, PartialEq)]
pub struct Description {
    source: Element,
    target: Element,
}

impl Description {
    /// Parse `derived` and fold it onto `base`
    ///
    /// Without a `base` the `inherit` reference of `derived` is read, with a
    /// relative `path` taken as relative to the working directory. Without
    /// either, `derived` is returned unmodified.
    pub fn new(derived: &str, base: Option<&str>) -> Result<Self> {
        Self::build(derived, base, None)
    }

    /// Like [`Description::new`], with a relative `inherit` path anchored at
    /// the directory of `path`
    #[instrument]
    pub fn from_file(path: &Path, base: Option<&str>) -> Result<Self> {
        let derived = fs::read_to_string(path).map_err(|err| Error::access(path, &err))?;
        Self::build(&derived, base, path.parent()).map_err(|err| err.in_file(path))
    }

    fn build(derived: &str, base: Option<&str>, anchor: Option<&Path>) -> Result<Self> {
        let source = from_str(derived)?.root;

        let target = match base {
            Some(base) => Some(from_str(base)?.root),
            None => match inherit_reference(&source)? {
                Some(reference) => {
                    let path = anchored(reference, anchor);
                    if !path.is_file() {
                        return Err(Error::missing_ancestor(Some(&path)));
                    }
                    debug!("Reading inherited description {}", path.display());
                    let content =
                        fs::read_to_string(&path).map_err(|err| Error::access(&path, &err))?;
                    Some(from_str(&content).map_err(|err| err.in_file(&path))?.root)
                }
                None => None,
            },
        };

        let Some(mut target) = target else {
            return Ok(Self {
                target: source.clone(),
                source,
            });
        };

        for (idx, child) in source.children.iter().enumerate() {
            let Some(op) = child.as_element().and_then(|e| Operation::from_tag(&e.name)) else {
                continue;
            };
            op.apply(&source, &[idx], &mut target)?;
        }
        Ok(Self { source, target })
    }

    /// Derived tree as parsed
    pub fn source(&self) -> &Element {
        &self.source
    }

    /// Resulting tree
    pub fn target(&self) -> &Element {
        &self.target
    }

    pub fn into_target(self) -> Element {
        self.target
    }

    /// Pretty-printed resulting document
    pub fn to_xml_string(&self) -> String {
        to_pretty_string(&self.target)
    }
}

/// `path` of the first `inherit` among the root's children, if any
///
/// An `inherit` without a non-empty `path` is an error.
pub fn inherit_reference(root: &Element) -> Result<Option<&str>> {
    let Some(inherit) = root.child(INHERIT) else {
        return Ok(None);
    };
    match inherit.attr("path") {
        Some(path) if !path.trim().is_empty() => Ok(Some(path)),
        _ => Err(Error::missing_ancestor(None)),
    }
}

/// Resolve a reference against `dir` unless it is absolute
pub fn anchored(reference: &str, dir: Option<&Path>) -> PathBuf {
    let reference = Path::new(reference);
    match dir {
        Some(dir) if reference.is_relative() => dir.join(reference),
        _ => reference.to_path_buf(),
    }
}
