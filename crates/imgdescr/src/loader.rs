//! Inheritance chain discovery and the end-to-end fold
//!
//! [`Loader::resolve`] walks `inherit` references from the requested
//! description up to the root ancestor. [`Loader::load`] then folds the chain
//! root first, each step's serialized result becoming the next step's base.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::descr::{anchored, inherit_reference, Description};
use crate::error::{Error, ErrorKind, Result, Span};
use crate::locate::find_description;
use crate::xml::from_str;

/// Base directory for relative `inherit` paths
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Anchor {
    /// Directory of the document holding the reference
    #[default]
    Document,
    /// Current working directory of the process
    WorkingDirectory,
}

/// Chain resolution settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Longest accepted chain; 0 disables the check
    pub max_depth: u16,
    pub anchor: Anchor,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new(64, Anchor::Document)
    }
}

impl LoaderConfig {
    pub const fn new(max_depth: u16, anchor: Anchor) -> Self {
        Self { max_depth, anchor }
    }
}

/// Ordered inheritance chain, root ancestor first
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chain {
    paths: Vec<PathBuf>,
    trivial: bool,
}

impl Chain {
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The requested document inherits nothing
    pub fn is_trivial(&self) -> bool {
        self.trivial
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The requested document, last in the chain
    pub fn requested(&self) -> Option<&Path> {
        self.paths.last().map(PathBuf::as_path)
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.paths
    }
}

/// Stack of visited documents; a path is only ever pushed once
#[derive(Debug, Default)]
struct Visited {
    paths: Vec<PathBuf>,
}

impl Visited {
    fn push(&mut self, path: PathBuf) -> bool {
        if self.paths.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    fn len(&self) -> usize {
        self.paths.len()
    }
}

/// Resolves and folds inheritance chains
#[derive(Clone, Copy, Debug, Default)]
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    pub const fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Discover the chain of `start`, root ancestor first
    #[instrument(skip(self))]
    pub fn resolve(&self, start: &Path) -> Result<Chain> {
        let mut visited = Visited::default();
        visited.push(start.to_path_buf());
        let mut current = start.to_path_buf();
        let mut inherits = false;

        loop {
            let content = fs::read_to_string(&current).map_err(|err| Error::access(&current, &err))?;
            let root = from_str(&content).map_err(|err| err.in_file(&current))?.root;

            let Some(reference) = inherit_reference(&root).map_err(|err| err.in_file(&current))?
            else {
                break;
            };
            inherits = true;
            let parent = match self.config.anchor {
                Anchor::Document => anchored(reference, current.parent()),
                Anchor::WorkingDirectory => PathBuf::from(reference),
            };
            if !parent.is_file() {
                return Err(Error::missing_ancestor(Some(&parent)));
            }
            if !visited.push(parent.clone()) {
                warn!(
                    "{} is inherited more than once, diamond or cyclic inheritance is not supported",
                    parent.display()
                );
                break;
            }
            if self.config.max_depth > 0 && visited.len() > usize::from(self.config.max_depth) {
                return Err(Error::new(
                    ErrorKind::MaxDepthExceeded {
                        max: self.config.max_depth,
                    },
                    Span::empty(),
                ));
            }
            debug!("{} inherits {}", current.display(), parent.display());
            current = parent;
        }

        let mut paths = visited.paths;
        paths.reverse();
        let trivial = !inherits;
        info!("Resolved chain of {} description(s)", paths.len());
        Ok(Chain { paths, trivial })
    }

    /// Resolve `start` and fold its chain into one document
    #[instrument(skip(self))]
    pub fn load(&self, start: &Path) -> Result<String> {
        let chain = self.resolve(start)?;
        self.fold(&chain)
    }

    /// Like [`Loader::load`] for the description inside `dir`
    pub fn load_dir(&self, dir: &Path) -> Result<String> {
        self.load(&find_description(dir)?)
    }

    /// Fold an already resolved chain
    pub fn fold(&self, chain: &Chain) -> Result<String> {
        let mut base: Option<String> = None;
        for path in chain.paths() {
            let content = fs::read_to_string(path).map_err(|err| Error::access(path, &err))?;
            // The root ancestor is taken as is, even when a cycle left an `inherit` in it
            let step = match base.as_deref() {
                Some(base) => Description::new(&content, Some(base)).map(|d| d.to_xml_string()),
                None => from_str(&content).map(|d| d.to_pretty_string()),
            }
            .map_err(|err| err.in_file(path))?;
            debug!("Folded {}", path.display());
            base = Some(step);
        }
        base.ok_or_else(|| Error::missing_ancestor(None))
    }
}

/// Resolve with the default configuration
pub fn resolve(start: &Path) -> Result<Chain> {
    Loader::default().resolve(start)
}

/// Load with the default configuration
pub fn load(start: &Path) -> Result<String> {
    Loader::default().load(start)
}
