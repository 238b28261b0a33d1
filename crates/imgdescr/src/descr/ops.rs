//! Edit operations of a derived description
//!
//! Each top-level child of a derived document whose tag is one of
//! [`Operation::ALL`] edits the target tree. Lookup goes through a static
//! table, and every handler receives the derived tree plus the address of
//! its operation element so the structural path of a payload can be
//! computed with the operation's own tag stripped.

use tracing::{debug, error, warn};

use crate::attrs::parse_attributes;
use crate::error::{ErrorKind, Result};
use crate::xml::{parent_of, Element, NodePath};
use crate::xpath::XPath;

/// Edit operation vocabulary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Remove,
    Merge,
    Replace,
    RemoveAny,
    Set,
}

type Handler = fn(&Source<'_>, &mut Element) -> Result<()>;

const TABLE: [(&str, Operation); 6] = [
    ("add", Operation::Add),
    ("remove", Operation::Remove),
    ("merge", Operation::Merge),
    ("replace", Operation::Replace),
    ("remove_any", Operation::RemoveAny),
    ("set", Operation::Set),
];

impl Operation {
    pub const ALL: [Self; 6] = [
        Self::Add,
        Self::Remove,
        Self::Merge,
        Self::Replace,
        Self::RemoveAny,
        Self::Set,
    ];

    /// Exact, case-sensitive tag lookup
    pub fn from_tag(tag: &str) -> Option<Self> {
        TABLE
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|&(_, op)| op)
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Merge => "merge",
            Self::Replace => "replace",
            Self::RemoveAny => "remove_any",
            Self::Set => "set",
        }
    }

    /// Apply the operation element at `path` of `source` to `target`
    pub fn apply(self, source: &Element, path: &[usize], target: &mut Element) -> Result<()> {
        let Some(element) = source.get(path) else {
            return Ok(());
        };
        debug!("Applying <{}> operation", self.tag());
        let source = Source {
            root: source,
            path,
            element,
            op: self,
        };
        (self.handler())(&source, target)
    }

    const fn handler(self) -> Handler {
        match self {
            Self::Add => add,
            Self::Remove => remove,
            Self::Merge => merge,
            Self::Replace => replace,
            Self::RemoveAny => remove_any,
            Self::Set => set,
        }
    }
}

/// Operation element inside the derived tree
struct Source<'a> {
    root: &'a Element,
    path: &'a [usize],
    element: &'a Element,
    op: Operation,
}

impl<'a> Source<'a> {
    /// Child elements with their addresses in the derived tree
    fn payloads(&self) -> impl Iterator<Item = (NodePath, &'a Element)> + 'a {
        let base = self.path;
        self.element
            .children
            .iter()
            .enumerate()
            .filter_map(move |(idx, child)| {
                let child = child.as_element()?;
                let mut path = base.to_vec();
                path.push(idx);
                Some((path, child))
            })
    }

    /// First element child, comments and text skipped
    fn first_payload(&self) -> Option<(NodePath, &'a Element)> {
        self.payloads().next()
    }

    /// Tag chain of a payload with the operation tag stripped out
    fn stripped_chain(&self, path: &[usize]) -> Vec<&'a str> {
        structural_path(self.root, path, self.op.tag())
    }
}

/// Tag chain from the root down to `path`, without any `op` segment
pub fn structural_path<'a>(root: &'a Element, path: &[usize], op: &str) -> Vec<&'a str> {
    root.tag_chain(path)
        .unwrap_or_default()
        .into_iter()
        .filter(|tag| *tag != op)
        .collect()
}

fn add(source: &Source<'_>, target: &mut Element) -> Result<()> {
    for (_, payload) in source.payloads() {
        let matches = target.find_where(|e| e.same_identity(payload));
        if !matches.is_empty() {
            for path in &matches {
                if let Some(existing) = target.get_mut(path) {
                    for child in payload.child_elements() {
                        existing.push(child.clone());
                    }
                }
            }
            debug!("Added to {} existing <{}> element(s)", matches.len(), payload.name);
            continue;
        }

        let sibling = target.find_all(&payload.name).pop();
        let parent = sibling
            .as_deref()
            .and_then(parent_of)
            .map(<[usize]>::to_vec);
        match parent.and_then(|p| target.get_mut(&p)) {
            Some(parent) => {
                debug!("Inserted new <{}> next to its siblings", payload.name);
                parent.push(payload.clone());
            }
            None => warn!(
                "No <{}> element to insert the new one next to, skipping",
                payload.name
            ),
        }
    }
    Ok(())
}

fn remove(source: &Source<'_>, target: &mut Element) -> Result<()> {
    for (path, payload) in source.payloads() {
        let doomed = if payload.has_child_elements() {
            let chain = source.stripped_chain(&path);
            let leaves = payload.leaves(&[]);
            let leaves: Vec<&Element> = leaves.iter().filter_map(|p| payload.get(p)).collect();

            let mut doomed = Vec::new();
            for container in target.find_where(|e| e.same_identity(payload)) {
                if target.tag_chain(&container).as_ref() != Some(&chain) {
                    continue;
                }
                doomed.extend(target.leaves(&container).into_iter().filter(|leaf| {
                    target
                        .get(leaf)
                        .is_some_and(|leaf| leaves.iter().any(|l| l.same_identity(leaf)))
                }));
            }
            doomed
        } else {
            target.find_where(|e| e.same_identity(payload))
        };
        let removed = target.detach_all(doomed);
        debug!("Removed {removed} element(s) for <{}>", payload.name);
    }
    Ok(())
}

fn merge(source: &Source<'_>, target: &mut Element) -> Result<()> {
    let Some((path, payload)) = source.first_payload() else {
        return Ok(());
    };
    let chain = source.stripped_chain(&path);
    let candidates = target.find_where(|e| {
        e.name == payload.name && (payload.attributes.is_empty() || e.attributes == payload.attributes)
    });

    for candidate in candidates {
        if target.tag_chain(&candidate).as_ref() != Some(&chain) {
            continue;
        }
        let Some(existing) = target.get_mut(&candidate) else {
            continue;
        };
        for child in payload.child_elements() {
            if existing.child(&child.name).is_none() {
                debug!("Merged <{}> into <{}>", child.name, existing.name);
                existing.push(child.clone());
            }
        }
    }
    Ok(())
}

fn replace(source: &Source<'_>, target: &mut Element) -> Result<()> {
    let Some((_, payload)) = source.first_payload() else {
        return Ok(());
    };
    // Reverse document order keeps the remaining addresses valid
    let mut matches = target.find_where(|e| e.same_identity(payload));
    matches.reverse();
    for path in matches {
        let Some(parent) = parent_of(&path).map(<[usize]>::to_vec) else {
            continue;
        };
        if target.detach(&path).is_none() {
            continue;
        }
        if let Some(parent) = target.get_mut(&parent) {
            parent.push(payload.clone());
        }
    }
    Ok(())
}

fn remove_any(source: &Source<'_>, target: &mut Element) -> Result<()> {
    let Some((_, payload)) = source.first_payload() else {
        return Ok(());
    };
    let matches =
        target.find_where(|e| e.name == payload.name && e.has_attributes_of(&payload.attributes));
    let removed = target.detach_all(matches);
    debug!("Removed {removed} element(s) matching <{}>", payload.name);
    Ok(())
}

fn set(source: &Source<'_>, target: &mut Element) -> Result<()> {
    let op = source.element;
    let payload = op.text().unwrap_or_default();
    let Some(expr) = op.attr("xpath") else {
        debug!("Skipping <set> without xpath");
        return Ok(());
    };
    if payload.trim().is_empty() {
        debug!("Skipping <set> without attributes for {expr}");
        return Ok(());
    }

    let attrs = match parse_attributes(&payload) {
        Ok(attrs) => attrs,
        Err(err) if matches!(err.kind(), ErrorKind::AttributeSyntax) => {
            error!("Unable to parse set of attributes in YAML for XPath {expr}: {err}");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    let matches = XPath::compile(expr)?.select(target)?;
    debug!("Setting {} attribute(s) on {} element(s)", attrs.len(), matches.len());
    for path in matches {
        if let Some(element) = target.get_mut(&path) {
            for (key, value) in &attrs {
                element.set_attr(key.clone(), value.clone());
            }
        }
    }
    Ok(())
}
