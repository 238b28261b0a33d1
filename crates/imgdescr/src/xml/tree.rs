//! Addressing and mutation of elements inside an owned tree
//!
//! Elements carry no parent pointers. A [`NodePath`] is the list of indices
//! into `children` leading from the root to an element, so lookups return
//! paths and mutations go through the root. Paths compare in document order.

use crate::xml::model::{Content, Element};

/// Address of an element relative to a root element
pub type NodePath = Vec<usize>;

impl Element {
    /// Resolve a path to an element
    pub fn get(&self, path: &[usize]) -> Option<&Self> {
        let mut node = self;
        for &idx in path {
            node = node.children.get(idx)?.as_element()?;
        }
        Some(node)
    }

    /// Resolve a path to a mutable element
    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut Self> {
        let mut node = self;
        for &idx in path {
            node = node.children.get_mut(idx)?.as_element_mut()?;
        }
        Some(node)
    }

    /// Descendants named `name` in document order, self excluded
    pub fn find_all(&self, name: &str) -> Vec<NodePath> {
        self.find_where(|e| e.name == name)
    }

    /// Descendants matching `pred` in document order, self excluded
    pub fn find_where<F>(&self, pred: F) -> Vec<NodePath>
    where
        F: Fn(&Self) -> bool,
    {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        collect(self, &pred, &mut prefix, &mut out);
        out
    }

    /// Every element of the subtree at `path` in document order, including it
    pub fn descendants_or_self(&self, path: &[usize]) -> Vec<NodePath> {
        let Some(node) = self.get(path) else {
            return Vec::new();
        };
        let mut out = vec![path.to_vec()];
        let mut prefix = path.to_vec();
        collect(node, &|_: &Self| true, &mut prefix, &mut out);
        out
    }

    /// Leaf elements under `path`; an element without child elements is its own leaf
    pub fn leaves(&self, path: &[usize]) -> Vec<NodePath> {
        let Some(node) = self.get(path) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut prefix = path.to_vec();
        collect_leaves(node, &mut prefix, &mut out);
        out
    }

    /// Tag names from the root down to the element at `path`
    pub fn tag_chain(&self, path: &[usize]) -> Option<Vec<&str>> {
        let mut node = self;
        let mut chain = vec![self.name.as_str()];
        for &idx in path {
            node = node.children.get(idx)?.as_element()?;
            chain.push(node.name.as_str());
        }
        Some(chain)
    }

    /// Detach the element at `path`; the root cannot be detached
    pub fn detach(&mut self, path: &[usize]) -> Option<Self> {
        let (&last, parent) = path.split_last()?;
        let parent = self.get_mut(parent)?;
        if !matches!(parent.children.get(last), Some(Content::Element(_))) {
            return None;
        }
        match parent.children.remove(last) {
            Content::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Detach several elements; returns how many were removed
    ///
    /// Paths are processed from last to first in document order, so
    /// descendants go before their ancestors and earlier paths stay valid.
    pub fn detach_all(&mut self, mut paths: Vec<NodePath>) -> usize {
        paths.sort();
        paths.dedup();
        paths
            .into_iter()
            .rev()
            .filter(|path| self.detach(path).is_some())
            .count()
    }
}

/// Parent address of `path`; `None` for the root
pub fn parent_of(path: &[usize]) -> Option<&[usize]> {
    path.split_last().map(|(_, parent)| parent)
}

fn collect<F>(node: &Element, pred: &F, prefix: &mut NodePath, out: &mut Vec<NodePath>)
where
    F: Fn(&Element) -> bool,
{
    for (idx, child) in node.children.iter().enumerate() {
        if let Content::Element(child) = child {
            prefix.push(idx);
            if pred(child) {
                out.push(prefix.clone());
            }
            collect(child, pred, prefix, out);
            prefix.pop();
        }
    }
}

fn collect_leaves(node: &Element, prefix: &mut NodePath, out: &mut Vec<NodePath>) {
    if !node.has_child_elements() {
        out.push(prefix.clone());
        return;
    }
    for (idx, child) in node.children.iter().enumerate() {
        if let Content::Element(child) = child {
            prefix.push(idx);
            collect_leaves(child, prefix, out);
            prefix.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("image")
            .with_child(
                Element::new("packages")
                    .with_attr("type", "image")
                    .with_child(Element::new("package").with_attr("name", "vim"))
                    .with_child(Element::new("package").with_attr("name", "mc")),
            )
            .with_child(
                Element::new("packages")
                    .with_attr("type", "bootstrap")
                    .with_child(Element::new("package").with_attr("name", "glibc")),
            )
    }

    #[test]
    fn test_find_all_document_order() {
        let tree = sample();
        assert_eq!(tree.find_all("package"), vec![vec![0, 0], vec![0, 1], vec![1, 0]]);
        assert!(tree.find_all("image").is_empty());
    }

    #[test]
    fn test_get_and_tag_chain() {
        let tree = sample();
        assert_eq!(tree.get(&[1, 0]).and_then(|e| e.attr("name")), Some("glibc"));
        assert_eq!(tree.get(&[5]), None);
        assert_eq!(
            tree.tag_chain(&[0, 1]),
            Some(vec!["image", "packages", "package"])
        );
    }

    #[test]
    fn test_leaves() {
        let tree = sample();
        assert_eq!(tree.leaves(&[0]), vec![vec![0, 0], vec![0, 1]]);
        assert_eq!(tree.leaves(&[0, 1]), vec![vec![0, 1]]);
    }

    #[test]
    fn test_detach_all_keeps_paths_valid() {
        let mut tree = sample();
        let paths = tree.find_all("package");
        assert_eq!(tree.detach_all(paths), 3);
        assert!(tree.find_all("package").is_empty());
        assert_eq!(tree.find_all("packages").len(), 2);
    }

    #[test]
    fn test_detach_all_nested() {
        let mut tree = sample();
        let mut paths = tree.find_all("package");
        paths.push(vec![0]);
        assert_eq!(tree.detach_all(paths), 4);
        assert_eq!(tree.find_all("packages"), vec![vec![0]]);
        assert_eq!(tree.get(&[0]).and_then(|e| e.attr("type")), Some("bootstrap"));
        assert!(tree.find_all("package").is_empty());
    }

    #[test]
    fn test_root_is_not_detachable() {
        let mut tree = sample();
        assert!(tree.detach(&[]).is_none());
        assert_eq!(parent_of(&[]), None);
        assert_eq!(parent_of(&[0, 1]), Some(&[0][..]));
    }
}
