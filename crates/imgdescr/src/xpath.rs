//! XPath 1.0 subset used by `set` operations
//!
//! Supported: absolute and relative location paths, `//`, `.`, `..`, `*`,
//! `@attr`, the `child`, `descendant`, `descendant-or-self`, `parent`,
//! `ancestor`, `ancestor-or-self`, `self` and `attribute` axes, `text()` and
//! `node()` tests, predicates with positions, comparisons, `and`, `or`, `|`,
//! filter expressions such as `(//user)[1]/@name` and the functions `last`,
//! `position`, `count`, `not`, `true`, `false`, `contains`, `starts-with`,
//! `name`, `string` and `normalize-space`. Expression nesting is bounded by
//! [`parser::Config`].
//! Arithmetic and variables are not supported.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

use crate::error::{Error, ErrorKind, Result, Span};
use crate::xml::{Element, NodePath};

pub use ast::Expr;
pub use eval::{Evaluator, Node, Value};

/// A compiled XPath expression
#[derive(Clone, Debug, PartialEq)]
pub struct XPath {
    source: String,
    expr: Expr,
}

impl XPath {
    pub fn compile(source: &str) -> Result<Self> {
        Ok(Self {
            source: source.to_string(),
            expr: parser::parse(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Elements selected with `root` as the context node, in document order
    ///
    /// Attribute and text nodes in the result are dropped; an expression
    /// that does not produce a node-set is an error.
    pub fn select(&self, root: &Element) -> Result<Vec<NodePath>> {
        match Evaluator::new(root).evaluate(&self.expr) {
            Ok(Value::Nodes(nodes)) => Ok(nodes
                .into_iter()
                .filter_map(|n| match n {
                    Node::Element(path) => Some(path),
                    _ => None,
                })
                .collect()),
            Ok(_) => Err(self.error("expression does not select nodes")),
            Err(err) => Err(self.error(err.message())),
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::with_message(
            ErrorKind::InvalidXPath {
                expr: self.source.clone(),
            },
            Span::empty(),
            format!("{message} in \"{}\"", self.source),
        )
    }
}

/// Compile and evaluate in one go
pub fn select(root: &Element, expr: &str) -> Result<Vec<NodePath>> {
    XPath::compile(expr)?.select(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::from_str;

    const DESCR: &str = r#"<image schemaversion="7.4" name="base">
        <preferences profiles="live">
            <version>1.0.0</version>
            <type image="iso" primary="true"/>
        </preferences>
        <preferences profiles="oem">
            <type image="oem" filesystem="xfs"/>
        </preferences>
        <users>
            <user name="root" groups="root" home="/root"/>
            <user name="tux" groups="users" home="/home/tux"/>
        </users>
        <packages type="image">
            <package name="vim"/>
            <package name="kernel-default"/>
            <package name="kernel-firmware"/>
        </packages>
    </image>"#;

    fn names(root: &Element, expr: &str) -> Result<Vec<String>> {
        Ok(select(root, expr)?
            .iter()
            .filter_map(|p| root.get(p))
            .map(|e| {
                e.attr("name")
                    .or_else(|| e.attr("image"))
                    .unwrap_or(e.name.as_str())
                    .to_string()
            })
            .collect())
    }

    #[test]
    fn test_descendant_and_absolute() -> Result<()> {
        let doc = from_str(DESCR)?;
        assert_eq!(names(&doc.root, "//user")?, vec!["root", "tux"]);
        assert_eq!(names(&doc.root, "/image/users/user")?, vec!["root", "tux"]);
        assert_eq!(names(&doc.root, "users/user")?, vec!["root", "tux"]);
        assert_eq!(names(&doc.root, "/image")?, vec!["base"]);
        assert!(names(&doc.root, "/users")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_attribute_predicates() -> Result<()> {
        let doc = from_str(DESCR)?;
        assert_eq!(names(&doc.root, "//user[@name='tux']")?, vec!["tux"]);
        assert_eq!(names(&doc.root, "//user[@name!='tux']")?, vec!["root"]);
        assert_eq!(names(&doc.root, "//type[@filesystem]")?, vec!["oem"]);
        assert_eq!(
            names(&doc.root, "//preferences[@profiles='live']/type")?,
            vec!["iso"]
        );
        assert_eq!(
            names(&doc.root, "//user[@groups='users' or @name='root']")?,
            vec!["root", "tux"]
        );
        Ok(())
    }

    #[test]
    fn test_positions_and_functions() -> Result<()> {
        let doc = from_str(DESCR)?;
        assert_eq!(names(&doc.root, "//package[2]")?, vec!["kernel-default"]);
        assert_eq!(names(&doc.root, "//package[last()]")?, vec!["kernel-firmware"]);
        assert_eq!(
            names(&doc.root, "//package[starts-with(@name, 'kernel')]")?,
            vec!["kernel-default", "kernel-firmware"]
        );
        assert_eq!(
            names(&doc.root, "//package[not(contains(@name, 'kernel'))]")?,
            vec!["vim"]
        );
        assert_eq!(
            names(&doc.root, "//preferences[version='1.0.0']")?,
            vec!["preferences"]
        );
        assert_eq!(names(&doc.root, "//packages[count(package) > 2]")?, vec!["packages"]);
        Ok(())
    }

    #[test]
    fn test_parent_and_union() -> Result<()> {
        let doc = from_str(DESCR)?;
        assert_eq!(names(&doc.root, "//type[@image='oem']/..")?, vec!["preferences"]);
        assert_eq!(
            names(&doc.root, "//package[1] | //user[1]")?,
            vec!["root", "vim"]
        );
        assert_eq!(names(&doc.root, "//user/@name")?, Vec::<String>::new());
        Ok(())
    }

    #[test]
    fn test_filter_expressions() -> Result<()> {
        let doc = from_str(DESCR)?;
        assert_eq!(names(&doc.root, "(//user)[1]")?, vec!["root"]);
        assert_eq!(names(&doc.root, "(//package)[last()]")?, vec!["kernel-firmware"]);
        assert_eq!(
            names(&doc.root, "(//preferences)[2]/type")?,
            vec!["oem"]
        );
        assert_eq!(
            names(&doc.root, "(//user | //package)[@name='vim']/..")?,
            vec!["packages"]
        );
        Ok(())
    }

    #[test]
    fn test_non_node_result_is_rejected() -> Result<()> {
        let doc = from_str(DESCR)?;
        for expr in ["count(//user)", "('a')[1]", "'a'/b"] {
            let err = select(&doc.root, expr);
            assert!(
                matches!(err, Err(e) if matches!(e.kind(), ErrorKind::InvalidXPath { .. })),
                "{expr:?} should be rejected"
            );
        }
        Ok(())
    }
}
