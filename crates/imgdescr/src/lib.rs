//! imgdescr - inheritance resolver for XML appliance descriptions
//!
//! A description may `inherit` another one and edit it with `add`, `remove`,
//! `merge`, `replace`, `remove_any` and `set` operations. [`Loader`] walks
//! the chain of ancestors and folds it into one pretty-printed document.
//!
//! # Quick Start
//!
//! ```
//! use imgdescr::Description;
//! # fn main() -> Result<(), imgdescr::Error> {
//! let base = r#"<image name="base">
//!     <packages type="image"><package name="vim"/></packages>
//! </image>"#;
//! let derived = r#"<image>
//!     <add><packages type="image"><package name="mc"/></packages></add>
//!     <set xpath="//package[@name='vim']">arch: x86_64</set>
//! </image>"#;
//!
//! let out = Description::new(derived, Some(base))?.to_xml_string();
//! assert!(out.contains(r#"<package name="vim" arch="x86_64"/>"#));
//! assert!(out.contains(r#"<package name="mc"/>"#));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod lexer;

pub mod xml;
pub use xml::{Content, Document, Element, NodePath};

pub mod xpath;
pub use xpath::XPath;

pub mod attrs;
pub use attrs::parse_attributes;

pub mod descr;
pub use descr::{Description, Operation};

pub mod loader;
pub use loader::{load, resolve, Anchor, Chain, Loader, LoaderConfig};

pub mod locate;
pub use locate::find_description;

pub mod swap;
pub use swap::Substitution;
