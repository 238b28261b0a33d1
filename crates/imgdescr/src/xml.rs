//! XML document model, parser and pretty-printer

pub mod model;
pub mod parser;
pub mod tree;
pub mod writer;

pub use model::{Content, Document, Element};
pub use parser::{from_str, Config, Parser};
pub use tree::{parent_of, NodePath};
pub use writer::to_pretty_string;
