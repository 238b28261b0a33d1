//! Shared lexing primitives for the XML and XPath parsers

pub mod cursor;

pub use cursor::Cursor;
