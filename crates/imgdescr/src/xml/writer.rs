//! Pretty-printing XML serializer
//!
//! Output is independent of the source formatting: an XML declaration, one
//! node per line, two-space indentation, no blank lines and no trailing
//! whitespace. Elements holding only text are written inline.
//!
//! Text next to child elements is trimmed and put on its own indented line.
//! Reparsing keeps the indentation as part of the text, so mixed content is
//! stable at the string level only: `to_pretty_string` of the reparsed tree
//! reproduces the first output.

use crate::xml::model::{Content, Document, Element};

const INDENT: &str = "  ";
const DECLARATION: &str = "<?xml version=\"1.0\" ?>";

impl Document {
    /// Serialize to a pretty-printed XML string
    pub fn to_pretty_string(&self) -> String {
        to_pretty_string(&self.root)
    }
}

/// Serialize `root` as a complete document
pub fn to_pretty_string(root: &Element) -> String {
    let mut raw = String::from(DECLARATION);
    raw.push('\n');
    write_element(root, 0, &mut raw);

    raw.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_element(element: &Element, depth: usize, out: &mut String) {
    push_indent(out, depth);
    write_start_tag(element, out);

    if element.children.is_empty() {
        out.push_str("/>\n");
        return;
    }

    out.push('>');

    let text_only = element
        .children
        .iter()
        .all(|c| matches!(c, Content::Text(_)));

    if text_only {
        for child in &element.children {
            if let Content::Text(text) = child {
                escape_text(text, out);
            }
        }
    } else {
        out.push('\n');
        for child in &element.children {
            match child {
                Content::Element(child) => write_element(child, depth + 1, out),
                Content::Text(text) => {
                    push_indent(out, depth + 1);
                    escape_text(text.trim(), out);
                    out.push('\n');
                }
                Content::Comment(comment) => {
                    push_indent(out, depth + 1);
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->\n");
                }
            }
        }
        push_indent(out, depth);
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push_str(">\n");
}

fn write_start_tag(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn escape_text(input: &str, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(input: &str, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::xml::parser::from_str;

    #[test]
    fn test_pretty_layout() {
        let tree = Element::new("image")
            .with_attr("name", "test")
            .with_child(
                Element::new("packages")
                    .with_attr("type", "image")
                    .with_child(Element::new("package").with_attr("name", "vim")),
            )
            .with_child(Element::new("description").with_text("Kiwi & friends"));

        let expected = "<?xml version=\"1.0\" ?>\n\
                        <image name=\"test\">\n  \
                        <packages type=\"image\">\n    \
                        <package name=\"vim\"/>\n  \
                        </packages>\n  \
                        <description>Kiwi &amp; friends</description>\n\
                        </image>";
        assert_eq!(to_pretty_string(&tree), expected);
    }

    #[test]
    fn test_reformats_source_layout() -> Result<()> {
        let doc = from_str(
            "<image>\n\n\n   <users>   <user name=\"root\"\n   pwd=\"x\"/></users>  <!--c--></image>",
        )?;
        assert_eq!(
            doc.to_pretty_string(),
            "<?xml version=\"1.0\" ?>\n<image>\n  <users>\n    <user name=\"root\" pwd=\"x\"/>\n  </users>\n  <!--c-->\n</image>"
        );
        Ok(())
    }

    #[test]
    fn test_no_blank_lines_in_multiline_text() -> Result<()> {
        let doc = from_str("<set xpath=\"//user\">\n\n  password: linux\n\n  pwdformat: plain\n</set>")?;
        let out = doc.to_pretty_string();
        assert!(out.lines().all(|l| !l.trim().is_empty()));
        assert!(out.contains("password: linux"));
        Ok(())
    }

    #[test]
    fn test_attribute_escaping_survives_reparse() -> Result<()> {
        let tree = Element::new("a").with_attr("v", "say \"hi\" <now> & then");
        let doc = from_str(&to_pretty_string(&tree))?;
        assert_eq!(doc.root, tree);
        Ok(())
    }
}
