//! XML parser implementation

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result, Span};
use crate::lexer::Cursor;
use crate::xml::model::{Content, Document, Element};

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

impl Config {
    pub const fn new(max_depth: u16) -> Self {
        Self { max_depth }
    }
}

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser with default config
    pub const fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config { max_depth: 256 })
    }

    /// Create a new XML parser with custom config
    pub const fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        self.skip_misc()?;
        if self.cursor.is_eof() {
            return Err(self.error_here("missing root element"));
        }

        let root = self.parse_element()?;
        self.skip_misc()?;

        if !self.cursor.is_eof() {
            return Err(self.error_here("unexpected content after root element"));
        }

        Ok(Document { root })
    }

    /// Skip whitespace, comments, processing instructions and doctype
    /// outside of the root element
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.eat(b"<?") {
                self.skip_until(b"?>")?;
            } else if self.cursor.eat(b"<!--") {
                self.parse_comment()?;
            } else if self.cursor.eat(b"<!") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        self.expect_byte(b'<')?;
        if self.cursor.current() == Some(b'/') {
            return Err(self.error_here("unexpected closing tag"));
        }

        self.depth = self.depth.saturating_add(1);
        if self.config.max_depth > 0 && self.depth > self.config.max_depth {
            return Err(Error::new(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                Span::at(self.cursor.position()),
            ));
        }

        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            self.depth = self.depth.saturating_sub(1);
            return Ok(Element {
                name,
                attributes,
                children: Vec::new(),
            });
        }

        self.expect_byte(b'>')?;

        let mut children = Vec::new();
        loop {
            if self.cursor.eat(b"</") {
                let close_name = self.parse_name()?;
                if close_name != name {
                    return Err(self.error_here("mismatched closing tag"));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                break;
            }

            if self.cursor.eat(b"<!--") {
                let comment = self.parse_comment()?;
                children.push(Content::Comment(comment));
                continue;
            }

            if self.cursor.eat(b"<![CDATA[") {
                let data = self.read_until(b"]]>")?;
                push_text(&mut children, data);
                continue;
            }

            if self.cursor.eat(b"<?") {
                self.skip_until(b"?>")?;
                continue;
            }

            if self.cursor.current() == Some(b'<') {
                let child = self.parse_element()?;
                children.push(Content::Element(child));
                continue;
            }

            if self.cursor.is_eof() {
                return Err(self.error_here("unterminated element"));
            }

            if let Some(text) = self.parse_text()? {
                push_text(&mut children, text);
            }
        }

        self.depth = self.depth.saturating_sub(1);
        Ok(Element {
            name,
            attributes,
            children,
        })
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            let had_space = matches!(self.cursor.current(), Some(b' ' | b'\t' | b'\r' | b'\n'));
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) if !had_space => {
                    return Err(self.error_here("expected whitespace before attribute"));
                }
                Some(_) => {}
                None => return Err(self.error_here("unexpected end of input")),
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(self.error_here("duplicate attribute"));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = self.bytes_to_string(raw)?;
                return self.decode_entities(&text);
            }
            if b == b'<' {
                return Err(self.error_here("'<' in attribute value"));
            }
            self.cursor.advance();
        }

        Err(self.error_here("unterminated attribute value"))
    }

    fn parse_text(&mut self) -> Result<Option<String>> {
        let raw = self.cursor.take_while(|b| b != b'<');
        let text = self.bytes_to_string(raw)?;
        let text = self.decode_entities(&text)?;

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        if !self.cursor.current().is_some_and(is_name_start) {
            return Err(self.error_here("expected name"));
        }
        let raw = self.cursor.take_while(is_name_char);
        self.bytes_to_string(raw)
    }

    fn skip_doctype(&mut self) -> Result<()> {
        // Internal subsets may nest '<' ... '>' pairs
        let mut level = 1usize;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match b {
                b'<' => level += 1,
                b'>' => {
                    level -= 1;
                    if level == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(self.error_here("unterminated markup"))
    }

    /// Comment body after `<!--`; `--` may not occur inside it
    fn parse_comment(&mut self) -> Result<String> {
        let start = self.cursor.position();
        let comment = self.read_until(b"-->")?;
        if comment.contains("--") || comment.ends_with('-') {
            return Err(Error::malformed_at(start, "'--' inside comment"));
        }
        Ok(comment)
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        self.read_until(pattern).map(|_| ())
    }

    /// Consume input up to and including `pattern`, returning what came before it
    fn read_until(&mut self, pattern: &[u8]) -> Result<String> {
        match self.cursor.take_until(pattern) {
            Some(raw) => self.bytes_to_string(raw),
            None => Err(self.error_here("unterminated markup")),
        }
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            Err(self.error_here(&format!("expected '{}'", char::from(expected))))
        }
    }

    fn error_here(&self, message: &str) -> Error {
        Error::malformed_at(self.cursor.position(), message)
    }

    fn bytes_to_string(&self, bytes: &[u8]) -> Result<String> {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| self.error_here("invalid utf-8"))
    }

    fn decode_entities(&self, input: &str) -> Result<String> {
        if !input.contains('&') {
            return Ok(input.to_string());
        }

        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars();
        while let Some(ch) = chars.next() {
            if ch != '&' {
                result.push(ch);
                continue;
            }

            let mut entity = String::new();
            let mut closed = false;
            for next in chars.by_ref() {
                if next == ';' {
                    closed = true;
                    break;
                }
                entity.push(next);
            }

            let decoded = match entity.as_str() {
                _ if !closed => None,
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => decode_numeric_entity(&entity),
            };

            match decoded {
                Some(ch) => result.push(ch),
                None => return Err(self.error_here(&format!("invalid xml entity '&{entity}'"))),
            }
        }

        Ok(result)
    }
}

/// Parse an XML document from a string
pub fn from_str(input: &str) -> Result<Document> {
    Parser::new(input.as_bytes()).parse()
}

/// Adjacent text and CDATA sections collapse into one text node
fn push_text(children: &mut Vec<Content>, text: String) {
    if let Some(Content::Text(prev)) = children.last_mut() {
        prev.push_str(&text);
    } else {
        children.push(Content::Text(text));
    }
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}
