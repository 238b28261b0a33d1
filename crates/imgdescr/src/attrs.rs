//! Attribute payloads of `set` operations
//!
//! The payload is a flat YAML mapping of attribute names to scalars, e.g.
//!
//! ```text
//! password: linux
//! pwdformat: plain
//! ```

use indexmap::IndexMap;
use serde_yaml::Value as Yaml;

use crate::error::{Error, ErrorKind, Result, Span};

/// Parse a `set` payload into attribute name/value pairs, in payload order
///
/// Every line is trimmed and blank lines are dropped before parsing, so the
/// payload may be indented to match the surrounding XML.
pub fn parse_attributes(text: &str) -> Result<IndexMap<String, String>> {
    let normalized = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let value: Yaml = serde_yaml::from_str(&normalized)
        .map_err(|err| syntax_error(format!("unable to parse set of attributes: {err}")))?;

    let Yaml::Mapping(mapping) = value else {
        return Err(syntax_error("set of attributes must be a mapping".to_string()));
    };

    let mut attrs = IndexMap::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = scalar_to_string(&key)
            .ok_or_else(|| syntax_error("attribute names must be scalars".to_string()))?;
        let value = scalar_to_string(&value).ok_or_else(|| {
            syntax_error(format!("value of attribute \"{key}\" must be a scalar"))
        })?;
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn scalar_to_string(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Null => Some(String::new()),
        Yaml::Sequence(_) | Yaml::Mapping(_) | Yaml::Tagged(_) => None,
    }
}

fn syntax_error(message: String) -> Error {
    Error::with_message(ErrorKind::AttributeSyntax, Span::empty(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_mapping() -> Result<()> {
        let attrs = parse_attributes("\n        password: linux\n\n        pwdformat: plain\n    ")?;
        assert_eq!(attrs.get("password").map(String::as_str), Some("linux"));
        assert_eq!(attrs.get("pwdformat").map(String::as_str), Some("plain"));
        assert_eq!(
            attrs.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["password", "pwdformat"]
        );
        Ok(())
    }

    #[test]
    fn test_scalars_render_as_text() -> Result<()> {
        let attrs = parse_attributes("id: 1000\nprimary: true\nhome:\nratio: 0.5")?;
        assert_eq!(attrs.get("id").map(String::as_str), Some("1000"));
        assert_eq!(attrs.get("primary").map(String::as_str), Some("true"));
        assert_eq!(attrs.get("home").map(String::as_str), Some(""));
        assert_eq!(attrs.get("ratio").map(String::as_str), Some("0.5"));
        Ok(())
    }

    #[test]
    fn test_quoted_values_keep_special_characters() -> Result<()> {
        let attrs = parse_attributes("password: '$1$wYJUgpM5$RXMMeASDc035eX.NbYWFl0'")?;
        assert_eq!(
            attrs.get("password").map(String::as_str),
            Some("$1$wYJUgpM5$RXMMeASDc035eX.NbYWFl0")
        );
        Ok(())
    }

    #[test]
    fn test_rejects_non_mappings() {
        for bad in ["just a string", "- a\n- b", "a: [1, 2]", "a: {b: c}", "a: b: c", "key: 'open"] {
            let err = parse_attributes(bad);
            assert!(
                matches!(&err, Err(e) if e.kind() == &ErrorKind::AttributeSyntax),
                "{bad:?} should be rejected"
            );
        }
    }
}
