//! Leaf-value readers shared by the document parsers.
//!
//! Elements are matched by local name; IMF documents carry several schema
//! revisions with different namespaces and the element names are stable
//! across them.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use roxmltree::{Document, Node, ParsingOptions};
use serde::{Deserialize, Serialize};

use crate::error::{ImfError, ImfResult};
use crate::identifier::Identifier;

/// Default `language` attribute of `UserText` elements.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Human-readable text with an optional language tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserText {
    /// The text content.
    pub text: String,
    /// RFC 5646 language tag (`en` when absent).
    pub language: String,
}

impl UserText {
    /// Create text in the default language.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Read a `UserText` element.
    pub fn from_node(node: Node<'_, '_>) -> Self {
        Self {
            text: node.text().map(str::trim).unwrap_or_default().to_string(),
            language: node
                .attribute("language")
                .unwrap_or(DEFAULT_LANGUAGE)
                .to_string(),
        }
    }
}

impl fmt::Display for UserText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Read a document from disk.
pub fn read_document(path: &Path) -> ImfResult<String> {
    std::fs::read_to_string(path).map_err(|e| ImfError::io(path, e))
}

/// Parse XML text into a DOM. DTDs are tolerated since some authoring
/// tools emit a doctype.
pub fn parse_document(xml: &str) -> ImfResult<Document<'_>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(xml, options)?)
}

/// Return the root element if its local name matches.
pub fn expect_root<'a, 'i>(doc: &'a Document<'i>, expected: &'static str) -> ImfResult<Node<'a, 'i>> {
    let root = doc.root_element();
    let found = root.tag_name().name();
    if found != expected {
        return Err(ImfError::UnexpectedRoot {
            expected,
            found: found.to_string(),
        });
    }
    Ok(root)
}

/// Element children of a node.
pub fn elements<'a, 'i>(node: Node<'a, 'i>) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(|n| n.is_element())
}

/// Element children with the given local name.
pub fn children_named<'a, 'i>(
    node: Node<'a, 'i>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'i>> {
    elements(node).filter(move |n| n.tag_name().name() == name)
}

/// First element child with the given local name.
pub fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    elements(node).find(|n| n.tag_name().name() == name)
}

/// First element child with the given local name, or `MissingRequiredField`.
pub fn required_child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> ImfResult<Node<'a, 'i>> {
    child(node, name).ok_or_else(|| missing(node, name))
}

/// Trimmed text of an optional child element.
pub fn optional_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name).map(|n| n.text().map(str::trim).unwrap_or_default().to_string())
}

/// Trimmed text of a mandatory child element. Empty text counts as missing.
pub fn required_text(node: Node<'_, '_>, name: &str) -> ImfResult<String> {
    match optional_text(node, name) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(missing(node, name)),
    }
}

/// Optional non-negative integer child.
pub fn optional_u64(node: Node<'_, '_>, name: &str) -> ImfResult<Option<u64>> {
    optional_text(node, name)
        .map(|text| {
            text.parse::<u64>()
                .map_err(|_| ImfError::invalid_value(name, text.as_str()))
        })
        .transpose()
}

/// Mandatory non-negative integer child.
pub fn required_u64(node: Node<'_, '_>, name: &str) -> ImfResult<u64> {
    let text = required_text(node, name)?;
    text.parse::<u64>()
        .map_err(|_| ImfError::invalid_value(name, text))
}

/// Optional `xs:boolean` child (`true`/`false`/`1`/`0`).
pub fn optional_bool(node: Node<'_, '_>, name: &str) -> ImfResult<Option<bool>> {
    optional_text(node, name)
        .map(|text| match text.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ImfError::invalid_value(name, text.as_str())),
        })
        .transpose()
}

/// Mandatory identifier child.
pub fn required_id(node: Node<'_, '_>, name: &str) -> ImfResult<Identifier> {
    Identifier::parse(&required_text(node, name)?)
}

/// Optional identifier child.
pub fn optional_id(node: Node<'_, '_>, name: &str) -> ImfResult<Option<Identifier>> {
    optional_text(node, name)
        .filter(|text| !text.is_empty())
        .map(|text| Identifier::parse(&text))
        .transpose()
}

/// Optional `UserText` child.
pub fn optional_user_text(node: Node<'_, '_>, name: &str) -> Option<UserText> {
    child(node, name).map(UserText::from_node)
}

/// Mandatory `UserText` child.
pub fn required_user_text(node: Node<'_, '_>, name: &str) -> ImfResult<UserText> {
    let text = required_child(node, name).map(UserText::from_node)?;
    if text.text.is_empty() {
        return Err(missing(node, name));
    }
    Ok(text)
}

/// Mandatory `xs:dateTime` child.
pub fn required_datetime(node: Node<'_, '_>, name: &str) -> ImfResult<DateTime<FixedOffset>> {
    let text = required_text(node, name)?;
    parse_xsd_datetime(&text)
}

/// Optional `xs:dateTime` child.
pub fn optional_datetime(
    node: Node<'_, '_>,
    name: &str,
) -> ImfResult<Option<DateTime<FixedOffset>>> {
    optional_text(node, name)
        .map(|text| parse_xsd_datetime(&text))
        .transpose()
}

/// Parse an `xs:dateTime` of the form `YYYY-MM-DDTHH:MM:SS[.fff][Z|±HH:MM]`.
///
/// A value without a zone designator is taken as UTC.
pub fn parse_xsd_datetime(text: &str) -> ImfResult<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt);
    }

    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_| ImfError::invalid_value("dateTime", text))?;
    Ok(Utc.from_utc_datetime(&naive).fixed_offset())
}

fn missing(parent: Node<'_, '_>, name: &str) -> ImfError {
    ImfError::missing(format!("{}/{}", parent.tag_name().name(), name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const SAMPLE: &str = r#"<Root xmlns="urn:test">
  <Id>urn:uuid:0f8a9b3e-5c2d-4e1f-8a7b-6c5d4e3f2a1b</Id>
  <Count> 42 </Count>
  <Bad>forty</Bad>
  <Flag>true</Flag>
  <Title language="fr">Le Titre</Title>
  <Plain>Untagged</Plain>
  <Empty/>
</Root>"#;

    #[test]
    fn reads_scalars() {
        let doc = parse_document(SAMPLE).unwrap();
        let root = expect_root(&doc, "Root").unwrap();

        assert!(required_id(root, "Id").is_ok());
        assert_eq!(required_u64(root, "Count").unwrap(), 42);
        assert_eq!(optional_u64(root, "Missing").unwrap(), None);
        assert!(matches!(
            optional_u64(root, "Bad"),
            Err(ImfError::InvalidValue { .. })
        ));
        assert_eq!(optional_bool(root, "Flag").unwrap(), Some(true));
    }

    #[test]
    fn missing_field_names_parent() {
        let doc = parse_document(SAMPLE).unwrap();
        let root = doc.root_element();
        match required_text(root, "Issuer") {
            Err(ImfError::MissingRequiredField(field)) => assert_eq!(field, "Root/Issuer"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(required_text(root, "Empty").is_err());
    }

    #[test]
    fn user_text_language_default() {
        let doc = parse_document(SAMPLE).unwrap();
        let root = doc.root_element();
        let title = optional_user_text(root, "Title").unwrap();
        assert_eq!(title.text, "Le Titre");
        assert_eq!(title.language, "fr");
        let plain = optional_user_text(root, "Plain").unwrap();
        assert_eq!(plain.language, "en");
    }

    #[test]
    fn unexpected_root_is_reported() {
        let doc = parse_document(SAMPLE).unwrap();
        assert!(matches!(
            expect_root(&doc, "AssetMap"),
            Err(ImfError::UnexpectedRoot { .. })
        ));
    }

    #[test]
    fn datetime_profiles() {
        let utc = parse_xsd_datetime("2021-03-04T05:06:07Z").unwrap();
        assert_eq!(utc.offset().local_minus_utc(), 0);
        assert_eq!(utc.hour(), 5);

        let offset = parse_xsd_datetime("2021-03-04T05:06:07.250-07:00").unwrap();
        assert_eq!(offset.offset().local_minus_utc(), -7 * 3600);
        assert_eq!(offset.nanosecond(), 250_000_000);

        let bare = parse_xsd_datetime("2021-03-04T05:06:07").unwrap();
        assert_eq!(bare.offset().local_minus_utc(), 0);
        assert_eq!(bare.year(), 2021);

        assert!(parse_xsd_datetime("2021-03-04").is_err());
        assert!(parse_xsd_datetime("yesterday").is_err());
    }
}
