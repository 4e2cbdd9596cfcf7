//! Output Profile List (SMPTE ST 2067-100) identity.
//!
//! Only the header is read; aliases and processing macros are not modelled.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::ImfResult;
use crate::identifier::Identifier;
use crate::xml::{self, UserText};

/// A parsed Output Profile List header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputProfileList {
    /// Output profile list identifier.
    pub id: Identifier,
    /// Optional description.
    pub annotation: Option<UserText>,
    /// When the list was issued, if stated.
    pub issue_date: Option<DateTime<FixedOffset>>,
    /// Composition the profile applies to.
    pub composition_id: Option<Identifier>,
}

impl OutputProfileList {
    /// Read and parse an output profile list file.
    pub fn from_file(path: &Path) -> ImfResult<Self> {
        let content = xml::read_document(path)?;
        Self::parse(&content)
    }

    /// Parse output profile list XML.
    pub fn parse(content: &str) -> ImfResult<Self> {
        let doc = xml::parse_document(content)?;
        let root = xml::expect_root(&doc, "OutputProfileList")?;

        let opl = Self {
            id: xml::required_id(root, "Id")?,
            annotation: xml::optional_user_text(root, "Annotation"),
            issue_date: xml::optional_datetime(root, "IssueDate")?,
            composition_id: xml::optional_id(root, "CompositionPlaylistId")?,
        };
        tracing::debug!("Parsed output profile list {}", opl.id);
        Ok(opl)
    }
}
