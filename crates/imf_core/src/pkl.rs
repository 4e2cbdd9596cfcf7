//! Packing List (SMPTE ST 2067-2) model.
//!
//! The Packing List enumerates the assets of a package with their sizes,
//! MIME types and integrity digests. Its own `Id` identifies the package
//! content and is distinct from the ids of its member assets.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use roxmltree::Node;
use serde::Serialize;

use crate::digest::{self, Base64Blob};
use crate::error::{ImfError, ImfResult};
use crate::identifier::Identifier;
use crate::xml::{self, UserText};

/// An `Asset` of the packing list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackedAsset {
    /// Asset identifier, shared with the asset map and CPL references.
    pub id: Identifier,
    /// Message digest of the asset file.
    pub content_hash: Base64Blob,
    /// Digest algorithm (fragment of the `Algorithm` URI, e.g. `sha1`).
    pub hash_algorithm: String,
    /// File size in bytes.
    pub byte_size: u64,
    /// MIME type of the asset.
    pub mime_type: String,
    /// File name at the time the packing list was written.
    pub original_file_name: Option<UserText>,
    /// Optional description.
    pub annotation: Option<UserText>,
}

impl PackedAsset {
    fn from_node(node: Node<'_, '_>) -> ImfResult<Self> {
        let hash_text = xml::required_text(node, "Hash")?;
        let algorithm_node = xml::required_child(node, "HashAlgorithm")?;
        let hash_algorithm = match algorithm_node.attribute("Algorithm") {
            Some(uri) => digest::algorithm_name(uri).to_string(),
            None => return Err(ImfError::missing("HashAlgorithm@Algorithm")),
        };

        Ok(Self {
            id: xml::required_id(node, "Id")?,
            content_hash: Base64Blob::parse("Hash", &hash_text)?,
            hash_algorithm,
            byte_size: xml::required_u64(node, "Size")?,
            mime_type: xml::required_text(node, "Type")?,
            original_file_name: xml::optional_user_text(node, "OriginalFileName"),
            annotation: xml::optional_user_text(node, "AnnotationText"),
        })
    }
}

/// A parsed Packing List document.
#[derive(Debug, Clone, Serialize)]
pub struct PackingList {
    /// Package content identifier.
    pub id: Identifier,
    /// When the packing list was issued.
    pub issue_date: DateTime<FixedOffset>,
    /// Who issued the packing list.
    pub issuer: UserText,
    /// Facility or system that created the packing list.
    pub creator: UserText,
    /// Optional description of the package.
    pub annotation: Option<UserText>,
    /// Group of packages this one belongs to.
    pub group_id: Option<Identifier>,
    /// Image asset to be used as an icon.
    pub icon_id: Option<Identifier>,
    /// Packed assets, in document order.
    pub assets: Vec<PackedAsset>,
    /// Whether `Signer`/`Signature` elements are present (not verified).
    pub signed: bool,
}

impl PackingList {
    /// Read and parse a packing list file.
    pub fn from_file(path: &Path) -> ImfResult<Self> {
        let content = xml::read_document(path)?;
        Self::parse(&content)
    }

    /// Parse packing list XML.
    pub fn parse(content: &str) -> ImfResult<Self> {
        let doc = xml::parse_document(content)?;
        let root = xml::expect_root(&doc, "PackingList")?;

        let asset_list = xml::required_child(root, "AssetList")?;
        let assets = xml::children_named(asset_list, "Asset")
            .map(PackedAsset::from_node)
            .collect::<ImfResult<Vec<_>>>()?;

        let pkl = Self {
            id: xml::required_id(root, "Id")?,
            issue_date: xml::required_datetime(root, "IssueDate")?,
            issuer: xml::required_user_text(root, "Issuer")?,
            creator: xml::required_user_text(root, "Creator")?,
            annotation: xml::optional_user_text(root, "AnnotationText"),
            group_id: xml::optional_id(root, "GroupId")?,
            icon_id: xml::optional_id(root, "IconId")?,
            assets,
            signed: xml::child(root, "Signer").is_some() && xml::child(root, "Signature").is_some(),
        };

        tracing::debug!(
            "Parsed packing list {} with {} assets",
            pkl.id,
            pkl.assets.len()
        );
        Ok(pkl)
    }

    /// Find an asset by identifier.
    pub fn lookup(&self, id: &Identifier) -> Option<&PackedAsset> {
        self.assets.iter().find(|a| &a.id == id)
    }

    /// Sum of all asset sizes in bytes, saturating at `u64::MAX`.
    pub fn total_size(&self) -> u64 {
        self.assets
            .iter()
            .fold(0u64, |total, a| total.saturating_add(a.byte_size))
    }
}
