//! Asset Map (SMPTE ST 429-9) model.
//!
//! `ASSETMAP.xml` is the entry point of a package: it maps every
//! package-wide identifier to the file chunks holding that asset and flags
//! which assets are Packing Lists.

use std::path::{Component, Path};

use chrono::{DateTime, FixedOffset};
use roxmltree::Node;
use serde::Serialize;

use crate::error::{ImfError, ImfResult};
use crate::identifier::Identifier;
use crate::xml::{self, UserText};

/// Default `VolumeIndex` of a chunk.
pub const DEFAULT_VOLUME_INDEX: u32 = 1;

/// A contiguous piece of an asset stored in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Path of the file, relative to the volume root.
    pub file_path: String,
    /// Volume holding the file.
    pub volume_index: u32,
    /// Byte offset of this chunk within the assembled asset.
    pub byte_offset: u64,
    /// Chunk length in bytes, when declared.
    pub byte_length: Option<u64>,
}

impl Chunk {
    /// Create a single-volume chunk at offset zero.
    pub fn new(file_path: impl Into<String>, byte_length: Option<u64>) -> Self {
        Self {
            file_path: file_path.into(),
            volume_index: DEFAULT_VOLUME_INDEX,
            byte_offset: 0,
            byte_length,
        }
    }

    /// The file path, checked to stay inside the volume root.
    ///
    /// Absolute paths and `..` components fail with `InvalidValue`.
    pub fn relative_path(&self) -> ImfResult<&Path> {
        let path = Path::new(&self.file_path);
        let escapes = path.components().any(|c| {
            matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
        });
        if self.file_path.is_empty() || path.is_absolute() || escapes {
            return Err(ImfError::invalid_value("Chunk/Path", self.file_path.as_str()));
        }
        Ok(path)
    }

    fn from_node(node: Node<'_, '_>) -> ImfResult<Self> {
        let volume_index = match xml::optional_u64(node, "VolumeIndex")? {
            Some(index) => u32::try_from(index)
                .map_err(|_| ImfError::invalid_value("VolumeIndex", index.to_string()))?,
            None => DEFAULT_VOLUME_INDEX,
        };

        let chunk = Self {
            file_path: xml::required_text(node, "Path")?,
            volume_index,
            byte_offset: xml::optional_u64(node, "Offset")?.unwrap_or(0),
            byte_length: xml::optional_u64(node, "Length")?,
        };
        chunk.relative_path()?;
        Ok(chunk)
    }
}

/// An `Asset` entry of the asset map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Package-wide identifier.
    pub id: Identifier,
    /// Chunks holding the asset, in document order.
    pub chunks: Vec<Chunk>,
    /// Whether this asset is a Packing List.
    pub is_packing_list: bool,
    /// Optional description.
    pub annotation: Option<UserText>,
}

impl CatalogEntry {
    /// Create an entry stored in a single chunk.
    pub fn single(id: Identifier, chunk: Chunk) -> Self {
        Self {
            id,
            chunks: vec![chunk],
            is_packing_list: false,
            annotation: None,
        }
    }

    /// Mark this entry as a Packing List.
    pub fn as_packing_list(mut self) -> Self {
        self.is_packing_list = true;
        self
    }

    /// Total size in bytes, or `None` if any chunk omits its length or the
    /// sum does not fit in `u64`.
    pub fn total_size(&self) -> Option<u64> {
        self.chunks
            .iter()
            .try_fold(0u64, |total, c| total.checked_add(c.byte_length?))
    }

    /// File paths of all chunks.
    pub fn file_paths(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(|c| c.file_path.as_str())
    }

    fn from_node(node: Node<'_, '_>) -> ImfResult<Self> {
        let id = xml::required_id(node, "Id")?;
        let chunk_list = xml::required_child(node, "ChunkList")?;
        let chunks = xml::children_named(chunk_list, "Chunk")
            .map(Chunk::from_node)
            .collect::<ImfResult<Vec<_>>>()?;
        if chunks.is_empty() {
            return Err(ImfError::missing("ChunkList/Chunk"));
        }

        Ok(Self {
            id,
            chunks,
            is_packing_list: xml::optional_bool(node, "PackingList")?.unwrap_or(false),
            annotation: xml::optional_user_text(node, "AnnotationText"),
        })
    }
}

/// A parsed `ASSETMAP.xml`.
#[derive(Debug, Clone, Serialize)]
pub struct AssetCatalog {
    /// Identifier of the asset map itself.
    pub id: Identifier,
    /// Optional description.
    pub annotation: Option<UserText>,
    /// Facility or system that created the map.
    pub creator: UserText,
    /// Number of volumes the map refers to.
    pub volume_count: u32,
    /// When the map was issued.
    pub issue_date: DateTime<FixedOffset>,
    /// Who issued the map.
    pub issuer: UserText,
    /// Mapped assets, in document order.
    pub entries: Vec<CatalogEntry>,
}

impl AssetCatalog {
    /// Read and parse an asset map file.
    pub fn from_file(path: &Path) -> ImfResult<Self> {
        let content = xml::read_document(path)?;
        Self::parse(&content)
    }

    /// Parse asset map XML.
    pub fn parse(content: &str) -> ImfResult<Self> {
        let doc = xml::parse_document(content)?;
        let root = xml::expect_root(&doc, "AssetMap")?;

        let id = xml::required_id(root, "Id")?;
        let volume_count = xml::required_u64(root, "VolumeCount")?;
        let volume_count = u32::try_from(volume_count)
            .map_err(|_| ImfError::invalid_value("VolumeCount", volume_count.to_string()))?;

        let asset_list = xml::required_child(root, "AssetList")?;
        let entries = xml::children_named(asset_list, "Asset")
            .map(CatalogEntry::from_node)
            .collect::<ImfResult<Vec<_>>>()?;

        let catalog = Self {
            id,
            annotation: xml::optional_user_text(root, "AnnotationText"),
            creator: xml::required_user_text(root, "Creator")?,
            volume_count,
            issue_date: xml::required_datetime(root, "IssueDate")?,
            issuer: xml::required_user_text(root, "Issuer")?,
            entries,
        };

        if catalog.volume_count != 1 {
            tracing::warn!(
                "Asset map {} declares {} volumes; only single-volume packages are assembled",
                catalog.id,
                catalog.volume_count
            );
        }
        tracing::debug!(
            "Parsed asset map {} with {} assets",
            catalog.id,
            catalog.entries.len()
        );

        Ok(catalog)
    }

    /// Find an entry by identifier.
    pub fn lookup(&self, id: &Identifier) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Entries flagged as Packing Lists.
    pub fn packing_lists(&self) -> Vec<&CatalogEntry> {
        self.entries.iter().filter(|e| e.is_packing_list).collect()
    }

    /// Total size of all assets, or `None` if any size is undeclared or the
    /// sum does not fit in `u64`.
    pub fn total_size(&self) -> Option<u64> {
        self.entries
            .iter()
            .try_fold(0u64, |total, e| total.checked_add(e.total_size()?))
    }
}

/// A parsed `VOLINDEX.xml`, present only on multi-volume packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolumeIndex {
    /// Index of this volume as referenced by chunk `VolumeIndex` values.
    pub index: u32,
}

impl VolumeIndex {
    /// Read and parse a volume index file.
    pub fn from_file(path: &Path) -> ImfResult<Self> {
        let content = xml::read_document(path)?;
        Self::parse(&content)
    }

    /// Parse volume index XML.
    pub fn parse(content: &str) -> ImfResult<Self> {
        let doc = xml::parse_document(content)?;
        let root = xml::expect_root(&doc, "VolumeIndex")?;
        let index = xml::required_u64(root, "Index")?;
        let index =
            u32::try_from(index).map_err(|_| ImfError::invalid_value("Index", index.to_string()))?;
        Ok(Self { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKL_ID: &str = "urn:uuid:11111111-2222-4333-8444-555555555555";
    const VIDEO_ID: &str = "urn:uuid:aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee";

    fn sample(video_length: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<AssetMap xmlns="http://www.smpte-ra.org/schemas/429-9/2007/AM">
  <Id>urn:uuid:01234567-89ab-4cde-8f01-23456789abcd</Id>
  <AnnotationText>Test package</AnnotationText>
  <Creator>imf_core tests</Creator>
  <VolumeCount>1</VolumeCount>
  <IssueDate>2022-01-01T12:00:00+00:00</IssueDate>
  <Issuer>Test Issuer</Issuer>
  <AssetList>
    <Asset>
      <Id>{PKL_ID}</Id>
      <PackingList>true</PackingList>
      <ChunkList>
        <Chunk>
          <Path>PKL_test.xml</Path>
          <VolumeIndex>1</VolumeIndex>
          <Offset>0</Offset>
          <Length>1024</Length>
        </Chunk>
      </ChunkList>
    </Asset>
    <Asset>
      <Id>{VIDEO_ID}</Id>
      <ChunkList>
        <Chunk>
          <Path>video.mxf</Path>
          {video_length}
        </Chunk>
      </ChunkList>
    </Asset>
  </AssetList>
</AssetMap>"#
        )
    }

    #[test]
    fn parses_entries_and_defaults() {
        let catalog = AssetCatalog::parse(&sample("<Length>2048</Length>")).unwrap();
        assert_eq!(catalog.entries.len(), 2);
        assert_eq!(catalog.volume_count, 1);
        assert_eq!(catalog.creator.text, "imf_core tests");

        let video = catalog
            .lookup(&Identifier::parse(VIDEO_ID).unwrap())
            .unwrap();
        assert!(!video.is_packing_list);
        assert_eq!(video.chunks[0].volume_index, DEFAULT_VOLUME_INDEX);
        assert_eq!(video.chunks[0].byte_offset, 0);
        assert_eq!(video.file_paths().collect::<Vec<_>>(), vec!["video.mxf"]);
        assert_eq!(catalog.total_size(), Some(3072));
    }

    #[test]
    fn packing_lists_are_flagged() {
        let catalog = AssetCatalog::parse(&sample("")).unwrap();
        let pkls = catalog.packing_lists();
        assert_eq!(pkls.len(), 1);
        assert_eq!(pkls[0].id, Identifier::parse(PKL_ID).unwrap());
    }

    #[test]
    fn missing_length_makes_size_unknown() {
        let catalog = AssetCatalog::parse(&sample("")).unwrap();
        let video = catalog
            .lookup(&Identifier::parse(VIDEO_ID).unwrap())
            .unwrap();
        assert_eq!(video.total_size(), None);
        assert_eq!(catalog.total_size(), None);

        let entry = CatalogEntry::single(
            Identifier::parse(VIDEO_ID).unwrap(),
            Chunk::new("video.mxf", None),
        );
        assert_eq!(entry.total_size(), None);
    }

    #[test]
    fn oversized_total_is_unknown() {
        let big = format!("<Length>{}</Length>", u64::MAX);
        let catalog = AssetCatalog::parse(&sample(&big)).unwrap();
        let video = catalog
            .lookup(&Identifier::parse(VIDEO_ID).unwrap())
            .unwrap();
        assert_eq!(video.total_size(), Some(u64::MAX));
        assert_eq!(catalog.total_size(), None);

        let mut entry = video.clone();
        entry.chunks.push(Chunk::new("video_2.mxf", Some(1)));
        assert_eq!(entry.total_size(), None);
    }

    #[test]
    fn rejects_paths_leaving_the_volume() {
        for path in ["../outside.mxf", "/etc/passwd", "media/../../outside.mxf"] {
            let xml = sample("").replace("<Path>video.mxf</Path>", &format!("<Path>{path}</Path>"));
            assert!(
                matches!(
                    AssetCatalog::parse(&xml),
                    Err(ImfError::InvalidValue { field, .. }) if field == "Chunk/Path"
                ),
                "{path} was accepted"
            );
        }
        assert!(Chunk::new("../x.mxf", None).relative_path().is_err());
        assert_eq!(
            Chunk::new("media/video.mxf", None).relative_path().unwrap(),
            Path::new("media/video.mxf")
        );
    }

    #[test]
    fn rejects_bad_identifier() {
        let xml = sample("").replace(VIDEO_ID, "urn:uuid:not-a-uuid");
        assert!(matches!(
            AssetCatalog::parse(&xml),
            Err(ImfError::MalformedIdentifier(_))
        ));
    }

    #[test]
    fn rejects_missing_path() {
        let xml = sample("").replace("<Path>video.mxf</Path>", "");
        assert!(matches!(
            AssetCatalog::parse(&xml),
            Err(ImfError::MissingRequiredField(_))
        ));
    }

    #[test]
    fn lookup_of_unknown_id_is_none() {
        let catalog = AssetCatalog::parse(&sample("")).unwrap();
        let other = Identifier::parse("urn:uuid:99999999-9999-4999-8999-999999999999").unwrap();
        assert!(catalog.lookup(&other).is_none());
    }

    #[test]
    fn parses_volume_index() {
        let xml = r#"<VolumeIndex xmlns="http://www.smpte-ra.org/schemas/429-9/2007/AM"><Index>2</Index></VolumeIndex>"#;
        assert_eq!(VolumeIndex::parse(xml).unwrap().index, 2);
        assert!(VolumeIndex::parse("<VolumeIndex/>").is_err());
    }
}
