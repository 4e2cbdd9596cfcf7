//! Package discovery and asset resolution.
//!
//! A package directory holds an asset map, exactly one packing list, one
//! composition playlist and optionally one output profile list. Track file
//! references in the composition are resolved lazily through the packing
//! list and asset map; a failed lookup affects only that resource.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::assetmap::{AssetCatalog, VolumeIndex};
use crate::config::DiscoverySettings;
use crate::cpl::{Composition, Resource};
use crate::error::{ImfError, ImfResult};
use crate::identifier::Identifier;
use crate::opl::OutputProfileList;
use crate::pkl::PackingList;

/// File name of the volume index on multi-volume packages.
pub const VOLUME_INDEX_NAME: &str = "VOLINDEX.xml";

/// A track file located on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAsset {
    /// Track file identifier.
    pub id: Identifier,
    /// Path as written in the asset map, relative to the package root.
    pub relative_path: PathBuf,
    /// `relative_path` joined to the package root; equal to
    /// `relative_path` when resolved without a package.
    pub path: PathBuf,
    /// Size from the packing list.
    pub byte_size: u64,
    /// MIME type from the packing list.
    pub mime_type: String,
    /// Digest algorithm from the packing list.
    pub hash_algorithm: String,
}

impl ResolvedAsset {
    // `relative_path` was checked by `Chunk::relative_path` in `resolve_track_file`.
    fn rooted(mut self, root: &Path) -> Self {
        self.path = root.join(&self.relative_path);
        self
    }
}

/// Join a track file id through the packing list and asset map.
///
/// The packing list must list the asset and the asset map must map it to a
/// file; otherwise `UnresolvedAssetReference(id)`.
pub fn resolve_track_file(
    catalog: &AssetCatalog,
    packing_list: &PackingList,
    id: &Identifier,
) -> ImfResult<ResolvedAsset> {
    let packed = packing_list
        .lookup(id)
        .ok_or(ImfError::UnresolvedAssetReference(*id))?;
    let entry = catalog
        .lookup(id)
        .ok_or(ImfError::UnresolvedAssetReference(*id))?;
    let chunk = entry
        .chunks
        .first()
        .ok_or(ImfError::UnresolvedAssetReference(*id))?;

    if entry.chunks.len() > 1 {
        tracing::warn!(
            "Asset {} spans {} chunks; resolving to the first ({})",
            id,
            entry.chunks.len(),
            chunk.file_path
        );
    }

    let relative_path = chunk.relative_path()?.to_path_buf();
    Ok(ResolvedAsset {
        id: *id,
        path: relative_path.clone(),
        relative_path,
        byte_size: packed.byte_size,
        mime_type: packed.mime_type.clone(),
        hash_algorithm: packed.hash_algorithm.clone(),
    })
}

/// An opened IMF package.
#[derive(Debug, Clone, Serialize)]
pub struct Package {
    root: PathBuf,
    catalog: AssetCatalog,
    packing_list: PackingList,
    composition: Composition,
    output_profile: Option<OutputProfileList>,
    volume_index: Option<VolumeIndex>,
}

impl Package {
    /// Open a package directory with default file names.
    pub fn open(dir: impl AsRef<Path>) -> ImfResult<Self> {
        Self::open_with(dir, &DiscoverySettings::default())
    }

    /// Open a package directory.
    pub fn open_with(dir: impl AsRef<Path>, settings: &DiscoverySettings) -> ImfResult<Self> {
        let root = dir.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(ImfError::NotADirectory(root));
        }

        let asset_map_path = root.join(&settings.asset_map_name);
        if !asset_map_path.is_file() {
            return Err(ImfError::MissingAssetMap(asset_map_path));
        }
        let catalog = AssetCatalog::from_file(&asset_map_path)?;

        let packing_list = {
            let entries = catalog.packing_lists();
            let entry = match entries.as_slice() {
                [] => return Err(ImfError::NoPackingListFound),
                [entry] => *entry,
                many => return Err(ImfError::MultiplePackingListsUnsupported(many.len())),
            };
            let chunk = match entry.chunks.as_slice() {
                [chunk] => chunk,
                chunks => return Err(ImfError::ChunkedPackingListUnsupported(chunks.len())),
            };
            PackingList::from_file(&root.join(chunk.relative_path()?))?
        };

        let compositions = find_documents(&root, &settings.composition_prefix)?;
        let composition = match compositions.as_slice() {
            [] => return Err(ImfError::NoCompositionFound(root)),
            [path] => Composition::from_file(path)?,
            many => return Err(ImfError::MultipleCompositionsUnsupported(many.len())),
        };

        let profiles = find_documents(&root, &settings.output_profile_prefix)?;
        let output_profile = match profiles.as_slice() {
            [] => None,
            [path] => Some(OutputProfileList::from_file(path)?),
            many => return Err(ImfError::MultipleOutputProfilesUnsupported(many.len())),
        };

        let volume_index_path = root.join(VOLUME_INDEX_NAME);
        let volume_index = if volume_index_path.is_file() {
            Some(VolumeIndex::from_file(&volume_index_path)?)
        } else {
            None
        };

        tracing::info!(
            "Opened package {}: composition '{}', {} packed assets",
            root.display(),
            composition.title(),
            packing_list.assets.len()
        );

        Ok(Self {
            root,
            catalog,
            packing_list,
            composition,
            output_profile,
            volume_index,
        })
    }

    /// Package directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The parsed asset map.
    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    /// The package's single packing list.
    pub fn packing_list(&self) -> &PackingList {
        &self.packing_list
    }

    /// The package's single composition playlist.
    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// The output profile list, if the package has one.
    pub fn output_profile(&self) -> Option<&OutputProfileList> {
        self.output_profile.as_ref()
    }

    /// The volume index, if `VOLINDEX.xml` is present.
    pub fn volume_index(&self) -> Option<&VolumeIndex> {
        self.volume_index.as_ref()
    }

    /// Locate the track file of a resource.
    pub fn resolve(&self, resource: &Resource) -> ImfResult<ResolvedAsset> {
        let info = resource
            .track_file_info()
            .ok_or(ImfError::NotATrackFile(resource.id()))?;
        let resolved = resolve_track_file(&self.catalog, &self.packing_list, &info.track_file_id)?;
        Ok(resolved.rooted(&self.root))
    }

    /// Resolve every track file resource of the composition.
    pub fn resolve_all(&self) -> Vec<(&Resource, ImfResult<ResolvedAsset>)> {
        let results: Vec<_> = self
            .composition
            .track_file_resources()
            .map(|resource| (resource, self.resolve(resource)))
            .collect();

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        if failed > 0 {
            tracing::warn!("{} of {} track file references are unresolved", failed, results.len());
        }
        results
    }
}

/// Files `<prefix>*.xml` directly inside `dir`, sorted by name.
fn find_documents(dir: &Path, prefix: &str) -> ImfResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| ImfError::io(dir, e))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ImfError::io(dir, e))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(prefix) && name.ends_with(".xml"))
            .unwrap_or(false);
        if matches && path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    const PKL_ID: &str = "urn:uuid:11111111-0000-4000-8000-000000000001";
    const TRACK_A: &str = "urn:uuid:aaaaaaaa-0000-4000-8000-000000000001";
    const TRACK_B: &str = "urn:uuid:aaaaaaaa-0000-4000-8000-000000000002";
    const HASH: &str = "2jmj7l5rSw0yVb/vlWAYkK/YBwk=";

    fn asset_map(pkl_chunks: &str) -> String {
        format!(
            r#"<AssetMap xmlns="http://www.smpte-ra.org/schemas/429-9/2007/AM">
  <Id>urn:uuid:01234567-0000-4000-8000-000000000001</Id>
  <Creator>imf_core tests</Creator>
  <VolumeCount>1</VolumeCount>
  <IssueDate>2022-01-01T00:00:00Z</IssueDate>
  <Issuer>Test</Issuer>
  <AssetList>
    <Asset>
      <Id>{PKL_ID}</Id>
      <PackingList>true</PackingList>
      <ChunkList>{pkl_chunks}</ChunkList>
    </Asset>
    <Asset>
      <Id>{TRACK_A}</Id>
      <ChunkList><Chunk><Path>video.mxf</Path><Length>2048</Length></Chunk></ChunkList>
    </Asset>
  </AssetList>
</AssetMap>"#
        )
    }

    fn packing_list() -> String {
        format!(
            r#"<PackingList xmlns="http://www.smpte-ra.org/schemas/2067-2/2016/PKL">
  <Id>{PKL_ID}</Id>
  <IssueDate>2022-01-01T00:00:00Z</IssueDate>
  <Issuer>Test</Issuer>
  <Creator>imf_core tests</Creator>
  <AssetList>
    <Asset>
      <Id>{TRACK_A}</Id>
      <Hash>{HASH}</Hash>
      <Size>2048</Size>
      <Type>application/mxf</Type>
      <HashAlgorithm Algorithm="http://www.w3.org/2000/09/xmldsig#sha1"/>
    </Asset>
    <Asset>
      <Id>{TRACK_B}</Id>
      <Hash>{HASH}</Hash>
      <Size>4096</Size>
      <Type>application/mxf</Type>
      <HashAlgorithm Algorithm="http://www.w3.org/2000/09/xmldsig#sha1"/>
    </Asset>
  </AssetList>
</PackingList>"#
        )
    }

    fn track_resource(n: u32, track: &str) -> String {
        format!(
            r#"<Resource>
  <Id>urn:uuid:bbbbbbbb-0000-4000-8000-00000000000{n}</Id>
  <IntrinsicDuration>48</IntrinsicDuration>
  <SourceEncoding>urn:uuid:dddddddd-0000-4000-8000-000000000001</SourceEncoding>
  <TrackFileId>{track}</TrackFileId>
</Resource>"#
        )
    }

    fn composition() -> String {
        format!(
            r#"<CompositionPlaylist xmlns="http://www.smpte-ra.org/schemas/2067-3/2016">
  <Id>urn:uuid:cccccccc-0000-4000-8000-000000000001</Id>
  <IssueDate>2022-01-01T00:00:00Z</IssueDate>
  <ContentTitle>Package test</ContentTitle>
  <EditRate>24 1</EditRate>
  <SegmentList>
    <Segment>
      <Id>urn:uuid:eeeeeeee-0000-4000-8000-000000000001</Id>
      <SequenceList>
        <MainImageSequence>
          <Id>urn:uuid:ffffffff-0000-4000-8000-000000000001</Id>
          <TrackId>urn:uuid:ffffffff-0000-4000-8000-0000000000a1</TrackId>
          <ResourceList>{}{}</ResourceList>
        </MainImageSequence>
        <MarkerSequence>
          <Id>urn:uuid:ffffffff-0000-4000-8000-000000000002</Id>
          <TrackId>urn:uuid:ffffffff-0000-4000-8000-0000000000a2</TrackId>
          <ResourceList>
            <Resource>
              <Id>urn:uuid:bbbbbbbb-0000-4000-8000-000000000009</Id>
              <IntrinsicDuration>96</IntrinsicDuration>
              <Marker><Label>FFOC</Label><Offset>0</Offset></Marker>
            </Resource>
          </ResourceList>
        </MarkerSequence>
      </SequenceList>
    </Segment>
  </SegmentList>
</CompositionPlaylist>"#,
            track_resource(1, TRACK_A),
            track_resource(2, TRACK_B)
        )
    }

    const PKL_CHUNK: &str = "<Chunk><Path>PKL_test.xml</Path></Chunk>";

    fn write_package() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ASSETMAP.xml"), asset_map(PKL_CHUNK)).unwrap();
        fs::write(dir.path().join("PKL_test.xml"), packing_list()).unwrap();
        fs::write(dir.path().join("CPL_test.xml"), composition()).unwrap();
        dir
    }

    #[test]
    fn opens_and_resolves() {
        crate::logging::init_test_tracing();
        let dir = write_package();
        let package = Package::open(dir.path()).unwrap();

        assert_eq!(package.composition().duration(), 96);
        assert!(package.output_profile().is_none());
        assert!(package.volume_index().is_none());

        let results = package.resolve_all();
        assert_eq!(results.len(), 2);

        let resolved = results[0].1.as_ref().unwrap();
        assert_eq!(resolved.relative_path, PathBuf::from("video.mxf"));
        assert_eq!(resolved.path, dir.path().join("video.mxf"));
        assert_eq!(resolved.byte_size, 2048);

        let track_b = Identifier::parse(TRACK_B).unwrap();
        assert!(matches!(
            &results[1].1,
            Err(ImfError::UnresolvedAssetReference(id)) if *id == track_b
        ));
    }

    #[test]
    fn pure_join_over_documents() {
        let catalog = AssetCatalog::parse(&asset_map(PKL_CHUNK)).unwrap();
        let pkl = PackingList::parse(&packing_list()).unwrap();

        let a = resolve_track_file(&catalog, &pkl, &Identifier::parse(TRACK_A).unwrap()).unwrap();
        assert_eq!(a.path, PathBuf::from("video.mxf"));
        assert_eq!(a.hash_algorithm, "sha1");

        let unknown = Identifier::parse("urn:uuid:99999999-0000-4000-8000-000000000001").unwrap();
        assert!(matches!(
            resolve_track_file(&catalog, &pkl, &unknown),
            Err(ImfError::UnresolvedAssetReference(id)) if id == unknown
        ));
    }

    #[test]
    fn marker_resource_is_not_a_track_file() {
        let dir = write_package();
        let package = Package::open(dir.path()).unwrap();
        let marker = package
            .composition()
            .resources()
            .find(|r| r.track_file_info().is_none())
            .unwrap();
        assert!(matches!(
            package.resolve(marker),
            Err(ImfError::NotATrackFile(id)) if id == marker.id()
        ));
    }

    #[test]
    fn missing_composition_fails() {
        let dir = write_package();
        fs::remove_file(dir.path().join("CPL_test.xml")).unwrap();
        assert!(matches!(
            Package::open(dir.path()),
            Err(ImfError::NoCompositionFound(_))
        ));
    }

    #[test]
    fn multiple_compositions_fail() {
        let dir = write_package();
        fs::write(dir.path().join("CPL_other.xml"), composition()).unwrap();
        assert!(matches!(
            Package::open(dir.path()),
            Err(ImfError::MultipleCompositionsUnsupported(2))
        ));
    }

    #[test]
    fn multiple_output_profiles_fail() {
        let dir = write_package();
        fs::write(dir.path().join("OPL_a.xml"), "<OutputProfileList/>").unwrap();
        fs::write(dir.path().join("OPL_b.xml"), "<OutputProfileList/>").unwrap();
        assert!(matches!(
            Package::open(dir.path()),
            Err(ImfError::MultipleOutputProfilesUnsupported(2))
        ));
    }

    #[test]
    fn opens_output_profile_and_volume_index() {
        let dir = write_package();
        fs::write(
            dir.path().join("OPL_hd.xml"),
            r#"<OutputProfileList xmlns="http://www.smpte-ra.org/schemas/2067-100/2014">
  <Id>urn:uuid:0a0a0a0a-0000-4000-8000-000000000001</Id>
  <Annotation>HD deliverable</Annotation>
  <CompositionPlaylistId>urn:uuid:cccccccc-0000-4000-8000-000000000001</CompositionPlaylistId>
</OutputProfileList>"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(VOLUME_INDEX_NAME),
            r#"<VolumeIndex xmlns="http://www.smpte-ra.org/schemas/429-9/2007/AM"><Index>1</Index></VolumeIndex>"#,
        )
        .unwrap();

        let package = Package::open(dir.path()).unwrap();
        let opl = package.output_profile().unwrap();
        assert_eq!(opl.annotation.as_ref().unwrap().text, "HD deliverable");
        assert_eq!(opl.composition_id, Some(package.composition().id()));
        assert_eq!(package.volume_index().map(|v| v.index), Some(1));
    }

    #[test]
    fn packing_list_outside_root_fails() {
        let outer = tempdir().unwrap();
        let dir = outer.path().join("pkg");
        fs::create_dir(&dir).unwrap();
        fs::write(outer.path().join("PKL_test.xml"), packing_list()).unwrap();
        fs::write(dir.join("CPL_test.xml"), composition()).unwrap();

        let absolute = outer.path().join("PKL_test.xml").display().to_string();
        for path in ["../PKL_test.xml", absolute.as_str()] {
            let chunk = format!("<Chunk><Path>{path}</Path></Chunk>");
            fs::write(dir.join("ASSETMAP.xml"), asset_map(&chunk)).unwrap();
            assert!(matches!(
                Package::open(&dir),
                Err(ImfError::InvalidValue { field, .. }) if field == "Chunk/Path"
            ));
        }
    }

    #[test]
    fn join_rejects_escaping_track_file_path() {
        let mut catalog = AssetCatalog::parse(&asset_map(PKL_CHUNK)).unwrap();
        let pkl = PackingList::parse(&packing_list()).unwrap();
        let track_a = Identifier::parse(TRACK_A).unwrap();
        let entry = catalog.entries.iter_mut().find(|e| e.id == track_a).unwrap();
        entry.chunks[0].file_path = "../../secret.mxf".to_string();

        assert!(matches!(
            resolve_track_file(&catalog, &pkl, &track_a),
            Err(ImfError::InvalidValue { field, .. }) if field == "Chunk/Path"
        ));
    }

    #[test]
    fn chunked_packing_list_fails() {
        let dir = write_package();
        let chunks = format!("{PKL_CHUNK}<Chunk><Path>PKL_test_2.xml</Path></Chunk>");
        fs::write(dir.path().join("ASSETMAP.xml"), asset_map(&chunks)).unwrap();
        assert!(matches!(
            Package::open(dir.path()),
            Err(ImfError::ChunkedPackingListUnsupported(2))
        ));
    }

    #[test]
    fn missing_packing_list_fails() {
        let dir = write_package();
        let map = asset_map(PKL_CHUNK).replace("<PackingList>true</PackingList>", "");
        fs::write(dir.path().join("ASSETMAP.xml"), map).unwrap();
        assert!(matches!(Package::open(dir.path()), Err(ImfError::NoPackingListFound)));
    }

    #[test]
    fn missing_asset_map_and_directory_fail() {
        let dir = write_package();
        fs::remove_file(dir.path().join("ASSETMAP.xml")).unwrap();
        assert!(matches!(Package::open(dir.path()), Err(ImfError::MissingAssetMap(_))));
        assert!(matches!(
            Package::open(dir.path().join("nope")),
            Err(ImfError::NotADirectory(_))
        ));
    }

    #[test]
    fn discovery_names_are_configurable() {
        let dir = write_package();
        fs::rename(dir.path().join("ASSETMAP.xml"), dir.path().join("ASSETMAP")).unwrap();
        fs::rename(dir.path().join("CPL_test.xml"), dir.path().join("COMP_test.xml")).unwrap();

        let settings = DiscoverySettings {
            asset_map_name: "ASSETMAP".to_string(),
            composition_prefix: "COMP".to_string(),
            ..DiscoverySettings::default()
        };
        let package = Package::open_with(dir.path(), &settings).unwrap();
        assert_eq!(package.composition().title().text, "Package test");
    }
}
