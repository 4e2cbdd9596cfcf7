//! Composition Playlist (SMPTE ST 2067-3) document reader.

use std::path::Path;

use roxmltree::Node;

use crate::digest::{self, Base64Blob};
use crate::error::{ImfError, ImfResult};
use crate::rational::RationalRate;
use crate::timecode::Timecode;
use crate::xml;

use super::composition::{Composition, CompositionInfo};
use super::metadata::{
    self, ContentKind, ContentVersions, EssenceDescriptor, ExtensionProperty, Locale,
};
use super::resource::{Marker, MarkerLabel, Resource, TrackFileInfo, STANDARD_MARKER_SCOPE};
use super::sequence::{Segment, Sequence, SequenceKind};

impl Composition {
    /// Read and parse a composition playlist file.
    pub fn from_file(path: &Path) -> ImfResult<Self> {
        let content = xml::read_document(path)?;
        Self::parse(&content)
    }

    /// Parse composition playlist XML.
    pub fn parse(content: &str) -> ImfResult<Self> {
        let doc = xml::parse_document(content)?;
        let root = xml::expect_root(&doc, "CompositionPlaylist")?;

        let edit_rate = RationalRate::parse_edit_rate(&xml::required_text(root, "EditRate")?)?;
        let start_timecode = match xml::child(root, "CompositionTimecode") {
            Some(node) => Some(parse_composition_timecode(node, edit_rate)?),
            None => None,
        };

        let info = parse_info(root)?;
        let segment_list = xml::required_child(root, "SegmentList")?;
        let segments = xml::children_named(segment_list, "Segment")
            .map(|node| parse_segment(node, edit_rate))
            .collect::<ImfResult<Vec<_>>>()?;

        let composition = Composition::new(info, edit_rate, start_timecode, segments)?;
        tracing::debug!(
            "Parsed composition {} '{}' at {} fps: {} segments, {} edit units",
            composition.id(),
            composition.title(),
            edit_rate,
            composition.segments().len(),
            composition.duration()
        );
        Ok(composition)
    }
}

fn parse_info(root: Node<'_, '_>) -> ImfResult<CompositionInfo> {
    let total_runtime = match xml::optional_text(root, "TotalRuntime") {
        Some(text) if !text.is_empty() => Some(metadata::parse_total_runtime(&text)?),
        _ => None,
    };

    let locales = match xml::child(root, "LocaleList") {
        Some(list) => xml::children_named(list, "Locale")
            .map(Locale::from_node)
            .collect::<ImfResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    let essence_descriptors = match xml::child(root, "EssenceDescriptorList") {
        Some(list) => xml::children_named(list, "EssenceDescriptor")
            .map(EssenceDescriptor::from_node)
            .collect::<ImfResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    let extension_properties = xml::child(root, "ExtensionProperties")
        .map(|list| xml::elements(list).map(ExtensionProperty::from_node).collect())
        .unwrap_or_default();

    let mut info = CompositionInfo::new(
        xml::required_id(root, "Id")?,
        xml::required_datetime(root, "IssueDate")?,
        xml::required_user_text(root, "ContentTitle")?,
    );
    info.annotation = xml::optional_user_text(root, "Annotation");
    info.issuer = xml::optional_user_text(root, "Issuer");
    info.creator = xml::optional_user_text(root, "Creator");
    info.content_originator = xml::optional_user_text(root, "ContentOriginator");
    info.content_kind = xml::child(root, "ContentKind").map(ContentKind::from_node);
    info.total_runtime = total_runtime;
    info.content_versions = ContentVersions::from_list(xml::child(root, "ContentVersionList"))?;
    info.locales = locales;
    info.essence_descriptors = essence_descriptors;
    info.extension_properties = extension_properties;
    info.signed = xml::child(root, "Signer").is_some() && xml::child(root, "Signature").is_some();
    Ok(info)
}

/// Read the start address at its own `TimecodeRate`.
///
/// The rate is integral; on a fractional (x/1001) edit rate it is taken as
/// the matching x000/1001 rate. `Composition::new` resamples the result to
/// the edit rate.
fn parse_composition_timecode(node: Node<'_, '_>, edit_rate: RationalRate) -> ImfResult<Timecode> {
    let drop_frame = xml::optional_bool(node, "TimecodeDropFrame")?.unwrap_or(false);
    let timecode_rate = xml::required_u64(node, "TimecodeRate")?;
    let address = xml::required_text(node, "TimecodeStartAddress")?;

    let invalid_rate = || ImfError::invalid_value("TimecodeRate", timecode_rate.to_string());
    let fps = u32::try_from(timecode_rate).map_err(|_| invalid_rate())?;
    let rate = if edit_rate.denominator() == 1001 {
        RationalRate::new(fps.checked_mul(1000).ok_or_else(invalid_rate)?, 1001)
    } else {
        RationalRate::new(fps, 1)
    }
    .map_err(|_| invalid_rate())?;

    if rate.nominal_fps() != edit_rate.nominal_fps() {
        tracing::debug!(
            "TimecodeRate {} differs from composition edit rate {}; resampling the start address",
            timecode_rate,
            edit_rate
        );
    }
    Timecode::parse(&address, rate, drop_frame)
}

fn parse_segment(node: Node<'_, '_>, edit_rate: RationalRate) -> ImfResult<Segment> {
    let id = xml::required_id(node, "Id")?;
    let sequence_list = xml::required_child(node, "SequenceList")?;
    let sequences = xml::elements(sequence_list)
        .map(parse_sequence)
        .collect::<ImfResult<Vec<_>>>()?;

    let segment = Segment::new(id, xml::optional_user_text(node, "Annotation"), sequences);
    tracing::trace!(
        "Segment {}: {} sequences, {} edit units",
        segment.id,
        segment.sequences.len(),
        segment.duration(edit_rate)
    );
    Ok(segment)
}

fn parse_sequence(node: Node<'_, '_>) -> ImfResult<Sequence> {
    let kind = SequenceKind::from_tag(node.tag_name().name())?;
    let resource_list = xml::required_child(node, "ResourceList")?;
    let resources = xml::children_named(resource_list, "Resource")
        .map(|res| parse_resource(res, kind))
        .collect::<ImfResult<Vec<_>>>()?;

    Ok(Sequence::new(
        xml::required_id(node, "Id")?,
        xml::required_id(node, "TrackId")?,
        kind,
        resources,
    ))
}

fn parse_resource(node: Node<'_, '_>, kind: SequenceKind) -> ImfResult<Resource> {
    let id = xml::required_id(node, "Id")?;
    let intrinsic_duration = xml::required_u64(node, "IntrinsicDuration")?;
    let edit_rate = match xml::optional_text(node, "EditRate") {
        Some(text) => Some(RationalRate::parse_edit_rate(&text)?),
        None => None,
    };

    let builder = if kind.carries_essence() {
        Resource::track_file(id, intrinsic_duration, parse_track_file_info(node)?)
    } else {
        let markers = xml::children_named(node, "Marker")
            .map(parse_marker)
            .collect::<ImfResult<Vec<_>>>()?;
        Resource::marker(id, intrinsic_duration, markers)
    };

    builder
        .annotation(xml::optional_user_text(node, "Annotation"))
        .edit_rate(edit_rate)
        .entry_point(xml::optional_u64(node, "EntryPoint")?)
        .source_duration(xml::optional_u64(node, "SourceDuration")?)
        .repeat_count(xml::optional_u64(node, "RepeatCount")?)
        .build()
}

fn parse_track_file_info(node: Node<'_, '_>) -> ImfResult<TrackFileInfo> {
    let content_hash = match xml::optional_text(node, "Hash") {
        Some(text) => Some(Base64Blob::parse("Hash", &text)?),
        None => None,
    };
    let hash_algorithm = xml::child(node, "HashAlgorithm")
        .and_then(|n| n.attribute("Algorithm"))
        .map(|uri| digest::algorithm_name(uri).to_string());

    Ok(TrackFileInfo {
        essence_descriptor_ref: xml::required_id(node, "SourceEncoding")?,
        track_file_id: xml::required_id(node, "TrackFileId")?,
        encryption_key_id: xml::optional_id(node, "KeyId")?,
        content_hash,
        hash_algorithm,
    })
}

fn parse_marker(node: Node<'_, '_>) -> ImfResult<Marker> {
    let label_node = xml::required_child(node, "Label")?;
    let text = label_node.text().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(ImfError::missing("Marker/Label"));
    }

    Ok(Marker {
        label: MarkerLabel {
            text: text.to_string(),
            scope: label_node
                .attribute("scope")
                .unwrap_or(STANDARD_MARKER_SCOPE)
                .to_string(),
        },
        offset: xml::required_u64(node, "Offset")?,
        annotation: xml::optional_user_text(node, "Annotation"),
    })
}
