//! Timeline resources: trimmed, repeated references to track files or markers.

use serde::Serialize;

use crate::digest::Base64Blob;
use crate::error::{ImfError, ImfResult};
use crate::identifier::Identifier;
use crate::rational::RationalRate;
use crate::timecode::{resample_count, Timecode, TimecodeRange};
use crate::xml::UserText;

/// Default scope of marker labels (SMPTE ST 2067-3 standard markers).
pub const STANDARD_MARKER_SCOPE: &str =
    "http://www.smpte-ra.org/schemas/2067-3/2013#standard-markers";

/// Reference from a resource to an essence track file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackFileInfo {
    /// Essence descriptor describing the track file (`SourceEncoding`).
    pub essence_descriptor_ref: Identifier,
    /// Track file identifier, resolved through the PKL and asset map.
    pub track_file_id: Identifier,
    /// Key used to encrypt the track file, if encrypted.
    pub encryption_key_id: Option<Identifier>,
    /// Digest of the track file.
    pub content_hash: Option<Base64Blob>,
    /// Digest algorithm name.
    pub hash_algorithm: Option<String>,
}

impl TrackFileInfo {
    /// Create an unencrypted, unhashed track file reference.
    pub fn new(essence_descriptor_ref: Identifier, track_file_id: Identifier) -> Self {
        Self {
            essence_descriptor_ref,
            track_file_id,
            encryption_key_id: None,
            content_hash: None,
            hash_algorithm: None,
        }
    }
}

/// Label of a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerLabel {
    /// Label text, e.g. `FFOC`.
    pub text: String,
    /// Set of labels the text is drawn from.
    pub scope: String,
}

impl MarkerLabel {
    /// A label from the standard marker scope.
    pub fn standard(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            scope: STANDARD_MARKER_SCOPE.to_string(),
        }
    }
}

/// A labelled point within a marker resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    /// The marker label.
    pub label: MarkerLabel,
    /// Offset from the start of the resource, in resource edit units.
    pub offset: u64,
    /// Optional description.
    pub annotation: Option<UserText>,
}

/// What a resource refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceBody {
    /// Essence from a track file.
    TrackFile(TrackFileInfo),
    /// A list of markers.
    Marker(Vec<Marker>),
}

/// A resource of a sequence.
///
/// Defaults are resolved when the resource is built: `entry_point` is 0,
/// `source_duration` is `intrinsic_duration - entry_point` and
/// `repeat_count` is 1. `repeat_count` counts total plays of the region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    id: Identifier,
    annotation: Option<UserText>,
    edit_rate: Option<RationalRate>,
    intrinsic_duration: u64,
    entry_point: u64,
    source_duration: u64,
    repeat_count: u32,
    body: ResourceBody,
}

impl Resource {
    /// Start building a track file resource.
    pub fn track_file(id: Identifier, intrinsic_duration: u64, info: TrackFileInfo) -> ResourceBuilder {
        ResourceBuilder::new(id, intrinsic_duration, ResourceBody::TrackFile(info))
    }

    /// Start building a marker resource.
    pub fn marker(id: Identifier, intrinsic_duration: u64, markers: Vec<Marker>) -> ResourceBuilder {
        ResourceBuilder::new(id, intrinsic_duration, ResourceBody::Marker(markers))
    }

    /// Resource identifier.
    pub fn id(&self) -> Identifier {
        self.id
    }

    /// Optional description.
    pub fn annotation(&self) -> Option<&UserText> {
        self.annotation.as_ref()
    }

    /// The resource's own edit rate, if it declares one.
    pub fn edit_rate(&self) -> Option<RationalRate> {
        self.edit_rate
    }

    /// The rate governing this resource's units: its own, else the inherited one.
    pub fn effective_edit_rate(&self, inherited: RationalRate) -> RationalRate {
        self.edit_rate.unwrap_or(inherited)
    }

    /// Native duration of the underlying asset, in resource edit units.
    pub fn intrinsic_duration(&self) -> u64 {
        self.intrinsic_duration
    }

    /// In-point of the playable region.
    pub fn entry_point(&self) -> u64 {
        self.entry_point
    }

    /// Length of the playable region (resolved default applied).
    pub fn source_duration(&self) -> u64 {
        self.source_duration
    }

    /// Total number of times the playable region is played.
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    /// Plays beyond the first.
    pub fn extra_repeats(&self) -> u32 {
        self.repeat_count - 1
    }

    /// Duration on the sequence, in resource edit units.
    pub fn duration(&self) -> u64 {
        // Checked to fit when built.
        self.source_duration * u64::from(self.repeat_count)
    }

    /// Duration expressed at the timeline rate.
    pub fn timeline_duration(&self, timeline_rate: RationalRate) -> u64 {
        resample_count(
            self.duration(),
            self.effective_edit_rate(timeline_rate),
            timeline_rate,
        )
    }

    /// In/out points within the source, at the resource's effective rate.
    pub fn edit_range(&self, inherited: RationalRate) -> TimecodeRange {
        let rate = self.effective_edit_rate(inherited);
        TimecodeRange::new(Timecode::from_frames(self.entry_point, rate), self.source_duration)
    }

    /// What the resource refers to.
    pub fn body(&self) -> &ResourceBody {
        &self.body
    }

    /// Track file reference, for track file resources.
    pub fn track_file_info(&self) -> Option<&TrackFileInfo> {
        match &self.body {
            ResourceBody::TrackFile(info) => Some(info),
            ResourceBody::Marker(_) => None,
        }
    }

    /// Markers, for marker resources.
    pub fn markers(&self) -> &[Marker] {
        match &self.body {
            ResourceBody::Marker(markers) => markers,
            ResourceBody::TrackFile(_) => &[],
        }
    }
}

/// Builder validating resource bounds.
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    id: Identifier,
    intrinsic_duration: u64,
    body: ResourceBody,
    annotation: Option<UserText>,
    edit_rate: Option<RationalRate>,
    entry_point: Option<u64>,
    source_duration: Option<u64>,
    repeat_count: Option<u64>,
}

impl ResourceBuilder {
    fn new(id: Identifier, intrinsic_duration: u64, body: ResourceBody) -> Self {
        Self {
            id,
            intrinsic_duration,
            body,
            annotation: None,
            edit_rate: None,
            entry_point: None,
            source_duration: None,
            repeat_count: None,
        }
    }

    /// Set the description.
    pub fn annotation(mut self, annotation: Option<UserText>) -> Self {
        self.annotation = annotation;
        self
    }

    /// Set the resource edit rate.
    pub fn edit_rate(mut self, edit_rate: Option<RationalRate>) -> Self {
        self.edit_rate = edit_rate;
        self
    }

    /// Set the in-point.
    pub fn entry_point(mut self, entry_point: Option<u64>) -> Self {
        self.entry_point = entry_point;
        self
    }

    /// Set the played length.
    pub fn source_duration(mut self, source_duration: Option<u64>) -> Self {
        self.source_duration = source_duration;
        self
    }

    /// Set the total play count.
    pub fn repeat_count(mut self, repeat_count: Option<u64>) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    /// Resolve defaults and check bounds.
    pub fn build(self) -> ImfResult<Resource> {
        let entry_point = self.entry_point.unwrap_or(0);
        if entry_point > self.intrinsic_duration {
            return Err(ImfError::bounds(
                "entry_point",
                format!(
                    "entry point {} exceeds intrinsic duration {}",
                    entry_point, self.intrinsic_duration
                ),
            ));
        }

        let available = self.intrinsic_duration - entry_point;
        let source_duration = self.source_duration.unwrap_or(available);
        if source_duration > available {
            return Err(ImfError::bounds(
                "source_duration",
                format!(
                    "source duration {} exceeds intrinsic duration {} minus entry point {}",
                    source_duration, self.intrinsic_duration, entry_point
                ),
            ));
        }

        let repeat_count = match self.repeat_count {
            None => 1,
            Some(0) => {
                return Err(ImfError::bounds(
                    "repeat_count",
                    "repeat count must be at least 1",
                ))
            }
            Some(count) => u32::try_from(count).map_err(|_| {
                ImfError::bounds("repeat_count", format!("repeat count {} is too large", count))
            })?,
        };

        if source_duration.checked_mul(u64::from(repeat_count)).is_none() {
            return Err(ImfError::bounds(
                "repeat_count",
                format!(
                    "source duration {} repeated {} times overflows",
                    source_duration, repeat_count
                ),
            ));
        }

        if let ResourceBody::Marker(markers) = &self.body {
            if let Some(marker) = markers.iter().find(|m| m.offset > self.intrinsic_duration) {
                return Err(ImfError::bounds(
                    "marker_offset",
                    format!(
                        "marker '{}' offset {} exceeds intrinsic duration {}",
                        marker.label.text, marker.offset, self.intrinsic_duration
                    ),
                ));
            }
        }

        Ok(Resource {
            id: self.id,
            annotation: self.annotation,
            edit_rate: self.edit_rate,
            intrinsic_duration: self.intrinsic_duration,
            entry_point,
            source_duration,
            repeat_count,
            body: self.body,
        })
    }
}
