//! The composition root and its derived timeline values.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::{ImfError, ImfResult};
use crate::identifier::Identifier;
use crate::rational::RationalRate;
use crate::timecode::{Timecode, TimecodeRange};
use crate::xml::UserText;

use super::metadata::{ContentKind, ContentVersions, EssenceDescriptor, ExtensionProperty, Locale};
use super::resource::Resource;
use super::sequence::{Segment, Sequence};
use super::timeline::{self, PlacedResource, PlacedSegment, PlacedSequence, TimelineCollector, TimelineVisitor};

/// Descriptive header of a composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositionInfo {
    pub id: Identifier,
    pub issue_date: DateTime<FixedOffset>,
    /// `ContentTitle`.
    pub title: UserText,
    pub annotation: Option<UserText>,
    pub issuer: Option<UserText>,
    pub creator: Option<UserText>,
    /// Who produced the content.
    pub content_originator: Option<UserText>,
    pub content_kind: Option<ContentKind>,
    /// Approximate running time; informational only.
    pub total_runtime: Option<Duration>,
    pub content_versions: ContentVersions,
    pub locales: Vec<Locale>,
    pub essence_descriptors: Vec<EssenceDescriptor>,
    pub extension_properties: Vec<ExtensionProperty>,
    /// Whether `Signer`/`Signature` elements are present (not verified).
    pub signed: bool,
}

impl CompositionInfo {
    /// Header with only the mandatory values set.
    pub fn new(id: Identifier, issue_date: DateTime<FixedOffset>, title: UserText) -> Self {
        Self {
            id,
            issue_date,
            title,
            annotation: None,
            issuer: None,
            creator: None,
            content_originator: None,
            content_kind: None,
            total_runtime: None,
            content_versions: ContentVersions::new(),
            locales: Vec::new(),
            essence_descriptors: Vec::new(),
            extension_properties: Vec::new(),
            signed: false,
        }
    }
}

/// A Composition Playlist: header, edit rate and a validated segment tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Composition {
    #[serde(flatten)]
    info: CompositionInfo,
    edit_rate: RationalRate,
    start_timecode: Option<Timecode>,
    segments: Vec<Segment>,
}

impl Composition {
    /// Assemble a composition. Every segment is validated at `edit_rate`.
    pub fn new(
        info: CompositionInfo,
        edit_rate: RationalRate,
        start_timecode: Option<Timecode>,
        segments: Vec<Segment>,
    ) -> ImfResult<Self> {
        let mut total: u64 = 0;
        for segment in &segments {
            total = total
                .checked_add(segment.validate(edit_rate)?)
                .ok_or(ImfError::TimelineOverflow(segment.id))?;
        }

        let start_timecode = match start_timecode {
            Some(tc) => Some(tc.checked_resample(edit_rate).ok_or_else(|| {
                ImfError::InvalidTimecode(format!("{} does not fit at {} fps", tc, edit_rate))
            })?),
            None => None,
        };
        let origin = start_timecode.map_or(0, |tc| tc.frame());
        if origin.checked_add(total).is_none() {
            return Err(ImfError::TimelineOverflow(info.id));
        }

        Ok(Self {
            info,
            edit_rate,
            start_timecode,
            segments,
        })
    }

    /// Descriptive header.
    pub fn info(&self) -> &CompositionInfo {
        &self.info
    }

    /// Composition identifier.
    pub fn id(&self) -> Identifier {
        self.info.id
    }

    /// Content title.
    pub fn title(&self) -> &UserText {
        &self.info.title
    }

    /// Rate of every timeline position and duration.
    pub fn edit_rate(&self) -> RationalRate {
        self.edit_rate
    }

    /// Declared start timecode, if any.
    pub fn start_timecode(&self) -> Option<Timecode> {
        self.start_timecode
    }

    /// Timeline origin: the start timecode, else `00:00:00:00`.
    pub fn origin(&self) -> Timecode {
        self.start_timecode
            .unwrap_or_else(|| Timecode::zero(self.edit_rate))
    }

    /// Validated segments, in playback order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// All sequences, segment by segment.
    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.segments.iter().flat_map(|s| s.sequences.iter())
    }

    /// All resources, in timeline order within each sequence.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.sequences().flat_map(|s| s.resources.iter())
    }

    /// Resources that reference track files.
    pub fn track_file_resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources().filter(|r| r.track_file_info().is_some())
    }

    /// Virtual track ids, in order of first appearance.
    pub fn track_ids(&self) -> Vec<Identifier> {
        let mut ids = Vec::new();
        for sequence in self.sequences() {
            if !ids.contains(&sequence.track_id) {
                ids.push(sequence.track_id);
            }
        }
        ids
    }

    /// Essence descriptor by id.
    pub fn essence_descriptor(&self, id: &Identifier) -> Option<&EssenceDescriptor> {
        self.info.essence_descriptors.iter().find(|d| &d.id == id)
    }

    /// Total duration in composition edit units.
    pub fn duration(&self) -> u64 {
        self.segments
            .iter()
            .map(|s| s.duration(self.edit_rate))
            .sum()
    }

    /// Total duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.edit_rate.units_to_seconds(self.duration())
    }

    /// Span of the whole composition from its origin.
    pub fn timecode_range(&self) -> TimecodeRange {
        TimecodeRange::new(self.origin(), self.duration())
    }

    /// Walk the timeline with a visitor.
    pub fn walk<'a, V>(&'a self, visitor: &mut V)
    where
        V: TimelineVisitor<'a> + ?Sized,
    {
        timeline::walk(&self.segments, self.origin(), visitor);
    }

    /// Every placed segment, sequence and resource.
    pub fn timeline(&self) -> TimelineCollector<'_> {
        let mut collector = TimelineCollector::default();
        self.walk(&mut collector);
        collector
    }

    /// Segments with their timeline ranges.
    pub fn placed_segments(&self) -> Vec<PlacedSegment<'_>> {
        self.timeline().segments
    }

    /// Sequences with their timeline ranges.
    pub fn placed_sequences(&self) -> Vec<PlacedSequence<'_>> {
        self.timeline().sequences
    }

    /// Resources with their timeline ranges and effective rates.
    pub fn placed_resources(&self) -> Vec<PlacedResource<'_>> {
        self.timeline().resources
    }
}
