//! Sequences (virtual tracks) and segments (parallel groups of sequences).

use std::fmt;

use serde::Serialize;

use crate::error::{ImfError, ImfResult};
use crate::identifier::Identifier;
use crate::rational::RationalRate;
use crate::timecode::checked_resample_count;
use crate::xml::UserText;

use super::resource::Resource;

/// Kind of a sequence, fixed by its element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    /// `MainImageSequence`.
    Image,
    /// `MainAudioSequence`.
    Audio,
    /// `MarkerSequence`.
    Marker,
    /// `IsochronousSequence` (also spelled `ISXDSequence`).
    Isochronous,
}

impl SequenceKind {
    /// Map a sequence element's local name to its kind.
    pub fn from_tag(tag: &str) -> ImfResult<Self> {
        match tag {
            "MainImageSequence" => Ok(Self::Image),
            "MainAudioSequence" => Ok(Self::Audio),
            "MarkerSequence" => Ok(Self::Marker),
            "IsochronousSequence" | "ISXDSequence" => Ok(Self::Isochronous),
            other => Err(ImfError::UnsupportedSequenceType(other.to_string())),
        }
    }

    /// Element name written for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Image => "MainImageSequence",
            Self::Audio => "MainAudioSequence",
            Self::Marker => "MarkerSequence",
            Self::Isochronous => "IsochronousSequence",
        }
    }

    /// Unit of the edit rate when displayed.
    pub fn rate_unit(&self) -> &'static str {
        match self {
            Self::Audio => "Hz",
            Self::Image | Self::Marker | Self::Isochronous => "fps",
        }
    }

    /// Whether resources of this kind reference track files.
    pub fn carries_essence(&self) -> bool {
        !matches!(self, Self::Marker)
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Marker => "marker",
            Self::Isochronous => "isochronous",
        };
        f.pad(name)
    }
}

/// An ordered list of resources played back to back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sequence {
    /// Sequence identifier.
    pub id: Identifier,
    /// Virtual track this sequence contributes to, shared across segments.
    pub track_id: Identifier,
    /// What the sequence carries.
    pub kind: SequenceKind,
    /// Resources in playback order.
    pub resources: Vec<Resource>,
}

impl Sequence {
    /// Create a sequence.
    pub fn new(id: Identifier, track_id: Identifier, kind: SequenceKind, resources: Vec<Resource>) -> Self {
        Self {
            id,
            track_id,
            kind,
            resources,
        }
    }

    /// Sum of resource durations, in units of `timeline_rate`.
    ///
    /// Saturates at `u64::MAX`; segments held by a `Composition` are known to fit.
    pub fn duration(&self, timeline_rate: RationalRate) -> u64 {
        self.checked_duration(timeline_rate).unwrap_or(u64::MAX)
    }

    /// Sum of resource durations, or `None` if it does not fit in `u64`.
    pub fn checked_duration(&self, timeline_rate: RationalRate) -> Option<u64> {
        self.resources.iter().try_fold(0u64, |total, r| {
            let rate = r.effective_edit_rate(timeline_rate);
            total.checked_add(checked_resample_count(r.duration(), rate, timeline_rate)?)
        })
    }
}

/// A group of sequences that play in parallel for the same duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Segment identifier.
    pub id: Identifier,
    /// Optional description.
    pub annotation: Option<UserText>,
    /// Parallel sequences.
    pub sequences: Vec<Sequence>,
}

impl Segment {
    /// Create a segment.
    pub fn new(id: Identifier, annotation: Option<UserText>, sequences: Vec<Sequence>) -> Self {
        Self {
            id,
            annotation,
            sequences,
        }
    }

    /// Check that every sequence has the same duration and return it.
    ///
    /// An empty segment has duration 0.
    pub fn validate(&self, timeline_rate: RationalRate) -> ImfResult<u64> {
        let mut durations = self.sequences.iter().map(|s| {
            s.checked_duration(timeline_rate)
                .ok_or(ImfError::TimelineOverflow(s.id))
        });
        let Some(expected) = durations.next().transpose()? else {
            return Ok(0);
        };
        for found in durations {
            let found = found?;
            if found != expected {
                return Err(ImfError::SegmentDurationMismatch {
                    segment: self.id,
                    expected,
                    found,
                });
            }
        }
        Ok(expected)
    }

    /// Duration of the segment, taken from its first sequence.
    ///
    /// Segments held by a `Composition` are validated, so every sequence
    /// agrees; use [`Segment::validate`] on free-standing segments.
    pub fn duration(&self, timeline_rate: RationalRate) -> u64 {
        self.sequences
            .first()
            .map(|s| s.duration(timeline_rate))
            .unwrap_or(0)
    }

    /// Sequences of one kind.
    pub fn sequences_of(&self, kind: SequenceKind) -> impl Iterator<Item = &Sequence> {
        self.sequences.iter().filter(move |s| s.kind == kind)
    }
}
