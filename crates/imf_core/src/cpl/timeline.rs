//! Projection of the composition tree onto a single timeline.
//!
//! Positions are never stored on the tree. A walk threads a
//! [`TimelineContext`] down from the composition: every sequence of a
//! segment starts at the segment's start, and each resource starts where
//! the previous resource of its sequence ended. All timeline positions are
//! counted at the composition edit rate.

use serde::Serialize;

use crate::identifier::Identifier;
use crate::rational::RationalRate;
use crate::timecode::{resample_count, Timecode, TimecodeRange};

use super::resource::{Marker, Resource};
use super::sequence::{Segment, Sequence, SequenceKind};

/// Rate and position handed down the tree during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineContext {
    /// Rate inherited by children without their own edit rate.
    pub edit_rate: RationalRate,
    /// Where the next child starts.
    pub offset: Timecode,
}

impl TimelineContext {
    /// Context at the timeline origin.
    pub fn new(origin: Timecode) -> Self {
        Self {
            edit_rate: origin.rate(),
            offset: origin,
        }
    }

    /// Move the offset forward by `frames` timeline units.
    pub fn advance(self, frames: u64) -> Self {
        Self {
            offset: self.offset + frames,
            ..self
        }
    }
}

/// A segment with its timeline position.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlacedSegment<'a> {
    #[serde(skip)]
    pub segment: &'a Segment,
    /// Position of the segment in the composition.
    pub index: usize,
    pub range: TimecodeRange,
}

/// A sequence with its timeline position.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlacedSequence<'a> {
    #[serde(skip)]
    pub sequence: &'a Sequence,
    pub segment_index: usize,
    /// Position of the sequence within its segment.
    pub index: usize,
    pub range: TimecodeRange,
}

/// A resource with its timeline position and effective rate.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlacedResource<'a> {
    #[serde(skip)]
    pub resource: &'a Resource,
    pub resource_id: Identifier,
    pub kind: SequenceKind,
    pub track_id: Identifier,
    pub segment_index: usize,
    pub sequence_index: usize,
    /// Position of the resource within its sequence.
    pub index: usize,
    /// Own edit rate, else the composition's.
    pub edit_rate: RationalRate,
    /// Span on the timeline, at the composition edit rate.
    pub range: TimecodeRange,
    /// In/out points within the source, at `edit_rate`.
    pub edit_range: TimecodeRange,
}

/// A marker with its timeline position.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlacedMarker<'a> {
    pub marker: &'a Marker,
    /// Play of the resource the marker falls in, starting at 0.
    pub play: u32,
    pub position: Timecode,
}

impl<'a> PlacedResource<'a> {
    /// Markers inside the played region, once per play, in timeline order.
    ///
    /// Placements are produced lazily; a resource may repeat billions of times.
    pub fn placed_markers(&self) -> impl Iterator<Item = PlacedMarker<'a>> + 'a {
        let resource = self.resource;
        let entry = resource.entry_point();
        let length = resource.source_duration();
        let edit_rate = self.edit_rate;
        let start = self.range.start;

        (0..resource.repeat_count()).flat_map(move |play| {
            resource
                .markers()
                .iter()
                .filter(move |m| m.offset >= entry && m.offset - entry < length)
                .map(move |marker| {
                    // Within the resource's duration, which was checked to fit.
                    let units = u64::from(play) * length + (marker.offset - entry);
                    let frames = resample_count(units, edit_rate, start.rate());
                    PlacedMarker {
                        marker,
                        play,
                        position: start + frames,
                    }
                })
        })
    }

    /// Number of items [`PlacedResource::placed_markers`] yields.
    pub fn placed_marker_count(&self) -> u64 {
        let entry = self.resource.entry_point();
        let length = self.resource.source_duration();
        let per_play = self
            .resource
            .markers()
            .iter()
            .filter(|m| m.offset >= entry && m.offset - entry < length)
            .count() as u64;
        per_play.saturating_mul(u64::from(self.resource.repeat_count()))
    }
}

/// Callbacks for a timeline walk. All methods default to no-ops.
pub trait TimelineVisitor<'a> {
    fn visit_segment(&mut self, _segment: &PlacedSegment<'a>) {}

    fn visit_sequence(&mut self, _sequence: &PlacedSequence<'a>) {}

    fn visit_resource(&mut self, _resource: &PlacedResource<'a>) {}
}

/// Walk segments in order from `origin`, calling the visitor depth first.
pub fn walk<'a, V>(segments: &'a [Segment], origin: Timecode, visitor: &mut V)
where
    V: TimelineVisitor<'a> + ?Sized,
{
    let mut ctx = TimelineContext::new(origin);
    for (segment_index, segment) in segments.iter().enumerate() {
        let duration = segment.duration(ctx.edit_rate);
        visitor.visit_segment(&PlacedSegment {
            segment,
            index: segment_index,
            range: TimecodeRange::new(ctx.offset, duration),
        });

        for (sequence_index, sequence) in segment.sequences.iter().enumerate() {
            walk_sequence(ctx, segment_index, sequence_index, sequence, visitor);
        }
        ctx = ctx.advance(duration);
    }
}

fn walk_sequence<'a, V>(
    segment_ctx: TimelineContext,
    segment_index: usize,
    sequence_index: usize,
    sequence: &'a Sequence,
    visitor: &mut V,
) where
    V: TimelineVisitor<'a> + ?Sized,
{
    let timeline_rate = segment_ctx.edit_rate;
    visitor.visit_sequence(&PlacedSequence {
        sequence,
        segment_index,
        index: sequence_index,
        range: TimecodeRange::new(segment_ctx.offset, sequence.duration(timeline_rate)),
    });

    let mut ctx = segment_ctx;
    for (index, resource) in sequence.resources.iter().enumerate() {
        let duration = resource.timeline_duration(timeline_rate);
        let edit_rate = resource.effective_edit_rate(timeline_rate);
        visitor.visit_resource(&PlacedResource {
            resource,
            resource_id: resource.id(),
            kind: sequence.kind,
            track_id: sequence.track_id,
            segment_index,
            sequence_index,
            index,
            edit_rate,
            range: TimecodeRange::new(ctx.offset, duration),
            edit_range: resource.edit_range(timeline_rate),
        });
        ctx = ctx.advance(duration);
    }
}

/// Visitor gathering every placed item.
#[derive(Debug, Default)]
pub struct TimelineCollector<'a> {
    pub segments: Vec<PlacedSegment<'a>>,
    pub sequences: Vec<PlacedSequence<'a>>,
    pub resources: Vec<PlacedResource<'a>>,
}

impl<'a> TimelineVisitor<'a> for TimelineCollector<'a> {
    fn visit_segment(&mut self, segment: &PlacedSegment<'a>) {
        self.segments.push(*segment);
    }

    fn visit_sequence(&mut self, sequence: &PlacedSequence<'a>) {
        self.sequences.push(*sequence);
    }

    fn visit_resource(&mut self, resource: &PlacedResource<'a>) {
        self.resources.push(*resource);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpl::resource::{MarkerLabel, TrackFileInfo};

    fn id(n: u32) -> Identifier {
        Identifier::parse(&format!("urn:uuid:{:08x}-0000-4000-8000-000000000000", n)).unwrap()
    }

    fn rate(num: u32, den: u32) -> RationalRate {
        RationalRate::new(num, den).unwrap()
    }

    fn clip(n: u32, length: u64) -> Resource {
        Resource::track_file(id(n), length, TrackFileInfo::new(id(900), id(1000 + n)))
            .build()
            .unwrap()
    }

    fn two_segments() -> Vec<Segment> {
        let first = Segment::new(
            id(1),
            None,
            vec![
                Sequence::new(id(10), id(100), SequenceKind::Image, vec![clip(20, 48), clip(21, 48)]),
                Sequence::new(
                    id(11),
                    id(101),
                    SequenceKind::Audio,
                    vec![Resource::track_file(id(22), 192_000, TrackFileInfo::new(id(901), id(1022)))
                        .edit_rate(Some(rate(48000, 1)))
                        .build()
                        .unwrap()],
                ),
            ],
        );
        let second = Segment::new(
            id(2),
            None,
            vec![Sequence::new(id(12), id(100), SequenceKind::Image, vec![clip(23, 24)])],
        );
        vec![first, second]
    }

    #[test]
    fn resources_follow_each_other() {
        let segments = two_segments();
        let origin = Timecode::parse("01:00:00:00", rate(24, 1), false).unwrap();
        let mut collector = TimelineCollector::default();
        walk(&segments, origin, &mut collector);

        assert_eq!(collector.segments.len(), 2);
        assert_eq!(collector.segments[0].range.duration, 96);
        assert_eq!(collector.segments[1].range.start.to_string(), "01:00:04:00");

        let starts: Vec<String> = collector
            .resources
            .iter()
            .map(|r| r.range.start.to_string())
            .collect();
        assert_eq!(starts, vec!["01:00:00:00", "01:00:02:00", "01:00:00:00", "01:00:04:00"]);

        let audio = &collector.resources[2];
        assert_eq!(audio.kind, SequenceKind::Audio);
        assert_eq!(audio.edit_rate, rate(48000, 1));
        assert_eq!(audio.range.duration, 96);
        assert_eq!(audio.edit_range.duration, 192_000);
    }

    #[test]
    fn sequences_start_with_their_segment() {
        let segments = two_segments();
        let mut collector = TimelineCollector::default();
        walk(&segments, Timecode::zero(rate(24, 1)), &mut collector);

        for seq in &collector.sequences {
            let segment = &collector.segments[seq.segment_index];
            assert_eq!(seq.range.start, segment.range.start);
            assert_eq!(seq.range.duration, segment.range.duration);
        }
    }

    #[test]
    fn markers_repeat_with_their_resource() {
        let markers = vec![
            Marker {
                label: MarkerLabel::standard("FFOC"),
                offset: 2,
                annotation: None,
            },
            Marker {
                label: MarkerLabel::standard("LFOC"),
                offset: 9,
                annotation: None,
            },
        ];
        let resource = Resource::marker(id(30), 10, markers)
            .entry_point(Some(1))
            .source_duration(Some(5))
            .repeat_count(Some(2))
            .build()
            .unwrap();
        let segments = vec![Segment::new(
            id(3),
            None,
            vec![Sequence::new(id(13), id(102), SequenceKind::Marker, vec![resource])],
        )];

        let mut collector = TimelineCollector::default();
        walk(&segments, Timecode::zero(rate(24, 1)), &mut collector);
        let placed: Vec<_> = collector.resources[0].placed_markers().collect();

        // LFOC lies outside the played region.
        assert_eq!(placed.len(), 2);
        assert_eq!(collector.resources[0].placed_marker_count(), 2);
        assert_eq!(placed[0].position.frame(), 1);
        assert_eq!(placed[1].play, 1);
        assert_eq!(placed[1].position.frame(), 6);
    }

    #[test]
    fn heavily_repeated_markers_are_lazy() {
        let marker = Marker {
            label: MarkerLabel::standard("FFOC"),
            offset: 0,
            annotation: None,
        };
        let resource = Resource::marker(id(31), 1, vec![marker])
            .repeat_count(Some(4_000_000_000))
            .build()
            .unwrap();
        let segments = vec![Segment::new(
            id(4),
            None,
            vec![Sequence::new(id(14), id(103), SequenceKind::Marker, vec![resource])],
        )];

        let mut collector = TimelineCollector::default();
        walk(&segments, Timecode::zero(rate(24, 1)), &mut collector);
        let placed = &collector.resources[0];

        assert_eq!(placed.placed_marker_count(), 4_000_000_000);
        let first: Vec<_> = placed.placed_markers().take(3).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first[2].play, 2);
        assert_eq!(first[2].position.frame(), 2);
    }
}
