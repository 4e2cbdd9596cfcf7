//! Composition Playlist module.
//!
//! A composition is a strict tree: segments play one after another, the
//! sequences of a segment play in parallel, and the resources of a sequence
//! play back to back. The tree is immutable once built and every segment
//! is checked for consistent sequence durations at construction.
//!
//! # Timing
//!
//! - A resource plays `source_duration` units from `entry_point`,
//!   `repeat_count` times in total
//! - A resource without an edit rate inherits the composition's
//! - Durations and positions on the timeline are counted at the composition
//!   edit rate; resources at other rates (audio samples) are resampled
//!
//! # Usage
//!
//! ```ignore
//! use imf_core::cpl::Composition;
//!
//! let cpl = Composition::from_file(Path::new("/package/CPL_feature.xml"))?;
//! for placed in cpl.placed_resources() {
//!     println!("{} {} {}", placed.kind, placed.resource_id, placed.range);
//! }
//! ```

mod composition;
mod metadata;
mod parse;
mod resource;
mod sequence;
mod timeline;

pub use composition::{Composition, CompositionInfo};
pub use metadata::{
    parse_total_runtime, ContentKind, ContentMaturityRating, ContentVersion, ContentVersions,
    EssenceDescriptor, ExtensionProperty, Locale, CONTENT_KIND_SCOPE,
};
pub use resource::{
    Marker, MarkerLabel, Resource, ResourceBody, ResourceBuilder, TrackFileInfo,
    STANDARD_MARKER_SCOPE,
};
pub use sequence::{Segment, Sequence, SequenceKind};
pub use timeline::{
    walk, PlacedMarker, PlacedResource, PlacedSegment, PlacedSequence, TimelineCollector,
    TimelineContext, TimelineVisitor,
};
