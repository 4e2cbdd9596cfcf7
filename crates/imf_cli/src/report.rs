//! Text and JSON reports printed by the subcommands.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use imf_core::cpl::{Composition, PlacedResource, SequenceKind};
use imf_core::{Identifier, Package};

/// Marker placements listed per resource; the rest are only counted.
pub const MAX_LISTED_MARKERS: usize = 32;

/// Overview of a package.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub title: String,
    pub composition_id: Identifier,
    pub edit_rate: String,
    pub start: String,
    pub end: String,
    pub duration_frames: u64,
    pub duration_seconds: f64,
    pub segments: usize,
    pub sequences: usize,
    pub resources: usize,
    pub track_files: usize,
    pub packed_assets: usize,
    /// Total asset size in bytes, unknown if any chunk omits its length.
    pub total_size: Option<u64>,
    pub output_profile: Option<Identifier>,
}

impl Summary {
    pub fn from_package(package: &Package) -> Self {
        let composition = package.composition();
        let range = composition.timecode_range();

        Self {
            title: composition.title().text.clone(),
            composition_id: composition.id(),
            edit_rate: composition.edit_rate().to_display_string(),
            start: range.start.to_string(),
            end: range.end().to_string(),
            duration_frames: composition.duration(),
            duration_seconds: composition.duration_seconds(),
            segments: composition.segments().len(),
            sequences: composition.sequences().count(),
            resources: composition.resources().count(),
            track_files: composition.track_file_resources().count(),
            packed_assets: package.packing_list().assets.len(),
            total_size: package.catalog().total_size(),
            output_profile: package.output_profile().map(|opl| opl.id),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title:        {}", self.title)?;
        writeln!(f, "Composition:  {}", self.composition_id)?;
        writeln!(f, "Edit rate:    {} fps", self.edit_rate)?;
        writeln!(
            f,
            "Duration:     {} frames ({:.3} s), {} - {}",
            self.duration_frames, self.duration_seconds, self.start, self.end
        )?;
        writeln!(
            f,
            "Structure:    {} segments, {} sequences, {} resources ({} track files)",
            self.segments, self.sequences, self.resources, self.track_files
        )?;
        writeln!(f, "Assets:       {} packed", self.packed_assets)?;
        match self.total_size {
            Some(bytes) => writeln!(f, "Total size:   {} bytes", bytes)?,
            None => writeln!(f, "Total size:   unknown")?,
        }
        if let Some(id) = &self.output_profile {
            writeln!(f, "Output profile: {}", id)?;
        }
        Ok(())
    }
}

/// One placed resource.
#[derive(Debug, Serialize)]
pub struct TimelineLine {
    pub segment: usize,
    pub sequence: usize,
    pub kind: SequenceKind,
    pub resource_id: Identifier,
    pub track_file_id: Option<Identifier>,
    pub start: String,
    pub end: String,
    pub duration_frames: u64,
    pub edit_rate: String,
    pub entry_point: u64,
    pub source_duration: u64,
    pub repeat_count: u32,
    /// First placed markers, as `label@timecode`.
    pub markers: Vec<String>,
    /// All marker placements, including those not listed.
    pub marker_count: u64,
}

impl TimelineLine {
    pub fn collect(composition: &Composition) -> Vec<Self> {
        composition
            .placed_resources()
            .iter()
            .map(Self::from_placed)
            .collect()
    }

    fn from_placed(placed: &PlacedResource<'_>) -> Self {
        let resource = placed.resource;
        let markers = placed
            .placed_markers()
            .take(MAX_LISTED_MARKERS)
            .map(|m| format!("{}@{}", m.marker.label.text, m.position))
            .collect();

        Self {
            segment: placed.segment_index,
            sequence: placed.sequence_index,
            kind: placed.kind,
            resource_id: placed.resource_id,
            track_file_id: resource.track_file_info().map(|info| info.track_file_id),
            start: placed.range.start.to_string(),
            end: placed.range.end().to_string(),
            duration_frames: placed.range.duration,
            edit_rate: format!(
                "{} {}",
                placed.edit_rate.to_display_string(),
                placed.kind.rate_unit()
            ),
            entry_point: resource.entry_point(),
            source_duration: resource.source_duration(),
            repeat_count: resource.repeat_count(),
            markers,
            marker_count: placed.placed_marker_count(),
        }
    }
}

impl fmt::Display for TimelineLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}.{}] {:<11} {} - {} {:>8} frames  in={} len={} x{} @ {}",
            self.segment,
            self.sequence,
            self.kind,
            self.start,
            self.end,
            self.duration_frames,
            self.entry_point,
            self.source_duration,
            self.repeat_count,
            self.edit_rate
        )?;
        match &self.track_file_id {
            Some(id) => write!(f, "  {}", id)?,
            None => write!(f, "  {}", self.markers.join(" "))?,
        }
        let unlisted = self.marker_count.saturating_sub(self.markers.len() as u64);
        if unlisted > 0 {
            write!(f, " (+{} more)", unlisted)?;
        }
        Ok(())
    }
}

/// Resolution outcome for one track file resource.
#[derive(Debug, Serialize)]
pub struct ResolutionLine {
    pub resource_id: Identifier,
    pub track_file_id: Option<Identifier>,
    pub path: Option<PathBuf>,
    pub exists: bool,
    pub error: Option<String>,
}

impl ResolutionLine {
    pub fn collect(package: &Package) -> Vec<Self> {
        package
            .resolve_all()
            .into_iter()
            .map(|(resource, result)| {
                let track_file_id = resource.track_file_info().map(|info| info.track_file_id);
                match result {
                    Ok(asset) => Self {
                        resource_id: resource.id(),
                        track_file_id,
                        exists: asset.path.is_file(),
                        path: Some(asset.path),
                        error: None,
                    },
                    Err(err) => Self {
                        resource_id: resource.id(),
                        track_file_id,
                        path: None,
                        exists: false,
                        error: Some(err.to_string()),
                    },
                }
            })
            .collect()
    }
}

impl fmt::Display for ResolutionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.track_file_id.unwrap_or(self.resource_id);
        match (&self.path, &self.error) {
            (Some(path), _) if self.exists => write!(f, "{}  {}", id, path.display()),
            (Some(path), _) => write!(f, "{}  {} (missing on disk)", id, path.display()),
            (None, Some(error)) => write!(f, "{}  ERROR: {}", id, error),
            (None, None) => write!(f, "{}  ERROR: unresolved", id),
        }
    }
}
