//! Frame-accurate SMPTE timecode on a rational edit rate.
//!
//! A [`Timecode`] is a frame count at a given rate; the `HH:MM:SS:FF`
//! address is a rendering of that count. Drop-frame rendering follows
//! SMPTE 12M: frame numbers 0 and 1 (0-3 at 60 fps nominal) are skipped at
//! the start of every minute except each tenth minute.

use std::fmt;
use std::ops::Add;

use serde::Serialize;

use crate::error::{ImfError, ImfResult};
use crate::rational::RationalRate;

/// A position on a timeline, counted in frames of `rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Timecode {
    frame: u64,
    rate: RationalRate,
    drop_frame: bool,
}

impl Timecode {
    /// A non-drop timecode at the given frame count.
    pub fn from_frames(frame: u64, rate: RationalRate) -> Self {
        Self {
            frame,
            rate,
            drop_frame: false,
        }
    }

    /// `00:00:00:00` at the given rate.
    pub fn zero(rate: RationalRate) -> Self {
        Self::from_frames(0, rate)
    }

    /// Switch the display mode. Drop frame is only valid for x/1001 rates
    /// whose nominal frame rate is a multiple of 30.
    pub fn with_drop_frame(mut self, drop_frame: bool) -> ImfResult<Self> {
        if drop_frame && !supports_drop_frame(self.rate) {
            return Err(ImfError::InvalidTimecode(format!(
                "drop frame is not defined for {} fps",
                self.rate
            )));
        }
        self.drop_frame = drop_frame;
        Ok(self)
    }

    /// Parse an `HH:MM:SS:FF` address (`;` or `.` separators accepted).
    pub fn parse(address: &str, rate: RationalRate, drop_frame: bool) -> ImfResult<Self> {
        let invalid = || ImfError::InvalidTimecode(address.to_string());

        let parts: Vec<&str> = address.trim().split([':', ';', '.']).collect();
        if parts.len() != 4 {
            return Err(invalid());
        }
        let mut values = [0u64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *value = part.parse().map_err(|_| invalid())?;
        }
        let [hours, minutes, seconds, frames] = values;

        let fps = rate.nominal_fps() as u64;
        if minutes > 59 || seconds > 59 || frames >= fps {
            return Err(invalid());
        }

        let tc = Self::zero(rate).with_drop_frame(drop_frame)?;
        let total_minutes = hours
            .checked_mul(60)
            .and_then(|m| m.checked_add(minutes))
            .ok_or_else(invalid)?;
        let nominal = total_minutes
            .checked_mul(60)
            .and_then(|s| s.checked_add(seconds))
            .and_then(|s| s.checked_mul(fps))
            .and_then(|f| f.checked_add(frames))
            .ok_or_else(invalid)?;
        if !drop_frame {
            return Ok(Self::from_frames(nominal, rate));
        }

        let drop = drop_count(fps);
        if seconds == 0 && minutes % 10 != 0 && frames < drop {
            return Err(ImfError::InvalidTimecode(format!(
                "{} is a dropped frame label",
                address
            )));
        }
        // Fewer labels are dropped per minute than a minute holds, so this
        // stays below `nominal`.
        let dropped = drop * (total_minutes - total_minutes / 10);
        Ok(Self {
            frame: nominal - dropped,
            ..tc
        })
    }

    /// Frame count from `00:00:00:00`.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Edit rate of the count.
    pub fn rate(&self) -> RationalRate {
        self.rate
    }

    /// Whether this renders as drop frame.
    pub fn is_drop_frame(&self) -> bool {
        self.drop_frame
    }

    /// Advance by a number of frames at this timecode's rate, saturating at
    /// the last representable frame.
    pub fn add_frames(self, frames: u64) -> Self {
        Self {
            frame: self.frame.saturating_add(frames),
            ..self
        }
    }

    /// Advance by a number of frames, or `None` past the last representable frame.
    pub fn checked_add_frames(self, frames: u64) -> Option<Self> {
        Some(Self {
            frame: self.frame.checked_add(frames)?,
            ..self
        })
    }

    /// Express this position at another rate, rounding to the nearest frame.
    ///
    /// The drop-frame flag is kept only if the target rate supports it.
    /// Saturates when the position does not fit at the target rate.
    pub fn resample(self, to: RationalRate) -> Self {
        Self {
            frame: resample_count(self.frame, self.rate, to),
            rate: to,
            drop_frame: self.drop_frame && supports_drop_frame(to),
        }
    }

    /// Like [`Timecode::resample`], or `None` when the position does not fit.
    pub fn checked_resample(self, to: RationalRate) -> Option<Self> {
        Some(Self {
            frame: checked_resample_count(self.frame, self.rate, to)?,
            rate: to,
            drop_frame: self.drop_frame && supports_drop_frame(to),
        })
    }

    /// Position in seconds.
    pub fn seconds(&self) -> f64 {
        self.rate.units_to_seconds(self.frame)
    }

    /// Display components `(hours, minutes, seconds, frames)`; hours wrap at 24.
    pub fn components(&self) -> (u64, u64, u64, u64) {
        let fps = self.rate.nominal_fps() as u64;
        let label = if self.drop_frame {
            drop_frame_label(self.frame, fps)
        } else {
            self.frame
        };

        let frames = label % fps;
        let total_seconds = label / fps;
        let seconds = total_seconds % 60;
        let minutes = (total_seconds / 60) % 60;
        let hours = (total_seconds / 3600) % 24;
        (hours, minutes, seconds, frames)
    }
}

impl Add<u64> for Timecode {
    type Output = Timecode;

    fn add(self, frames: u64) -> Self::Output {
        self.add_frames(frames)
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, minutes, seconds, frames) = self.components();
        let sep = if self.drop_frame { ';' } else { ':' };
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}",
            hours, minutes, seconds, sep, frames
        )
    }
}

/// A start position and a duration in frames of the start's rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimecodeRange {
    /// First frame of the range.
    pub start: Timecode,
    /// Number of frames in the range.
    pub duration: u64,
}

impl TimecodeRange {
    /// Create a new range.
    pub fn new(start: Timecode, duration: u64) -> Self {
        Self { start, duration }
    }

    /// First frame after the range.
    pub fn end(&self) -> Timecode {
        self.start + self.duration
    }

    /// Duration rendered as a timecode from zero.
    pub fn duration_timecode(&self) -> Timecode {
        Timecode {
            frame: self.duration,
            ..self.start
        }
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.start.rate().units_to_seconds(self.duration)
    }

    /// Re-express the range at another rate (nearest-frame rounding).
    pub fn resample(&self, to: RationalRate) -> Self {
        Self {
            start: self.start.resample(to),
            duration: resample_count(self.duration, self.start.rate(), to),
        }
    }
}

impl fmt::Display for TimecodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end())
    }
}

/// Convert a count of units at `from` into units at `to`.
///
/// Exact when the conversion divides evenly, otherwise rounded to the
/// nearest unit (halves round up). Saturates at `u64::MAX`.
pub fn resample_count(count: u64, from: RationalRate, to: RationalRate) -> u64 {
    checked_resample_count(count, from, to).unwrap_or(u64::MAX)
}

/// Like [`resample_count`], or `None` when the result exceeds `u64`.
pub fn checked_resample_count(count: u64, from: RationalRate, to: RationalRate) -> Option<u64> {
    if from == to {
        return Some(count);
    }
    // count * factor / divisor, split as q * divisor + r so no step leaves u128.
    let factor = from.denominator() as u128 * to.numerator() as u128;
    let divisor = from.numerator() as u128 * to.denominator() as u128;
    let count = count as u128;
    let whole = (count / divisor) * factor;
    let part = ((count % divisor) * factor + divisor / 2) / divisor;
    u64::try_from(whole.checked_add(part)?).ok()
}

/// Whether drop-frame labelling is defined for a rate.
pub fn supports_drop_frame(rate: RationalRate) -> bool {
    rate.denominator() == 1001 && rate.nominal_fps() % 30 == 0
}

/// Frame labels dropped per minute: 2 at 30 fps nominal, 4 at 60.
fn drop_count(fps: u64) -> u64 {
    fps / 15
}

/// Convert a frame count into the nominal count its drop-frame label shows.
fn drop_frame_label(frame: u64, fps: u64) -> u64 {
    let drop = drop_count(fps);
    let per_ten_minutes = fps * 600 - drop * 9;
    let per_minute = fps * 60 - drop;

    let tens = frame / per_ten_minutes;
    let rem = frame % per_ten_minutes;
    let skipped = if rem > drop {
        drop * 9 * tens + drop * ((rem - drop) / per_minute)
    } else {
        drop * 9 * tens
    };
    frame + skipped
}
