//! Rational edit and sample rates.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{ImfError, ImfResult};

/// A rate expressed as a ratio of two positive integers (e.g. `24000/1001`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RationalRate {
    numerator: u32,
    denominator: u32,
}

impl RationalRate {
    /// Create a new rate. Both terms must be non-zero.
    pub fn new(numerator: u32, denominator: u32) -> ImfResult<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(ImfError::InvalidRate {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Parse the `EditRate` element form: two integers separated by whitespace.
    pub fn parse_edit_rate(text: &str) -> ImfResult<Self> {
        let mut parts = text.split_whitespace();
        let (num, den) = match (parts.next(), parts.next(), parts.next()) {
            (Some(num), Some(den), None) => (num, den),
            _ => return Err(ImfError::invalid_value("EditRate", text)),
        };

        let numerator = num
            .parse()
            .map_err(|_| ImfError::invalid_value("EditRate", text))?;
        let denominator = den
            .parse()
            .map_err(|_| ImfError::invalid_value("EditRate", text))?;
        Self::new(numerator, denominator)
    }

    /// Numerator.
    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    /// Denominator.
    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// Rate as a floating approximation.
    pub fn to_float(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Whether the ratio is a whole number.
    pub fn is_integral(&self) -> bool {
        self.numerator % self.denominator == 0
    }

    /// Integer frames per second used for timecode display (24000/1001 -> 24).
    pub fn nominal_fps(&self) -> u32 {
        (self.to_float().round() as u32).max(1)
    }

    /// Display form: the integer when exact, else rounded to two decimals.
    pub fn to_display_string(&self) -> String {
        if self.is_integral() {
            (self.numerator / self.denominator).to_string()
        } else {
            let rounded = format!("{:.2}", self.to_float());
            rounded.trim_end_matches('0').trim_end_matches('.').to_string()
        }
    }

    /// Convert a count of units at this rate into seconds.
    pub fn units_to_seconds(&self, units: u64) -> f64 {
        units as f64 * self.denominator as f64 / self.numerator as f64
    }
}

impl fmt::Display for RationalRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl FromStr for RationalRate {
    type Err = ImfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_edit_rate(s)
    }
}
