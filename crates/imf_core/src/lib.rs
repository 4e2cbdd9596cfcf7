//! IMF Core - Interoperable Master Format package model
//!
//! This crate parses the documents of an IMF package (asset map, packing
//! list, composition playlist, output profile list), projects the
//! composition onto a timeline and resolves track file references to
//! files on disk. It has no CLI dependencies.

pub mod assetmap;
pub mod config;
pub mod cpl;
pub mod digest;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod opl;
pub mod package;
pub mod pkl;
pub mod rational;
pub mod timecode;
pub mod xml;

pub use error::{ImfError, ImfResult};
pub use identifier::Identifier;
pub use package::{resolve_track_file, Package, ResolvedAsset};
pub use rational::RationalRate;
pub use timecode::{Timecode, TimecodeRange};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
