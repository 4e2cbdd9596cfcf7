//! Error types for IMF document parsing and package assembly.
//!
//! Structural problems fail the parse of the enclosing document. Asset
//! resolution failures are reported per resource and never abort loading
//! a package.

use std::path::PathBuf;

use thiserror::Error;

use crate::identifier::Identifier;

/// Errors that can occur while reading or assembling an IMF package.
#[derive(Error, Debug)]
pub enum ImfError {
    /// An identifier is not a valid RFC 4122 `urn:uuid:` value.
    #[error("Malformed identifier: '{0}'")]
    MalformedIdentifier(String),

    /// A mandatory element is absent.
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// An element is present but its text cannot be interpreted.
    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: String, value: String },

    /// Resource trim/repeat values violate their bounds.
    #[error("Invalid resource bounds ({field}): {reason}")]
    InvalidResourceBounds { field: &'static str, reason: String },

    /// A sequence element is not one of the supported kinds.
    #[error("Unsupported sequence type: {0}")]
    UnsupportedSequenceType(String),

    /// Parallel sequences in one segment have different durations.
    #[error("Segment {segment} has sequences of differing duration: expected {expected}, found {found}")]
    SegmentDurationMismatch {
        segment: Identifier,
        expected: u64,
        found: u64,
    },

    /// A duration or position does not fit in 64-bit edit units.
    #[error("Timeline of {0} exceeds the range of 64-bit edit units")]
    TimelineOverflow(Identifier),

    /// No packing list or asset map entry matches a track file id.
    #[error("Unresolved asset reference: {0}")]
    UnresolvedAssetReference(Identifier),

    /// Asset resolution was requested for a marker resource.
    #[error("Resource {0} does not reference a track file")]
    NotATrackFile(Identifier),

    /// The asset map references more than one packing list.
    #[error("Support for {0} packing lists is not implemented")]
    MultiplePackingListsUnsupported(usize),

    /// The asset map references no packing list.
    #[error("The asset map does not reference a packing list")]
    NoPackingListFound,

    /// The packing list is split across several chunks.
    #[error("Support for chunked packing lists is not implemented ({0} chunks)")]
    ChunkedPackingListUnsupported(usize),

    /// No composition playlist was found in the package directory.
    #[error("Could not find a composition playlist in {0}")]
    NoCompositionFound(PathBuf),

    /// More than one composition playlist was found.
    #[error("Support for {0} composition playlists is not implemented")]
    MultipleCompositionsUnsupported(usize),

    /// More than one output profile list was found.
    #[error("Support for {0} output profile lists is not implemented")]
    MultipleOutputProfilesUnsupported(usize),

    /// The asset map file is missing from the package directory.
    #[error("Asset map not found: {0}")]
    MissingAssetMap(PathBuf),

    /// The package path is not a directory.
    #[error("Path does not exist or is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A rate has a zero numerator or denominator.
    #[error("Invalid rate: {numerator}/{denominator}")]
    InvalidRate { numerator: u32, denominator: u32 },

    /// A timecode string or drop-frame combination is invalid.
    #[error("Invalid timecode: {0}")]
    InvalidTimecode(String),

    /// Two entries of an id-keyed collection share the same id.
    #[error("Duplicate {what} identifier: {id}")]
    DuplicateIdentifier { what: &'static str, id: Identifier },

    /// Two maturity ratings in one locale name the same agency.
    #[error("Duplicate content maturity rating for agency '{0}'")]
    DuplicateRatingAgency(String),

    /// The document root is not the expected element.
    #[error("Unexpected root element <{found}>, expected <{expected}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    /// The document is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Failed to read a document from disk.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ImfError {
    /// Create a missing field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingRequiredField(field.into())
    }

    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an invalid resource bounds error.
    pub fn bounds(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidResourceBounds {
            field,
            reason: reason.into(),
        }
    }

    /// Create an I/O error with the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for IMF operations.
pub type ImfResult<T> = Result<T, ImfError>;
