//! Base64-encoded message digests carried by PKL and CPL documents.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Serialize, Serializer};

use crate::error::{ImfError, ImfResult};

/// A validated base64 blob. The original text is kept for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Blob {
    text: String,
    bytes: Vec<u8>,
}

impl Base64Blob {
    /// Decode and validate base64 text. Embedded whitespace is ignored.
    pub fn parse(field: &str, text: &str) -> ImfResult<Self> {
        let compact: String = text.split_whitespace().collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|_| ImfError::invalid_value(field, text))?;
        Ok(Self {
            text: compact,
            bytes,
        })
    }

    /// Decoded digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Base64 text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Base64Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Base64Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// Digest algorithm name from an `Algorithm` URI (`...xmldsig#sha1` -> `sha1`).
pub fn algorithm_name(uri: &str) -> &str {
    match uri.rsplit_once('#') {
        Some((_, fragment)) => fragment.trim(),
        None => uri.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_sha1_digest() {
        let blob = Base64Blob::parse("Hash", "2jmj7l5rSw0yVb/vlWAYkK/YBwk=").unwrap();
        assert_eq!(blob.as_bytes().len(), 20);
        assert_eq!(blob.to_string(), "2jmj7l5rSw0yVb/vlWAYkK/YBwk=");
    }

    #[test]
    fn rejects_invalid_text() {
        assert!(matches!(
            Base64Blob::parse("Hash", "not base64!"),
            Err(ImfError::InvalidValue { .. })
        ));
    }

    #[test]
    fn algorithm_fragment() {
        assert_eq!(
            algorithm_name("http://www.w3.org/2000/09/xmldsig#sha1"),
            "sha1"
        );
        assert_eq!(algorithm_name("sha256"), "sha256");
        assert_eq!(algorithm_name("urn:example#"), "");
    }
}
