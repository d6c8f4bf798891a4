//! Content-derived identity for font binaries

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;

/// SHA-256 digest of the complete byte content of a font binary.
///
/// Byte-identical fonts always share an identity, whatever URL or request
/// they arrived through. The digest is a cache key, not a security boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontIdentity([u8; 32]);

impl FontIdentity {
    /// Hash an in-memory font binary
    pub fn of(font: &[u8]) -> Self {
        Self(Sha256::digest(font).into())
    }

    /// Hash a font stream, consuming it exactly once
    ///
    /// The reader is left at end of stream; callers that need the bytes again
    /// for rendering must keep their own copy.
    pub fn from_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(Self(hasher.finalize().into()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex form of the digest
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for FontIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FontIdentity {
    // Short prefix keeps log lines readable
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FontIdentity({}..)", &self.to_hex()[..12])
    }
}
