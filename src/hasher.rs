/// Content hashing for recipe pins.
use sha2::{Digest as _, Sha256};

use crate::error::Error;
use crate::types::SourceBuffer;

/// SHA-256 of `text` as 64 lowercase hex chars.
pub fn hash_text(text: &str) -> String {
    let hash = Sha256::digest(text.as_bytes());
    return format!("{hash:x}");
}

/// Verify the buffer still has the content a recipe was written against.
///
/// # Errors
///
/// Returns `Error::ContentMismatch` when the hashes differ.
pub fn verify_pin(buffer: &SourceBuffer, expected: &str) -> Result<(), Error> {
    let actual = hash_text(&buffer.text);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        return Ok(());
    }
    return Err(Error::ContentMismatch {
        actual,
        expected: expected.to_string(),
        file: buffer.path.clone(),
    });
}
