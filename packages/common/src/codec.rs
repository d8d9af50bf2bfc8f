//! Base64 staging for file attachments.
//!
//! Picked files are read fully, encoded once and decoded once into the blob
//! that gets uploaded. Every upload path goes through these two functions.

use base64::{Engine as _, engine::general_purpose};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("attachment payload is empty")]
    Empty,
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Encode raw bytes as standard padded base64.
pub fn encode(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode a base64 payload into bytes.
///
/// Accepts a `data:<mime>;base64,` prefix and ignores embedded whitespace,
/// both of which file pickers produce.
pub fn decode(payload: &str) -> Result<Vec<u8>, CodecError> {
    let body = match payload.split_once(',') {
        Some((head, rest)) if head.starts_with("data:") => rest,
        _ => payload,
    };

    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(CodecError::Empty);
    }

    Ok(general_purpose::STANDARD.decode(compact)?)
}
