//! Base64 image payload decoding.
//!
//! Clients upload images as `data:<mime>;base64,<payload>` strings (the
//! leading `data:` is optional). The MIME subtype doubles as the stored
//! file extension.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::{AppError, AppResult};

/// A decoded base64 image payload.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Full MIME type, e.g. `image/png`.
    pub content_type: String,
    /// File extension derived from the MIME subtype.
    pub extension: String,
    /// Decoded bytes.
    pub data: Vec<u8>,
}

/// Parse a `<mime>;base64,<data>` envelope into its decoded payload.
pub fn decode_image_payload(raw: &str) -> AppResult<ImagePayload> {
    let raw = raw.strip_prefix("data:").unwrap_or(raw);

    let (mime, encoded) = raw
        .split_once(";base64,")
        .ok_or_else(|| AppError::Validation("expected a base64-encoded image".to_string()))?;

    if encoded.is_empty() {
        return Err(AppError::Validation("image payload is empty".to_string()));
    }

    let data = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::Validation(format!("invalid base64 image data: {e}")))?;

    let extension = mime.rsplit('/').next().unwrap_or("bin").to_string();

    Ok(ImagePayload {
        content_type: mime.to_string(),
        extension,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_data_prefix() {
        // "hi" in base64
        let payload = decode_image_payload("data:image/png;base64,aGk=").unwrap();
        assert_eq!(payload.content_type, "image/png");
        assert_eq!(payload.extension, "png");
        assert_eq!(payload.data, b"hi");
    }

    #[test]
    fn test_decode_without_data_prefix() {
        let payload = decode_image_payload("image/jpeg;base64,aGk=").unwrap();
        assert_eq!(payload.extension, "jpeg");
    }

    #[test]
    fn test_decode_rejects_missing_envelope() {
        assert!(decode_image_payload("aGk=").is_err());
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        assert!(decode_image_payload("data:image/png;base64,").is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        assert!(decode_image_payload("data:image/png;base64,???").is_err());
    }
}
