//! Ingress validation (spec §4.1: "Image must be a decodable raster format
//! with bounded dimensions ... `context` trimmed and non-empty, length
//! capped").

use altify_core::domain::MAX_CONTEXT_LEN;
use altify_core::error::{AltifyError, Result};

/// Reject images over this size outright, before attempting to decode them.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Reject images wider or taller than this (spec §4.1).
pub const MAX_IMAGE_DIM: u32 = 8192;

/// Decode `bytes` as a raster image and check its size/dimensions. Returns
/// `Ok(())` without keeping the decoded buffer around — callers still pass
/// the original bytes on to the blob store.
pub fn validate_image(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(AltifyError::BadInput("image must not be empty".to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AltifyError::BadInput(format!(
            "image is {} bytes, exceeds the {MAX_IMAGE_BYTES}-byte limit",
            bytes.len()
        )));
    }
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| AltifyError::BadInput(format!("image is not a decodable raster format: {e}")))?;
    let (width, height) = (decoded.width(), decoded.height());
    if width > MAX_IMAGE_DIM || height > MAX_IMAGE_DIM {
        return Err(AltifyError::BadInput(format!(
            "image is {width}x{height}, exceeds the {MAX_IMAGE_DIM}x{MAX_IMAGE_DIM} limit"
        )));
    }
    Ok(())
}

/// Trim and length-cap the context string; reject empty context.
pub fn validate_context(context: &str) -> Result<String> {
    let trimmed = context.trim();
    if trimmed.is_empty() {
        return Err(AltifyError::BadInput("context must not be empty".to_string()));
    }
    if trimmed.len() > MAX_CONTEXT_LEN {
        return Err(AltifyError::BadInput(format!(
            "context is {} bytes, exceeds the {MAX_CONTEXT_LEN}-byte limit",
            trimmed.len()
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // A 1x1 transparent PNG (the literal fixture from spec §8 scenario 1).
    const ONE_PX_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00,
        0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00,
        0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x64, 0x60, 0x60, 0x60, 0x00, 0x00, 0x00, 0x05, 0x00, 0x01,
        0x5A, 0x27, 0xDE, 0xFC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn valid_one_pixel_png_passes() {
        validate_image(ONE_PX_PNG).unwrap();
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let err = validate_image(b"not an image").unwrap_err();
        assert!(matches!(err, AltifyError::BadInput(_)));
    }

    #[test]
    fn oversized_bytes_are_rejected_without_decoding() {
        let big = vec![0u8; MAX_IMAGE_BYTES + 1];
        let err = validate_image(&big).unwrap_err();
        assert!(matches!(err, AltifyError::BadInput(_)));
    }

    #[test]
    fn empty_context_is_rejected() {
        let err = validate_context("   ").unwrap_err();
        assert!(matches!(err, AltifyError::BadInput(_)));
    }

    #[test]
    fn context_is_trimmed() {
        assert_eq!(validate_context("  cat on mat  ").unwrap(), "cat on mat");
    }

    #[test]
    fn overlong_context_is_rejected() {
        let long = "a".repeat(MAX_CONTEXT_LEN + 1);
        let err = validate_context(&long).unwrap_err();
        assert!(matches!(err, AltifyError::BadInput(_)));
    }
}
