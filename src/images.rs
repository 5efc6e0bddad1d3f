// ABOUTME: Inbound image payload validation - size ceiling, base64 decode, format sniffing
// ABOUTME: Guards the external image-analysis call from malformed or oversized input
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gymkit Contributors

//! Image ingestion validation.
//!
//! Payloads arrive as base64 strings, usually `data:image/...;base64,`
//! URLs pasted straight from a browser canvas. Before anything reaches
//! the image-analysis service the payload must decode, stay under the
//! size ceiling, and carry a recognized image signature. Rejections are
//! user-facing text results, not errors.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Size ceiling for decoded image payloads (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Recognized image container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG
    Png,
    /// JPEG
    Jpeg,
    /// GIF
    Gif,
    /// WebP
    Webp,
    /// BMP
    Bmp,
}

impl ImageFormat {
    /// MIME type forwarded to the analysis service
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
        }
    }

    /// Sniff the format from leading magic bytes
    fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else if bytes.starts_with(b"BM") {
            Some(Self::Bmp)
        } else {
            None
        }
    }
}

/// A structurally valid, size-bounded image ready for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedImage {
    /// Decoded image bytes
    pub bytes: Vec<u8>,
    /// Sniffed container format
    pub format: ImageFormat,
}

impl ValidatedImage {
    /// Re-encode the bytes as base64 for the analysis API
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

/// Reason an image payload was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRejection {
    /// Decoded payload exceeds [`MAX_IMAGE_BYTES`]
    TooLarge,
    /// Payload is not decodable or carries no recognized image signature
    InvalidFormat,
}

impl ImageRejection {
    /// User-facing text shown in place of an analysis result
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::TooLarge => {
                "The image is too large. Please use a smaller image (max. 10 MB)."
            }
            Self::InvalidFormat => {
                "The image could not be processed. The format is invalid or the file is corrupted."
            }
        }
    }
}

/// Validate an inbound image payload
///
/// Accepts a raw base64 string or a `data:image/...;base64,` URL.
///
/// # Errors
///
/// Returns an [`ImageRejection`] describing why the payload was refused;
/// the analysis service must never see a rejected payload.
pub fn validate_image_payload(payload: &str) -> Result<ValidatedImage, ImageRejection> {
    let encoded = payload
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .map_or(payload, |(_, data)| data);

    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|_| ImageRejection::InvalidFormat)?;

    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageRejection::TooLarge);
    }

    let format = ImageFormat::sniff(&bytes).ok_or(ImageRejection::InvalidFormat)?;

    Ok(ValidatedImage { bytes, format })
}
