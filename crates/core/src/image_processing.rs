//! Image processing and encoding utilities.
//!
//! This module turns camera frames, screen captures and picked files into
//! base64 payloads for the Gemini API, and converts between those payloads
//! and `data:` URIs.
//!
//! # Data URIs
//!
//! A data URI has the form `data:<mime>;base64,<payload>`. Bare base64
//! payloads without the prefix are accepted as well and assumed to be JPEG.

use crate::error::{AppError, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

pub const JPEG_MIME: &str = "image/jpeg";
pub const PNG_MIME: &str = "image/png";

/// An encoded image as exchanged with the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    /// Base64 payload without any `data:` prefix.
    pub data: String,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Parses a data URI, or a bare base64 payload.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageProcessing`] if the URI is not base64 encoded
    /// or carries no payload.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        let Some(rest) = uri.strip_prefix("data:") else {
            if uri.is_empty() {
                return Err(AppError::image("Empty image payload"));
            }
            return Ok(Self::new(JPEG_MIME, uri));
        };

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AppError::image("Data URI has no payload separator"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| AppError::image("Only base64 data URIs are supported"))?;

        if payload.is_empty() {
            return Err(AppError::image("Empty image payload"));
        }

        let mime_type = if mime_type.is_empty() { JPEG_MIME } else { mime_type };
        Ok(Self::new(mime_type, payload))
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(&self.data)
            .map_err(|e| AppError::image(format!("Invalid base64 payload: {}", e)))
    }

    /// Decodes the payload into pixels (for display).
    pub fn decode(&self) -> Result<DynamicImage> {
        let bytes = self.bytes()?;
        image::load_from_memory(&bytes)
            .map_err(|e| AppError::image(format!("Failed to decode image: {}", e)))
    }
}

/// A preview image produced by the image generation client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub image: EncodedImage,
    /// Prompt the image was generated from.
    pub prompt: String,
}

impl GeneratedImage {
    pub fn to_data_uri(&self) -> String {
        self.image.to_data_uri()
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        self.image.bytes()
    }
}

/// Image processing utilities for the capture workflow.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Encodes a captured frame as a JPEG payload ready for the analysis call.
    pub fn encode_jpeg(image: &DynamicImage) -> Result<EncodedImage> {
        // JPEG has no alpha channel; screen captures arrive as RGBA.
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

        let mut buffer: Vec<u8> = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        rgb.write_to(&mut cursor, ImageFormat::Jpeg)
            .map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;

        Ok(EncodedImage::new(JPEG_MIME, BASE64.encode(buffer)))
    }

    /// Loads an image file chosen by the user and re-encodes it as JPEG.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the file cannot be read and
    /// [`AppError::ImageProcessing`] if it is not a supported image.
    pub fn load_file(path: &Path) -> Result<EncodedImage> {
        let bytes = std::fs::read(path)?;
        let image = image::load_from_memory(&bytes).map_err(|e| {
            AppError::image(format!("Failed to decode {}: {}", path.display(), e))
        })?;
        Self::encode_jpeg(&image)
    }
}
