//! The seam between the clients and the remote generative service.
//!
//! The analysis, translation and image generation clients only need two
//! primitive calls: a schema-constrained JSON generation and an image
//! generation that returns raw content parts. [`GeminiClient`] implements
//! both against the Gemini API; tests substitute scripted implementations.
//!
//! [`GeminiClient`]: crate::gemini::GeminiClient

use crate::error::Result;
use crate::image_processing::EncodedImage;
use async_trait::async_trait;
use serde_json::Value;

/// A request whose answer must be JSON following `schema`.
#[derive(Debug, Clone)]
pub struct JsonRequest {
    pub instruction: String,
    pub image: Option<EncodedImage>,
    pub schema: Value,
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    /// Width to height, as the service expects it (e.g. `"1:1"`).
    pub aspect_ratio: &'static str,
}

/// One content part of a generation response.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    InlineImage(EncodedImage),
}

#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Returns the text of the first candidate, or `None` when it is empty.
    async fn generate_json(&self, request: JsonRequest) -> Result<Option<String>>;

    /// Returns the content parts of the first candidate, in order.
    async fn generate_image(&self, request: ImageRequest) -> Result<Vec<ContentPart>>;
}
