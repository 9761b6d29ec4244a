//! Image generation client: one prompt in, one preview image out.

use crate::backend::{ContentPart, GenerativeBackend, ImageRequest};
use crate::error::{AppError, Result};
use crate::image_processing::{EncodedImage, GeneratedImage};

/// Previews are always square.
pub const PREVIEW_ASPECT_RATIO: &str = "1:1";

/// Requests one square image for `prompt`.
///
/// # Errors
///
/// Returns [`AppError::NoImage`] when the response carries no inline image.
pub async fn generate_preview(backend: &dyn GenerativeBackend, prompt: &str) -> Result<GeneratedImage> {
    tracing::info!("requesting preview image");
    let parts = backend
        .generate_image(ImageRequest {
            prompt: prompt.to_string(),
            aspect_ratio: PREVIEW_ASPECT_RATIO,
        })
        .await?;

    let image = first_inline_image(parts)?;
    Ok(GeneratedImage {
        image,
        prompt: prompt.to_string(),
    })
}

/// Returns the first inline image among `parts`.
pub fn first_inline_image(parts: Vec<ContentPart>) -> Result<EncodedImage> {
    parts
        .into_iter()
        .find_map(|part| match part {
            ContentPart::InlineImage(image) if !image.data.is_empty() => Some(image),
            _ => None,
        })
        .ok_or(AppError::NoImage)
}
