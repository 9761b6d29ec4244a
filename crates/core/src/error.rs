//! Error types for the prompt-genius-core library.
//!
//! This module provides granular error variants for different failure modes,
//! enabling precise error handling and user-friendly error messages.

use thiserror::Error;

/// Errors that can occur within the prompt-genius-core library.
///
/// Each variant represents a specific failure mode with contextual information
/// to help diagnose and handle errors appropriately.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing keys, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required environment variable was not found.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Camera or screen capture is unavailable, denied, or failed.
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Requested screen/monitor index was not found.
    #[error("Screen not found: index {0}")]
    ScreenNotFound(usize),

    /// Image decoding or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// The analysis response was empty or did not match the expected schema.
    #[error("Analysis failed: {0}")]
    Analysis(String),

    /// The translation response was empty or malformed.
    #[error("Translation failed: {0}")]
    Translation(String),

    /// The translated prompt list does not line up with the original one.
    #[error("Translation returned {actual} prompts, expected {expected}")]
    TranslationMismatch { expected: usize, actual: usize },

    /// Image generation finished without any inline image part.
    #[error("No image data found in response")]
    NoImage,

    /// General Gemini API error.
    #[error("Gemini API error: {0}")]
    GeminiApi(String),

    /// Rate limited by the Gemini API.
    #[error("Rate limited by Gemini API, please retry later")]
    RateLimited,

    /// Clipboard access failed.
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// UI-related errors (rendering, window management).
    #[error("UI error: {0}")]
    Ui(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used to pick the recovery path for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Capture,
    Analysis,
    Translation,
    ImageGeneration,
    Other,
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a capture error with the given message.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates an analysis error with the given message.
    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis(msg.into())
    }

    /// Creates a translation error with the given message.
    pub fn translation(msg: impl Into<String>) -> Self {
        Self::Translation(msg.into())
    }

    /// Creates a Gemini API error with the given message.
    pub fn gemini(msg: impl Into<String>) -> Self {
        Self::GeminiApi(msg.into())
    }

    /// Creates a UI error with the given message.
    pub fn ui(msg: impl Into<String>) -> Self {
        Self::Ui(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Capture(_) | Self::ScreenNotFound(_) => ErrorKind::Capture,
            Self::Analysis(_) => ErrorKind::Analysis,
            Self::Translation(_) | Self::TranslationMismatch { .. } => ErrorKind::Translation,
            Self::NoImage => ErrorKind::ImageGeneration,
            _ => ErrorKind::Other,
        }
    }

    /// Text shown to the user in the blocking alert for this failure.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Capture => "Please allow camera access to use this feature.".to_string(),
            ErrorKind::Analysis => "Failed to analyze image. Please try again.".to_string(),
            ErrorKind::Translation => {
                "Translation failed. Check your connection and try again.".to_string()
            }
            ErrorKind::ImageGeneration => "Failed to generate image.".to_string(),
            ErrorKind::Other => self.to_string(),
        }
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_counts_as_translation_failure() {
        let err = AppError::TranslationMismatch { expected: 30, actual: 29 };
        assert_eq!(err.kind(), ErrorKind::Translation);
        assert_eq!(err.to_string(), "Translation returned 29 prompts, expected 30");
    }

    #[test]
    fn user_message_hides_details_for_remote_failures() {
        let err = AppError::analysis("expected value at line 1 column 1");
        assert_eq!(err.user_message(), "Failed to analyze image. Please try again.");

        let err = AppError::RateLimited;
        assert_eq!(err.user_message(), err.to_string());
    }
}
