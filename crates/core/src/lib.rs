//! PromptGenius Core Library
//!
//! This library provides the core functionality of PromptGenius: turning a
//! photo into a detailed description plus thirty image-generation prompts,
//! one per art style, using Google's Gemini models.
//!
//! # Overview
//!
//! A photo comes from a file or a capture device, is analyzed under a chosen
//! style category, and the result can be translated or used to render a
//! preview image. The library handles:
//!
//! - **Capture**: Camera and screen sources via the [`capture`] module
//! - **Analysis**: Structured description and prompts via [`analysis`]
//! - **Translation**: Whole-result translation via [`translation`]
//! - **Previews**: Image generation via [`imagegen`]
//! - **View logic**: The state controller in [`state`], driven by [`session`]
//! - **User Interface**: The desktop app via [`ui`]
//!
//! # Quick Start
//!
//! ```ignore
//! use prompt_genius_core::{PromptGenius, model::StyleCategory, state::Event};
//!
//! let app = PromptGenius::new()?;
//! let mut session = app.session(StyleCategory::Anime)?;
//! let image = prompt_genius_core::ImageProcessor::load_file("photo.jpg".as_ref())?;
//! session.handle(Event::ImageProvided(image)).await;
//! println!("{:?}", session.state().analysis);
//! ```
//!
//! # Module Structure
//!
//! - [`backend`]: The generative service seam
//! - [`gemini`]: Gemini implementation of the seam
//! - [`prompts`]: Instructions and response schemas
//! - [`model`]: Style catalog, categories and result types
//! - [`clipboard`]: Copy and export helpers
//! - [`keys`]: API key selection hook
//! - [`config`]: Configuration loading and management
//! - [`error`]: Error types and result aliases

pub mod analysis;
pub mod backend;
pub mod capture;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod gemini;
pub mod image_processing;
pub mod imagegen;
pub mod keys;
pub mod model;
pub mod prompts;
pub mod session;
pub mod state;
pub mod translation;
pub mod ui;

// Re-export primary types for convenience
pub use backend::GenerativeBackend;
pub use capture::{CameraSession, CaptureDevice, ScreenCapturer, ScreenSource};
pub use config::Config;
pub use error::{AppError, Result};
pub use gemini::GeminiClient;
pub use image_processing::{EncodedImage, GeneratedImage, ImageProcessor};
pub use model::{AnalysisResult, GeneratedPrompt, StyleCategory};
pub use session::{Services, Session};

use std::sync::Arc;

/// Main entry point for PromptGenius.
///
/// This struct provides a facade over the various subsystems, handling
/// initialization and wiring. It's the recommended way to use the library
/// for most use cases.
pub struct PromptGenius {
    config: Config,
}

impl PromptGenius {
    /// Creates an instance from the environment (including `.env` files).
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
        })
    }

    /// Creates an instance with custom configuration.
    ///
    /// Use this when you need to override environment-based configuration,
    /// such as specifying a different model or API key.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Lists available monitors with their dimensions.
    pub fn list_monitors(&self) -> Result<Vec<String>> {
        Ok(ScreenCapturer::new()?.list_screen())
    }

    /// Grabs one photo from `device`, releasing it afterwards.
    pub fn capture(&self, device: &dyn CaptureDevice) -> Result<EncodedImage> {
        CameraSession::open(device)?.snapshot()
    }

    /// Builds a headless session talking to Gemini.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingEnvVar`] when no API key is configured.
    pub fn session(&self, category: StyleCategory) -> Result<Session> {
        let client = GeminiClient::new(&self.config)?;
        let services = Services::from_config(Arc::new(client), &self.config);
        Ok(Session::new(services, category))
    }

    /// Launches the desktop app.
    ///
    /// # Arguments
    /// * `device` - Source opened by the "Use Camera" flow
    pub fn run_interactive(&self, device: Box<dyn CaptureDevice>) -> Result<()> {
        ui::run(self.config.clone(), device)
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup before using any other functions.
/// This loads `.env` files if present.
pub fn init() {
    let _ = dotenvy::dotenv();
}
