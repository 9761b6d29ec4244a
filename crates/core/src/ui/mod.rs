//! Desktop front-end for prompt-genius.
//!
//! # Architecture
//!
//! The UI is split into focused submodules:
//! - [`settings`]: User preferences and persistence
//! - [`rendering`]: Texture upload and the framed image widget
//! - [`app`]: Main application, views and effect handling
//!
//! The view logic itself lives in [`crate::state`]; this module only renders
//! a [`ViewState`](crate::state::ViewState) and turns clicks into events.
//!
//! # Usage
//!
//! ```ignore
//! use prompt_genius_core::{Config, capture::ScreenSource, ui};
//!
//! let config = Config::load()?;
//! ui::run(config, Box::new(ScreenSource::new(0)))?;
//! ```

mod app;
mod rendering;
mod settings;

// Public API exports
pub use app::PromptGeniusApp;
pub use settings::{AVAILABLE_MODELS, Settings};

use crate::capture::CaptureDevice;
use crate::config::Config;
use crate::error::{AppError, Result};
use eframe::egui;

/// Opens the main window and blocks until it is closed.
///
/// # Arguments
/// * `config` - Application configuration with API keys and settings
/// * `device` - Capture device used by the "Use Camera" flow
///
/// # Errors
/// Returns [`AppError::Ui`] when the native window cannot be created.
pub fn run(config: Config, device: Box<dyn CaptureDevice>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("PromptGenius AI")
            .with_inner_size([1100.0, 800.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "PromptGenius AI",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(PromptGeniusApp::new(config, device)) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))
}
