//! Clipboard and export helpers.
//!
//! Copy actions go through [`ClipboardSink`] so that the desktop UI uses the
//! system clipboard (via `arboard`) while tests can record what was copied.
//! [`CopyFeedback`] tracks the short-lived "copied" acknowledgment of each
//! copy affordance independently.

use crate::error::{AppError, Result};
use crate::image_processing::GeneratedImage;
use crate::model::AnalysisResult;
use directories::UserDirs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// File name used when saving a generated preview.
pub const PREVIEW_FILENAME: &str = "promptgenius-masterpiece.png";

/// How long a "copied" acknowledgment stays visible.
pub const COPY_FEEDBACK_TTL: Duration = Duration::from_secs(2);

pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let inner = arboard::Clipboard::new()
            .map_err(|e| AppError::Clipboard(format!("Could not access clipboard: {}", e)))?;
        Ok(Self { inner })
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| AppError::Clipboard(format!("Failed to copy to clipboard: {}", e)))
    }
}

/// Identifies one copy affordance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CopyTarget {
    Description,
    AllPrompts,
    /// A single prompt, keyed by its style name.
    Prompt(String),
}

/// Time-boxed "copied" acknowledgments, one per [`CopyTarget`].
#[derive(Debug, Clone)]
pub struct CopyFeedback {
    marks: HashMap<CopyTarget, Instant>,
    ttl: Duration,
}

impl Default for CopyFeedback {
    fn default() -> Self {
        Self::with_ttl(COPY_FEEDBACK_TTL)
    }
}

impl CopyFeedback {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            marks: HashMap::new(),
            ttl,
        }
    }

    pub fn mark(&mut self, target: CopyTarget, now: Instant) {
        self.marks.insert(target, now);
    }

    pub fn is_active(&self, target: &CopyTarget, now: Instant) -> bool {
        self.marks
            .get(target)
            .is_some_and(|at| now.saturating_duration_since(*at) < self.ttl)
    }

    /// Drops expired marks. Returns true while any mark is still visible.
    pub fn prune(&mut self, now: Instant) -> bool {
        let ttl = self.ttl;
        self.marks
            .retain(|_, at| now.saturating_duration_since(*at) < ttl);
        !self.marks.is_empty()
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }
}

/// Formats every prompt in the displayed language as one delimited list.
pub fn format_all_prompts(result: &AnalysisResult, translated: bool) -> String {
    result
        .prompts
        .iter()
        .map(|p| format!("STYLE: {}\nPROMPT: {}\n---", p.style, p.prompt_text(translated)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Copies `text` and records the acknowledgment for `target`.
pub fn copy_with_feedback(
    clipboard: &mut dyn ClipboardSink,
    feedback: &mut CopyFeedback,
    target: CopyTarget,
    text: &str,
    now: Instant,
) -> Result<()> {
    clipboard.set_text(text)?;
    feedback.mark(target, now);
    Ok(())
}

/// The user's download directory, or the current directory when unknown.
pub fn default_download_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Writes the preview into `dir` under [`PREVIEW_FILENAME`].
pub fn save_preview(image: &GeneratedImage, dir: &Path) -> Result<PathBuf> {
    save_preview_as(image, &dir.join(PREVIEW_FILENAME))
}

/// Writes the preview bytes to an explicit path.
pub fn save_preview_as(image: &GeneratedImage, path: &Path) -> Result<PathBuf> {
    let bytes = image.bytes()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), "saved preview image");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::EncodedImage;
    use crate::model::GeneratedPrompt;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl ClipboardSink for Recorder {
        fn set_text(&mut self, text: &str) -> Result<()> {
            self.0.push(text.to_string());
            Ok(())
        }
    }

    fn result() -> AnalysisResult {
        let mut first = GeneratedPrompt::new("Neon Noir", "rua molhada", "neon");
        first.translated_prompt = Some("wet street".into());
        AnalysisResult {
            detailed_description: "uma rua".into(),
            translated_description: Some("a street".into()),
            prompts: vec![first, GeneratedPrompt::new("Ukiyo-e", "onda", "gravura")],
            category: None,
        }
    }

    #[test]
    fn all_prompts_use_displayed_language() {
        assert_eq!(
            format_all_prompts(&result(), false),
            "STYLE: Neon Noir\nPROMPT: rua molhada\n---\n\nSTYLE: Ukiyo-e\nPROMPT: onda\n---"
        );
        let translated = format_all_prompts(&result(), true);
        assert!(translated.starts_with("STYLE: Neon Noir\nPROMPT: wet street\n---"));
        // Missing translation falls back to the original text.
        assert!(translated.ends_with("PROMPT: onda\n---"));
    }

    #[test]
    fn feedback_is_keyed_and_expires() {
        let start = Instant::now();
        let mut clipboard = Recorder::default();
        let mut feedback = CopyFeedback::default();
        let target = CopyTarget::Prompt("Neon Noir".into());

        copy_with_feedback(&mut clipboard, &mut feedback, target.clone(), "wet street", start).unwrap();

        assert_eq!(clipboard.0, vec!["wet street".to_string()]);
        assert!(feedback.is_active(&target, start + Duration::from_millis(1500)));
        assert!(!feedback.is_active(&CopyTarget::Prompt("Ukiyo-e".into()), start));
        assert!(!feedback.is_active(&CopyTarget::AllPrompts, start));
        assert!(!feedback.is_active(&target, start + Duration::from_secs(2)));

        assert!(feedback.prune(start + Duration::from_secs(1)));
        assert!(!feedback.prune(start + Duration::from_secs(3)));
    }

    #[test]
    fn preview_is_saved_under_fixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let image = GeneratedImage {
            image: EncodedImage::new("image/png", "aGVsbG8="),
            prompt: "a fox".into(),
        };
        let path = save_preview(&image, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), PREVIEW_FILENAME);
        assert_eq!(std::fs::read(path).unwrap(), b"hello");
    }
}
