//! Session flow tests
//!
//! Drives a headless session end to end against a scripted backend.

use async_trait::async_trait;
use prompt_genius_core::backend::{ContentPart, GenerativeBackend, ImageRequest, JsonRequest};
use prompt_genius_core::clipboard::{ClipboardSink, CopyFeedback, CopyTarget, copy_with_feedback, format_all_prompts};
use prompt_genius_core::error::Result;
use prompt_genius_core::image_processing::EncodedImage;
use prompt_genius_core::model::StyleCategory;
use prompt_genius_core::session::{Services, Session};
use prompt_genius_core::state::{AppState, Effect, Event};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Answers JSON calls from a queue and counts every call.
#[derive(Default)]
struct ScriptedBackend {
    json: Mutex<VecDeque<Option<String>>>,
    images: Mutex<VecDeque<Vec<ContentPart>>>,
    json_calls: AtomicUsize,
    image_calls: AtomicUsize,
    last_image_prompt: Mutex<Option<String>>,
}

impl ScriptedBackend {
    fn answer(self, text: impl Into<String>) -> Self {
        self.json.lock().unwrap().push_back(Some(text.into()));
        self
    }

    fn answer_empty(self) -> Self {
        self.json.lock().unwrap().push_back(None);
        self
    }

    fn draw(self, parts: Vec<ContentPart>) -> Self {
        self.images.lock().unwrap().push_back(parts);
        self
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate_json(&self, _request: JsonRequest) -> Result<Option<String>> {
        self.json_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.json.lock().unwrap().pop_front().flatten())
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<Vec<ContentPart>> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_image_prompt.lock().unwrap() = Some(request.prompt);
        Ok(self.images.lock().unwrap().pop_front().unwrap_or_default())
    }
}

fn analysis_json() -> String {
    json!({
        "detailedDescription": "um gato",
        "prompts": [
            {"style": "Pixel Art", "prompt": "gato em pixel", "description": "pixels"},
            {"style": "Aquarela", "prompt": "gato em aquarela", "description": "tinta"}
        ]
    })
    .to_string()
}

fn translation_json(count: usize) -> String {
    let prompts: Vec<_> = (0..count)
        .map(|i| json!({"style": format!("S{i}"), "prompt": format!("cat {i}"), "description": "en"}))
        .collect();
    json!({"detailedDescription": "a cat", "prompts": prompts}).to_string()
}

fn photo() -> EncodedImage {
    EncodedImage::new("image/jpeg", "AAAA")
}

fn session(backend: &Arc<ScriptedBackend>) -> Session {
    let backend: Arc<dyn GenerativeBackend> = backend.clone();
    Session::new(Services::new(backend), StyleCategory::Anime)
}

async fn analyzed(backend: &Arc<ScriptedBackend>) -> Session {
    let mut session = session(backend);
    session.handle(Event::ImageProvided(photo())).await;
    assert_eq!(session.state().mode, AppState::Result);
    session
}

#[derive(Default)]
struct RecordingClipboard(Vec<String>);

impl ClipboardSink for RecordingClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.0.push(text.to_string());
        Ok(())
    }
}

/// Upload leads to a result tagged with the chosen category
#[tokio::test]
async fn test_upload_produces_result() {
    let backend = Arc::new(ScriptedBackend::default().answer(analysis_json()));
    let session = analyzed(&backend).await;

    let analysis = session.state().analysis.as_ref().unwrap();
    assert_eq!(analysis.detailed_description, "um gato");
    assert_eq!(analysis.prompts.len(), 2);
    assert_eq!(analysis.category, Some(StyleCategory::Anime));
    assert_eq!(session.state().selected_image, Some(photo()));
    assert!(session.alerts().is_empty());
}

/// An empty answer alerts and returns to idle with nothing kept
#[tokio::test]
async fn test_empty_analysis_alerts_and_resets() {
    let backend = Arc::new(ScriptedBackend::default().answer_empty());
    let mut session = session(&backend);
    session.handle(Event::ImageProvided(photo())).await;

    assert_eq!(session.state().mode, AppState::Idle);
    assert!(session.state().analysis.is_none());
    assert!(session.state().selected_image.is_none());
    assert_eq!(session.state().category, StyleCategory::Anime);
    assert_eq!(
        session.take_alerts(),
        vec!["Failed to analyze image. Please try again.".to_string()]
    );
}

/// The second translate toggle only flips the view
#[tokio::test]
async fn test_translation_is_fetched_once() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .answer(analysis_json())
            .answer(translation_json(2)),
    );
    let mut session = analyzed(&backend).await;

    session.handle(Event::ToggleTranslation).await;
    assert!(session.state().showing_translation());
    assert_eq!(session.state().displayed_description(), Some("a cat"));

    session.handle(Event::ToggleTranslation).await;
    assert!(!session.state().showing_translation());
    assert_eq!(session.state().displayed_description(), Some("um gato"));

    session.handle(Event::ToggleTranslation).await;
    assert!(session.state().showing_translation());
    assert_eq!(backend.json_calls.load(Ordering::SeqCst), 2);
}

/// A translation of the wrong length leaves the original untouched
#[tokio::test]
async fn test_translation_mismatch_keeps_original() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .answer(analysis_json())
            .answer(translation_json(1)),
    );
    let mut session = analyzed(&backend).await;
    let before = session.state().analysis.clone();

    session.handle(Event::ToggleTranslation).await;

    assert_eq!(session.state().analysis, before);
    assert!(!session.state().translating);
    assert!(!session.state().showing_translation());
    assert_eq!(session.take_alerts().len(), 1);
}

/// Copy-all follows the displayed language
#[tokio::test]
async fn test_copy_all_uses_displayed_language() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .answer(analysis_json())
            .answer(translation_json(2)),
    );
    let mut session = analyzed(&backend).await;
    session.handle(Event::ToggleTranslation).await;

    let mut clipboard = RecordingClipboard::default();
    let mut feedback = CopyFeedback::default();
    let text = session.state().displayed_prompt_list().unwrap();
    let now = Instant::now();
    copy_with_feedback(&mut clipboard, &mut feedback, CopyTarget::AllPrompts, &text, now).unwrap();

    assert_eq!(
        clipboard.0,
        vec!["STYLE: Pixel Art\nPROMPT: cat 0\n---\n\nSTYLE: Aquarela\nPROMPT: cat 1\n---".to_string()]
    );
    assert!(feedback.is_active(&CopyTarget::AllPrompts, now));
    assert!(!feedback.is_active(&CopyTarget::Description, now));

    let original = session.state().analysis.as_ref().unwrap();
    assert!(format_all_prompts(original, false).contains("PROMPT: gato em pixel"));
}

/// Only one preview request is admitted at a time
#[tokio::test]
async fn test_preview_admission() {
    let backend = Arc::new(ScriptedBackend::default().answer(analysis_json()));
    let mut session = analyzed(&backend).await;

    let first = session.apply(Event::RequestPreview {
        style: "Pixel Art".into(),
        prompt: "gato em pixel".into(),
    });
    assert_eq!(
        first,
        vec![Effect::GeneratePreview { prompt: "gato em pixel".into() }]
    );
    assert_eq!(session.state().generating_for.as_deref(), Some("Pixel Art"));

    let second = session.apply(Event::RequestPreview {
        style: "Aquarela".into(),
        prompt: "gato em aquarela".into(),
    });
    assert!(second.is_empty());
    assert_eq!(session.state().generating_for.as_deref(), Some("Pixel Art"));
}

/// A finished preview is shown, then dismissed back to the list
#[tokio::test]
async fn test_preview_round_trip() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .answer(analysis_json())
            .draw(vec![
                ContentPart::Text("here you go".into()),
                ContentPart::InlineImage(EncodedImage::new("image/png", "iVBORw0KGgo=")),
            ]),
    );
    let mut session = analyzed(&backend).await;

    session
        .handle(Event::RequestPreview {
            style: "Pixel Art".into(),
            prompt: "gato em pixel".into(),
        })
        .await;

    assert_eq!(session.state().mode, AppState::GeneratingImage);
    let image = session.state().generated_image.as_ref().unwrap();
    assert_eq!(image.image.mime_type, "image/png");
    assert_eq!(image.prompt, "gato em pixel");
    assert!(session.state().generating_for.is_none());
    assert_eq!(
        backend.last_image_prompt.lock().unwrap().as_deref(),
        Some("gato em pixel")
    );

    session.handle(Event::BackToList).await;
    assert_eq!(session.state().mode, AppState::Result);
    assert!(session.state().generated_image.is_none());
    assert!(session.state().analysis.is_some());
}

/// A text-only image answer alerts and keeps the result view
#[tokio::test]
async fn test_preview_without_image_stays_on_result() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .answer(analysis_json())
            .draw(vec![ContentPart::Text("no".into())]),
    );
    let mut session = analyzed(&backend).await;

    session
        .handle(Event::RequestPreview {
            style: "Aquarela".into(),
            prompt: "gato em aquarela".into(),
        })
        .await;

    assert_eq!(session.state().mode, AppState::Result);
    assert!(session.state().generating_for.is_none());
    assert_eq!(session.take_alerts(), vec!["Failed to generate image.".to_string()]);
    assert_eq!(backend.image_calls.load(Ordering::SeqCst), 1);
}

/// Reset keeps the category and drops everything else
#[tokio::test]
async fn test_reset_after_result() {
    let backend = Arc::new(ScriptedBackend::default().answer(analysis_json()));
    let mut session = analyzed(&backend).await;
    session.apply(Event::ToggleZoom);

    let effects = session.handle(Event::Reset).await;

    assert!(effects.is_empty());
    let state = session.state();
    assert_eq!(state.mode, AppState::Idle);
    assert!(state.analysis.is_none());
    assert!(state.selected_image.is_none());
    assert!(!state.zoom.open);
    assert_eq!(state.category, StyleCategory::Anime);
}
