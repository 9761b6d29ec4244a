//! The view state controller.
//!
//! All transitions go through [`update`], a pure function from the current
//! [`ViewState`] and an [`Event`] to the next state plus the [`Effect`]s the
//! owner must perform. The owner never mutates a `ViewState` in place; it
//! swaps in the state returned by the transition.
//!
//! ```text
//! Idle ──OpenCamera──▶ Capturing ──ImageProvided──▶ Analyzing ──ok──▶ Result
//!  │                      │                             │              │
//!  └──ImageProvided───────┼────────────────────────────▶│              │ PreviewReady
//!                         └──cancel/fail──▶ Idle ◀──fail┘              ▼
//!                                                         Result ◀── GeneratingImage
//! ```
//!
//! `Reset` returns to `Idle` from anywhere.

use crate::image_processing::{EncodedImage, GeneratedImage};
use crate::model::{AnalysisResult, StyleCategory};

pub const ZOOM_MIN: f32 = 0.5;
pub const ZOOM_MAX: f32 = 5.0;
/// Step of the zoom buttons.
pub const ZOOM_STEP: f32 = 0.25;
/// Step of one mouse wheel notch.
pub const ZOOM_WHEEL_STEP: f32 = 0.1;

/// Application mode; decides which view is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppState {
    #[default]
    Idle,
    Capturing,
    Analyzing,
    Result,
    GeneratingImage,
}

/// Zoom modal over the source photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    pub open: bool,
    pub level: f32,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self { open: false, level: 1.0 }
    }
}

/// Everything the views render from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub mode: AppState,
    pub category: StyleCategory,
    /// `None` while the key status is still being resolved.
    pub key_status: Option<bool>,
    pub selected_image: Option<EncodedImage>,
    pub analysis: Option<AnalysisResult>,
    pub generated_image: Option<GeneratedImage>,
    /// Style key of the prompt whose preview is pending.
    pub generating_for: Option<String>,
    pub show_translated: bool,
    pub translating: bool,
    pub zoom: ZoomState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    KeyStatusResolved(bool),
    KeySelected,
    SelectCategory(StyleCategory),
    OpenCamera,
    CameraFailed(String),
    CaptureCancelled,
    /// A photo arrived, from the camera or from a picked file.
    ImageProvided(EncodedImage),
    AnalysisCompleted(AnalysisResult),
    AnalysisFailed(String),
    ToggleTranslation,
    TranslationCompleted(AnalysisResult),
    TranslationFailed(String),
    RequestPreview { style: String, prompt: String },
    PreviewReady(GeneratedImage),
    PreviewFailed(String),
    BackToList,
    Reset,
    ToggleZoom,
    AdjustZoom(f32),
    CloseZoom,
}

/// Work requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartCamera,
    StopCamera,
    Analyze { image: EncodedImage, category: StyleCategory },
    Translate(AnalysisResult),
    GeneratePreview { prompt: String },
    /// Abort every in-flight remote call owned by the view.
    CancelPending,
    /// Blocking notification for the user.
    Alert(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ViewState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: &ViewState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }

    fn to(state: ViewState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

impl ViewState {
    pub fn new(category: StyleCategory) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    /// True when the translated variant is both requested and available.
    pub fn showing_translation(&self) -> bool {
        self.show_translated
            && self
                .analysis
                .as_ref()
                .is_some_and(AnalysisResult::is_translated)
    }

    /// Description in the language currently displayed.
    pub fn displayed_description(&self) -> Option<&str> {
        let translated = self.show_translated;
        self.analysis
            .as_ref()
            .map(|a| a.description_text(translated))
    }

    /// The preview request for `style`. Previews are always rendered from
    /// the prompt as analyzed, whichever language is displayed.
    pub fn preview_request(&self, style: &str) -> Option<Event> {
        let prompt = self.analysis.as_ref()?.find_prompt(style)?;
        Some(Event::RequestPreview {
            style: prompt.style.clone(),
            prompt: prompt.prompt.clone(),
        })
    }

    /// The copy-all text in the language currently displayed.
    pub fn displayed_prompt_list(&self) -> Option<String> {
        self.analysis
            .as_ref()
            .map(|a| crate::clipboard::format_all_prompts(a, self.show_translated))
    }

    pub fn is_generating(&self) -> bool {
        self.generating_for.is_some()
    }

    /// Initial values for every transient field; category and key status survive.
    fn reset(&self) -> Self {
        Self {
            category: self.category,
            key_status: self.key_status,
            ..Self::default()
        }
    }
}

fn same_source(current: &AnalysisResult, translated: &AnalysisResult) -> bool {
    current.detailed_description == translated.detailed_description
        && current.prompts.len() == translated.prompts.len()
        && current
            .prompts
            .iter()
            .zip(&translated.prompts)
            .all(|(a, b)| a.style == b.style && a.prompt == b.prompt)
}

/// Computes the next state for `event`.
///
/// Completion events arriving in a mode that no longer expects them (for
/// example after a reset) leave the state untouched.
pub fn update(state: &ViewState, event: Event) -> Transition {
    use AppState::*;

    match event {
        Event::KeyStatusResolved(present) => {
            let mut next = state.clone();
            next.key_status = Some(present);
            Transition::to(next, vec![])
        }
        Event::KeySelected => {
            let mut next = state.clone();
            next.key_status = Some(true);
            Transition::to(next, vec![])
        }
        Event::SelectCategory(category) if state.mode == Idle => {
            let mut next = state.clone();
            next.category = category;
            Transition::to(next, vec![])
        }
        Event::OpenCamera if state.mode == Idle => {
            let mut next = state.clone();
            next.mode = Capturing;
            Transition::to(next, vec![Effect::StartCamera])
        }
        Event::CaptureCancelled if state.mode == Capturing => {
            let mut next = state.clone();
            next.mode = Idle;
            Transition::to(next, vec![Effect::StopCamera])
        }
        Event::CameraFailed(message) if state.mode == Capturing => {
            let mut next = state.clone();
            next.mode = Idle;
            Transition::to(next, vec![Effect::StopCamera, Effect::Alert(message)])
        }
        Event::ImageProvided(image) if matches!(state.mode, Idle | Capturing) => {
            let mut effects = Vec::new();
            if state.mode == Capturing {
                effects.push(Effect::StopCamera);
            }
            let mut next = state.reset();
            next.mode = Analyzing;
            next.selected_image = Some(image.clone());
            effects.push(Effect::Analyze {
                image,
                category: state.category,
            });
            Transition::to(next, effects)
        }
        Event::AnalysisCompleted(result) if state.mode == Analyzing => {
            let mut next = state.clone();
            next.mode = Result;
            next.analysis = Some(result);
            next.show_translated = false;
            Transition::to(next, vec![])
        }
        Event::AnalysisFailed(message) if state.mode == Analyzing => {
            // No partial state survives a failed analysis.
            let next = state.reset();
            Transition::to(next, vec![Effect::Alert(message)])
        }
        Event::ToggleTranslation if state.mode == Result => {
            let Some(analysis) = &state.analysis else {
                return Transition::stay(state);
            };
            if analysis.is_translated() {
                let mut next = state.clone();
                next.show_translated = !state.show_translated;
                return Transition::to(next, vec![]);
            }
            if state.translating {
                return Transition::stay(state);
            }
            let mut next = state.clone();
            next.translating = true;
            Transition::to(next, vec![Effect::Translate(analysis.clone())])
        }
        Event::TranslationCompleted(translated) if state.translating => {
            let mut next = state.clone();
            next.translating = false;
            match &state.analysis {
                Some(current) if translated.is_translated() && same_source(current, &translated) => {
                    next.analysis = Some(translated);
                    next.show_translated = true;
                }
                _ => {}
            }
            Transition::to(next, vec![])
        }
        Event::TranslationFailed(message) if state.translating => {
            let mut next = state.clone();
            next.translating = false;
            Transition::to(next, vec![Effect::Alert(message)])
        }
        Event::RequestPreview { style, prompt } if state.mode == Result => {
            if state.generating_for.is_some() || state.analysis.is_none() {
                return Transition::stay(state);
            }
            let mut next = state.clone();
            next.generating_for = Some(style);
            Transition::to(next, vec![Effect::GeneratePreview { prompt }])
        }
        Event::PreviewReady(image) if state.mode == Result && state.generating_for.is_some() => {
            let mut next = state.clone();
            next.generating_for = None;
            next.generated_image = Some(image);
            next.mode = GeneratingImage;
            Transition::to(next, vec![])
        }
        Event::PreviewFailed(message) if state.generating_for.is_some() => {
            let mut next = state.clone();
            next.generating_for = None;
            Transition::to(next, vec![Effect::Alert(message)])
        }
        Event::BackToList if state.mode == GeneratingImage => {
            let mut next = state.clone();
            next.mode = Result;
            next.generated_image = None;
            Transition::to(next, vec![])
        }
        Event::Reset => {
            let mut effects = vec![Effect::CancelPending];
            if state.mode == Capturing {
                effects.push(Effect::StopCamera);
            }
            Transition::to(state.reset(), effects)
        }
        Event::ToggleZoom if state.selected_image.is_some() => {
            let mut next = state.clone();
            next.zoom.open = !state.zoom.open;
            next.zoom.level = 1.0;
            Transition::to(next, vec![])
        }
        Event::AdjustZoom(delta) if state.zoom.open => {
            let mut next = state.clone();
            next.zoom.level = (state.zoom.level + delta).clamp(ZOOM_MIN, ZOOM_MAX);
            Transition::to(next, vec![])
        }
        Event::CloseZoom => {
            let mut next = state.clone();
            next.zoom.open = false;
            Transition::to(next, vec![])
        }
        _ => Transition::stay(state),
    }
}
