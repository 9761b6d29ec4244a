//! Main desktop application.
//!
//! This module contains the `PromptGeniusApp` struct which implements the
//! `eframe::App` trait. Every user action becomes a state [`Event`]; the
//! resulting effects are carried out here (camera control, background
//! requests, alerts).

use super::rendering::{TextureSlot, framed_image};
use super::settings::{AVAILABLE_MODELS, Settings};
use crate::capture::{CameraSession, CaptureDevice};
use crate::clipboard::{
    COPY_FEEDBACK_TTL, CopyFeedback, CopyTarget, SystemClipboard,
    copy_with_feedback, default_download_dir, save_preview,
};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::gemini::GeminiClient;
use crate::image_processing::ImageProcessor;
use crate::keys::{KeySelector, key_status};
use crate::model::{STYLE_LABELS, StyleCategory};
use crate::session::{Services, TaskScope, run_effect};
use crate::state::{
    AppState, Effect, Event, ViewState, ZOOM_STEP, ZOOM_WHEEL_STEP, update,
};
use eframe::egui;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;
use std::time::{Duration, Instant};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(99, 102, 241);

/// Something the user did during this frame.
enum Action {
    Dispatch(Event),
    Copy(CopyTarget, String),
    PickFile,
    TakePhoto,
    Download,
    ConnectKey,
    SaveSettings,
    DismissAlert,
}

/// The desktop front-end.
pub struct PromptGeniusApp {
    view: ViewState,
    config: Config,
    settings: Settings,
    show_settings: bool,

    // Remote work
    services: Option<Arc<Services>>,
    scope: TaskScope,
    tx: Sender<Event>,
    rx: Receiver<Event>,

    // Camera
    device: Box<dyn CaptureDevice>,
    camera: Option<CameraSession>,

    // Textures
    camera_texture: TextureSlot,
    photo_texture: TextureSlot,
    preview_texture: TextureSlot,

    // Clipboard
    clipboard: Option<SystemClipboard>,
    feedback: CopyFeedback,

    alert: Option<String>,
    status: Option<String>,
}

impl PromptGeniusApp {
    /// Creates the application.
    ///
    /// # Arguments
    /// * `config` - Application configuration
    /// * `device` - Capture device opened when the user picks the camera
    pub fn new(config: Config, device: Box<dyn CaptureDevice>) -> Self {
        let (tx, rx) = channel();

        // Load settings, using config's API key as fallback
        let mut settings = Settings::load(&config.model_name);
        if settings.api_key.is_empty() {
            settings.api_key = config.gemini_api_key.clone();
        }

        // The settings panel is the key selector; an env-provided key means
        // no selector is needed at all.
        let selector: Option<&dyn KeySelector> = if config.has_api_key() {
            None
        } else {
            Some(&settings)
        };
        let view = update(
            &ViewState::new(settings.category),
            Event::KeyStatusResolved(key_status(selector)),
        )
        .state;

        Self {
            view,
            config,
            settings,
            show_settings: false,
            services: None,
            scope: TaskScope::default(),
            tx,
            rx,
            device,
            camera: None,
            camera_texture: TextureSlot::default(),
            photo_texture: TextureSlot::default(),
            preview_texture: TextureSlot::default(),
            clipboard: None,
            feedback: CopyFeedback::default(),
            alert: None,
            status: None,
        }
    }

    /// Builds the Gemini services from the current settings on first use.
    fn services(&mut self) -> Result<Arc<Services>> {
        if let Some(services) = &self.services {
            return Ok(services.clone());
        }
        let config = Config {
            gemini_api_key: self.settings.api_key.clone(),
            model_name: self.settings.model.clone(),
            ..self.config.clone()
        };
        let client = GeminiClient::new(&config)?;
        let services = Arc::new(Services::from_config(Arc::new(client), &config));
        self.services = Some(services.clone());
        Ok(services)
    }

    /// Runs one event through the state machine and performs its effects.
    fn dispatch(&mut self, ctx: &egui::Context, event: Event) {
        let transition = update(&self.view, event);
        self.view = transition.state;
        if self.view.generated_image.is_none() {
            self.status = None;
        }

        for effect in transition.effects {
            match effect {
                Effect::StartCamera => match CameraSession::open(self.device.as_ref()) {
                    Ok(session) => self.camera = Some(session),
                    Err(e) => {
                        tracing::error!("camera unavailable: {}", e);
                        self.dispatch(ctx, Event::CameraFailed(e.user_message()));
                    }
                },
                Effect::StopCamera => {
                    self.camera = None;
                    self.camera_texture.clear();
                }
                Effect::CancelPending => self.scope.abort_all(),
                Effect::Alert(message) => self.alert = Some(message),
                remote => self.spawn_request(ctx, remote),
            }
        }
    }

    /// Runs a remote effect on a background thread.
    ///
    /// The completion event comes back through the channel; aborted requests
    /// send nothing.
    fn spawn_request(&mut self, ctx: &egui::Context, effect: Effect) {
        let services = match self.services() {
            Ok(services) => services,
            Err(e) => {
                tracing::error!("cannot reach Gemini: {}", e);
                if let Some(event) = failure_event(&effect, e.to_string()) {
                    self.dispatch(ctx, event);
                }
                return;
            }
        };

        let tx = self.tx.clone();
        let ctx = ctx.clone();
        let fallback = failure_event(&effect, "Failed to create async runtime".to_string());
        let task = self
            .scope
            .wrap(async move { run_effect(&services, effect).await });

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();

            let outcome = match runtime {
                Ok(rt) => rt.block_on(task),
                Err(e) => {
                    tracing::error!("failed to create async runtime: {}", e);
                    Ok(fallback)
                }
            };

            if let Ok(Some(event)) = outcome {
                let _ = tx.send(event);
                ctx.request_repaint();
            }
        });
    }

    /// Processes completion events from background threads.
    fn process_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.rx.try_recv() {
            self.dispatch(ctx, event);
        }
    }

    fn perform(&mut self, ctx: &egui::Context, action: Action) {
        match action {
            Action::Dispatch(event) => self.dispatch(ctx, event),
            Action::Copy(target, text) => {
                if let Err(e) = self.copy(target, &text) {
                    self.alert = Some(e.to_string());
                }
            }
            Action::PickFile => {
                let picked = rfd::FileDialog::new()
                    .add_filter("Images", &["png", "jpg", "jpeg"])
                    .pick_file();
                if let Some(path) = picked {
                    match ImageProcessor::load_file(&path) {
                        Ok(image) => self.dispatch(ctx, Event::ImageProvided(image)),
                        Err(e) => self.alert = Some(e.to_string()),
                    }
                }
            }
            Action::TakePhoto => {
                if let Some(session) = self.camera.take() {
                    match session.snapshot() {
                        Ok(image) => self.dispatch(ctx, Event::ImageProvided(image)),
                        Err(e) => self.dispatch(ctx, Event::CameraFailed(e.user_message())),
                    }
                }
            }
            Action::Download => {
                if let Some(image) = &self.view.generated_image {
                    match save_preview(image, &default_download_dir()) {
                        Ok(path) => self.status = Some(format!("Saved to {}", path.display())),
                        Err(e) => self.alert = Some(e.to_string()),
                    }
                }
            }
            Action::ConnectKey => match self.settings.open_key_selector() {
                Ok(()) => {
                    self.services = None;
                    self.dispatch(ctx, Event::KeySelected);
                }
                Err(e) => self.alert = Some(e.to_string()),
            },
            Action::SaveSettings => {
                self.services = None;
                self.settings.category = self.view.category;
                if let Err(e) = self.settings.save() {
                    tracing::warn!("failed to save settings: {}", e);
                }
                self.show_settings = false;
            }
            Action::DismissAlert => self.alert = None,
        }
    }

    fn copy(&mut self, target: CopyTarget, text: &str) -> Result<()> {
        if self.clipboard.is_none() {
            self.clipboard = Some(SystemClipboard::new()?);
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            return Err(AppError::Clipboard("Clipboard unavailable".to_string()));
        };
        copy_with_feedback(clipboard, &mut self.feedback, target, text, Instant::now())
    }

    fn copied(&self, target: &CopyTarget) -> bool {
        self.feedback.is_active(target, Instant::now())
    }

    fn copy_label(&self, target: &CopyTarget, idle: &'static str) -> &'static str {
        if self.copied(target) { "Copied!" } else { idle }
    }

    /// Keeps textures in step with the view state.
    fn sync_textures(&mut self, ctx: &egui::Context) {
        self.photo_texture
            .sync(ctx, "photo", self.view.selected_image.as_ref());
        self.preview_texture.sync(
            ctx,
            "preview",
            self.view.generated_image.as_ref().map(|g| &g.image),
        );

        if let Some(session) = self.camera.as_mut() {
            match session.preview() {
                Ok(frame) => self.camera_texture.set_frame(ctx, "camera", &frame),
                Err(e) => tracing::warn!("camera frame dropped: {}", e),
            }
            ctx.request_repaint_after(Duration::from_millis(33));
        }
    }

    fn render_header(&self, ui: &mut egui::Ui, actions: &mut Vec<Action>) -> bool {
        let mut toggle_settings = false;
        ui.horizontal(|ui| {
            ui.heading(egui::RichText::new("PromptGenius AI").color(ACCENT).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("⚙").clicked() {
                    toggle_settings = true;
                }
                if self.view.mode != AppState::Idle && self.view.key_status == Some(true) {
                    if ui.button("⟲ New image").clicked() {
                        actions.push(Action::Dispatch(Event::Reset));
                    }
                }
            });
        });
        toggle_settings
    }

    /// Renders the settings panel.
    fn render_settings_ui(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.separator();
        ui.label("Settings");

        // Model selector
        egui::ComboBox::from_label("Model")
            .selected_text(&self.settings.model)
            .show_ui(ui, |ui| {
                for model in AVAILABLE_MODELS {
                    ui.selectable_value(&mut self.settings.model, model.to_string(), *model);
                }
            });

        // API Key
        ui.label("API Key:");
        ui.add(
            egui::TextEdit::singleline(&mut self.settings.api_key)
                .password(true)
                .hint_text("Paste Gemini API Key"),
        );

        if ui.button("Save").clicked() {
            actions.push(Action::SaveSettings);
        }
        ui.separator();
    }

    fn render_key_screen(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("Connect your Gemini API key");
            ui.label(
                "To keep full and private access to the AI generations, connect your own \
                Google Gemini API key.",
            );
            ui.add_space(12.0);
            ui.add(
                egui::TextEdit::singleline(&mut self.settings.api_key)
                    .password(true)
                    .hint_text("Paste Gemini API Key"),
            );
            if ui.button("Connect My API Key").clicked() {
                actions.push(Action::ConnectKey);
            }
            ui.small("The key is stored in your local settings file only.");
        });
    }

    fn render_idle(&self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            ui.heading("From Photo to Prompt");
            ui.label(
                "Upload or capture an image. The AI writes 30 professional prompts in \
                specialised art styles for your next creation.",
            );
            ui.add_space(16.0);

            let mut category = self.view.category;
            egui::ComboBox::from_label("Main art direction")
                .selected_text(category.label())
                .show_ui(ui, |ui| {
                    for option in StyleCategory::ALL {
                        ui.selectable_value(&mut category, option, option.label());
                    }
                });
            if category != self.view.category {
                actions.push(Action::Dispatch(Event::SelectCategory(category)));
            }

            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if ui.button("📷 Use Camera").clicked() {
                    actions.push(Action::Dispatch(Event::OpenCamera));
                }
                if ui.button("🖼 Upload File").clicked() {
                    actions.push(Action::PickFile);
                }
            });

            ui.add_space(24.0);
            ui.horizontal_wrapped(|ui| {
                for label in STYLE_LABELS {
                    ui.label(egui::RichText::new(label).small().color(egui::Color32::GRAY));
                }
            });
        });
    }

    fn render_capturing(&self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.vertical_centered(|ui| {
            if let Some(session) = &self.camera {
                ui.label(egui::RichText::new(session.device_name()).small().color(egui::Color32::GRAY));
            }
            match self.camera_texture.handle() {
                Some(texture) => {
                    framed_image(ui, texture, egui::vec2(800.0, 450.0), 1.0);
                }
                None => {
                    ui.spinner();
                }
            }
            ui.add_space(16.0);
            ui.horizontal(|ui| {
                if ui.button("Cancel").clicked() {
                    actions.push(Action::Dispatch(Event::CaptureCancelled));
                }
                if ui.button("Capture Photo").clicked() {
                    actions.push(Action::TakePhoto);
                }
            });
        });
    }

    fn render_analyzing(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(60.0);
            if let Some(texture) = self.photo_texture.handle() {
                framed_image(ui, texture, egui::vec2(320.0, 320.0), 1.0);
            }
            ui.add_space(16.0);
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(format!(
                    "Analyzing image with a {} direction...",
                    self.view.category.label()
                ));
            });
        });
    }

    fn render_result(&self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        let Some(analysis) = &self.view.analysis else {
            return;
        };
        let translated = self.view.show_translated;

        ui.horizontal(|ui| {
            if let Some(texture) = self.photo_texture.handle() {
                if framed_image(ui, texture, egui::vec2(220.0, 220.0), 1.0)
                    .on_hover_text("Click to zoom")
                    .clicked()
                {
                    actions.push(Action::Dispatch(Event::ToggleZoom));
                }
            }
            ui.vertical(|ui| {
                ui.horizontal(|ui| {
                    let title = if self.view.showing_translation() {
                        format!("Context in {}", self.config.translation_language)
                    } else {
                        "Detailed Context".to_string()
                    };
                    ui.strong(title);
                    if let Some(category) = analysis.category {
                        ui.label(egui::RichText::new(category.label()).small().color(ACCENT));
                    }
                    let label = self.copy_label(&CopyTarget::Description, "Copy");
                    if ui.small_button(label).clicked() {
                        actions.push(Action::Copy(
                            CopyTarget::Description,
                            analysis.description_text(translated).to_string(),
                        ));
                    }
                });
                ui.label(egui::RichText::new(analysis.description_text(translated)).italics());
            });
        });

        ui.separator();
        ui.horizontal(|ui| {
            ui.strong(format!("{} styled prompts", analysis.prompts.len()));
            let translate_label = if self.view.translating {
                "Translating...".to_string()
            } else if self.view.showing_translation() {
                "View original".to_string()
            } else {
                format!("Translate to {}", self.config.translation_language)
            };
            if ui
                .add_enabled(!self.view.translating, egui::Button::new(translate_label))
                .clicked()
            {
                actions.push(Action::Dispatch(Event::ToggleTranslation));
            }
            if self.view.translating {
                ui.spinner();
            }
            let label = self.copy_label(&CopyTarget::AllPrompts, "Copy All");
            if ui.button(label).clicked() {
                if let Some(text) = self.view.displayed_prompt_list() {
                    actions.push(Action::Copy(CopyTarget::AllPrompts, text));
                }
            }
        });

        egui::ScrollArea::vertical().show(ui, |ui| {
            for prompt in &analysis.prompts {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        ui.strong(&prompt.style);
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            let pending = self.view.generating_for.as_deref() == Some(&prompt.style);
                            let preview_label = if pending { "Generating..." } else { "Preview" };
                            if ui
                                .add_enabled(
                                    !self.view.is_generating(),
                                    egui::Button::new(preview_label),
                                )
                                .clicked()
                            {
                                if let Some(event) = self.view.preview_request(&prompt.style) {
                                    actions.push(Action::Dispatch(event));
                                }
                            }
                            if pending {
                                ui.spinner();
                            }

                            let target = CopyTarget::Prompt(prompt.style.clone());
                            let label = self.copy_label(&target, "Copy");
                            if ui.small_button(label).clicked() {
                                actions.push(Action::Copy(
                                    target,
                                    prompt.prompt_text(translated).to_string(),
                                ));
                            }
                        });
                    });
                    ui.label(
                        egui::RichText::new(prompt.description_text(translated))
                            .small()
                            .color(egui::Color32::GRAY),
                    );
                    ui.label(prompt.prompt_text(translated));
                });
                ui.add_space(4.0);
            }
        });
    }

    fn render_preview(&self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.vertical_centered(|ui| {
            ui.heading("Preview");
            if let Some(texture) = self.preview_texture.handle() {
                framed_image(ui, texture, egui::vec2(640.0, 640.0), 1.0);
            }
            if let Some(image) = &self.view.generated_image {
                ui.label(egui::RichText::new(&image.prompt).small().italics());
            }
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if ui.button("← Back to list").clicked() {
                    actions.push(Action::Dispatch(Event::BackToList));
                }
                if ui.button("⬇ Download").clicked() {
                    actions.push(Action::Download);
                }
                if ui.button("⟲ Start over").clicked() {
                    actions.push(Action::Dispatch(Event::Reset));
                }
            });
            if let Some(status) = &self.status {
                ui.small(status);
            }
        });
    }

    fn render_zoom(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        if !self.view.zoom.open {
            return;
        }
        let Some(texture) = self.photo_texture.handle() else {
            return;
        };

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            actions.push(Action::Dispatch(Event::CloseZoom));
        }
        // Unsmoothed delta: one wheel notch is non-zero for a single frame
        if let Some(delta) = wheel_zoom_step(ctx.input(|i| i.raw_scroll_delta.y)) {
            actions.push(Action::Dispatch(Event::AdjustZoom(delta)));
        }

        egui::Window::new("Zoom")
            .collapsible(false)
            .resizable(true)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("+").clicked() {
                        actions.push(Action::Dispatch(Event::AdjustZoom(ZOOM_STEP)));
                    }
                    if ui.button("−").clicked() {
                        actions.push(Action::Dispatch(Event::AdjustZoom(-ZOOM_STEP)));
                    }
                    if ui.button("✕").clicked() {
                        actions.push(Action::Dispatch(Event::ToggleZoom));
                    }
                    ui.label(format!(
                        "Zoom: {}% • use the mouse wheel or the buttons",
                        (self.view.zoom.level * 100.0).round()
                    ));
                });
                egui::ScrollArea::both().max_height(700.0).show(ui, |ui| {
                    framed_image(ui, texture, egui::vec2(900.0, 650.0), self.view.zoom.level);
                });
            });
    }

    fn render_alert(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let Some(message) = &self.alert else {
            return;
        };
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(message).color(egui::Color32::LIGHT_RED));
                if ui.button("OK").clicked() {
                    actions.push(Action::DismissAlert);
                }
            });
    }
}

/// The event that unwinds a remote effect which could not be started.
/// One fixed zoom step per wheel movement, whatever its magnitude.
fn wheel_zoom_step(scroll_y: f32) -> Option<f32> {
    if scroll_y > 0.0 {
        Some(ZOOM_WHEEL_STEP)
    } else if scroll_y < 0.0 {
        Some(-ZOOM_WHEEL_STEP)
    } else {
        None
    }
}

fn failure_event(effect: &Effect, message: String) -> Option<Event> {
    match effect {
        Effect::Analyze { .. } => Some(Event::AnalysisFailed(message)),
        Effect::Translate(_) => Some(Event::TranslationFailed(message)),
        Effect::GeneratePreview { .. } => Some(Event::PreviewFailed(message)),
        _ => None,
    }
}

impl eframe::App for PromptGeniusApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Enforce dark mode
        ctx.set_visuals(egui::Visuals::dark());

        self.process_events(ctx);
        self.sync_textures(ctx);

        if self.feedback.prune(Instant::now()) {
            ctx.request_repaint_after(COPY_FEEDBACK_TTL / 4);
        }

        let mut actions = Vec::new();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            if self.render_header(ui, &mut actions) {
                self.show_settings = !self.show_settings;
            }
            if self.show_settings {
                self.render_settings_ui(ui, &mut actions);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.view.key_status {
            None => {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            }
            Some(false) => self.render_key_screen(ui, &mut actions),
            Some(true) => match self.view.mode {
                AppState::Idle => self.render_idle(ui, &mut actions),
                AppState::Capturing => self.render_capturing(ui, &mut actions),
                AppState::Analyzing => self.render_analyzing(ui),
                AppState::Result => self.render_result(ui, &mut actions),
                AppState::GeneratingImage => self.render_preview(ui, &mut actions),
            },
        });

        self.render_zoom(ctx, &mut actions);
        self.render_alert(ctx, &mut actions);

        for action in actions {
            self.perform(ctx, action);
        }
    }
}
