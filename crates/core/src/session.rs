//! Request orchestration around the view state controller.
//!
//! [`Session`] owns the [`ViewState`], feeds events through
//! [`state::update`](crate::state::update) and performs the remote effects
//! with the analysis, translation and image generation clients. Front-ends
//! that need to stay responsive (the egui app) call [`run_effect`] on a
//! background thread instead and post the resulting event back.

use crate::analysis::{AnalysisOptions, analyze_image};
use crate::backend::GenerativeBackend;
use crate::config::Config;
use crate::imagegen::generate_preview;
use crate::model::StyleCategory;
use crate::state::{Effect, Event, ViewState, update};
use crate::translation::{TranslationOptions, translate_result};
use futures::future::{AbortHandle, Abortable, Aborted};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The remote clients plus the options they run with.
pub struct Services {
    pub backend: Arc<dyn GenerativeBackend>,
    pub analysis: AnalysisOptions,
    pub translation: TranslationOptions,
}

impl Services {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            analysis: AnalysisOptions::default(),
            translation: TranslationOptions::default(),
        }
    }

    pub fn from_config(backend: Arc<dyn GenerativeBackend>, config: &Config) -> Self {
        Self {
            backend,
            analysis: AnalysisOptions {
                language: config.prompt_language.clone(),
                prompt_count: config.prompt_count,
            },
            translation: TranslationOptions {
                source_language: config.prompt_language.clone(),
                target_language: config.translation_language.clone(),
            },
        }
    }
}

/// True for effects that call the remote service.
pub fn is_remote(effect: &Effect) -> bool {
    matches!(
        effect,
        Effect::Analyze { .. } | Effect::Translate(_) | Effect::GeneratePreview { .. }
    )
}

/// Performs one remote effect and returns the completion event.
///
/// Failures become `*Failed` events carrying the user-facing message; local
/// effects return `None`.
pub async fn run_effect(services: &Services, effect: Effect) -> Option<Event> {
    let backend = services.backend.as_ref();
    match effect {
        Effect::Analyze { image, category } => {
            Some(match analyze_image(backend, &image, category, &services.analysis).await {
                Ok(result) => Event::AnalysisCompleted(result),
                Err(e) => {
                    tracing::error!("analysis failed: {}", e);
                    Event::AnalysisFailed(e.user_message())
                }
            })
        }
        Effect::Translate(result) => {
            Some(match translate_result(backend, &result, &services.translation).await {
                Ok(translated) => Event::TranslationCompleted(translated),
                Err(e) => {
                    tracing::error!("translation failed: {}", e);
                    Event::TranslationFailed(e.user_message())
                }
            })
        }
        Effect::GeneratePreview { prompt } => {
            Some(match generate_preview(backend, &prompt).await {
                Ok(image) => Event::PreviewReady(image),
                Err(e) => {
                    tracing::error!("image generation failed: {}", e);
                    Event::PreviewFailed(e.user_message())
                }
            })
        }
        _ => None,
    }
}

/// Abort handles of the in-flight work owned by one view.
///
/// Dropping the scope aborts everything still registered.
#[derive(Default)]
pub struct TaskScope {
    tasks: Vec<Tracked>,
}

struct Tracked {
    handle: AbortHandle,
    done: Arc<AtomicBool>,
}

/// Marks a task finished when its future completes or is dropped.
struct DoneOnDrop(Arc<AtomicBool>);

impl Drop for DoneOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

impl TaskScope {
    /// Registers `future` with the scope; the returned future resolves to
    /// `Err(Aborted)` once the scope aborts it.
    pub fn wrap<F: Future>(
        &mut self,
        future: F,
    ) -> impl Future<Output = Result<F::Output, Aborted>> + use<F> {
        self.tasks
            .retain(|t| !t.handle.is_aborted() && !t.done.load(Ordering::Acquire));

        let (handle, registration) = AbortHandle::new_pair();
        let done = Arc::new(AtomicBool::new(false));
        self.tasks.push(Tracked {
            handle,
            done: done.clone(),
        });

        let task = Abortable::new(future, registration);
        let guard = DoneOnDrop(done);
        async move {
            let _guard = guard;
            task.await
        }
    }

    pub fn abort_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.handle.abort();
        }
    }

    /// Number of registered tasks that have not finished yet.
    pub fn len(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| !t.done.load(Ordering::Acquire))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.abort_all();
    }
}

/// Headless owner of the view state, used by the CLI and by tests.
pub struct Session {
    state: ViewState,
    services: Arc<Services>,
    scope: TaskScope,
    alerts: Vec<String>,
}

impl Session {
    pub fn new(services: Services, category: StyleCategory) -> Self {
        Self {
            state: ViewState::new(category),
            services: Arc::new(services),
            scope: TaskScope::default(),
            alerts: Vec::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Alerts raised so far, oldest first.
    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    /// Applies one event without running remote work.
    ///
    /// Alerts and cancellations are handled here; every other effect is
    /// returned to the caller.
    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        let transition = update(&self.state, event);
        self.state = transition.state;

        let mut pending = Vec::new();
        for effect in transition.effects {
            match effect {
                Effect::Alert(message) => {
                    tracing::warn!(%message, "alert");
                    self.alerts.push(message);
                }
                Effect::CancelPending => self.scope.abort_all(),
                other => pending.push(other),
            }
        }
        pending
    }

    /// Applies `event` and runs the remote effects it triggers to completion,
    /// feeding their results back in. Returns the local effects (camera
    /// control) left for the caller.
    pub async fn handle(&mut self, event: Event) -> Vec<Effect> {
        let mut queue = VecDeque::from([event]);
        let mut local = Vec::new();

        while let Some(event) = queue.pop_front() {
            for effect in self.apply(event) {
                if !is_remote(&effect) {
                    local.push(effect);
                    continue;
                }
                let services = self.services.clone();
                let task = self.scope.wrap(async move { run_effect(&services, effect).await });
                match task.await {
                    Ok(Some(next)) => queue.push_back(next),
                    Ok(None) => {}
                    Err(Aborted) => tracing::debug!("remote call aborted"),
                }
            }
        }

        local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ContentPart, ImageRequest, JsonRequest};
    use crate::error::Result;
    use crate::image_processing::EncodedImage;
    use async_trait::async_trait;
    use futures::future::pending;

    struct Unreachable;

    #[async_trait]
    impl GenerativeBackend for Unreachable {
        async fn generate_json(&self, _request: JsonRequest) -> Result<Option<String>> {
            Ok(None)
        }

        async fn generate_image(&self, _request: ImageRequest) -> Result<Vec<ContentPart>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn abort_all_cancels_pending_work() {
        let mut scope = TaskScope::default();
        let task = scope.wrap(pending::<()>());
        assert_eq!(scope.len(), 1);

        scope.abort_all();

        assert_eq!(task.await, Err(Aborted));
        assert!(scope.is_empty());
    }

    #[tokio::test]
    async fn dropping_the_scope_cancels_pending_work() {
        let mut scope = TaskScope::default();
        let first = scope.wrap(pending::<()>());
        let second = scope.wrap(pending::<()>());

        drop(scope);

        assert_eq!(first.await, Err(Aborted));
        assert_eq!(second.await, Err(Aborted));
    }

    #[tokio::test]
    async fn finished_work_is_pruned() {
        let mut scope = TaskScope::default();
        for i in 0..5 {
            assert_eq!(scope.wrap(async move { i }).await, Ok(i));
        }
        assert!(scope.is_empty());

        let _pending = scope.wrap(pending::<()>());
        assert_eq!(scope.tasks.len(), 1);
        assert_eq!(scope.len(), 1);
    }

    #[tokio::test]
    async fn reset_cancels_in_flight_requests() {
        let mut session = Session::new(Services::new(Arc::new(Unreachable)), StyleCategory::Anime);
        let effects = session.apply(Event::ImageProvided(EncodedImage::new("image/jpeg", "AAAA")));
        assert!(matches!(effects.as_slice(), [Effect::Analyze { .. }]));

        let in_flight = session.scope.wrap(pending::<Option<Event>>());
        let local = session.apply(Event::Reset);

        assert!(local.is_empty());
        assert_eq!(in_flight.await, Err(Aborted));
        assert!(session.scope.is_empty());
    }
}
