//! Test helpers and builder patterns for orchestrator tests
//!
//! The builder installs permissive defaults for every mock that a test does
//! not configure itself, so each test only states the behaviour it checks.

use std::sync::{Arc, Mutex};

use orchestrator::core::{inputs_fingerprint, plan, GenerationSession};
use orchestrator::traits::{MockAssetUploader, MockCheckpointStore, MockRenderApi};
use orchestrator::{Notifier, Orchestrator, ResumeChoice, ResumeOffer};
use shared::{CheckpointRecord, GenerationRequest, ProgressUpdate, RenderResponse, ToastLevel};

pub type TestOrchestrator = Orchestrator<MockRenderApi, MockAssetUploader, MockCheckpointStore, RecordingNotifier>;

/// Everything the orchestrator told the user
#[derive(Debug, Default)]
pub struct NotifierLog {
    pub progress: Vec<ProgressUpdate>,
    pub toasts: Vec<(ToastLevel, String)>,
    pub modals: Vec<String>,
    pub offers: Vec<ResumeOffer>,
}

/// Notifier that records every call and answers resume offers with a fixed choice
#[derive(Clone)]
pub struct RecordingNotifier {
    log: Arc<Mutex<NotifierLog>>,
    choice: ResumeChoice,
}

impl RecordingNotifier {
    pub fn new(choice: ResumeChoice) -> Self {
        Self {
            log: Arc::new(Mutex::new(NotifierLog::default())),
            choice,
        }
    }

    pub fn percents(&self) -> Vec<f64> {
        self.log.lock().unwrap().progress.iter().map(|p| p.percent).collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.log.lock().unwrap().progress.iter().map(|p| p.status.clone()).collect()
    }

    pub fn toasts(&self, level: ToastLevel) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .toasts
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn modals(&self) -> Vec<String> {
        self.log.lock().unwrap().modals.clone()
    }

    pub fn offers(&self) -> Vec<ResumeOffer> {
        self.log.lock().unwrap().offers.clone()
    }
}

impl Notifier for RecordingNotifier {
    fn progress(&self, update: ProgressUpdate) {
        self.log.lock().unwrap().progress.push(update);
    }

    fn toast(&self, level: ToastLevel, message: String) {
        self.log.lock().unwrap().toasts.push((level, message));
    }

    fn modal(&self, message: String) {
        self.log.lock().unwrap().modals.push(message);
    }

    fn confirm_resume(&self, offer: ResumeOffer) -> ResumeChoice {
        self.log.lock().unwrap().offers.push(offer);
        self.choice
    }
}

/// Builder pattern for creating test orchestrators with sensible defaults
pub struct OrchestratorBuilder {
    render: MockRenderApi,
    uploader: MockAssetUploader,
    store: MockCheckpointStore,
    notifier: RecordingNotifier,
    render_configured: bool,
    uploader_configured: bool,
    store_configured: bool,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            render: MockRenderApi::new(),
            uploader: MockAssetUploader::new(),
            store: MockCheckpointStore::new(),
            notifier: RecordingNotifier::new(ResumeChoice::Resume),
            render_configured: false,
            uploader_configured: false,
            store_configured: false,
        }
    }

    /// Configure the render mock with a setup function
    pub fn with_render<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockRenderApi),
    {
        setup(&mut self.render);
        self.render_configured = true;
        self
    }

    /// Configure the uploader mock with a setup function
    pub fn with_uploader<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockAssetUploader),
    {
        setup(&mut self.uploader);
        self.uploader_configured = true;
        self
    }

    /// Configure the checkpoint store mock with a setup function
    pub fn with_store<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockCheckpointStore),
    {
        setup(&mut self.store);
        self.store_configured = true;
        self
    }

    pub fn with_resume_choice(mut self, choice: ResumeChoice) -> Self {
        self.notifier = RecordingNotifier::new(choice);
        self
    }

    /// Build the orchestrator and hand back the notifier for assertions
    pub fn build(mut self) -> (TestOrchestrator, RecordingNotifier) {
        if !self.render_configured {
            self.render
                .expect_render()
                .returning(|_, request| Ok(TestHelpers::rendered(request.index)))
                .times(0..);
        }
        if !self.uploader_configured {
            self.uploader.expect_upload().times(0);
        }
        if !self.store_configured {
            TestHelpers::permissive_store(&mut self.store);
        }

        let notifier = self.notifier.clone();
        let orchestrator = Orchestrator::new(self.render, self.uploader, self.store, self.notifier);
        (orchestrator, notifier)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper functions for common test operations
pub struct TestHelpers;

impl TestHelpers {
    pub fn rendered(index: usize) -> RenderResponse {
        RenderResponse::video(format!("/renders/{index}.mp4"))
    }

    /// Store that accepts every write and holds nothing
    pub fn permissive_store(store: &mut MockCheckpointStore) {
        store.expect_save().returning(|_| Ok(())).times(0..);
        store.expect_load().returning(|| Ok(None)).times(0..);
        store.expect_clear().returning(|| Ok(())).times(0..);
    }

    /// Checkpoint of `request` interrupted after `generated` items
    pub fn interrupted_record(request: &GenerationRequest, seed: u64, generated: usize) -> CheckpointRecord {
        let plan = plan(request, seed).expect("fixture request plans");
        let mut session = GenerationSession::start(request.mode, plan.total(), seed, inputs_fingerprint(request));
        for index in 0..generated {
            session.record_success(vec![format!("/renders/{index}.mp4")]);
        }
        let (outer, inner) = plan.position_of(generated);
        session.advance_to(generated, outer, inner);
        session.progress_percent = generated as f64 * 100.0 / plan.total() as f64;
        session.to_record()
    }

    /// Assert that values never decrease
    pub fn assert_monotonic(values: &[f64]) {
        for pair in values.windows(2) {
            assert!(pair[1] >= pair[0], "progress went backwards: {pair:?}");
        }
    }
}
