//! Main orchestrator implementation
//!
//! Drives one batch through `Idle → Validating → Enumerating → Running(i) →
//! Completed | Cancelled | FatalError` with injected render, upload,
//! checkpoint and notification services. Items run strictly one after the
//! other; a failed item is reported and skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;

use shared::{
    logging, run_debug, run_info, run_warn, AudioSelection, GenerationRequest, ProgressUpdate, RunId, ToastLevel,
    VariantSettings,
};

use crate::core::{
    inputs_fingerprint, pick_hook, pick_timing, validate, GenerationJob, GenerationPhase, GenerationSession,
    JobPlan, ProgressTracker,
};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::payload::{build_payload, PayloadContext};
use crate::persistence::{CheckpointManager, SaveOutcome};
use crate::services::MediaResolver;
use crate::traits::{AssetUploader, CheckpointStore, Notifier, RenderApi, ResumeChoice, ResumeOffer};

/// Interval of the in-item progress timer
pub const PROGRESS_TICK: Duration = Duration::from_millis(500);

/// Default estimate of one item's processing time
pub const DEFAULT_EXPECTED_ITEM: Duration = Duration::from_secs(45);

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Result of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: RunId,
    pub outcome: RunOutcome,
    pub total: usize,
    pub generated: usize,
    pub failed: usize,
    pub media_urls: Vec<String>,
}

/// Cooperative cancellation flag, checked before each item starts
#[derive(Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Access to the live session from outside the run loop
pub struct SessionHandle<S: CheckpointStore> {
    session: Arc<Mutex<GenerationSession>>,
    checkpoints: Arc<CheckpointManager<S>>,
}

impl<S: CheckpointStore> Clone for SessionHandle<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            checkpoints: Arc::clone(&self.checkpoints),
        }
    }
}

impl<S: CheckpointStore> SessionHandle<S> {
    /// The host is going away: persist the session if a run is active
    ///
    /// Returns whether a checkpoint was written. The session stays locked
    /// during the write so a run finishing meanwhile clears it afterwards.
    pub async fn visibility_hidden(&self) -> bool {
        let session = self.session.lock().await;
        if !session.is_generating {
            return false;
        }
        self.checkpoints.save_checkpoint(&session).await != SaveOutcome::Disabled
    }
}

/// Batch generation state machine with injected services
pub struct Orchestrator<R, U, S, N>
where
    R: RenderApi + 'static,
    U: AssetUploader + 'static,
    S: CheckpointStore + 'static,
    N: Notifier + 'static,
{
    /// Core state
    session: Arc<Mutex<GenerationSession>>,
    phase: Arc<Mutex<GenerationPhase>>,
    cancel: CancelHandle,

    /// Injected services
    render: R,
    resolver: MediaResolver<U>,
    checkpoints: Arc<CheckpointManager<S>>,
    notifier: N,

    expected_item: Duration,
    tick_interval: Duration,
}

impl<R, U, S, N> Orchestrator<R, U, S, N>
where
    R: RenderApi + 'static,
    U: AssetUploader + 'static,
    S: CheckpointStore + 'static,
    N: Notifier + 'static,
{
    /// Create new orchestrator with injected dependencies
    pub fn new(render: R, uploader: U, store: S, notifier: N) -> Self {
        Self {
            session: Arc::new(Mutex::new(GenerationSession::default())),
            phase: Arc::new(Mutex::new(GenerationPhase::Idle)),
            cancel: CancelHandle::default(),
            render,
            resolver: MediaResolver::new(uploader),
            checkpoints: Arc::new(CheckpointManager::new(store)),
            notifier,
            expected_item: DEFAULT_EXPECTED_ITEM,
            tick_interval: PROGRESS_TICK,
        }
    }

    pub fn with_expected_item(mut self, expected_item: Duration) -> Self {
        self.expected_item = expected_item;
        self
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn session_handle(&self) -> SessionHandle<S> {
        SessionHandle {
            session: Arc::clone(&self.session),
            checkpoints: Arc::clone(&self.checkpoints),
        }
    }

    pub async fn phase(&self) -> GenerationPhase {
        self.phase.lock().await.clone()
    }

    pub async fn session(&self) -> GenerationSession {
        self.session.lock().await.clone()
    }

    async fn set_phase(&self, phase: GenerationPhase) {
        *self.phase.lock().await = phase;
    }

    /// Stored session that can still be resumed
    ///
    /// An unreadable checkpoint is dropped rather than blocking the user.
    pub async fn pending_resume(&self) -> OrchestratorResult<Option<GenerationSession>> {
        match self.checkpoints.load_checkpoint().await {
            Ok(session) => Ok(session.filter(GenerationSession::is_resumable)),
            Err(e) => {
                tracing::warn!("⚠️ Ignoring unreadable checkpoint: {}", e);
                self.checkpoints.clear_checkpoint().await?;
                Ok(None)
            }
        }
    }

    /// Offer to resume an interrupted run
    ///
    /// Returns the summary of the resumed run, or `None` when there was
    /// nothing to resume or the user discarded it.
    pub async fn startup(&self, request: Option<&GenerationRequest>) -> OrchestratorResult<Option<RunSummary>> {
        let Some(pending) = self.pending_resume().await? else {
            return Ok(None);
        };

        let offer = ResumeOffer {
            mode: pending.mode,
            generated_count: pending.generated_count,
            total_to_generate: pending.total_to_generate,
            progress: pending.progress_percent,
        };

        match self.notifier.confirm_resume(offer) {
            ResumeChoice::Discard => {
                self.discard_pending().await?;
                Ok(None)
            }
            ResumeChoice::Resume => match request {
                Some(request) => self.resume(request, pending).await.map(Some),
                None => Err(self
                    .resume_failed("the original job inputs are no longer available")
                    .await),
            },
        }
    }

    /// Clear any stored checkpoint and return to idle
    pub async fn discard_pending(&self) -> OrchestratorResult<()> {
        self.checkpoints.clear_checkpoint().await?;
        self.session.lock().await.reset();
        self.set_phase(GenerationPhase::Idle).await;
        self.notifier
            .toast(ToastLevel::Info, "Discarded the interrupted run".to_string());
        Ok(())
    }

    /// Start a fresh run, superseding any stored checkpoint
    pub async fn start(&self, request: &GenerationRequest) -> OrchestratorResult<RunSummary> {
        let run_id = RunId::new();
        logging::log_startup(&format!("{} run {} ({} requested)", request.mode, run_id, request.settings.requested_count));
        self.cancel.reset();

        self.set_phase(GenerationPhase::Validating).await;
        let validated = match validate(request) {
            Ok(validated) => validated,
            Err(e) => return Err(self.validation_failed(e).await),
        };

        if let Err(e) = self.checkpoints.clear_checkpoint().await {
            run_warn!(run_id, "Could not clear previous checkpoint: {}", e);
        }

        self.set_phase(GenerationPhase::Enumerating).await;
        let seed: u64 = rand::random();
        let plan = match validated.plan(seed) {
            Ok(plan) => plan,
            Err(e) => return Err(self.validation_failed(e).await),
        };
        if plan.is_clamped() {
            self.notifier.toast(
                ToastLevel::Warning,
                format!(
                    "Only {} unique variants are possible; generating {} instead of {}",
                    plan.space,
                    plan.total(),
                    plan.requested
                ),
            );
        }
        run_info!(run_id, "🧮 Planned {} items (space: {})", plan.total(), plan.space);

        let context = self.prepare(&run_id, request).await?;

        let session = GenerationSession::start(request.mode, plan.total(), seed, inputs_fingerprint(request));
        *self.session.lock().await = session;
        self.checkpoints.reset();
        if self.cancel.is_cancelled() {
            return self.finish_cancelled(&run_id, plan.total()).await;
        }
        self.persist(&run_id).await;

        self.run_loop(&run_id, &plan, &context, &request.settings, 0).await
    }

    /// Continue a stored run from its next unprocessed item
    ///
    /// The job list is rebuilt from the stored plan seed; already processed
    /// items are never submitted again.
    pub async fn resume(&self, request: &GenerationRequest, saved: GenerationSession) -> OrchestratorResult<RunSummary> {
        let run_id = RunId::new();
        logging::log_startup(&format!(
            "resume of {} run {} at item {}/{}",
            request.mode, run_id, saved.next_index, saved.total_to_generate
        ));
        self.cancel.reset();

        if let Err(reason) = Self::check_resumable(request, &saved) {
            return Err(self.resume_failed(&reason).await);
        }

        self.set_phase(GenerationPhase::Validating).await;
        let validated = match validate(request) {
            Ok(validated) => validated,
            Err(e) => return Err(self.resume_failed(&e.to_string()).await),
        };

        self.set_phase(GenerationPhase::Enumerating).await;
        let seed = saved.plan_seed.unwrap_or_default();
        let plan = match validated.plan(seed) {
            Ok(plan) => plan,
            Err(e) => return Err(self.resume_failed(&e.to_string()).await),
        };
        if plan.total() != saved.total_to_generate || saved.next_index > plan.total() {
            return Err(self
                .resume_failed(&format!(
                    "the job now plans {} items but the checkpoint expects {}",
                    plan.total(),
                    saved.total_to_generate
                ))
                .await);
        }

        let context = self.prepare(&run_id, request).await?;

        let start_index = saved.next_index;
        {
            let mut session = self.session.lock().await;
            *session = saved;
            session.is_generating = true;
        }
        self.checkpoints.reset();
        if self.cancel.is_cancelled() {
            return self.finish_cancelled(&run_id, plan.total()).await;
        }
        run_info!(run_id, "⏯️ Resuming at item {} of {}", start_index + 1, plan.total());

        self.run_loop(&run_id, &plan, &context, &request.settings, start_index).await
    }

    /// Reasons the stored session cannot be rebuilt from `request`
    fn check_resumable(request: &GenerationRequest, saved: &GenerationSession) -> Result<(), String> {
        if saved.plan_seed.is_none() {
            return Err("the checkpoint does not record how its jobs were planned".to_string());
        }
        if let Some(mode) = saved.mode {
            if mode != request.mode {
                return Err(format!("the checkpoint belongs to a {mode} run, not {}", request.mode));
            }
        }
        match &saved.inputs_fingerprint {
            Some(fingerprint) if *fingerprint == inputs_fingerprint(request) => {}
            Some(_) => return Err("the job inputs changed since the run was interrupted".to_string()),
            None => return Err("the checkpoint does not identify its inputs".to_string()),
        }

        let track = match &request.audio {
            Some(AudioSelection::Track { track, .. }) => Some(track),
            _ => None,
        };
        let missing = request
            .pools
            .iter()
            .flat_map(|pool| pool.parts.iter())
            .chain(track)
            .chain(request.settings.branding.iter())
            .filter_map(|part| part.local_path())
            .find(|path| !path.exists());
        if let Some(path) = missing {
            return Err(format!("missing input file {}", path.display()));
        }
        Ok(())
    }

    async fn validation_failed(&self, error: OrchestratorError) -> OrchestratorError {
        self.notifier.toast(ToastLevel::Error, error.to_string());
        self.set_phase(GenerationPhase::Idle).await;
        error
    }

    /// Blocking prompt, then start over from a clean slate
    async fn resume_failed(&self, reason: &str) -> OrchestratorError {
        let error = OrchestratorError::resume(reason);
        self.notifier.modal(format!("{error}. Start the batch again."));
        if let Err(e) = self.checkpoints.clear_checkpoint().await {
            tracing::warn!("⚠️ Could not clear checkpoint: {}", e);
        }
        self.session.lock().await.reset();
        self.set_phase(GenerationPhase::Idle).await;
        error
    }

    /// Resolve the run-wide assets; only the music track is mandatory
    async fn prepare(&self, run_id: &RunId, request: &GenerationRequest) -> OrchestratorResult<PayloadContext> {
        let audio = match &request.audio {
            Some(selection) => self.resolver.resolve_audio(selection).await,
            None => Err(OrchestratorError::validation("no audio selection")),
        };
        let audio = match audio {
            Ok(audio) => audio,
            Err(e) => {
                let error = OrchestratorError::fatal(format!("could not prepare the music track: {e}"));
                logging::log_error(run_id, "Setup", &error);
                self.notifier.toast(ToastLevel::Error, error.to_string());
                self.set_phase(GenerationPhase::FatalError(error.to_string())).await;
                return Err(error);
            }
        };

        let branding_url = match &request.settings.branding {
            Some(branding) => match self.resolver.resolve(branding).await {
                Ok(url) => Some(url),
                Err(e) => {
                    run_warn!(run_id, "Branding dropped: {}", e);
                    self.notifier
                        .toast(ToastLevel::Warning, format!("Branding overlay skipped: {e}"));
                    None
                }
            },
            None => None,
        };

        Ok(PayloadContext {
            mode: request.mode,
            hook_style: request.settings.hook_style.clone(),
            variation: request.settings.variation_enabled,
            audio,
            branding_url,
        })
    }

    async fn persist(&self, run_id: &RunId) {
        let was_disabled = self.checkpoints.is_disabled();
        let session = self.session.lock().await;
        let outcome = self.checkpoints.save_checkpoint(&session).await;
        drop(session);
        match outcome {
            SaveOutcome::Disabled if !was_disabled => {
                run_warn!(run_id, "Checkpoints disabled; this run cannot be resumed");
                self.notifier.toast(
                    ToastLevel::Warning,
                    "Progress can no longer be saved; an interruption will lose this batch".to_string(),
                );
            }
            SaveOutcome::Degraded => run_debug!(run_id, "Saved minimal checkpoint"),
            _ => {}
        }
    }

    async fn report_progress(&self, run_id: &RunId, percent: f64, index: usize, total: usize) {
        self.session.lock().await.progress_percent = percent;
        self.notifier.progress(ProgressUpdate::processing(percent, index, total));
        self.persist(run_id).await;
    }

    async fn run_loop(
        &self,
        run_id: &RunId,
        plan: &JobPlan,
        context: &PayloadContext,
        settings: &VariantSettings,
        start_index: usize,
    ) -> OrchestratorResult<RunSummary> {
        let total = plan.total();
        let saved_percent = self.session.lock().await.progress_percent;
        let mut tracker = ProgressTracker::new(total, start_index, self.expected_item).resume_from(saved_percent);
        let mut rng = StdRng::from_entropy();

        for index in start_index..total {
            if self.cancel.is_cancelled() {
                return self.finish_cancelled(run_id, total).await;
            }
            let Some(item) = plan.item(index) else { break };
            self.set_phase(GenerationPhase::Running { index }).await;

            let hook_text = match item.fixed_hook {
                Some(hook) => plan.hook_lines.get(hook).cloned(),
                None => pick_hook(&plan.hook_lines, index, &mut rng).map(str::to_string),
            };
            let timing = pick_timing(index, total, settings, &mut rng);
            let mut job = GenerationJob::new(index, item.combination.clone(), hook_text, timing);

            job.begin();
            tracker.begin_item(Instant::now());
            self.notifier
                .progress(ProgressUpdate::processing(tracker.current(), index, total));

            let result = self.process_job(run_id, &job, context, &mut tracker, total).await;

            // Late results of a cancelled run are dropped
            if self.cancel.is_cancelled() {
                return self.finish_cancelled(run_id, total).await;
            }

            match result {
                Ok(urls) => {
                    job.succeed();
                    run_info!(run_id, "🎞️ Item {}/{} ready", index + 1, total);
                    self.session.lock().await.record_success(urls);
                }
                Err(e) => {
                    job.fail(e.to_string());
                    run_warn!(run_id, "Item {}/{} failed: {}", index + 1, total, e);
                    self.notifier
                        .toast(ToastLevel::Error, format!("Video {} failed: {}", index + 1, e));
                    self.session.lock().await.record_failure();
                }
            }

            let percent = tracker.finish_item();
            let (outer, inner) = plan.position_of(index + 1);
            self.session.lock().await.advance_to(index + 1, outer, inner);
            self.report_progress(run_id, percent, index + 1, total).await;
        }

        self.finish_completed(run_id, &mut tracker, total).await
    }

    /// Resolve, build and submit one job while the progress timer ticks
    async fn process_job(
        &self,
        run_id: &RunId,
        job: &GenerationJob,
        context: &PayloadContext,
        tracker: &mut ProgressTracker,
        total: usize,
    ) -> OrchestratorResult<Vec<String>> {
        let part_urls = self.resolver.resolve_all(&job.combination).await?;
        let request = build_payload(context, job, part_urls);
        run_debug!(run_id, "Submitting item {} ({} parts)", job.index + 1, request.part_urls.len());

        let mut render = self.render.render(context.mode, request);
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                result = &mut render => {
                    return result.map(|response| response.media_urls());
                }
                _ = ticker.tick() => {
                    let percent = tracker.tick(Instant::now());
                    self.report_progress(run_id, percent, job.index, total).await;
                }
            }
        }
    }

    async fn finish_completed(
        &self,
        run_id: &RunId,
        tracker: &mut ProgressTracker,
        total: usize,
    ) -> OrchestratorResult<RunSummary> {
        let percent = tracker.complete();
        let session = {
            let mut session = self.session.lock().await;
            session.progress_percent = percent;
            session.is_generating = false;
            session.clone()
        };
        self.notifier.progress(ProgressUpdate::finished(total));

        if let Err(e) = self.checkpoints.clear_checkpoint().await {
            run_warn!(run_id, "Could not clear finished checkpoint: {}", e);
        }
        self.set_phase(GenerationPhase::Completed).await;

        let message = format!("{} of {} videos ready", session.generated_count, total);
        logging::log_success(run_id, &message);
        self.notifier.toast(ToastLevel::Success, message);

        Ok(RunSummary {
            run_id: run_id.clone(),
            outcome: RunOutcome::Completed,
            total,
            generated: session.generated_count,
            failed: session.failed_count,
            media_urls: session.completed_media_urls,
        })
    }

    async fn finish_cancelled(&self, run_id: &RunId, total: usize) -> OrchestratorResult<RunSummary> {
        let session = {
            let mut session = self.session.lock().await;
            let finished = session.clone();
            session.reset();
            finished
        };

        if let Err(e) = self.checkpoints.clear_checkpoint().await {
            run_warn!(run_id, "Could not clear cancelled checkpoint: {}", e);
        }
        self.set_phase(GenerationPhase::Cancelled).await;
        logging::log_shutdown(&format!("run {run_id} cancelled after {} items", session.processed()));
        self.notifier
            .toast(ToastLevel::Info, "Generation cancelled".to_string());

        Ok(RunSummary {
            run_id: run_id.clone(),
            outcome: RunOutcome::Cancelled,
            total,
            generated: session.generated_count,
            failed: session.failed_count,
            media_urls: session.completed_media_urls,
        })
    }
}
