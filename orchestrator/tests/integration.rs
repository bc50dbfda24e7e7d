//! Integration tests for the orchestrator
//!
//! These tests drive whole runs end to end using mockall-generated mocks
//! for the render, upload and checkpoint services.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use orchestrator::traits::{MockAssetUploader, MockCheckpointStore, RenderApi};
use orchestrator::{
    CancelHandle, GenerationPhase, Orchestrator, OrchestratorError, OrchestratorResult, ResumeChoice, RunOutcome,
    SessionHandle,
};
use shared::{
    AudioSelection, CheckpointRecord, GenerationMode, MediaKind, MediaPart, RenderRequest, RenderResponse, ToastLevel,
};

mod common;
use common::{OrchestratorBuilder, TestFixtures, TestHelpers};

/// Scenario A: two valid orderings, request clamped to them
#[tokio::test]
async fn test_scenario_a_generates_both_orderings() {
    let requests = Arc::new(Mutex::new(Vec::<RenderRequest>::new()));
    let seen = Arc::clone(&requests);
    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_render(move |render| {
            render
                .expect_render()
                .times(2)
                .returning(move |mode, request| {
                    assert_eq!(mode, GenerationMode::Versus);
                    let index = request.index;
                    seen.lock().unwrap().push(request);
                    Ok(TestHelpers::rendered(index))
                });
        })
        .build();

    let summary = orchestrator.start(&TestFixtures::scenario_a(5)).await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.generated, 2);
    assert_eq!(summary.media_urls, vec!["/renders/0.mp4".to_string(), "/renders/1.mp4".to_string()]);

    let mut orderings: Vec<Vec<String>> = requests
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.part_urls.iter().map(|u| u.trim_start_matches("https://cdn.test/").to_string()).collect())
        .collect();
    orderings.sort();
    assert_eq!(
        orderings,
        vec![
            vec!["v1.mp4", "s1.mp4", "s2.mp4", "g1.mp4", "c1.mp4"],
            vec!["v1.mp4", "s2.mp4", "s1.mp4", "g1.mp4", "c1.mp4"],
        ]
    );

    // the clamp is surfaced to the user
    assert_eq!(notifier.toasts(ToastLevel::Warning).len(), 1);
    assert_eq!(orchestrator.phase().await, GenerationPhase::Completed);
}

/// Scenario B: ten single-item pools allow exactly one video
#[tokio::test]
async fn test_scenario_b_single_combination() {
    let (orchestrator, _notifier) = OrchestratorBuilder::new()
        .with_render(|render| {
            render
                .expect_render()
                .withf(|mode, request| *mode == GenerationMode::Fein && request.part_urls.len() == 10)
                .times(1)
                .returning(|_, request| Ok(TestHelpers::rendered(request.index)));
        })
        .build();

    let request = TestFixtures::fixed_parts(GenerationMode::Fein, 10, 1, 5);
    let summary = orchestrator.start(&request).await.unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.generated, 1);
}

/// Resume from generatedCount=3 of 10 submits exactly items 3..10
#[tokio::test]
async fn test_resume_continues_after_completed_items() {
    let request = TestFixtures::fein(10);
    let record = TestHelpers::interrupted_record(&request, TestFixtures::TEST_SEED, 3);

    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_store(move |store| {
            store.expect_load().times(1).returning(move || Ok(Some(record.clone())));
            store.expect_save().returning(|_| Ok(())).times(0..);
            store.expect_clear().returning(|| Ok(())).times(1);
        })
        .with_render(|render| {
            render
                .expect_render()
                .withf(|_, request| request.index >= 3)
                .times(7)
                .returning(|_, request| Ok(TestHelpers::rendered(request.index)));
        })
        .build();

    let summary = orchestrator.startup(Some(&request)).await.unwrap().expect("run resumed");

    assert_eq!(summary.total, 10);
    assert_eq!(summary.generated, 10);
    assert_eq!(summary.media_urls.len(), 10);
    assert_eq!(summary.media_urls[3], "/renders/3.mp4");

    let offers = notifier.offers();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].generated_count, 3);
    assert_eq!(offers[0].total_to_generate, 10);

    // progress picks up from the checkpoint
    let percents = notifier.percents();
    assert!(percents[0] >= 30.0);
    TestHelpers::assert_monotonic(&percents);
}

/// The timer may have pushed the saved percentage past the item floor
#[tokio::test]
async fn test_resume_never_reports_less_than_saved_progress() {
    let request = TestFixtures::fein(10);
    let mut record = TestHelpers::interrupted_record(&request, TestFixtures::TEST_SEED, 3);
    record.progress = 38.0;

    let persisted = Arc::new(Mutex::new(Vec::<f64>::new()));
    let sink = Arc::clone(&persisted);
    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_store(move |store| {
            store.expect_load().returning(move || Ok(Some(record.clone())));
            store.expect_save().returning(move |record| {
                sink.lock().unwrap().push(record.progress);
                Ok(())
            });
            store.expect_clear().returning(|| Ok(())).times(0..);
        })
        .build();

    let summary = orchestrator.startup(Some(&request)).await.unwrap().expect("run resumed");
    assert_eq!(summary.generated, 10);

    let percents = notifier.percents();
    assert!(percents[0] >= 38.0, "{percents:?}");
    TestHelpers::assert_monotonic(&percents);

    let persisted = persisted.lock().unwrap();
    assert!(!persisted.is_empty());
    assert!(persisted.iter().all(|p| *p >= 38.0), "{persisted:?}");
}

/// Resumed runs rebuild the same combinations from the stored seed
#[tokio::test]
async fn test_resume_replans_identical_jobs() {
    let request = TestFixtures::fein(6);
    let plan = orchestrator::core::plan(&request, TestFixtures::TEST_SEED).unwrap();
    let expected: Vec<Vec<String>> = plan
        .items
        .iter()
        .map(|item| item.combination.iter().map(|p| p.remote_url().unwrap_or_default().to_string()).collect())
        .collect();
    let record = TestHelpers::interrupted_record(&request, TestFixtures::TEST_SEED, 4);

    let (orchestrator, _notifier) = OrchestratorBuilder::new()
        .with_store(move |store| {
            store.expect_load().returning(move || Ok(Some(record.clone())));
            store.expect_save().returning(|_| Ok(())).times(0..);
            store.expect_clear().returning(|| Ok(())).times(0..);
        })
        .with_render(move |render| {
            render
                .expect_render()
                .times(2)
                .returning(move |_, request| {
                    assert_eq!(request.part_urls, expected[request.index]);
                    Ok(TestHelpers::rendered(request.index))
                });
        })
        .build();

    let summary = orchestrator.startup(Some(&request)).await.unwrap().unwrap();
    assert_eq!(summary.generated, 6);
}

/// Changed inputs cannot be resumed: modal, cleared checkpoint, no renders
#[tokio::test]
async fn test_resume_with_changed_inputs_fails_gracefully() {
    let original = TestFixtures::fein(10);
    let record = TestHelpers::interrupted_record(&original, TestFixtures::TEST_SEED, 3);
    let mut changed = original.clone();
    changed.pools[2].parts[0] = TestFixtures::remote("replacement");

    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_store(move |store| {
            store.expect_load().returning(move || Ok(Some(record.clone())));
            store.expect_save().times(0);
            store.expect_clear().returning(|| Ok(())).times(1);
        })
        .with_render(|render| {
            render.expect_render().times(0);
        })
        .build();

    let err = orchestrator.startup(Some(&changed)).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::ResumeIntegrity { .. }));
    assert_eq!(notifier.modals().len(), 1);
    assert_eq!(orchestrator.phase().await, GenerationPhase::Idle);
    assert!(!orchestrator.session().await.is_generating);
}

/// Local inputs that disappeared since the interruption block the resume
#[tokio::test]
async fn test_resume_with_missing_local_file_fails() {
    let mut request = TestFixtures::fein(10);
    request.pools[0].parts[0] = MediaPart::local("gone", MediaKind::Video, "/definitely/not/here.mp4");
    let record = TestHelpers::interrupted_record(&request, TestFixtures::TEST_SEED, 2);

    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_store(move |store| {
            store.expect_load().returning(move || Ok(Some(record.clone())));
            store.expect_clear().returning(|| Ok(())).times(1);
        })
        .with_render(|render| {
            render.expect_render().times(0);
        })
        .build();

    let err = orchestrator.startup(Some(&request)).await.unwrap_err();
    assert!(err.to_string().contains("missing input file"));
    assert!(notifier.modals()[0].contains("/definitely/not/here.mp4"));
}

/// Resuming without the original inputs at all is a resume-integrity failure
#[tokio::test]
async fn test_resume_without_inputs_fails() {
    let record = TestHelpers::interrupted_record(&TestFixtures::fein(10), TestFixtures::TEST_SEED, 3);
    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_store(move |store| {
            store.expect_load().returning(move || Ok(Some(record.clone())));
            store.expect_clear().returning(|| Ok(())).times(1);
        })
        .build();

    let err = orchestrator.startup(None).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::ResumeIntegrity { .. }));
    assert_eq!(notifier.modals().len(), 1);
}

/// Discarding clears the checkpoint and leaves the engine idle
#[tokio::test]
async fn test_discard_pending_run() {
    let record = TestHelpers::interrupted_record(&TestFixtures::fein(10), TestFixtures::TEST_SEED, 3);
    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_resume_choice(ResumeChoice::Discard)
        .with_store(move |store| {
            store.expect_load().returning(move || Ok(Some(record.clone())));
            store.expect_clear().returning(|| Ok(())).times(1);
        })
        .with_render(|render| {
            render.expect_render().times(0);
        })
        .build();

    assert!(orchestrator.startup(Some(&TestFixtures::fein(10))).await.unwrap().is_none());
    assert_eq!(notifier.offers().len(), 1);
    assert_eq!(orchestrator.phase().await, GenerationPhase::Idle);
}

/// Finished or idle checkpoints are not offered for resume
#[tokio::test]
async fn test_nothing_to_resume() {
    let finished = TestHelpers::interrupted_record(&TestFixtures::fein(4), TestFixtures::TEST_SEED, 4);
    assert!(finished.is_generating);
    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_store(move |store| {
            store.expect_load().returning(move || Ok(Some(finished.clone())));
        })
        .build();

    assert!(orchestrator.startup(None).await.unwrap().is_none());
    assert!(notifier.offers().is_empty());
}

/// A failed item is reported and skipped; the batch continues
#[tokio::test]
async fn test_item_failure_does_not_stop_batch() {
    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_render(|render| {
            render.expect_render().times(3).returning(|_, request| {
                if request.index == 1 {
                    Err(OrchestratorError::RenderRequest {
                        status: 500,
                        message: "encoder crashed".to_string(),
                    })
                } else {
                    Ok(TestHelpers::rendered(request.index))
                }
            });
        })
        .build();

    let summary = orchestrator.start(&TestFixtures::fein(3)).await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.generated, 2);
    assert_eq!(summary.failed, 1);
    // no placeholder for the failed item
    assert_eq!(summary.media_urls, vec!["/renders/0.mp4".to_string(), "/renders/2.mp4".to_string()]);

    let errors = notifier.toasts(ToastLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("encoder crashed"));
}

/// Cancelling stops before the next item and drops the late result
#[tokio::test]
async fn test_cancellation_discards_in_flight_result() {
    let handle: Arc<Mutex<Option<CancelHandle>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&handle);

    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_render(move |render| {
            render.expect_render().times(2).returning(move |_, request| {
                if request.index == 1 {
                    if let Some(cancel) = slot.lock().unwrap().as_ref() {
                        cancel.cancel();
                    }
                }
                Ok(TestHelpers::rendered(request.index))
            });
        })
        .with_store(|store| {
            store.expect_save().returning(|_| Ok(())).times(0..);
            // superseding clear at start, cancellation clear at the end
            store.expect_clear().returning(|| Ok(())).times(2);
        })
        .build();
    *handle.lock().unwrap() = Some(orchestrator.cancel_handle());

    let summary = orchestrator.start(&TestFixtures::fein(5)).await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert_eq!(summary.generated, 1);
    assert_eq!(summary.media_urls, vec!["/renders/0.mp4".to_string()]);
    assert_eq!(orchestrator.phase().await, GenerationPhase::Cancelled);

    let session = orchestrator.session().await;
    assert_eq!(session.generated_count, 0);
    assert!(!session.is_generating);
    assert_eq!(notifier.toasts(ToastLevel::Info), vec!["Generation cancelled".to_string()]);
}

/// A cancel pressed while the music track uploads stops the run before item 0
#[tokio::test]
async fn test_cancel_during_setup_renders_nothing() {
    let mut request = TestFixtures::fein(3);
    request.audio = Some(AudioSelection::Track {
        track: MediaPart::local("song", MediaKind::Video, "/music/song.mp3"),
        start_ms: 0,
        words: Vec::new(),
    });

    let handle: Arc<Mutex<Option<CancelHandle>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&handle);
    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_uploader(move |uploader| {
            uploader.expect_upload().times(1).returning(move |_, _| {
                if let Some(cancel) = slot.lock().unwrap().as_ref() {
                    cancel.cancel();
                }
                Ok("https://cdn.test/uploaded/song.mp3".to_string())
            });
        })
        .with_render(|render| {
            render.expect_render().times(0);
        })
        .with_store(|store| {
            store.expect_save().times(0);
            // superseding clear at start, cancellation clear at the end
            store.expect_clear().returning(|| Ok(())).times(2);
        })
        .build();
    *handle.lock().unwrap() = Some(orchestrator.cancel_handle());

    let summary = orchestrator.start(&request).await.unwrap();

    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.generated, 0);
    assert!(summary.media_urls.is_empty());
    assert_eq!(orchestrator.phase().await, GenerationPhase::Cancelled);
    assert!(!orchestrator.session().await.is_generating);
    assert_eq!(notifier.toasts(ToastLevel::Info), vec!["Generation cancelled".to_string()]);
}

/// A cancel left over from an earlier run does not stop the next one
#[tokio::test]
async fn test_stale_cancel_is_cleared_on_start() {
    let (orchestrator, _notifier) = OrchestratorBuilder::new().build();
    orchestrator.cancel_handle().cancel();

    let summary = orchestrator.start(&TestFixtures::fein(2)).await.unwrap();
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.generated, 2);
}

/// Progress never decreases and ends at exactly 100
#[tokio::test]
async fn test_progress_is_monotonic_and_finishes_at_100() {
    let (orchestrator, notifier) = OrchestratorBuilder::new().build();
    orchestrator.start(&TestFixtures::fein(6)).await.unwrap();

    let percents = notifier.percents();
    TestHelpers::assert_monotonic(&percents);
    assert_eq!(percents.last().copied(), Some(100.0));
    assert!(percents[..percents.len() - 1].iter().all(|p| *p <= 95.0));

    let statuses = notifier.statuses();
    assert_eq!(statuses[0], "Processing item 1 of 6");
    assert_eq!(statuses.last().map(String::as_str), Some("Ready to download"));
}

struct SlowRender {
    delay: Duration,
}

#[async_trait::async_trait]
impl RenderApi for SlowRender {
    async fn render(&self, _mode: GenerationMode, request: RenderRequest) -> OrchestratorResult<RenderResponse> {
        tokio::time::sleep(self.delay).await;
        Ok(TestHelpers::rendered(request.index))
    }
}

/// The timer interpolates inside an item and stops when the result arrives
#[tokio::test]
async fn test_progress_interpolates_while_rendering() {
    let mut uploader = orchestrator::traits::MockAssetUploader::new();
    uploader.expect_upload().times(0);
    let mut store = orchestrator::traits::MockCheckpointStore::new();
    TestHelpers::permissive_store(&mut store);
    let notifier = common::RecordingNotifier::new(ResumeChoice::Resume);

    let orchestrator = Orchestrator::new(
        SlowRender {
            delay: Duration::from_millis(200),
        },
        uploader,
        store,
        notifier.clone(),
    )
    .with_tick_interval(Duration::from_millis(20))
    .with_expected_item(Duration::from_secs(1));

    orchestrator.start(&TestFixtures::fein(2)).await.unwrap();

    let percents = notifier.percents();
    TestHelpers::assert_monotonic(&percents);
    // sub-item values between the per-item floors
    assert!(percents.iter().any(|p| *p > 0.0 && *p < 50.0), "{percents:?}");
    assert!(percents.iter().any(|p| *p > 50.0 && *p < 100.0), "{percents:?}");
    assert_eq!(percents.last().copied(), Some(100.0));
}

/// Checkpoints follow every item and the finished run clears them
#[tokio::test]
async fn test_checkpoint_saved_after_each_item() {
    let saved = Arc::new(Mutex::new(Vec::<CheckpointRecord>::new()));
    let sink = Arc::clone(&saved);

    let (orchestrator, _notifier) = OrchestratorBuilder::new()
        .with_store(move |store| {
            store.expect_save().returning(move |record| {
                sink.lock().unwrap().push(record);
                Ok(())
            });
            store.expect_clear().returning(|| Ok(())).times(2);
        })
        .build();

    orchestrator.start(&TestFixtures::fein(4)).await.unwrap();

    let saved = saved.lock().unwrap();
    let counts: Vec<usize> = saved.iter().map(|r| r.generated_count).collect();
    assert_eq!(counts.first().copied(), Some(0));
    assert_eq!(counts.last().copied(), Some(4));
    assert!(counts.windows(2).all(|w| w[1] >= w[0]));

    let last = saved.last().unwrap();
    assert!(last.is_generating);
    assert_eq!(last.next_index, Some(4));
    assert!(last.plan_seed.is_some());
    assert_eq!(last.generated_videos.len(), 4);
}

/// Storage failures degrade silently; the run still completes
#[tokio::test]
async fn test_persistence_failure_never_blocks() {
    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_store(|store| {
            // full + minimal attempt once, then checkpoints are off
            store
                .expect_save()
                .times(2)
                .returning(|_| Err(OrchestratorError::persistence("quota exceeded")));
            store.expect_clear().returning(|| Ok(())).times(0..);
        })
        .build();

    let summary = orchestrator.start(&TestFixtures::fein(3)).await.unwrap();
    assert_eq!(summary.generated, 3);

    let warnings = notifier.toasts(ToastLevel::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("can no longer be saved"));
}

/// Validation errors block the run before any I/O
#[tokio::test]
async fn test_validation_failure_touches_nothing() {
    let mut request = TestFixtures::scenario_a(2);
    request.audio = None;

    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_store(|store| {
            store.expect_save().times(0);
            store.expect_clear().times(0);
            store.expect_load().times(0);
        })
        .with_render(|render| {
            render.expect_render().times(0);
        })
        .build();

    let err = orchestrator.start(&request).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Validation { .. }));
    assert_eq!(orchestrator.phase().await, GenerationPhase::Idle);
    assert_eq!(notifier.toasts(ToastLevel::Error).len(), 1);
}

/// Versus without a goal has no valid combination
#[tokio::test]
async fn test_empty_goals_block_generation() {
    let request = TestFixtures::versus([&["v1"], &[], &[], &[], &[], &["s1"], &[], &["c1"]], 3);
    let (orchestrator, _notifier) = OrchestratorBuilder::new()
        .with_render(|render| {
            render.expect_render().times(0);
        })
        .build();

    let err = orchestrator.start(&request).await.unwrap_err();
    assert!(err.to_string().contains("Goals"));
}

/// A track that cannot be uploaded aborts the whole run
#[tokio::test]
async fn test_track_upload_failure_is_fatal() {
    let mut request = TestFixtures::fein(3);
    request.audio = Some(AudioSelection::Track {
        track: MediaPart::local("song", MediaKind::Video, "/music/song.mp3"),
        start_ms: 0,
        words: Vec::new(),
    });

    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_uploader(|uploader| {
            uploader
                .expect_upload()
                .times(1)
                .returning(|_, _| Err(OrchestratorError::resource("song.mp3", "connection reset")));
        })
        .with_render(|render| {
            render.expect_render().times(0);
        })
        .build();

    let err = orchestrator.start(&request).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Fatal { .. }));
    assert!(matches!(orchestrator.phase().await, GenerationPhase::FatalError(_)));
    assert_eq!(notifier.toasts(ToastLevel::Error).len(), 1);
}

/// A branding overlay that fails to upload is dropped with a warning
#[tokio::test]
async fn test_branding_failure_only_drops_branding() {
    let mut request = TestFixtures::fein(2);
    request.settings.branding = Some(MediaPart::local("logo", MediaKind::Image, "/brand/logo.png"));

    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_uploader(|uploader| {
            uploader
                .expect_upload()
                .times(1)
                .returning(|_, _| Err(OrchestratorError::resource("logo.png", "timeout")));
        })
        .with_render(|render| {
            render
                .expect_render()
                .withf(|_, request| request.branding_url.is_none())
                .times(2)
                .returning(|_, request| Ok(TestHelpers::rendered(request.index)));
        })
        .build();

    let summary = orchestrator.start(&request).await.unwrap();
    assert_eq!(summary.generated, 2);
    assert!(notifier.toasts(ToastLevel::Warning)[0].contains("Branding"));
}

/// Local assets are uploaded once and the URL reused across jobs
#[tokio::test]
async fn test_uploaded_urls_are_reused() {
    let base = MediaPart::local("base", MediaKind::Video, "/videos/base.mp4");
    let request = TestFixtures::add_hook(vec![base], 3);

    let requests = Arc::new(Mutex::new(Vec::<RenderRequest>::new()));
    let seen = Arc::clone(&requests);
    let (orchestrator, _notifier) = OrchestratorBuilder::new()
        .with_uploader(|uploader| {
            uploader
                .expect_upload()
                .withf(|path, kind| path.ends_with("base.mp4") && *kind == MediaKind::Video)
                .times(1)
                .returning(|_, _| Ok("https://cdn.test/uploaded/base.mp4".to_string()));
        })
        .with_render(move |render| {
            render.expect_render().times(3).returning(move |_, request| {
                let index = request.index;
                seen.lock().unwrap().push(request);
                Ok(TestHelpers::rendered(index))
            });
        })
        .build();

    orchestrator.start(&request).await.unwrap();

    let requests = requests.lock().unwrap();
    assert!(requests
        .iter()
        .all(|r| r.part_urls == vec!["https://cdn.test/uploaded/base.mp4".to_string()]));
    // add-hook applies each hook line in turn
    let hooks: Vec<&str> = requests.iter().filter_map(|r| r.hook_text.as_deref()).collect();
    assert_eq!(hooks, vec!["A", "B", "C"]);
}

/// A part that cannot be uploaded fails only its own item
#[tokio::test]
async fn test_unresolvable_part_fails_item() {
    let videos = vec![
        TestFixtures::remote("ok"),
        MediaPart::local("broken", MediaKind::Video, "/videos/broken.mp4"),
    ];
    let request = TestFixtures::add_hook(videos, 2);

    let (orchestrator, notifier) = OrchestratorBuilder::new()
        .with_uploader(|uploader| {
            uploader
                .expect_upload()
                .times(1)
                .returning(|_, _| Err(OrchestratorError::resource("broken.mp4", "403 Forbidden")));
        })
        .with_render(|render| {
            render
                .expect_render()
                .times(1)
                .returning(|_, request| Ok(TestHelpers::rendered(request.index)));
        })
        .build();

    let summary = orchestrator.start(&request).await.unwrap();
    assert_eq!(summary.generated, 1);
    assert_eq!(summary.failed, 1);
    assert!(notifier.toasts(ToastLevel::Error)[0].contains("broken.mp4"));
}

/// Hiding the host only writes a checkpoint while a run is active
#[tokio::test]
async fn test_visibility_hidden_when_idle() {
    let (orchestrator, _notifier) = OrchestratorBuilder::new()
        .with_store(|store| {
            store.expect_save().times(0);
        })
        .build();

    assert!(!orchestrator.session_handle().visibility_hidden().await);
}

/// Render service that hides the host while one item is in flight
struct HidingRender {
    at_index: usize,
    handle: Arc<Mutex<Option<SessionHandle<MockCheckpointStore>>>>,
    saves: Arc<Mutex<Vec<CheckpointRecord>>>,
    hidden: Arc<Mutex<Vec<(bool, Option<CheckpointRecord>)>>>,
}

#[async_trait::async_trait]
impl RenderApi for HidingRender {
    async fn render(&self, _mode: GenerationMode, request: RenderRequest) -> OrchestratorResult<RenderResponse> {
        if request.index == self.at_index {
            let handle = self.handle.lock().unwrap().clone();
            if let Some(handle) = handle {
                let before = self.saves.lock().unwrap().len();
                let written = handle.visibility_hidden().await;
                let record = self.saves.lock().unwrap().get(before).cloned();
                self.hidden.lock().unwrap().push((written, record));
            }
        }
        Ok(TestHelpers::rendered(request.index))
    }
}

/// Hiding the host mid-run writes the live session, positioned at the item in flight
#[tokio::test]
async fn test_visibility_hidden_mid_run_saves_position() {
    let saves = Arc::new(Mutex::new(Vec::<CheckpointRecord>::new()));
    let sink = Arc::clone(&saves);
    let mut store = MockCheckpointStore::new();
    store.expect_save().returning(move |record| {
        sink.lock().unwrap().push(record);
        Ok(())
    });
    store.expect_clear().returning(|| Ok(())).times(0..);
    store.expect_load().returning(|| Ok(None)).times(0..);
    let mut uploader = MockAssetUploader::new();
    uploader.expect_upload().times(0);

    let handle = Arc::new(Mutex::new(None));
    let hidden = Arc::new(Mutex::new(Vec::new()));
    let render = HidingRender {
        at_index: 2,
        handle: Arc::clone(&handle),
        saves: Arc::clone(&saves),
        hidden: Arc::clone(&hidden),
    };
    let orchestrator = Orchestrator::new(render, uploader, store, common::RecordingNotifier::new(ResumeChoice::Resume));
    *handle.lock().unwrap() = Some(orchestrator.session_handle());

    let summary = orchestrator.start(&TestFixtures::fein(4)).await.unwrap();
    assert_eq!(summary.generated, 4);

    let hidden = hidden.lock().unwrap();
    assert_eq!(hidden.len(), 1);
    let (written, record) = &hidden[0];
    assert!(*written);
    let record = record.as_ref().expect("hiding wrote a checkpoint");
    assert!(record.is_generating);
    assert_eq!(record.next_index, Some(2));
    assert_eq!(record.generated_count, 2);
    assert_eq!(record.generated_videos, vec!["/renders/0.mp4".to_string(), "/renders/1.mp4".to_string()]);
}

/// Once a run has finished, hiding the host never writes its checkpoint back
#[tokio::test]
async fn test_visibility_hidden_after_completion_writes_nothing() {
    let saves = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&saves);
    let (orchestrator, _notifier) = OrchestratorBuilder::new()
        .with_store(move |store| {
            store.expect_save().returning(move |_| {
                *counter.lock().unwrap() += 1;
                Ok(())
            });
            store.expect_clear().returning(|| Ok(())).times(2);
        })
        .build();

    orchestrator.start(&TestFixtures::fein(2)).await.unwrap();
    let after_run = *saves.lock().unwrap();

    assert!(!orchestrator.session_handle().visibility_hidden().await);
    assert_eq!(*saves.lock().unwrap(), after_run);
}

/// Hide events racing the end of a run are always followed by the final clear
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_visibility_hidden_racing_completion_leaves_no_checkpoint() {
    let operations = Arc::new(Mutex::new(Vec::<&'static str>::new()));
    let on_save = Arc::clone(&operations);
    let on_clear = Arc::clone(&operations);
    let (orchestrator, _notifier) = OrchestratorBuilder::new()
        .with_store(move |store| {
            store.expect_save().returning(move |_| {
                on_save.lock().unwrap().push("save");
                Ok(())
            });
            store.expect_clear().returning(move || {
                on_clear.lock().unwrap().push("clear");
                Ok(())
            });
        })
        .build();

    let stop = Arc::new(AtomicBool::new(false));
    let hider = {
        let session = orchestrator.session_handle();
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            while !stop.load(Ordering::SeqCst) {
                session.visibility_hidden().await;
                tokio::task::yield_now().await;
            }
        })
    };

    orchestrator.start(&TestFixtures::fein(5)).await.unwrap();
    stop.store(true, Ordering::SeqCst);
    hider.await.unwrap();

    let operations = operations.lock().unwrap();
    assert_eq!(operations.last().copied(), Some("clear"), "{operations:?}");
}
