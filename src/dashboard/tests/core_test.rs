use super::fixture::*;
use crate::dashboard::core::{init, transition, Effect, Event, Phase, Playback};
use crate::dashboard_ui::interface::UiEvent;
use crate::detection_api::interface::PredictionStreamEvent;
use crate::video_source::interface::VideoSourceEvent;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn frame() -> Arc<DynamicImage> {
    Arc::new(DynamicImage::new_rgb8(4, 4))
}

#[test]
fn test_init() {
    let (model, effects) = init();

    assert!(matches!(model.playback, Playback::Idle));
    assert!(model.video.is_none());
    assert_eq!(model.thresholds.confidence, 0.7);
    assert_eq!(model.thresholds.iou, 0.5);
    assert_eq!(effects.len(), 6);
    assert!(effects.contains(&Effect::SubscribeUi));
    assert!(effects.contains(&Effect::SubscribeVideo));
    assert!(effects.contains(&Effect::SubscribeStream));
    assert!(effects.contains(&Effect::SubscribeTick));
    assert!(effects.contains(&Effect::CheckHealth));
    assert!(effects.contains(&Effect::FetchHistory));
}

#[test]
fn test_play_starts_capture_loop() {
    let config = test_config();
    let model = ready_model(Playback::Idle);

    let (model, effects) = transition(&config, model, Event::Ui(UiEvent::PlayClicked));

    assert!(matches!(model.playback, Playback::Playing(Phase::Capturing)));
    assert_eq!(effects, vec![Effect::PlayVideo, Effect::CaptureFrame]);
}

#[test]
fn test_play_without_video_is_rejected() {
    let config = test_config();
    let (model, _) = init();

    let (model, effects) = transition(&config, model, Event::Ui(UiEvent::PlayClicked));

    assert!(matches!(model.playback, Playback::Idle));
    assert!(effects.is_empty());
}

#[test]
fn test_play_rejected_while_model_errored() {
    let config = test_config();
    let mut model = ready_model(Playback::Idle);
    model.health.last = Some(unhealthy());

    let (model, effects) = transition(&config, model, Event::Ui(UiEvent::PlayClicked));

    assert!(matches!(model.playback, Playback::Idle));
    assert!(effects.is_empty());
    assert_eq!(
        model.error.as_deref(),
        Some("Cannot start detection - model error")
    );
}

#[test]
fn test_capture_submits_detection_with_current_thresholds() {
    let config = test_config();
    let mut model = playing_model(Phase::Capturing);
    model.thresholds.confidence = 0.25;
    model.thresholds.iou = 0.45;
    let frame = frame();

    let (model, effects) = transition(
        &config,
        model,
        Event::FrameCaptureDone(Ok(frame.clone())),
    );

    assert!(matches!(model.playback, Playback::Playing(Phase::Detecting)));
    assert_eq!(model.frame_seq, 1);
    assert_eq!(
        effects,
        vec![Effect::Detect {
            frame,
            confidence: 0.25,
            iou: 0.45,
            video_filename: Some("traffic.mp4".to_string()),
        }]
    );
}

#[test]
fn test_no_second_detection_while_one_is_in_flight() {
    let config = test_config();
    let model = playing_model(Phase::Detecting);
    let now = Instant::now() + Duration::from_secs(5);

    let (model, effects) = transition(&config, model, Event::Tick(now));

    assert!(matches!(model.playback, Playback::Playing(Phase::Detecting)));
    assert!(effects.is_empty());
}

#[test]
fn test_detection_response_updates_predictions_and_sleeps() {
    let config = test_config();
    let model = playing_model(Phase::Detecting);
    let predictions = vec![prediction("car", 0.92)];

    let (model, effects) = transition(
        &config,
        model,
        Event::DetectionDone(Ok(predictions.clone())),
    );

    assert!(matches!(
        model.playback,
        Playback::Playing(Phase::Sleeping { .. })
    ));
    assert_eq!(model.predictions, predictions);
    assert!(effects.is_empty());
}

#[test]
fn test_detection_failure_surfaces_error_and_loop_continues() {
    let config = test_config();
    let model = playing_model(Phase::Detecting);

    let (model, effects) = transition(
        &config,
        model,
        Event::DetectionDone(Err("detect exploded".into())),
    );

    assert!(matches!(
        model.playback,
        Playback::Playing(Phase::Sleeping { .. })
    ));
    assert!(model.error.as_deref().unwrap().contains("detect exploded"));
    assert!(effects.is_empty());
}

#[test]
fn test_capture_failure_skips_straight_to_sleep() {
    let config = test_config();
    let mut model = playing_model(Phase::Capturing);
    model.predictions = vec![prediction("car", 0.92)];

    let (model, effects) = transition(
        &config,
        model,
        Event::FrameCaptureDone(Err("decode failed".into())),
    );

    assert!(matches!(
        model.playback,
        Playback::Playing(Phase::Sleeping { .. })
    ));
    assert_eq!(model.predictions.len(), 1);
    assert!(effects.is_empty());
}

#[test]
fn test_sleep_holds_until_detection_delay_elapses() {
    let config = test_config();
    let since = Instant::now();
    let model = playing_model(Phase::Sleeping { since });

    let (model, effects) = transition(
        &config,
        model,
        Event::Tick(since + Duration::from_millis(200)),
    );
    assert!(matches!(
        model.playback,
        Playback::Playing(Phase::Sleeping { .. })
    ));
    assert!(effects.is_empty());

    let (model, effects) = transition(&config, model, Event::Tick(since + config.detection_delay));
    assert!(matches!(model.playback, Playback::Playing(Phase::Capturing)));
    assert_eq!(effects, vec![Effect::CaptureFrame]);
}

#[test]
fn test_late_detection_response_still_renders_after_pause() {
    let config = test_config();
    let model = ready_model(Playback::Paused);
    let predictions = vec![prediction("dog", 0.8)];

    let (model, effects) = transition(
        &config,
        model,
        Event::DetectionDone(Ok(predictions.clone())),
    );

    assert!(matches!(model.playback, Playback::Paused));
    assert_eq!(model.predictions, predictions);
    assert!(effects.is_empty());
}

#[test]
fn test_pause_stops_playback() {
    let config = test_config();
    let model = playing_model(Phase::Sleeping {
        since: Instant::now(),
    });

    let (model, effects) = transition(&config, model, Event::Ui(UiEvent::PauseClicked));

    assert!(matches!(model.playback, Playback::Paused));
    assert_eq!(effects, vec![Effect::PauseVideo]);
}

#[test]
fn test_video_end_pauses_and_keeps_last_result() {
    let config = test_config();
    let mut model = playing_model(Phase::Sleeping {
        since: Instant::now(),
    });
    model.predictions = vec![prediction("car", 0.92)];

    let (model, effects) = transition(&config, model, Event::Video(VideoSourceEvent::Ended));

    assert!(matches!(model.playback, Playback::Paused));
    assert_eq!(model.predictions.len(), 1);
    assert!(effects.is_empty());
}

#[test]
fn test_error_status_blocks_playback_within_one_event() {
    let config = test_config();
    let model = playing_model(Phase::Sleeping {
        since: Instant::now(),
    });

    let (model, effects) = transition(&config, model, Event::HealthCheckDone(Ok(unhealthy())));

    assert!(matches!(model.playback, Playback::Blocked));
    assert_eq!(effects, vec![Effect::PauseVideo]);
}

#[test]
fn test_status_clearing_waits_out_the_resume_delay() {
    let config = test_config();
    let mut model = playing_model(Phase::Sleeping {
        since: Instant::now(),
    });
    model.playback = Playback::Blocked;
    model.health.last = Some(unhealthy());

    let (model, effects) = transition(&config, model, Event::HealthCheckDone(Ok(healthy())));
    assert!(matches!(model.playback, Playback::Resuming { .. }));
    assert!(effects.is_empty());

    let since = match model.playback {
        Playback::Resuming { since } => since,
        _ => unreachable!(),
    };

    let (model, effects) = transition(
        &config,
        model,
        Event::Tick(since + config.resume_delay - Duration::from_millis(100)),
    );
    assert!(matches!(model.playback, Playback::Resuming { .. }));
    assert!(effects.is_empty());

    let (model, effects) = transition(&config, model, Event::Tick(since + config.resume_delay));
    assert!(matches!(model.playback, Playback::Playing(Phase::Capturing)));
    assert_eq!(effects, vec![Effect::PlayVideo, Effect::CaptureFrame]);
}

#[test]
fn test_user_pause_cancels_auto_resume() {
    let config = test_config();
    let model = ready_model(Playback::Resuming {
        since: Instant::now(),
    });

    let (model, effects) = transition(&config, model, Event::Ui(UiEvent::PauseClicked));

    assert!(matches!(model.playback, Playback::Paused));
    assert_eq!(effects, vec![Effect::PauseVideo]);

    let (model, effects) = transition(
        &config,
        model,
        Event::Tick(Instant::now() + Duration::from_secs(1)),
    );
    assert!(matches!(model.playback, Playback::Paused));
    assert!(effects.is_empty());
}

#[test]
fn test_health_poll_interval() {
    let config = test_config();
    let model = ready_model(Playback::Idle);
    let polled_at = model.health.last_polled.unwrap();

    let (model, effects) = transition(
        &config,
        model,
        Event::Tick(polled_at + config.health_poll_interval - Duration::from_secs(1)),
    );
    assert!(effects.is_empty());
    assert!(!model.health.checking);

    let (model, effects) = transition(
        &config,
        model,
        Event::Tick(polled_at + config.health_poll_interval),
    );
    assert_eq!(effects, vec![Effect::CheckHealth]);
    assert!(model.health.checking);
}

#[test]
fn test_model_load_schedules_settled_health_check() {
    let config = test_config();
    let model = ready_model(Playback::Idle);

    let (model, effects) = transition(
        &config,
        model,
        Event::Ui(UiEvent::LoadModelClicked("yolov8s".to_string())),
    );
    assert!(model.model_loading);
    assert_eq!(
        effects,
        vec![Effect::LoadModel {
            model_name: "yolov8s".to_string()
        }]
    );

    // A second click while the load is in flight is ignored.
    let (model, effects) = transition(
        &config,
        model,
        Event::Ui(UiEvent::LoadModelClicked("yolov8n".to_string())),
    );
    assert!(effects.is_empty());

    let (model, effects) = transition(&config, model, Event::ModelLoadDone(Ok(())));
    assert!(!model.model_loading);
    assert!(model.health.settle_deadline.is_some());
    assert!(effects.is_empty());

    let (model, effects) = transition(
        &config,
        model,
        Event::Tick(Instant::now() + config.health_settle_delay + Duration::from_secs(1)),
    );
    assert_eq!(effects, vec![Effect::CheckHealth]);
    assert!(model.health.settle_deadline.is_none());
    assert!(model.health.checking);
}

#[test]
fn test_model_load_failure_shows_message_and_gates_playback() {
    let config = test_config();
    let model = playing_model(Phase::Sleeping {
        since: Instant::now(),
    });

    let (model, effects) = transition(
        &config,
        model,
        Event::ModelLoadDone(Err("CUDA out of memory".into())),
    );

    assert!(matches!(model.playback, Playback::Blocked));
    assert_eq!(effects, vec![Effect::PauseVideo]);
    assert!(model.error.as_deref().unwrap().contains("CUDA out of memory"));
    assert!(model.health.is_error());
}

#[test]
fn test_stream_snapshot_replaces_history() {
    let config = test_config();
    let mut model = ready_model(Playback::Idle);
    model.history.records = vec![record(1, vec![prediction("dog", 0.9)])];

    let snapshot = vec![
        record(2, vec![prediction("cat", 0.8)]),
        record(3, vec![prediction("bird", 0.7)]),
    ];
    let (model, effects) = transition(
        &config,
        model,
        Event::Stream(PredictionStreamEvent::Snapshot(snapshot.clone())),
    );

    assert_eq!(model.history.records, snapshot);
    assert!(model.history.error.is_none());
    assert!(effects.is_empty());
}

#[test]
fn test_stream_disconnect_sets_table_error() {
    let config = test_config();
    let model = ready_model(Playback::Idle);

    let (model, _) = transition(
        &config,
        model,
        Event::Stream(PredictionStreamEvent::Disconnected("timeout".to_string())),
    );

    assert_eq!(
        model.history.error.as_deref(),
        Some("Lost connection to server")
    );
}

#[test]
fn test_selecting_a_video_resets_detection_state() {
    let config = test_config();
    let mut model = playing_model(Phase::Sleeping {
        since: Instant::now(),
    });
    model.predictions = vec![prediction("car", 0.92)];
    model.error = Some("stale".to_string());

    let (model, effects) = transition(
        &config,
        model,
        Event::Ui(UiEvent::VideoSelected(PathBuf::from("frames/"))),
    );

    assert!(matches!(model.playback, Playback::Idle));
    assert!(model.predictions.is_empty());
    assert!(model.error.is_none());
    assert_eq!(
        effects,
        vec![
            Effect::PauseVideo,
            Effect::OpenVideo {
                path: PathBuf::from("frames/")
            }
        ]
    );
}

#[test]
fn test_threshold_edits_are_stored_unclamped() {
    let config = test_config();
    let model = ready_model(Playback::Idle);

    let (model, _) = transition(&config, model, Event::Ui(UiEvent::ConfidenceChanged(1.7)));
    let (model, _) = transition(&config, model, Event::Ui(UiEvent::IouChanged(0.05)));

    assert_eq!(model.thresholds.confidence, 1.7);
    assert_eq!(model.thresholds.iou, 0.05);
}

#[test]
fn test_manual_health_check() {
    let config = test_config();
    let model = ready_model(Playback::Idle);

    let (model, effects) = transition(&config, model, Event::Ui(UiEvent::CheckHealthClicked));
    assert!(model.health.checking);
    assert_eq!(effects, vec![Effect::CheckHealth]);

    let (_, effects) = transition(&config, model, Event::Ui(UiEvent::CheckHealthClicked));
    assert!(effects.is_empty());
}

#[test]
fn test_failed_health_check_counts_as_error_status() {
    let config = test_config();
    let model = playing_model(Phase::Capturing);

    let (model, effects) = transition(
        &config,
        model,
        Event::HealthCheckDone(Err("connection refused".into())),
    );

    assert!(matches!(model.playback, Playback::Blocked));
    assert_eq!(effects, vec![Effect::PauseVideo]);
    assert!(model.health.is_error());
    assert!(!model.health.checking);
}
