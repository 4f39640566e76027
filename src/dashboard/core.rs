use crate::config::Config;
use crate::dashboard_ui::interface::UiEvent;
use crate::detection_api::interface::{
    HistoricalPrediction, ModelHealth, Prediction, PredictionStreamEvent,
};
use crate::video_source::interface::{VideoMetadata, VideoSourceEvent};
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

type DynError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Debug)]
pub struct Model {
    pub playback: Playback,
    pub video: Option<VideoMetadata>,
    pub latest_frame: Option<Arc<DynamicImage>>,
    pub frame_seq: u64,
    pub predictions: Vec<Prediction>,
    pub thresholds: Thresholds,
    pub health: HealthState,
    pub model_loading: bool,
    pub history: HistoryState,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Thresholds {
    pub confidence: f32,
    pub iou: f32,
}

#[derive(Clone, Debug)]
pub struct HealthState {
    pub last: Option<ModelHealth>,
    pub checking: bool,
    pub last_polled: Option<Instant>,
    pub settle_deadline: Option<Instant>,
}

impl HealthState {
    pub fn is_error(&self) -> bool {
        matches!(&self.last, Some(health) if health.is_error())
    }
}

#[derive(Clone, Debug)]
pub struct HistoryState {
    pub records: Vec<HistoricalPrediction>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug)]
pub enum Playback {
    Idle,
    Playing(Phase),
    Paused,
    /// Model health is `error`; playback is forced off until it clears.
    Blocked,
    /// Health cleared while blocked; waiting out the stabilization delay.
    Resuming { since: Instant },
}

#[derive(Clone, Debug)]
pub enum Phase {
    Capturing,
    Detecting,
    Sleeping { since: Instant },
}

#[derive(Debug)]
pub enum Event {
    Tick(Instant),
    Ui(UiEvent),
    Video(VideoSourceEvent),
    VideoOpenDone(Result<VideoMetadata, DynError>),
    FrameCaptureDone(Result<Arc<DynamicImage>, DynError>),
    DetectionDone(Result<Vec<Prediction>, DynError>),
    HealthCheckDone(Result<ModelHealth, DynError>),
    ModelLoadDone(Result<(), DynError>),
    HistoryFetchDone(Result<Vec<HistoricalPrediction>, DynError>),
    Stream(PredictionStreamEvent),
}

impl Event {
    pub fn to_display_string(&self) -> String {
        match self {
            Event::FrameCaptureDone(Ok(_)) => "FrameCaptureDone(Ok(frame))".to_string(),
            event => format!("{:?}", event),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Effect {
    SubscribeUi,
    SubscribeVideo,
    SubscribeStream,
    SubscribeTick,
    CheckHealth,
    LoadModel {
        model_name: String,
    },
    FetchHistory,
    OpenVideo {
        path: PathBuf,
    },
    PlayVideo,
    PauseVideo,
    CaptureFrame,
    Detect {
        frame: Arc<DynamicImage>,
        confidence: f32,
        iou: f32,
        video_filename: Option<String>,
    },
}

impl Effect {
    pub fn to_display_string(&self) -> String {
        match self {
            Effect::Detect {
                confidence,
                iou,
                video_filename,
                ..
            } => format!(
                "Detect {{ frame, confidence: {}, iou: {}, video_filename: {:?} }}",
                confidence, iou, video_filename
            ),
            effect => format!("{:?}", effect),
        }
    }
}

impl PartialEq for Effect {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Effect::Detect {
                    frame: frame_a,
                    confidence: confidence_a,
                    iou: iou_a,
                    video_filename: video_a,
                },
                Effect::Detect {
                    frame: frame_b,
                    confidence: confidence_b,
                    iou: iou_b,
                    video_filename: video_b,
                },
            ) => {
                Arc::ptr_eq(frame_a, frame_b)
                    && confidence_a == confidence_b
                    && iou_a == iou_b
                    && video_a == video_b
            }
            (Effect::LoadModel { model_name: a }, Effect::LoadModel { model_name: b }) => a == b,
            (Effect::OpenVideo { path: a }, Effect::OpenVideo { path: b }) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

pub fn init() -> (Model, Vec<Effect>) {
    (
        Model {
            playback: Playback::Idle,
            video: None,
            latest_frame: None,
            frame_seq: 0,
            predictions: Vec::new(),
            thresholds: Thresholds {
                confidence: 0.7,
                iou: 0.5,
            },
            health: HealthState {
                last: None,
                checking: true,
                last_polled: None,
                settle_deadline: None,
            },
            model_loading: false,
            history: HistoryState {
                records: Vec::new(),
                loading: true,
                error: None,
            },
            error: None,
        },
        vec![
            Effect::SubscribeUi,
            Effect::SubscribeVideo,
            Effect::SubscribeStream,
            Effect::SubscribeTick,
            Effect::CheckHealth,
            Effect::FetchHistory,
        ],
    )
}

pub fn transition(config: &Config, model: Model, event: Event) -> (Model, Vec<Effect>) {
    match event {
        Event::Ui(ui_event) => on_ui(model, ui_event),
        Event::Tick(now) => on_tick(config, model, now),
        Event::Video(video_event) => on_video(model, video_event),
        Event::VideoOpenDone(result) => on_video_open_done(model, result),
        Event::FrameCaptureDone(result) => on_frame_capture_done(model, result),
        Event::DetectionDone(result) => on_detection_done(model, result),
        Event::HealthCheckDone(result) => on_health_check_done(model, result),
        Event::ModelLoadDone(result) => on_model_load_done(config, model, result),
        Event::HistoryFetchDone(result) => on_history_fetch_done(model, result),
        Event::Stream(stream_event) => on_stream(model, stream_event),
    }
}

fn on_ui(mut model: Model, event: UiEvent) -> (Model, Vec<Effect>) {
    match event {
        UiEvent::PlayClicked => {
            if model.video.is_none() {
                return (model, vec![]);
            }
            if model.health.is_error() {
                model.error = Some("Cannot start detection - model error".to_string());
                return (model, vec![]);
            }
            match model.playback {
                Playback::Idle | Playback::Paused => {
                    model.playback = Playback::Playing(Phase::Capturing);
                    model.error = None;
                    (model, vec![Effect::PlayVideo, Effect::CaptureFrame])
                }
                _ => (model, vec![]),
            }
        }
        UiEvent::PauseClicked => match model.playback {
            Playback::Playing(_) | Playback::Resuming { .. } | Playback::Blocked => {
                model.playback = Playback::Paused;
                (model, vec![Effect::PauseVideo])
            }
            _ => (model, vec![]),
        },
        UiEvent::VideoSelected(path) => {
            let was_rolling = matches!(
                model.playback,
                Playback::Playing(_) | Playback::Resuming { .. }
            );
            model.playback = Playback::Idle;
            model.video = None;
            model.latest_frame = None;
            model.predictions.clear();
            model.error = None;

            let mut effects = vec![];
            if was_rolling {
                effects.push(Effect::PauseVideo);
            }
            effects.push(Effect::OpenVideo { path });
            (model, effects)
        }
        UiEvent::ConfidenceChanged(value) => {
            model.thresholds.confidence = value;
            (model, vec![])
        }
        UiEvent::IouChanged(value) => {
            model.thresholds.iou = value;
            (model, vec![])
        }
        UiEvent::LoadModelClicked(model_name) => {
            if model.model_loading {
                return (model, vec![]);
            }
            model.model_loading = true;
            model.error = None;
            (model, vec![Effect::LoadModel { model_name }])
        }
        UiEvent::CheckHealthClicked => {
            if model.health.checking {
                return (model, vec![]);
            }
            model.health.checking = true;
            (model, vec![Effect::CheckHealth])
        }
    }
}

fn on_tick(config: &Config, mut model: Model, now: Instant) -> (Model, Vec<Effect>) {
    let mut effects = vec![];

    if let Some(deadline) = model.health.settle_deadline {
        if now >= deadline {
            model.health.settle_deadline = None;
            if !model.health.checking {
                model.health.checking = true;
                effects.push(Effect::CheckHealth);
            }
        }
    } else if !model.health.checking
        && model
            .health
            .last_polled
            .map_or(true, |polled| now.duration_since(polled) >= config.health_poll_interval)
    {
        model.health.checking = true;
        effects.push(Effect::CheckHealth);
    }

    match model.playback {
        Playback::Playing(Phase::Sleeping { since })
            if now.duration_since(since) >= config.detection_delay =>
        {
            model.playback = Playback::Playing(Phase::Capturing);
            effects.push(Effect::CaptureFrame);
        }
        Playback::Resuming { since } if now.duration_since(since) >= config.resume_delay => {
            model.playback = Playback::Playing(Phase::Capturing);
            effects.push(Effect::PlayVideo);
            effects.push(Effect::CaptureFrame);
        }
        _ => {}
    }

    (model, effects)
}

fn on_video(mut model: Model, event: VideoSourceEvent) -> (Model, Vec<Effect>) {
    match event {
        VideoSourceEvent::Ended => {
            if matches!(
                model.playback,
                Playback::Playing(_) | Playback::Resuming { .. }
            ) {
                model.playback = Playback::Paused;
            }
            (model, vec![])
        }
    }
}

fn on_video_open_done(
    mut model: Model,
    result: Result<VideoMetadata, DynError>,
) -> (Model, Vec<Effect>) {
    match result {
        Ok(metadata) => {
            model.video = Some(metadata);
            model.playback = Playback::Idle;
            model.error = None;
        }
        Err(e) => {
            model.error = Some(format!("Failed to open video: {}", e));
        }
    }
    (model, vec![])
}

fn on_frame_capture_done(
    mut model: Model,
    result: Result<Arc<DynamicImage>, DynError>,
) -> (Model, Vec<Effect>) {
    match result {
        Ok(frame) => {
            model.latest_frame = Some(frame.clone());
            model.frame_seq += 1;

            if matches!(model.playback, Playback::Playing(Phase::Capturing)) {
                model.playback = Playback::Playing(Phase::Detecting);
                let effects = vec![Effect::Detect {
                    frame,
                    confidence: model.thresholds.confidence,
                    iou: model.thresholds.iou,
                    video_filename: model.video.as_ref().map(|v| v.filename.clone()),
                }];
                (model, effects)
            } else {
                (model, vec![])
            }
        }
        Err(_) => {
            // Skip this tick's detection; the runtime already logged it.
            if matches!(model.playback, Playback::Playing(Phase::Capturing)) {
                model.playback = Playback::Playing(Phase::Sleeping {
                    since: Instant::now(),
                });
            }
            (model, vec![])
        }
    }
}

fn on_detection_done(
    mut model: Model,
    result: Result<Vec<Prediction>, DynError>,
) -> (Model, Vec<Effect>) {
    match result {
        Ok(predictions) => {
            model.predictions = predictions;
            model.error = None;
        }
        Err(e) => {
            model.error = Some(e.to_string());
        }
    }

    if matches!(model.playback, Playback::Playing(Phase::Detecting)) {
        model.playback = Playback::Playing(Phase::Sleeping {
            since: Instant::now(),
        });
    }
    (model, vec![])
}

fn on_health_check_done(
    mut model: Model,
    result: Result<ModelHealth, DynError>,
) -> (Model, Vec<Effect>) {
    let health = match result {
        Ok(health) => health,
        Err(e) => ModelHealth::error(Some(e.to_string())),
    };
    model.health.checking = false;
    model.health.last_polled = Some(Instant::now());
    apply_health(model, health)
}

fn on_model_load_done(
    config: &Config,
    mut model: Model,
    result: Result<(), DynError>,
) -> (Model, Vec<Effect>) {
    model.model_loading = false;
    match result {
        Ok(()) => {
            model.health.settle_deadline = Some(Instant::now() + config.health_settle_delay);
            (model, vec![])
        }
        Err(e) => {
            model.error = Some(e.to_string());
            apply_health(model, ModelHealth::error(Some(e.to_string())))
        }
    }
}

fn apply_health(mut model: Model, health: ModelHealth) -> (Model, Vec<Effect>) {
    let was_error = model.health.is_error();
    let is_error = health.is_error();
    model.health.last = Some(health);

    let mut effects = vec![];
    if is_error {
        if matches!(
            model.playback,
            Playback::Playing(_) | Playback::Resuming { .. }
        ) {
            model.playback = Playback::Blocked;
            effects.push(Effect::PauseVideo);
        }
    } else if was_error && matches!(model.playback, Playback::Blocked) {
        model.playback = Playback::Resuming {
            since: Instant::now(),
        };
    }
    (model, effects)
}

fn on_history_fetch_done(
    mut model: Model,
    result: Result<Vec<HistoricalPrediction>, DynError>,
) -> (Model, Vec<Effect>) {
    model.history.loading = false;
    match result {
        Ok(records) => {
            model.history.records = records;
            model.history.error = None;
        }
        Err(e) => {
            model.history.error = Some(e.to_string());
        }
    }
    (model, vec![])
}

fn on_stream(mut model: Model, event: PredictionStreamEvent) -> (Model, Vec<Effect>) {
    match event {
        PredictionStreamEvent::Snapshot(records) => {
            model.history.records = records;
            model.history.loading = false;
            model.history.error = None;
        }
        PredictionStreamEvent::Disconnected(_) => {
            model.history.error = Some("Lost connection to server".to_string());
        }
    }
    (model, vec![])
}
