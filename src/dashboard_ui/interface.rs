use crate::detection_api::interface::Prediction;
use crate::video_source::interface::VideoMetadata;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    PlayClicked,
    PauseClicked,
    VideoSelected(PathBuf),
    ConfidenceChanged(f32),
    IouChanged(f32),
    LoadModelClicked(String),
    CheckHealthClicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackView {
    Idle,
    Playing,
    Paused,
    Blocked,
    Resuming,
}

#[derive(Clone)]
pub struct FrameView {
    pub image: Arc<DynamicImage>,
    /// Bumped on every new capture; lets the renderer skip texture re-uploads.
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelControlView {
    pub status_label: String,
    pub healthy: bool,
    pub model_name: String,
    pub database: String,
    pub message: Option<String>,
    pub busy: bool,
    pub available_models: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRowView {
    pub time: String,
    pub current_frame: bool,
    pub class_name: String,
    pub confidence: f32,
    pub position: String,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub loading: bool,
    pub error: Option<String>,
    pub rows: Vec<TableRowView>,
}

/// Snapshot of everything the window draws. Rebuilt after every core
/// transition and handed over whole; the GUI keeps no state of its own
/// beyond widget scratch space.
#[derive(Clone)]
pub struct ViewModel {
    pub playback: PlaybackView,
    pub can_play: bool,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub frame: Option<FrameView>,
    pub predictions: Vec<Prediction>,
    pub video: Option<VideoMetadata>,
    pub confidence: f32,
    pub iou: f32,
    pub model: ModelControlView,
    pub table: TableView,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            playback: PlaybackView::Idle,
            can_play: false,
            notice: None,
            error: None,
            frame: None,
            predictions: Vec::new(),
            video: None,
            confidence: 0.7,
            iou: 0.5,
            model: ModelControlView {
                status_label: "loading".to_string(),
                healthy: false,
                model_name: "None".to_string(),
                database: "Unknown".to_string(),
                message: None,
                busy: false,
                available_models: Vec::new(),
            },
            table: TableView {
                loading: true,
                error: None,
                rows: Vec::new(),
            },
        }
    }
}

pub trait DashboardUi: Send {
    fn init(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn render(&mut self, view: &ViewModel) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn events(&self) -> Receiver<UiEvent>;
}
