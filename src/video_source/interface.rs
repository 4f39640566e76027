use image::DynamicImage;
use std::path::Path;
use std::sync::mpsc::Receiver;

#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoSourceEvent {
    Ended,
}

/// A playable frame sequence. Playback position advances with wall-clock
/// time while playing; `capture_frame` samples whatever frame is current.
pub trait VideoSource: Send + Sync {
    fn open(&self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error + Send + Sync>>;
    fn play(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn pause(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn capture_frame(&self) -> Result<DynamicImage, Box<dyn std::error::Error + Send + Sync>>;
    fn events(&self) -> Receiver<VideoSourceEvent>;
}
