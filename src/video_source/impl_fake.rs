use crate::logger::interface::Logger;
use crate::video_source::interface::{VideoMetadata, VideoSource, VideoSourceEvent};
use image::{DynamicImage, Rgb, RgbImage};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 360;

/// Synthesizes frames (a rectangle drifting across a dark background), so
/// the capture loop can be exercised without any files on disk.
pub struct FakeVideoSource {
    logger: Arc<dyn Logger + Send + Sync>,
    state: Mutex<FakeState>,
    subscribers: Mutex<Vec<Sender<VideoSourceEvent>>>,
}

#[derive(Default)]
struct FakeState {
    opened: bool,
    playing: bool,
    frame_counter: u64,
}

impl FakeVideoSource {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger.with_namespace("video_source").with_namespace("fake"),
            state: Mutex::new(FakeState::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl VideoSource for FakeVideoSource {
    fn open(&self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error + Send + Sync>> {
        self.logger.info(&format!("Opening {}...", path.display()))?;
        let mut state = self.state.lock().unwrap();
        state.opened = true;
        state.playing = false;
        state.frame_counter = 0;

        Ok(VideoMetadata {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "synthetic.mp4".to_string()),
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
        })
    }

    fn play(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self.state.lock().unwrap();
        if !state.opened {
            return Err("no video opened".into());
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.state.lock().unwrap().playing = false;
        Ok(())
    }

    fn capture_frame(&self) -> Result<DynamicImage, Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self.state.lock().unwrap();
        if !state.opened {
            return Err("no video opened".into());
        }
        if state.playing {
            state.frame_counter += 1;
        }

        let offset = (state.frame_counter * 8) % (FRAME_WIDTH as u64 - 80);
        let frame = RgbImage::from_fn(FRAME_WIDTH, FRAME_HEIGHT, |x, y| {
            let in_box = x as u64 >= offset
                && (x as u64) < offset + 80
                && y >= FRAME_HEIGHT / 2 - 40
                && y < FRAME_HEIGHT / 2 + 40;
            if in_box {
                Rgb([230, 230, 230])
            } else {
                Rgb([20, 24, 34])
            }
        });

        Ok(DynamicImage::ImageRgb8(frame))
    }

    fn events(&self) -> Receiver<VideoSourceEvent> {
        let (sender, receiver) = channel();
        self.subscribers.lock().unwrap().push(sender);
        receiver
    }
}

#[cfg(test)]
mod impl_fake_test {
    use super::*;
    use crate::logger::impl_console::LoggerConsole;

    fn source() -> FakeVideoSource {
        let logger = Arc::new(LoggerConsole::new(chrono::FixedOffset::east_opt(0).unwrap()));
        FakeVideoSource::new(logger)
    }

    #[test]
    fn test_capture_requires_open() {
        let source = source();
        assert!(source.capture_frame().is_err());
    }

    #[test]
    fn test_frames_advance_only_while_playing() {
        let source = source();
        source.open(Path::new("clip.mp4")).unwrap();

        let paused_a = source.capture_frame().unwrap();
        let paused_b = source.capture_frame().unwrap();
        assert_eq!(paused_a.to_rgb8().as_raw(), paused_b.to_rgb8().as_raw());

        source.play().unwrap();
        let playing_a = source.capture_frame().unwrap();
        let playing_b = source.capture_frame().unwrap();
        assert_ne!(playing_a.to_rgb8().as_raw(), playing_b.to_rgb8().as_raw());
    }

    #[test]
    fn test_open_reports_synthetic_dimensions() {
        let source = source();
        let metadata = source.open(Path::new("clip.mp4")).unwrap();
        assert_eq!(metadata.filename, "clip.mp4");
        assert_eq!(metadata.width, 640);
        assert_eq!(metadata.height, 360);
    }
}
