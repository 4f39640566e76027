use crate::logger::interface::Logger;
use crate::video_source::interface::{VideoMetadata, VideoSource, VideoSourceEvent};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Plays a directory of image frames (sorted by file name) at a fixed rate.
/// The container-format decode a real deployment would need slots in behind
/// the same trait.
pub struct ImageDirVideoSource {
    logger: Arc<dyn Logger + Send + Sync>,
    frame_rate: f64,
    state: Mutex<Option<Playback>>,
    subscribers: Mutex<Vec<Sender<VideoSourceEvent>>>,
}

struct Playback {
    frames: Vec<PathBuf>,
    playing: bool,
    base_elapsed: Duration,
    resumed_at: Option<Instant>,
    ended_notified: bool,
}

impl Playback {
    fn position(&self, now: Instant) -> Duration {
        match self.resumed_at {
            Some(resumed_at) if self.playing => {
                self.base_elapsed + now.duration_since(resumed_at)
            }
            _ => self.base_elapsed,
        }
    }
}

impl ImageDirVideoSource {
    pub fn new(frame_rate: f64, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger.with_namespace("video_source").with_namespace("image_dir"),
            frame_rate,
            state: Mutex::new(None),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn notify_ended(&self) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|sender| sender.send(VideoSourceEvent::Ended).is_ok());
    }
}

impl VideoSource for ImageDirVideoSource {
    fn open(&self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error + Send + Sync>> {
        self.logger.info(&format!("Opening {}...", path.display()))?;

        let mut frames: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref(),
                    Some("jpg") | Some("jpeg") | Some("png")
                )
            })
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(format!("no image frames in {}", path.display()).into());
        }

        let first = image::open(&frames[0])?;
        let metadata = VideoMetadata {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            width: first.width(),
            height: first.height(),
        };

        self.logger
            .info(&format!("Opened {} frames at {}x{}", frames.len(), metadata.width, metadata.height))?;

        *self.state.lock().unwrap() = Some(Playback {
            frames,
            playing: false,
            base_elapsed: Duration::ZERO,
            resumed_at: None,
            ended_notified: false,
        });

        Ok(metadata)
    }

    fn play(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self.state.lock().unwrap();
        let playback = state.as_mut().ok_or("no video opened")?;
        if playback.ended_notified {
            playback.base_elapsed = Duration::ZERO;
            playback.ended_notified = false;
        }
        playback.playing = true;
        playback.resumed_at = Some(Instant::now());
        Ok(())
    }

    fn pause(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self.state.lock().unwrap();
        let playback = state.as_mut().ok_or("no video opened")?;
        playback.base_elapsed = playback.position(Instant::now());
        playback.playing = false;
        playback.resumed_at = None;
        Ok(())
    }

    fn capture_frame(&self) -> Result<DynamicImage, Box<dyn std::error::Error + Send + Sync>> {
        let frame_path;
        let mut ended = false;
        {
            let mut state = self.state.lock().unwrap();
            let playback = state.as_mut().ok_or("no video opened")?;

            let now = Instant::now();
            let position = playback.position(now);
            let index = frame_index(position, self.frame_rate, playback.frames.len());

            if past_end(position, self.frame_rate, playback.frames.len())
                && !playback.ended_notified
            {
                playback.ended_notified = true;
                playback.playing = false;
                playback.base_elapsed = position;
                playback.resumed_at = None;
                ended = true;
            }

            frame_path = playback.frames[index].clone();
        }

        if ended {
            self.logger.info("Playback reached last frame")?;
            self.notify_ended();
        }

        Ok(image::open(&frame_path)?)
    }

    fn events(&self) -> Receiver<VideoSourceEvent> {
        let (sender, receiver) = channel();
        self.subscribers.lock().unwrap().push(sender);
        receiver
    }
}

fn frame_index(elapsed: Duration, frame_rate: f64, frame_count: usize) -> usize {
    let index = (elapsed.as_secs_f64() * frame_rate) as usize;
    index.min(frame_count.saturating_sub(1))
}

fn past_end(elapsed: Duration, frame_rate: f64, frame_count: usize) -> bool {
    (elapsed.as_secs_f64() * frame_rate) as usize >= frame_count
}

#[cfg(test)]
mod impl_image_dir_test {
    use super::*;

    #[test]
    fn test_frame_index_maps_elapsed_time() {
        assert_eq!(frame_index(Duration::ZERO, 30.0, 90), 0);
        assert_eq!(frame_index(Duration::from_secs(1), 30.0, 90), 30);
        assert_eq!(frame_index(Duration::from_millis(2500), 30.0, 90), 75);
    }

    #[test]
    fn test_frame_index_clamps_at_last_frame() {
        assert_eq!(frame_index(Duration::from_secs(10), 30.0, 90), 89);
        assert_eq!(frame_index(Duration::from_secs(10), 30.0, 0), 0);
    }

    #[test]
    fn test_past_end() {
        assert!(!past_end(Duration::from_millis(2966), 30.0, 90));
        assert!(past_end(Duration::from_secs(3), 30.0, 90));
    }
}
