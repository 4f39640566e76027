use crate::config::Config;
use crate::dashboard::core::{Effect, Event};
use crate::dashboard_ui::interface::DashboardUi;
use crate::detection_api::interface::DetectionApi;
use crate::logger::interface::Logger;
use crate::video_source::interface::VideoSource;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Clone)]
pub struct RunEffect {
    config: Config,
    logger: Arc<dyn Logger + Send + Sync>,
    detection_api: Arc<dyn DetectionApi>,
    video_source: Arc<dyn VideoSource>,
    ui: Arc<Mutex<dyn DashboardUi>>,
    event_sender: Sender<Event>,
}

impl RunEffect {
    pub fn new(
        config: Config,
        logger: Arc<dyn Logger + Send + Sync>,
        detection_api: Arc<dyn DetectionApi>,
        video_source: Arc<dyn VideoSource>,
        ui: Arc<Mutex<dyn DashboardUi>>,
        event_sender: Sender<Event>,
    ) -> Self {
        Self {
            config,
            logger,
            detection_api,
            video_source,
            ui,
            event_sender,
        }
    }

    pub fn run_effect(&self, effect: Effect) {
        match effect {
            Effect::SubscribeUi => {
                let events = { self.ui.lock().unwrap().events() };
                while let Ok(event) = events.recv() {
                    if self.event_sender.send(Event::Ui(event)).is_err() {
                        break;
                    }
                }
            }
            Effect::SubscribeVideo => {
                let events = self.video_source.events();
                while let Ok(event) = events.recv() {
                    if self.event_sender.send(Event::Video(event)).is_err() {
                        break;
                    }
                }
            }
            Effect::SubscribeStream => {
                let events = self.detection_api.prediction_stream();
                while let Ok(event) = events.recv() {
                    if self.event_sender.send(Event::Stream(event)).is_err() {
                        break;
                    }
                }
            }
            Effect::SubscribeTick => loop {
                std::thread::sleep(self.config.tick_rate);
                if self.event_sender.send(Event::Tick(Instant::now())).is_err() {
                    break;
                }
            },
            Effect::CheckHealth => {
                let result = self.detection_api.health_check();
                let _ = self.event_sender.send(Event::HealthCheckDone(result));
            }
            Effect::LoadModel { model_name } => {
                let result = self.detection_api.load_model(&model_name);
                let _ = self.event_sender.send(Event::ModelLoadDone(result));
            }
            Effect::FetchHistory => {
                let result = self.detection_api.fetch_predictions();
                let _ = self.event_sender.send(Event::HistoryFetchDone(result));
            }
            Effect::OpenVideo { path } => {
                let result = self.video_source.open(&path);
                let _ = self.event_sender.send(Event::VideoOpenDone(result));
            }
            Effect::PlayVideo => {
                if let Err(e) = self.video_source.play() {
                    let _ = self.logger.error(&format!("play failed: {}", e));
                }
            }
            Effect::PauseVideo => {
                if let Err(e) = self.video_source.pause() {
                    let _ = self.logger.error(&format!("pause failed: {}", e));
                }
            }
            Effect::CaptureFrame => {
                let result = self.video_source.capture_frame().map(Arc::new);
                if let Err(e) = &result {
                    let _ = self.logger.error(&format!("frame capture failed: {}", e));
                }
                let _ = self.event_sender.send(Event::FrameCaptureDone(result));
            }
            Effect::Detect {
                frame,
                confidence,
                iou,
                video_filename,
            } => {
                let result = encode_jpeg(&frame).and_then(|jpeg| {
                    self.detection_api
                        .detect(&jpeg, confidence, iou, video_filename.as_deref())
                });
                let _ = self.event_sender.send(Event::DetectionDone(result));
            }
        }
    }
}

fn encode_jpeg(frame: &DynamicImage) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, 90);
    frame.to_rgb8().write_with_encoder(encoder)?;
    Ok(buffer)
}
