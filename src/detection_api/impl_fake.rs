use crate::detection_api::interface::{
    BoundingBox, DetectionApi, HistoricalPrediction, ModelHealth, ModelStatus, Prediction,
    PredictionStreamEvent,
};
use crate::logger::interface::Logger;
use chrono::Utc;
use image::GenericImageView;
use rand::distr::{Distribution, Uniform};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// Stand-in for the remote service: random detections and an in-memory
/// history, so the dashboard runs without a server.
pub struct FakeDetectionApi {
    logger: Arc<dyn Logger + Send + Sync>,
    loaded_model: Mutex<String>,
    history: Mutex<Vec<HistoricalPrediction>>,
    next_id: Mutex<i64>,
    subscribers: Mutex<Vec<Sender<PredictionStreamEvent>>>,
}

impl FakeDetectionApi {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger.with_namespace("detection_api").with_namespace("fake"),
            loaded_model: Mutex::new("yolov8n".to_string()),
            history: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn notify_subscribers(&self) {
        let snapshot = self.history.lock().unwrap().clone();
        self.subscribers
            .lock()
            .unwrap()
            .retain(|sender| sender.send(PredictionStreamEvent::Snapshot(snapshot.clone())).is_ok());
    }
}

impl DetectionApi for FakeDetectionApi {
    fn health_check(&self) -> Result<ModelHealth, Box<dyn std::error::Error + Send + Sync>> {
        Ok(ModelHealth {
            status: ModelStatus::Healthy,
            model: Some(self.loaded_model.lock().unwrap().clone()),
            database: Some("connected".to_string()),
            message: None,
        })
    }

    fn load_model(&self, model_name: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.logger.info(&format!("Loading model {}...", model_name))?;
        std::thread::sleep(std::time::Duration::from_millis(300));
        *self.loaded_model.lock().unwrap() = model_name.to_string();
        self.logger.info("Model loaded")?;
        Ok(())
    }

    fn detect(
        &self,
        frame_jpeg: &[u8],
        confidence: f32,
        iou: f32,
        video_filename: Option<&str>,
    ) -> Result<Vec<Prediction>, Box<dyn std::error::Error + Send + Sync>> {
        let objects = [
            "dog", "cat", "person", "car", "chair", "table", "bird", "tree", "bicycle", "book",
            "laptop", "phone", "cup", "bottle", "keyboard", "mouse", "plant", "clock",
        ];

        let frame = image::load_from_memory(frame_jpeg)?;
        let (frame_width, frame_height) = frame.dimensions();

        let mut rng = rand::rng();

        let index_dist = Uniform::new(0, objects.len())?;
        let confidence_dist = Uniform::new(0.0f32, 1.0f32)?;
        let left_dist = Uniform::new(0.0f32, frame_width as f32 / 2.0)?;
        let top_dist = Uniform::new(0.0f32, frame_height as f32 / 2.0)?;

        let score = confidence_dist.sample(&mut rng);
        let predictions = if score >= confidence {
            vec![Prediction {
                class_name: objects[index_dist.sample(&mut rng)].to_string(),
                confidence: score,
                bbox: BoundingBox {
                    left: left_dist.sample(&mut rng),
                    top: top_dist.sample(&mut rng),
                    width: frame_width as f32 / 4.0,
                    height: frame_height as f32 / 4.0,
                },
            }]
        } else {
            vec![]
        };

        let mut next_id = self.next_id.lock().unwrap();
        let record = HistoricalPrediction {
            id: *next_id,
            timestamp: Utc::now(),
            image_name: "frame.jpg".to_string(),
            video_filename: video_filename.unwrap_or("unknown.mp4").to_string(),
            predictions: predictions.clone(),
            confidence_threshold: Some(confidence),
            iou_threshold: Some(iou),
            processing_time: None,
            model_version: Some(self.loaded_model.lock().unwrap().clone()),
        };
        *next_id += 1;
        drop(next_id);

        {
            let mut history = self.history.lock().unwrap();
            history.insert(0, record);
            history.truncate(10);
        }
        self.notify_subscribers();

        Ok(predictions)
    }

    fn fetch_predictions(
        &self,
    ) -> Result<Vec<HistoricalPrediction>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.history.lock().unwrap().clone())
    }

    fn prediction_stream(&self) -> Receiver<PredictionStreamEvent> {
        let (sender, receiver) = channel();
        let snapshot = self.history.lock().unwrap().clone();
        let _ = sender.send(PredictionStreamEvent::Snapshot(snapshot));
        self.subscribers.lock().unwrap().push(sender);
        receiver
    }
}
