use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::mpsc::Receiver;

/// Axis-aligned box in source-frame pixel units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class_name: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Healthy,
    Loading,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHealth {
    pub status: ModelStatus,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ModelHealth {
    pub fn error(message: Option<String>) -> Self {
        Self {
            status: ModelStatus::Error,
            model: None,
            database: None,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ModelStatus::Error
    }
}

/// One stored inference, owned and persisted by the detection service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPrediction {
    pub id: i64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub image_name: String,
    #[serde(default)]
    pub video_filename: String,
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub confidence_threshold: Option<f32>,
    #[serde(default)]
    pub iou_threshold: Option<f32>,
    #[serde(default)]
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub model_version: Option<String>,
}

// The service emits naive ISO 8601 timestamps (no offset); accept both
// those and RFC 3339.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| {
            raw.parse::<NaiveDateTime>()
                .map(|n| DateTime::<Utc>::from_naive_utc_and_offset(n, Utc))
        })
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone)]
pub enum PredictionStreamEvent {
    /// Full replacement of the historical record list.
    Snapshot(Vec<HistoricalPrediction>),
    Disconnected(String),
}

pub trait DetectionApi: Send + Sync {
    fn health_check(&self) -> Result<ModelHealth, Box<dyn std::error::Error + Send + Sync>>;
    fn load_model(&self, model_name: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn detect(
        &self,
        frame_jpeg: &[u8],
        confidence: f32,
        iou: f32,
        video_filename: Option<&str>,
    ) -> Result<Vec<Prediction>, Box<dyn std::error::Error + Send + Sync>>;
    fn fetch_predictions(
        &self,
    ) -> Result<Vec<HistoricalPrediction>, Box<dyn std::error::Error + Send + Sync>>;
    fn prediction_stream(&self) -> Receiver<PredictionStreamEvent>;
}
