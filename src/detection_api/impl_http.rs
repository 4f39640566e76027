use crate::config::Config;
use crate::detection_api::error::ApiError;
use crate::detection_api::interface::{
    DetectionApi, HistoricalPrediction, ModelHealth, Prediction, PredictionStreamEvent,
};
use crate::logger::interface::Logger;
use reqwest::blocking::multipart::{Form, Part};
use std::io::{BufRead, BufReader};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;

pub struct HttpDetectionApi {
    client: reqwest::blocking::Client,
    base_url: String,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl HttpDetectionApi {
    pub fn new(config: &Config, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self {
            client,
            base_url: config.api_base_url.clone(),
            logger: logger.with_namespace("detection_api"),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl DetectionApi for HttpDetectionApi {
    fn health_check(&self) -> Result<ModelHealth, Box<dyn std::error::Error + Send + Sync>> {
        let health = self
            .client
            .get(self.url("/health_check"))
            .send()
            .map_err(ApiError::Transport)?
            .json::<ModelHealth>()
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(health)
    }

    fn load_model(&self, model_name: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let response = self
            .client
            .post(self.url("/load_model"))
            .json(&serde_json::json!({ "model_name": model_name }))
            .send()
            .map_err(ApiError::Transport)?;

        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            let message = server_message(&body)
                .unwrap_or_else(|| "Failed to load model".to_string());
            return Err(Box::new(ApiError::Server(message)));
        }
        Ok(())
    }

    fn detect(
        &self,
        frame_jpeg: &[u8],
        confidence: f32,
        iou: f32,
        video_filename: Option<&str>,
    ) -> Result<Vec<Prediction>, Box<dyn std::error::Error + Send + Sync>> {
        let part = Part::bytes(frame_jpeg.to_vec())
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(ApiError::Transport)?;

        let mut form = Form::new().part("file", part);
        for (name, value) in detect_form_fields(confidence, iou, video_filename) {
            form = form.text(name, value);
        }

        let response = self
            .client
            .post(self.url("/detect"))
            .multipart(form)
            .send()
            .map_err(ApiError::Transport)?;

        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            let message = server_message(&body)
                .unwrap_or_else(|| "An error occurred during detection".to_string());
            return Err(Box::new(ApiError::Server(message)));
        }

        let predictions = response
            .json::<Vec<Prediction>>()
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(predictions)
    }

    fn fetch_predictions(
        &self,
    ) -> Result<Vec<HistoricalPrediction>, Box<dyn std::error::Error + Send + Sync>> {
        let records = self
            .client
            .get(self.url("/predictions"))
            .send()
            .map_err(ApiError::Transport)?
            .error_for_status()
            .map_err(ApiError::Transport)?
            .json::<Vec<HistoricalPrediction>>()
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(records)
    }

    fn prediction_stream(&self) -> Receiver<PredictionStreamEvent> {
        let (sender, receiver) = channel();
        let url = self.url("/predictions/stream");
        let logger = self.logger.with_namespace("stream");

        std::thread::spawn(move || {
            // The shared client carries a request timeout that would kill a
            // long-lived stream; this connection runs without one.
            let client = match reqwest::blocking::Client::builder().timeout(None).build() {
                Ok(client) => client,
                Err(e) => {
                    let _ = sender.send(PredictionStreamEvent::Disconnected(e.to_string()));
                    return;
                }
            };

            let response = match client.get(&url).send().and_then(|r| r.error_for_status()) {
                Ok(response) => response,
                Err(e) => {
                    let _ = logger.error(&format!("stream connect failed: {}", e));
                    let _ = sender.send(PredictionStreamEvent::Disconnected(e.to_string()));
                    return;
                }
            };

            let reader = BufReader::new(response);
            let mut data_lines: Vec<String> = Vec::new();

            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if line.is_empty() {
                            if let Some(records) = parse_sse_data(&data_lines) {
                                if sender.send(PredictionStreamEvent::Snapshot(records)).is_err() {
                                    return;
                                }
                            }
                            data_lines.clear();
                        } else if let Some(rest) = line.strip_prefix("data:") {
                            data_lines.push(rest.trim_start().to_string());
                        }
                    }
                    Err(e) => {
                        let _ = logger.error(&format!("stream read failed: {}", e));
                        let _ = sender.send(PredictionStreamEvent::Disconnected(e.to_string()));
                        return;
                    }
                }
            }

            let _ = sender.send(PredictionStreamEvent::Disconnected("stream ended".to_string()));
        });

        receiver
    }
}

/// Text fields of the multipart detect request, in wire format.
pub(crate) fn detect_form_fields(
    confidence: f32,
    iou: f32,
    video_filename: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("confidence", format_threshold(confidence)),
        ("iou", format_threshold(iou)),
    ];
    if let Some(name) = video_filename {
        fields.push(("video_filename", name.to_string()));
    }
    fields
}

pub(crate) fn format_threshold(value: f32) -> String {
    value.to_string()
}

/// Completed SSE event payload (one or more `data:` lines) to records.
pub(crate) fn parse_sse_data(data_lines: &[String]) -> Option<Vec<HistoricalPrediction>> {
    if data_lines.is_empty() {
        return None;
    }
    serde_json::from_str(&data_lines.join("\n")).ok()
}

fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
}

#[cfg(test)]
mod impl_http_test {
    use super::*;

    #[test]
    fn test_thresholds_serialize_like_the_browser_client() {
        assert_eq!(format_threshold(0.1), "0.1");
        assert_eq!(format_threshold(1.0), "1");
        assert_eq!(format_threshold(0.45), "0.45");
    }

    #[test]
    fn test_detect_form_fields() {
        let fields = detect_form_fields(0.1, 1.0, Some("traffic.mp4"));
        assert_eq!(
            fields,
            vec![
                ("confidence", "0.1".to_string()),
                ("iou", "1".to_string()),
                ("video_filename", "traffic.mp4".to_string()),
            ]
        );
    }

    #[test]
    fn test_detect_form_fields_without_video() {
        let fields = detect_form_fields(0.7, 0.5, None);
        assert_eq!(fields.len(), 2);
        assert!(!fields.iter().any(|(name, _)| *name == "video_filename"));
    }

    #[test]
    fn test_parse_sse_data() {
        let lines = vec![
            r#"[{"id": 1, "timestamp": "2025-03-14T09:26:53","#.to_string(),
            r#""image_name": "a.jpg", "video_filename": "v.mp4", "predictions": []}]"#.to_string(),
        ];
        let records = parse_sse_data(&lines).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
    }

    #[test]
    fn test_parse_sse_data_ignores_empty_and_garbage() {
        assert!(parse_sse_data(&[]).is_none());
        assert!(parse_sse_data(&["not json".to_string()]).is_none());
    }

    #[test]
    fn test_server_message_prefers_error_key() {
        assert_eq!(
            server_message(r#"{"error": "CUDA out of memory"}"#).as_deref(),
            Some("CUDA out of memory")
        );
        assert_eq!(
            server_message(r#"{"message": "Model not loaded"}"#).as_deref(),
            Some("Model not loaded")
        );
        assert!(server_message("oops").is_none());
    }
}
