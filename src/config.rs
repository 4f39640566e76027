use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub tick_rate: Duration,
    pub detection_delay: Duration,
    pub resume_delay: Duration,
    pub health_poll_interval: Duration,
    pub health_settle_delay: Duration,
    pub http_timeout: Duration,
    pub max_table_rows: usize,
    pub available_models: Vec<String>,
    pub source_frame_rate: f64,
    pub logger_timezone: chrono::FixedOffset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            tick_rate: Duration::from_millis(100),
            detection_delay: Duration::from_millis(500),
            resume_delay: Duration::from_millis(500),
            health_poll_interval: Duration::from_secs(30),
            health_settle_delay: Duration::from_secs(1),
            http_timeout: Duration::from_secs(15),
            max_table_rows: 10,
            available_models: vec!["yolov8n".to_string(), "yolov8s".to_string()],
            source_frame_rate: 30.0,
            logger_timezone: utc(),
        }
    }
}

fn utc() -> chrono::FixedOffset {
    chrono::FixedOffset::east_opt(0).unwrap()
}
