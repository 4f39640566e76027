use config::Config;
use dashboard::run::Dashboard;
use dashboard_ui::impl_gui::DashboardUiGui;
use dashboard_ui::interface::DashboardUi;
use detection_api::impl_fake::FakeDetectionApi;
use detection_api::impl_http::HttpDetectionApi;
use detection_api::interface::DetectionApi;
use logger::impl_console::LoggerConsole;
use logger::interface::Logger;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use video_source::impl_fake::FakeVideoSource;
use video_source::impl_image_dir::ImageDirVideoSource;
use video_source::interface::VideoSource;

mod config;
mod dashboard;
mod dashboard_ui;
mod detection_api;
mod logger;
mod video_source;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut config = Config::default();
    if let Ok(base_url) = std::env::var("DETECTION_API_URL") {
        config.api_base_url = base_url;
    }

    let logger: Arc<dyn Logger + Send + Sync> =
        Arc::new(LoggerConsole::new(config.logger_timezone));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let use_fakes = args.iter().any(|arg| arg == "--fake");
    let video_path = args.iter().find(|arg| !arg.starts_with("--")).cloned();

    let (detection_api, video_source): (Arc<dyn DetectionApi>, Arc<dyn VideoSource>) =
        if use_fakes {
            (
                Arc::new(FakeDetectionApi::new(logger.clone())),
                Arc::new(FakeVideoSource::new(logger.clone())),
            )
        } else {
            (
                Arc::new(HttpDetectionApi::new(&config, logger.clone())),
                Arc::new(ImageDirVideoSource::new(
                    config.source_frame_rate,
                    logger.clone(),
                )),
            )
        };

    let ui: Arc<Mutex<dyn DashboardUi>> = Arc::new(Mutex::new(DashboardUiGui::new()));

    let dashboard = Dashboard::new(config, logger, detection_api, video_source, ui);

    if let Some(path) = video_path {
        dashboard.open_video(PathBuf::from(path));
    }

    dashboard.run()?;

    Ok(())
}
