use crate::config::Config;
use crate::dashboard::run::Dashboard;
use crate::dashboard_ui::impl_fake::DashboardUiFake;
use crate::dashboard_ui::interface::{DashboardUi, PlaybackView, UiEvent, ViewModel};
use crate::detection_api::impl_fake::FakeDetectionApi;
use crate::logger::impl_console::LoggerConsole;
use crate::logger::interface::Logger;
use crate::video_source::impl_fake::FakeVideoSource;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn quiet_config() -> Config {
    Config {
        tick_rate: Duration::from_millis(10),
        detection_delay: Duration::from_millis(20),
        ..Config::default()
    }
}

// End-to-end over the fake devices: open a video, press play, and watch a
// captured frame plus a detection round-trip come back through the renders.
#[test]
fn test_runtime_plays_and_detects_with_fakes() {
    let config = quiet_config();
    let logger: Arc<dyn Logger + Send + Sync> =
        Arc::new(LoggerConsole::new(config.logger_timezone));

    let ui_fake = DashboardUiFake::new(vec![UiEvent::VideoSelected(PathBuf::from("clip.mp4"))]);
    let rendered = ui_fake.rendered();
    let user = ui_fake.sender();
    let ui: Arc<Mutex<dyn DashboardUi>> = Arc::new(Mutex::new(ui_fake));

    let dashboard = Dashboard::new(
        config,
        logger.clone(),
        Arc::new(FakeDetectionApi::new(logger.clone())),
        Arc::new(FakeVideoSource::new(logger)),
        ui,
    );

    let mut model = dashboard.start().unwrap();
    let mut play_sent = false;

    for _ in 0..500 {
        model = dashboard.step(model).unwrap();

        let views = rendered.lock().unwrap();
        if !play_sent && views.last().map_or(false, |view| view.can_play) {
            let _ = user.send(UiEvent::PlayClicked);
            play_sent = true;
        }
        if views.iter().any(played_with_frame) {
            return;
        }
    }

    panic!("dashboard never captured a frame while playing");
}

fn played_with_frame(view: &ViewModel) -> bool {
    view.playback == PlaybackView::Playing && view.frame.is_some()
}
