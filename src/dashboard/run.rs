use crate::config::Config;
use crate::dashboard::core::{init, transition, Effect, Event, Model};
use crate::dashboard::render;
use crate::dashboard::run_effect::RunEffect;
use crate::dashboard_ui::interface::{DashboardUi, UiEvent};
use crate::detection_api::interface::DetectionApi;
use crate::logger::interface::Logger;
use crate::video_source::interface::VideoSource;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

pub struct Dashboard {
    config: Config,
    logger: Arc<dyn Logger + Send + Sync>,
    detection_api: Arc<dyn DetectionApi>,
    video_source: Arc<dyn VideoSource>,
    ui: Arc<Mutex<dyn DashboardUi>>,
    event_sender: Sender<Event>,
    event_receiver: Receiver<Event>,
}

impl Dashboard {
    pub fn new(
        config: Config,
        logger: Arc<dyn Logger + Send + Sync>,
        detection_api: Arc<dyn DetectionApi>,
        video_source: Arc<dyn VideoSource>,
        ui: Arc<Mutex<dyn DashboardUi>>,
    ) -> Self {
        let (event_sender, event_receiver) = channel();

        Self {
            config,
            logger: logger.with_namespace("dashboard"),
            detection_api,
            video_source,
            ui,
            event_sender,
            event_receiver,
        }
    }

    /// Queue a video to open before the loop starts, e.g. from the CLI.
    pub fn open_video(&self, path: PathBuf) {
        let _ = self
            .event_sender
            .send(Event::Ui(UiEvent::VideoSelected(path)));
    }

    pub fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut model = self.start()?;
        loop {
            model = self.step(model)?;
        }
    }

    pub(crate) fn start(&self) -> Result<Model, Box<dyn std::error::Error + Send + Sync>> {
        self.ui.lock().unwrap().init()?;

        let (model, effects) = init();
        self.render(&model)?;
        self.spawn_effects(effects);
        Ok(model)
    }

    /// Process one event: transition, render, spawn the resulting effects.
    pub(crate) fn step(
        &self,
        model: Model,
    ) -> Result<Model, Box<dyn std::error::Error + Send + Sync>> {
        let event = self.event_receiver.recv()?;

        if !matches!(event, Event::Tick(_)) {
            let _ = self
                .logger
                .info(&format!("event: {}", event.to_display_string()));
        }

        let (new_model, effects) = transition(&self.config, model, event);

        if !effects.is_empty() {
            let display: Vec<String> = effects.iter().map(|e| e.to_display_string()).collect();
            let _ = self.logger.info(&format!("effects: {:?}", display));
        }

        self.render(&new_model)?;
        self.spawn_effects(effects);
        Ok(new_model)
    }

    fn render(&self, model: &Model) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let view = render::view(&self.config, model);
        self.ui.lock().unwrap().render(&view)
    }

    fn spawn_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            let runner = RunEffect::new(
                self.config.clone(),
                self.logger.clone(),
                self.detection_api.clone(),
                self.video_source.clone(),
                self.ui.clone(),
                self.event_sender.clone(),
            );
            std::thread::spawn(move || runner.run_effect(effect));
        }
    }
}
