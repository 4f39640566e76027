use crate::dashboard_ui::interface::{DashboardUi, UiEvent, ViewModel};
use std::error::Error;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// Headless UI: records every rendered view model and replays a scripted
/// event sequence, so the runtime can be exercised in tests.
pub struct DashboardUiFake {
    rendered: Arc<Mutex<Vec<ViewModel>>>,
    scripted_events: Vec<UiEvent>,
    event_receiver: Mutex<Option<Receiver<UiEvent>>>,
    event_sender: Sender<UiEvent>,
}

impl DashboardUiFake {
    pub fn new(scripted_events: Vec<UiEvent>) -> Self {
        let (event_sender, event_receiver) = channel();
        Self {
            rendered: Arc::new(Mutex::new(Vec::new())),
            scripted_events,
            event_receiver: Mutex::new(Some(event_receiver)),
            event_sender,
        }
    }

    pub fn rendered(&self) -> Arc<Mutex<Vec<ViewModel>>> {
        self.rendered.clone()
    }

    /// Handle for pushing events as if the user had interacted with the
    /// window, usable after the UI itself moves behind the runtime.
    pub fn sender(&self) -> Sender<UiEvent> {
        self.event_sender.clone()
    }
}

impl DashboardUi for DashboardUiFake {
    fn init(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        for event in self.scripted_events.drain(..) {
            let _ = self.event_sender.send(event);
        }
        Ok(())
    }

    fn render(&mut self, view: &ViewModel) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.rendered.lock().unwrap().push(view.clone());
        Ok(())
    }

    fn events(&self) -> Receiver<UiEvent> {
        self.event_receiver
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| channel().1)
    }
}
