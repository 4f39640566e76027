use crate::dashboard::overlay;
use crate::dashboard_ui::interface::{DashboardUi, PlaybackView, UiEvent, ViewModel};
use eframe::egui;
use std::error::Error;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(59, 130, 246);
const ERROR_TEXT: egui::Color32 = egui::Color32::from_rgb(248, 113, 113);
const HEALTHY_TEXT: egui::Color32 = egui::Color32::from_rgb(52, 211, 153);

pub struct DashboardUiGui {
    view: Arc<Mutex<ViewModel>>,
    event_sender: Sender<UiEvent>,
    event_receiver: Mutex<Option<Receiver<UiEvent>>>,
}

impl DashboardUiGui {
    pub fn new() -> Self {
        let (event_sender, event_receiver) = channel();
        Self {
            view: Arc::new(Mutex::new(ViewModel::default())),
            event_sender,
            event_receiver: Mutex::new(Some(event_receiver)),
        }
    }
}

impl Default for DashboardUiGui {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardUi for DashboardUiGui {
    fn init(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let view = self.view.clone();
        let event_sender = self.event_sender.clone();

        // The window blocks its thread until closed; the event loop keeps
        // running on the main thread.
        thread::spawn(move || {
            let options = eframe::NativeOptions {
                viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 900.0]),
                ..Default::default()
            };

            let window = DashboardWindow::new(view, event_sender);

            let _ = eframe::run_native(
                "Smart Object Detection Dashboard",
                options,
                Box::new(|_cc| Box::new(window)),
            );
        });

        Ok(())
    }

    fn render(&mut self, view: &ViewModel) -> Result<(), Box<dyn Error + Send + Sync>> {
        *self.view.lock().unwrap() = view.clone();
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

struct DashboardWindow {
    view: Arc<Mutex<ViewModel>>,
    event_sender: Sender<UiEvent>,
    video_path_input: String,
    frame_texture: Option<(u64, egui::TextureHandle)>,
}

impl DashboardWindow {
    fn new(view: Arc<Mutex<ViewModel>>, event_sender: Sender<UiEvent>) -> Self {
        Self {
            view,
            event_sender,
            video_path_input: String::new(),
            frame_texture: None,
        }
    }

    fn send(&self, event: UiEvent) {
        let _ = self.event_sender.send(event);
    }

    fn model_control(&self, ui: &mut egui::Ui, view: &ViewModel) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.heading("Model Control");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let color = if view.model.healthy {
                        HEALTHY_TEXT
                    } else {
                        ERROR_TEXT
                    };
                    ui.colored_label(color, &view.model.status_label);
                    ui.label("Status:");
                });
            });

            ui.horizontal(|ui| {
                ui.label("Current Model:");
                ui.strong(&view.model.model_name);
                ui.separator();
                ui.label("Database:");
                ui.strong(&view.model.database);
            });

            if let Some(message) = &view.model.message {
                ui.colored_label(ERROR_TEXT, message);
            }

            ui.horizontal(|ui| {
                let check = ui.add_enabled(
                    !view.model.busy,
                    egui::Button::new(if view.model.busy {
                        "Checking..."
                    } else {
                        "Check Health"
                    }),
                );
                if check.clicked() {
                    self.send(UiEvent::CheckHealthClicked);
                }

                for model_name in &view.model.available_models {
                    let load = ui.add_enabled(
                        !view.model.busy,
                        egui::Button::new(format!("Load {}", model_name)),
                    );
                    if load.clicked() {
                        self.send(UiEvent::LoadModelClicked(model_name.clone()));
                    }
                }
            });
        });
    }

    fn video_open(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Video:");
                ui.text_edit_singleline(&mut self.video_path_input);
                let open = ui.add_enabled(
                    !self.video_path_input.is_empty(),
                    egui::Button::new("Open"),
                );
                if open.clicked() {
                    self.send(UiEvent::VideoSelected(PathBuf::from(
                        self.video_path_input.clone(),
                    )));
                }
            });
        });
    }

    fn detection_viewer(&mut self, ui: &mut egui::Ui, view: &ViewModel) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.heading("Detection Results");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Model: {}", view.model.model_name));
                });
            });

            if let Some(notice) = &view.notice {
                ui.colored_label(ERROR_TEXT, notice);
            }

            ui.horizontal(|ui| {
                match view.playback {
                    PlaybackView::Playing | PlaybackView::Resuming => {
                        if ui.button("Pause").clicked() {
                            self.send(UiEvent::PauseClicked);
                        }
                    }
                    _ => {
                        let play = ui.add_enabled(view.can_play, egui::Button::new("Play"));
                        if play.clicked() {
                            self.send(UiEvent::PlayClicked);
                        }
                    }
                }
                if let Some(video) = &view.video {
                    ui.label(format!(
                        "{} ({}x{})",
                        video.filename, video.width, video.height
                    ));
                }
            });

            if let Some(frame) = &view.frame {
                let needs_upload = self
                    .frame_texture
                    .as_ref()
                    .map_or(true, |(seq, _)| *seq != frame.seq);
                if needs_upload {
                    let rgba = frame.image.to_rgba8();
                    let size = [rgba.width() as usize, rgba.height() as usize];
                    let color_image =
                        egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                    let texture = ui.ctx().load_texture(
                        "frame",
                        color_image,
                        egui::TextureOptions::LINEAR,
                    );
                    self.frame_texture = Some((frame.seq, texture));
                }

                if let Some((_, texture)) = &self.frame_texture {
                    let frame_width = frame.image.width();
                    let frame_height = frame.image.height();
                    let zoom = overlay::zoom_factor(ui.available_width(), frame_width);
                    let display_size = egui::vec2(
                        frame_width as f32 * zoom,
                        frame_height as f32 * zoom,
                    );

                    let response = ui.add(
                        egui::Image::new(texture).fit_to_exact_size(display_size),
                    );

                    let painter = ui.painter();
                    let origin = response.rect.min;
                    for overlay_box in overlay::layout(&view.predictions, zoom) {
                        let rect = egui::Rect::from_min_size(
                            origin + egui::vec2(overlay_box.left, overlay_box.top),
                            egui::vec2(overlay_box.width, overlay_box.height),
                        );
                        painter.rect_stroke(
                            rect,
                            0.0,
                            egui::Stroke::new(overlay::STROKE_WIDTH, ACCENT),
                        );
                        painter.text(
                            origin + egui::vec2(overlay_box.label_left, overlay_box.label_top),
                            egui::Align2::LEFT_TOP,
                            &overlay_box.label,
                            egui::FontId::proportional(
                                (overlay::LABEL_FONT_SIZE * zoom).max(10.0),
                            ),
                            ACCENT,
                        );
                    }
                }
            } else {
                ui.label("No frames captured yet");
            }
        });
    }

    fn config_panel(&self, ui: &mut egui::Ui, view: &ViewModel) {
        ui.group(|ui| {
            ui.heading("Detection Config");

            let mut confidence = view.confidence;
            let confidence_slider = ui.add(
                egui::Slider::new(&mut confidence, 0.1..=1.0)
                    .step_by(0.1)
                    .text("Confidence Threshold"),
            );
            if confidence_slider.changed() {
                self.send(UiEvent::ConfidenceChanged(confidence));
            }

            let mut iou = view.iou;
            let iou_slider = ui.add(
                egui::Slider::new(&mut iou, 0.1..=1.0)
                    .step_by(0.1)
                    .text("IoU Threshold"),
            );
            if iou_slider.changed() {
                self.send(UiEvent::IouChanged(iou));
            }
        });
    }

    fn predictions_table(&self, ui: &mut egui::Ui, view: &ViewModel) {
        ui.group(|ui| {
            ui.heading("Recent Predictions");

            if let Some(error) = &view.table.error {
                ui.colored_label(ERROR_TEXT, format!("Error: {}", error));
                return;
            }
            if view.table.loading {
                ui.label("Loading...");
                return;
            }
            if view.table.rows.is_empty() {
                ui.label("No predictions available");
                return;
            }

            egui::Grid::new("predictions_table")
                .striped(true)
                .num_columns(6)
                .show(ui, |ui| {
                    ui.strong("Time");
                    ui.strong("Source");
                    ui.strong("Class");
                    ui.strong("Confidence");
                    ui.strong("Position");
                    ui.strong("Size");
                    ui.end_row();

                    for row in &view.table.rows {
                        ui.label(&row.time);
                        ui.label(if row.current_frame {
                            "Current Frame"
                        } else {
                            "Historical"
                        });
                        ui.strong(&row.class_name);
                        ui.label(format!("{:.1}%", row.confidence * 100.0));
                        ui.label(&row.position);
                        ui.label(&row.size);
                        ui.end_row();
                    }
                });
        });
    }
}

impl eframe::App for DashboardWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // The view model changes from the core's thread; poll for it.
        ctx.request_repaint_after(Duration::from_millis(100));

        let view = self.view.lock().unwrap().clone();

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Smart Object Detection Dashboard");
                ui.add_space(8.0);

                self.model_control(ui, &view);
                ui.add_space(8.0);

                self.video_open(ui);
                ui.add_space(8.0);

                if let Some(error) = &view.error {
                    ui.colored_label(ERROR_TEXT, error);
                    ui.add_space(8.0);
                }

                self.detection_viewer(ui, &view);
                ui.add_space(8.0);

                self.config_panel(ui, &view);
                ui.add_space(8.0);

                self.predictions_table(ui, &view);
            });
        });
    }
}
