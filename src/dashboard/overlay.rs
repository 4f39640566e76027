use crate::detection_api::interface::Prediction;

/// Vertical gap between a box and its label, in source-frame units.
const LABEL_OFFSET: f32 = 20.0;

/// Font size of box labels, in source-frame units.
pub const LABEL_FONT_SIZE: f32 = 36.0;

pub const STROKE_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub label_left: f32,
    pub label_top: f32,
    pub label: String,
}

/// Display size over source size. Boxes stay authored in source-frame units
/// and everything scales by this single factor; no independent X/Y scaling.
pub fn zoom_factor(container_width: f32, frame_width: u32) -> f32 {
    if frame_width == 0 {
        return 1.0;
    }
    container_width / frame_width as f32
}

pub fn layout(predictions: &[Prediction], zoom: f32) -> Vec<OverlayBox> {
    predictions
        .iter()
        .map(|prediction| {
            let bbox = &prediction.bbox;
            OverlayBox {
                left: bbox.left * zoom,
                top: bbox.top * zoom,
                width: bbox.width * zoom,
                height: bbox.height * zoom,
                label_left: bbox.left * zoom,
                label_top: (bbox.top - LABEL_OFFSET).max(0.0) * zoom,
                label: format!(
                    "{} {:.1}%",
                    prediction.class_name,
                    prediction.confidence * 100.0
                ),
            }
        })
        .collect()
}
