use crate::config::Config;
use crate::dashboard::core::{Model, Playback};
use crate::dashboard::table::{self, RowSource};
use crate::dashboard_ui::interface::{
    FrameView, ModelControlView, PlaybackView, TableRowView, TableView, ViewModel,
};
use crate::detection_api::interface::ModelStatus;
use chrono::Utc;

pub fn view(config: &Config, model: &Model) -> ViewModel {
    let playback = match model.playback {
        Playback::Idle => PlaybackView::Idle,
        Playback::Playing(_) => PlaybackView::Playing,
        Playback::Paused => PlaybackView::Paused,
        Playback::Blocked => PlaybackView::Blocked,
        Playback::Resuming { .. } => PlaybackView::Resuming,
    };

    let status_label = match &model.health.last {
        None => "loading".to_string(),
        Some(health) => match health.status {
            ModelStatus::Healthy => "healthy".to_string(),
            ModelStatus::Loading => "loading".to_string(),
            ModelStatus::Error => "error".to_string(),
            ModelStatus::Unknown => "unknown".to_string(),
        },
    };

    let notice = if model.health.is_error() {
        Some("Model error - detection paused".to_string())
    } else {
        None
    };

    let rows = table::merge_rows(
        &model.predictions,
        &model.history.records,
        Utc::now(),
        config.max_table_rows,
    )
    .into_iter()
    .map(|row| TableRowView {
        time: row
            .timestamp
            .with_timezone(&config.logger_timezone)
            .format("%H:%M:%S")
            .to_string(),
        current_frame: row.source == RowSource::CurrentFrame,
        class_name: row.prediction.class_name.clone(),
        confidence: row.prediction.confidence,
        position: format!("({}, {})", row.prediction.bbox.left, row.prediction.bbox.top),
        size: format!(
            "{} x {}",
            row.prediction.bbox.width, row.prediction.bbox.height
        ),
    })
    .collect();

    ViewModel {
        playback,
        can_play: model.video.is_some(),
        notice,
        error: model.error.clone(),
        frame: model.latest_frame.as_ref().map(|image| FrameView {
            image: image.clone(),
            seq: model.frame_seq,
        }),
        predictions: model.predictions.clone(),
        video: model.video.clone(),
        confidence: model.thresholds.confidence,
        iou: model.thresholds.iou,
        model: ModelControlView {
            status_label,
            healthy: matches!(
                model.health.last.as_ref().map(|h| h.status),
                Some(ModelStatus::Healthy)
            ),
            model_name: model
                .health
                .last
                .as_ref()
                .and_then(|h| h.model.clone())
                .unwrap_or_else(|| "None".to_string()),
            database: model
                .health
                .last
                .as_ref()
                .and_then(|h| h.database.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            message: model.health.last.as_ref().and_then(|h| h.message.clone()),
            busy: model.health.checking || model.model_loading,
            available_models: config.available_models.clone(),
        },
        table: TableView {
            loading: model.history.loading,
            error: model.history.error.clone(),
            rows,
        },
    }
}

#[cfg(test)]
mod render_test {
    use super::*;
    use crate::dashboard::core::init;
    use crate::detection_api::interface::ModelHealth;

    #[test]
    fn test_initial_view() {
        let config = Config::default();
        let (model, _) = init();

        let view = view(&config, &model);

        assert_eq!(view.playback, PlaybackView::Idle);
        assert!(!view.can_play);
        assert_eq!(view.model.status_label, "loading");
        assert_eq!(view.model.model_name, "None");
        assert_eq!(view.model.database, "Unknown");
        assert!(view.model.busy);
        assert!(view.table.loading);
        assert!(view.notice.is_none());
    }

    #[test]
    fn test_model_error_sets_notice() {
        let config = Config::default();
        let (mut model, _) = init();
        model.health.checking = false;
        model.health.last = Some(ModelHealth::error(None));

        let view = view(&config, &model);

        assert_eq!(view.model.status_label, "error");
        assert_eq!(view.notice.as_deref(), Some("Model error - detection paused"));
        assert!(!view.model.healthy);
    }
}
