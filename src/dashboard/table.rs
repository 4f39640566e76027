use crate::detection_api::interface::{HistoricalPrediction, Prediction};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    CurrentFrame,
    Historical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub timestamp: DateTime<Utc>,
    pub source: RowSource,
    pub prediction: Prediction,
}

/// Current-frame predictions (timestamped now) ahead of flattened history,
/// truncated to `cap` rows combined. Current entries always come first, so
/// they stay visible however large the history grows.
pub fn merge_rows(
    current: &[Prediction],
    history: &[HistoricalPrediction],
    now: DateTime<Utc>,
    cap: usize,
) -> Vec<TableRow> {
    let current_rows = current.iter().map(|prediction| TableRow {
        timestamp: now,
        source: RowSource::CurrentFrame,
        prediction: prediction.clone(),
    });

    let historical_rows = history.iter().flat_map(|record| {
        record.predictions.iter().map(|prediction| TableRow {
            timestamp: record.timestamp,
            source: RowSource::Historical,
            prediction: prediction.clone(),
        })
    });

    current_rows.chain(historical_rows).take(cap).collect()
}
