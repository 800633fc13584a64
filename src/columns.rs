use tracing::debug;

use crate::model::Token;

const HEADER_QUANTILE: f32 = 0.2;
const DEFAULT_TOKEN_WIDTH: f32 = 40.0;
const MIN_MERGE_GAP: f32 = 20.0;
const MIN_CELL_WIDTH: f32 = 30.0;

/// Linear-interpolated quantile of unsorted values.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn quantile(values: &[f32], q: f32) -> Option<f32> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let last = sorted.len().checked_sub(1)?;
    let position = q.clamp(0.0, 1.0) * last as f32;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f32;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

fn median(values: &[f32]) -> Option<f32> {
    quantile(values, 0.5)
}

/// Column centers clustered from token left edges, for pages without ruling lines.
///
/// Only the topmost fifth of the tokens (the likely header band) is clustered.
/// When clustering finds fewer than two anchors, three evenly spaced anchors
/// across the whole token extent are used instead.
pub fn infer_column_centers(tokens: &[Token]) -> Vec<f32> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let tops = tokens.iter().map(|token| token.bbox.top).collect::<Vec<_>>();
    let header_threshold = quantile(&tops, HEADER_QUANTILE).unwrap_or(f32::INFINITY);
    let header_band = tokens
        .iter()
        .filter(|token| token.bbox.top <= header_threshold)
        .collect::<Vec<_>>();
    let candidates = if header_band.is_empty() {
        tokens.iter().collect()
    } else {
        header_band
    };

    let widths = candidates
        .iter()
        .map(|token| token.bbox.width)
        .collect::<Vec<_>>();
    let width_median = median(&widths)
        .filter(|width| *width > 0.0)
        .unwrap_or(DEFAULT_TOKEN_WIDTH);

    let mut lefts = candidates
        .iter()
        .map(|token| token.bbox.left)
        .collect::<Vec<_>>();
    lefts.sort_by(f32::total_cmp);

    let merge_gap = width_median.max(MIN_MERGE_GAP);
    let mut anchors: Vec<f32> = Vec::new();
    for left in lefts {
        if anchors.last().is_none_or(|anchor| left - anchor > merge_gap) {
            anchors.push(left);
        }
    }

    if anchors.len() < 2 {
        let min_left = tokens
            .iter()
            .map(|token| token.bbox.left)
            .fold(f32::INFINITY, f32::min);
        let max_right = tokens
            .iter()
            .map(|token| token.bbox.right())
            .fold(f32::NEG_INFINITY, f32::max);
        anchors = vec![min_left, (min_left + max_right) / 2.0, max_right];
    }

    debug!(columns = anchors.len(), "inferred columns from token positions");
    let half_cell = width_median.max(MIN_CELL_WIDTH) / 2.0;
    anchors.into_iter().map(|anchor| anchor + half_cell).collect()
}

#[cfg(test)]
mod tests {
    use super::{infer_column_centers, median, quantile};
    use crate::model::{BoundingBox, LineKey, Token};

    fn token(left: f32, top: f32, width: f32) -> Token {
        Token {
            text: "x".to_string(),
            bbox: BoundingBox {
                left,
                top,
                width,
                height: 20.0,
            },
            confidence: Some(90.0),
            line: LineKey::default(),
        }
    }

    #[test]
    fn quantile_interpolates_like_a_dataframe() {
        let q = quantile(&[50.0, 20.0, 10.0, 40.0, 30.0], 0.2).expect("non-empty input");
        assert!((q - 18.0).abs() < 1e-4, "q = {q}");
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(quantile(&[], 0.2), None);
    }

    #[test]
    fn clusters_header_band_left_edges() {
        let tokens = vec![
            token(100.0, 10.0, 50.0),
            token(400.0, 10.0, 50.0),
            token(700.0, 10.0, 50.0),
            token(105.0, 60.0, 50.0),
            token(402.0, 60.0, 50.0),
            token(698.0, 60.0, 50.0),
            token(100.0, 110.0, 50.0),
            token(410.0, 110.0, 50.0),
            token(705.0, 110.0, 50.0),
        ];
        let centers = infer_column_centers(&tokens);
        assert_eq!(centers, vec![125.0, 425.0, 725.0]);
    }

    #[test]
    fn nearby_left_edges_merge_into_one_anchor() {
        let tokens = vec![
            token(100.0, 10.0, 60.0),
            token(140.0, 10.0, 60.0),
            token(400.0, 10.0, 60.0),
        ];
        let centers = infer_column_centers(&tokens);
        assert_eq!(centers, vec![130.0, 430.0]);
    }

    #[test]
    fn fabricates_three_anchors_when_clustering_collapses() {
        let tokens = vec![token(100.0, 10.0, 20.0), token(300.0, 80.0, 100.0)];
        let centers = infer_column_centers(&tokens);
        // header band is the single top token; median width 20 -> half cell 15
        assert_eq!(centers, vec![115.0, 265.0, 415.0]);
    }

    #[test]
    fn no_tokens_no_columns() {
        assert!(infer_column_centers(&[]).is_empty());
    }
}
