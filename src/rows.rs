use std::collections::BTreeMap;

use crate::model::{LineKey, Row, Token};

/// Index of the closest center; the lower index wins a tie.
pub(crate) fn nearest_column(x: f32, centers: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, center) in centers.iter().enumerate() {
        let distance = (x - center).abs();
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

/// Snaps tokens into cells: one row per OCR line, one cell per column center.
pub fn assemble_rows(tokens: &[Token], column_centers: &[f32]) -> Vec<Row> {
    if column_centers.is_empty() {
        return Vec::new();
    }
    let mut centers = column_centers.to_vec();
    centers.sort_by(f32::total_cmp);

    let mut lines: BTreeMap<LineKey, Vec<&Token>> = BTreeMap::new();
    for token in tokens {
        lines.entry(token.line).or_default().push(token);
    }

    let mut rows = Vec::new();
    for mut line in lines.into_values() {
        line.sort_by(|a, b| a.bbox.left.total_cmp(&b.bbox.left));

        let mut cells = vec![String::new(); centers.len()];
        for token in line {
            let text = token.text.trim();
            if text.is_empty() {
                continue;
            }
            let Some(column) = nearest_column(token.bbox.center_x(), &centers) else {
                continue;
            };
            let cell = &mut cells[column];
            if !cell.is_empty() {
                cell.push(' ');
            }
            cell.push_str(text);
        }

        if cells.iter().any(|cell| !cell.is_empty()) {
            rows.push(cells);
        }
    }

    rows
}
