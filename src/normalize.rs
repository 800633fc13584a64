//! Turns assembled rows into rectangular tables with column names.
//!
//! OCR rows are noisy: sparse rows are filtered and the first row is promoted to
//! a canonical header when it reads like labels. Rows from structured PDF
//! extraction are trusted as-is and name their columns from their first row.

use tracing::debug;

use crate::header::{clean_header, looks_like_header};
use crate::model::{Row, Table, positional_name};

/// Right-pads every row with empty cells up to the widest row.
fn pad_rows(rows: Vec<Row>) -> (Vec<Row>, usize) {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let padded = rows
        .into_iter()
        .map(|mut row| {
            row.resize(width, String::new());
            row
        })
        .collect();
    (padded, width)
}

fn is_meaningful_row(row: &Row) -> bool {
    let mut filled = row.iter().map(|cell| cell.trim()).filter(|cell| !cell.is_empty());
    match (filled.next(), filled.next()) {
        (None, _) => false,
        (Some(_), Some(_)) => true,
        (Some(only), None) => only.chars().any(|ch| ch.is_ascii_digit()),
    }
}

fn positional_columns(width: usize) -> Vec<String> {
    (0..width).map(positional_name).collect()
}

/// Builds a table from OCR-assembled rows.
pub fn normalize_table(rows: Vec<Row>) -> Table {
    let (padded, width) = pad_rows(rows);
    let mut rows = padded
        .into_iter()
        .filter(is_meaningful_row)
        .collect::<Vec<_>>();

    let columns = if rows.first().is_some_and(looks_like_header) {
        let header = rows.remove(0);
        debug!(?header, "promoting first row to header");
        header
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let cleaned = clean_header(cell);
                if cleaned.is_empty() {
                    positional_name(index)
                } else {
                    cleaned
                }
            })
            .collect()
    } else {
        positional_columns(width)
    };

    Table { columns, rows }
}

/// Builds a table from cleaned structured-extraction rows.
///
/// The first row names the columns when data rows follow it; a lone row stays
/// data under positional names.
pub(crate) fn structured_table(rows: Vec<Row>) -> Table {
    let (mut rows, width) = pad_rows(rows);
    if rows.len() < 2 {
        return Table {
            columns: positional_columns(width),
            rows,
        };
    }

    let header = rows.remove(0);
    let columns = header
        .into_iter()
        .enumerate()
        .map(|(index, cell)| {
            if cell.is_empty() {
                positional_name(index)
            } else {
                cell
            }
        })
        .collect();

    Table { columns, rows }
}
