use serde::Serialize;

use crate::csv_out::write_csv_to_string;
use crate::error::ExtractError;
use crate::note::Note;

pub type Row = Vec<String>;

/// Rows of one table as handed back by a structured reader, before cleaning.
pub type RawTable = Vec<Vec<String>>;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    pub page: u32,
    pub rows: RawTable,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageTables {
    pub page: u32,
    pub tables: Vec<DetectedTable>,
}

/// Tesseract's block/paragraph/line triple; tokens sharing it sit on one physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LineKey {
    pub block: u32,
    pub paragraph: u32,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }
}

/// One OCR-recognized word.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub bbox: BoundingBox,
    /// 0–100; `None` when the engine reported a value that does not parse.
    pub confidence: Option<f32>,
    pub line: LineKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[must_use]
pub fn positional_name(index: usize) -> String {
    format!("Column {}", index + 1)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ExtractionResult {
    pub table: Table,
    pub notes: Vec<Note>,
}

impl ExtractionResult {
    #[must_use]
    pub fn empty(notes: Vec<Note>) -> Self {
        Self {
            table: Table::default(),
            notes,
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.table.rows.len()
    }
}

/// Serializable summary handed to callers that want everything in one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResponse {
    pub filename: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub csv: String,
    pub row_count: usize,
    pub notes: Vec<String>,
}

impl ExtractionResponse {
    pub fn from_result(
        filename: impl Into<String>,
        result: &ExtractionResult,
    ) -> Result<Self, ExtractError> {
        let csv = if result.table.is_empty() {
            String::new()
        } else {
            write_csv_to_string(&result.table, b',')?
        };

        Ok(Self {
            filename: filename.into(),
            columns: result.table.columns.clone(),
            rows: result.table.rows.clone(),
            csv,
            row_count: result.row_count(),
            notes: result.notes.iter().map(ToString::to_string).collect(),
        })
    }
}
