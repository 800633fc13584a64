use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use pdfplumber::{Pdf, Strategy, TableSettings};
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::model::{DetectedTable, PageTables, RawTable, Row, Table};
use crate::normalize::structured_table;
use crate::note::{Note, NoteCode};

/// Structured tables scoring below this are kept but noted.
pub(crate) const LOW_CONFIDENCE_THRESHOLD: f32 = 0.60;

/// Reads tables straight from a PDF's embedded layout, without rasterizing.
pub trait TableReader: Send + Sync {
    fn read_tables(&self, pdf: &[u8]) -> Result<Vec<PageTables>, ExtractError>;
}

/// Table finder over the PDF's vector graphics and positioned characters.
///
/// The default lattice strategy only reports tables drawn with ruling lines or
/// cell rectangles; a page whose text layer is just a letterhead yields nothing.
#[derive(Debug, Clone, Default)]
pub struct PlumberTableReader {
    settings: TableSettings,
}

impl PlumberTableReader {
    #[must_use]
    pub fn lattice() -> Self {
        Self::default()
    }

    /// Finds borderless tables from text alignment; far more eager than `lattice`.
    #[must_use]
    pub fn stream() -> Self {
        Self {
            settings: TableSettings {
                strategy: Strategy::Stream,
                ..TableSettings::default()
            },
        }
    }

    fn read_pages(&self, pdf: &[u8]) -> Result<Vec<PageTables>, ExtractError> {
        let document = Pdf::open(pdf, None)?;
        if document.page_count() == 0 {
            return Err(ExtractError::NoPages);
        }

        let mut pages = Vec::with_capacity(document.page_count());
        for (index, page_number) in (0..document.page_count()).zip(1_u32..) {
            let page = document.page(index)?;
            let tables = page
                .find_tables(&self.settings)
                .into_iter()
                .map(|table| {
                    let rows = table
                        .rows
                        .into_iter()
                        .map(|row| {
                            row.into_iter()
                                .map(|cell| cell.text.unwrap_or_default())
                                .collect::<Row>()
                        })
                        .collect::<RawTable>();
                    let confidence = table_confidence(&rows);
                    DetectedTable {
                        page: page_number,
                        rows,
                        confidence,
                    }
                })
                .collect::<Vec<_>>();
            debug!(page = page_number, tables = tables.len(), "ruled tables found");
            pages.push(PageTables {
                page: page_number,
                tables,
            });
        }
        Ok(pages)
    }
}

impl TableReader for PlumberTableReader {
    fn read_tables(&self, pdf: &[u8]) -> Result<Vec<PageTables>, ExtractError> {
        // Malformed content streams can panic deep inside the parser.
        catch_unwind(AssertUnwindSafe(|| self.read_pages(pdf))).map_err(|panic| {
            let detail = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "PDF parser panicked".to_string());
            ExtractError::StructuredExtraction(detail)
        })?
    }
}

/// Share of rows at the most common width, blended with the min/max width ratio.
#[allow(clippy::cast_precision_loss)]
fn table_confidence(rows: &[Row]) -> f32 {
    let mut widths: HashMap<usize, usize> = HashMap::new();
    for row in rows {
        *widths.entry(row.len()).or_default() += 1;
    }
    let Some((_, modal_count)) = widths
        .iter()
        .max_by_key(|(width, count)| (**count, **width))
    else {
        return 0.0;
    };
    let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
    let narrowest = rows.iter().map(Vec::len).min().unwrap_or(0);
    if widest == 0 {
        return 0.0;
    }

    let consistent = *modal_count as f32 / rows.len() as f32;
    let uniformity = narrowest as f32 / widest as f32;
    (consistent * 0.75 + uniformity * 0.25).clamp(0.0, 1.0)
}

/// Trims every cell and drops rows that are blank throughout.
pub(crate) fn clean_table_rows(table: &RawTable) -> Vec<Row> {
    table
        .iter()
        .map(|row| row.iter().map(|cell| cell.trim().to_string()).collect::<Row>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect()
}

/// Outcome of the structured pass: tables found, or the reason none were.
pub(crate) enum StructuredOutcome {
    Tables(Vec<Table>),
    Nothing,
    Failed(ExtractError),
}

pub(crate) fn extract_structured(
    reader: &dyn TableReader,
    pdf: &[u8],
    notes: &mut Vec<Note>,
) -> StructuredOutcome {
    let pages = match reader.read_tables(pdf) {
        Ok(pages) => pages,
        Err(error) => return StructuredOutcome::Failed(error),
    };

    let mut tables = Vec::new();
    for page in pages {
        for detected in page.tables {
            let cleaned = clean_table_rows(&detected.rows);
            if cleaned.is_empty() {
                continue;
            }
            if detected.confidence < LOW_CONFIDENCE_THRESHOLD {
                warn!(page = page.page, confidence = detected.confidence, "low-confidence table");
                notes.push(
                    Note::new(
                        NoteCode::LowConfidenceTable,
                        format!(
                            "Low-confidence structured table on page {} (confidence {:.2}).",
                            page.page, detected.confidence
                        ),
                    )
                    .with_page(page.page),
                );
            }
            tables.push(structured_table(cleaned));
        }
    }

    debug!(tables = tables.len(), "structured extraction finished");
    if tables.is_empty() {
        StructuredOutcome::Nothing
    } else {
        StructuredOutcome::Tables(tables)
    }
}
