use std::path::Path;

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::columns::infer_column_centers;
use crate::config::ProcessorConfig;
use crate::error::ExtractError;
use crate::grid::detect_column_centers;
use crate::image_ops::{load_image, upscale_for_ocr};
use crate::merge::concat_tables;
use crate::model::{ExtractionResult, Table};
use crate::normalize::normalize_table;
use crate::note::{Note, NoteCode};
use crate::ocr::{OcrEngine, TESSERACT_INSTALL_HINT, TesseractCli, filter_tokens};
use crate::pdf_tables::{PlumberTableReader, StructuredOutcome, TableReader, extract_structured};
use crate::raster::{POPPLER_INSTALL_HINT, PdfRasterizer, Pdftoppm, RASTER_DPI};
use crate::rows::assemble_rows;

/// Turns PDFs and screenshots into one table plus a log of the fallbacks taken.
///
/// Configuration and collaborators are fixed at construction; `process` keeps no
/// state between calls.
pub struct DocumentProcessor {
    config: ProcessorConfig,
    ocr: Box<dyn OcrEngine>,
    rasterizer: Box<dyn PdfRasterizer>,
    table_reader: Box<dyn TableReader>,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(ProcessorConfig::default())
    }
}

impl DocumentProcessor {
    /// Processor backed by `tesseract`, `pdftoppm` and the lattice table finder.
    #[must_use]
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            config,
            ocr: Box::new(TesseractCli::default()),
            rasterizer: Box::new(Pdftoppm::default()),
            table_reader: Box::new(PlumberTableReader::lattice()),
        }
    }

    #[must_use]
    pub fn with_ocr_engine(mut self, ocr: impl OcrEngine + 'static) -> Self {
        self.ocr = Box::new(ocr);
        self
    }

    #[must_use]
    pub fn with_rasterizer(mut self, rasterizer: impl PdfRasterizer + 'static) -> Self {
        self.rasterizer = Box::new(rasterizer);
        self
    }

    #[must_use]
    pub fn with_table_reader(mut self, table_reader: impl TableReader + 'static) -> Self {
        self.table_reader = Box::new(table_reader);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Extracts a table from a document; `filename` is only used to sniff the type.
    pub fn process(&self, filename: &str, content: &[u8]) -> ExtractionResult {
        let mut notes = Vec::new();
        let units = if is_pdf(filename, content) {
            info!(filename, bytes = content.len(), "processing PDF");
            self.process_pdf(content, &mut notes)
        } else {
            info!(filename, bytes = content.len(), "processing image");
            self.process_image_bytes(content, &mut notes)
        };

        let tables = match units {
            Ok(tables) => tables,
            Err(error) => {
                warn!("aborting document: {error}");
                notes.extend(abort_notes(&error));
                return ExtractionResult::empty(notes);
            }
        };

        let tables = tables
            .into_iter()
            .filter(|table| !table.is_empty())
            .collect::<Vec<_>>();
        if tables.is_empty() {
            notes.push(Note::new(NoteCode::NoTextDetected, "No text detected."));
            return ExtractionResult::empty(notes);
        }

        let table = concat_tables(tables);
        debug!(rows = table.rows.len(), columns = table.columns.len(), "document extracted");
        ExtractionResult { table, notes }
    }

    /// `Err` only for a fatal OCR failure; every other failure becomes a note.
    fn process_pdf(&self, content: &[u8], notes: &mut Vec<Note>) -> Result<Vec<Table>, ExtractError> {
        match extract_structured(self.table_reader.as_ref(), content, notes) {
            StructuredOutcome::Tables(tables) => {
                notes.push(Note::new(
                    NoteCode::StructuredExtraction,
                    "Structured data extracted directly from PDF tables.",
                ));
                return Ok(tables);
            }
            StructuredOutcome::Nothing => {
                debug!("no structured tables found");
                notes.push(Note::new(
                    NoteCode::StructuredFallback,
                    "No structured tables found in PDF, falling back to OCR.",
                ));
            }
            StructuredOutcome::Failed(error) => {
                warn!("structured extraction failed: {error}");
                notes.push(Note::new(
                    NoteCode::StructuredFallback,
                    format!("Structured PDF extraction failed, falling back to OCR ({error})."),
                ));
            }
        }

        let pages = match self.rasterizer.rasterize(content, RASTER_DPI) {
            Ok(pages) => pages,
            Err(error) => {
                warn!("rasterization failed: {error}");
                notes.push(Note::new(
                    NoteCode::RasterizationFailed,
                    format!("{POPPLER_INSTALL_HINT} Details: {error}"),
                ));
                return Ok(Vec::new());
            }
        };

        let mut tables = Vec::with_capacity(pages.len());
        for (page, image) in (1_u32..).zip(pages) {
            notes.push(
                Note::new(NoteCode::OcrApplied, format!("OCR applied to PDF page {page}."))
                    .with_page(page),
            );
            match self.ocr_table(image) {
                Ok(table) => tables.push(table),
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    warn!(page, "OCR failed: {error}");
                    notes.push(
                        Note::new(NoteCode::OcrFailed, format!("PDF page {page}: {error}"))
                            .with_page(page),
                    );
                }
            }
        }
        Ok(tables)
    }

    fn process_image_bytes(
        &self,
        content: &[u8],
        notes: &mut Vec<Note>,
    ) -> Result<Vec<Table>, ExtractError> {
        let image = match load_image(content) {
            Ok(image) => image,
            Err(error) => {
                warn!("image decode failed: {error}");
                notes.push(Note::new(
                    NoteCode::ImageDecodeFailed,
                    format!("Unable to decode image ({error})."),
                ));
                return Ok(Vec::new());
            }
        };

        match self.ocr_table(image) {
            Ok(table) => Ok(vec![table]),
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                warn!("OCR failed: {error}");
                notes.push(Note::new(NoteCode::OcrFailed, error.to_string()));
                Ok(Vec::new())
            }
        }
    }

    /// OCR one bitmap into a table: tokens, column centers, rows, normalization.
    fn ocr_table(&self, image: RgbImage) -> Result<Table, ExtractError> {
        let image = upscale_for_ocr(image);
        let raw = self
            .ocr
            .recognize(&image, &self.config.ocr_language, &self.config.ocr_config)?;
        let tokens = filter_tokens(raw);
        if tokens.is_empty() {
            debug!("no confident tokens");
            return Ok(Table::default());
        }

        let centers = if let Some(centers) = detect_column_centers(&image) {
            debug!(columns = centers.len(), "columns from grid lines");
            centers
        } else {
            infer_column_centers(&tokens)
        };

        let rows = assemble_rows(&tokens, &centers);
        if rows.is_empty() {
            return Ok(Table::default());
        }
        Ok(normalize_table(rows))
    }
}

/// Notes explaining why a document was abandoned, with the matching install hint.
fn abort_notes(error: &ExtractError) -> Vec<Note> {
    match error {
        ExtractError::EngineUnavailable(_) => vec![
            Note::new(NoteCode::EngineUnavailable, TESSERACT_INSTALL_HINT),
            Note::new(NoteCode::EngineUnavailable, error.to_string()),
        ],
        ExtractError::Rasterization(_) => vec![Note::new(
            NoteCode::RasterizationFailed,
            format!("{POPPLER_INSTALL_HINT} Details: {error}"),
        )],
        _ => vec![Note::new(NoteCode::OcrFailed, error.to_string())],
    }
}

fn is_pdf(filename: &str, content: &[u8]) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"))
        || content.starts_with(b"%PDF")
}
