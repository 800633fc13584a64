//! Rebuilds bank-statement tables from PDFs and screenshots.
//!
//! PDFs are searched for ruled tables first; documents without any are
//! rasterized and OCR'd. Images go straight to OCR, where column positions come
//! from ruling lines when the page has them and from word clustering otherwise.

mod columns;
mod config;
mod csv_out;
mod error;
mod grid;
mod header;
mod image_ops;
mod merge;
mod model;
mod normalize;
mod note;
mod ocr;
mod pdf_tables;
mod processor;
mod raster;
mod rows;

pub use columns::infer_column_centers;
pub use config::{
    DEFAULT_OCR_CONFIG, DEFAULT_OCR_LANGUAGE, OCR_CONFIG_ENV, OCR_LANGUAGE_ENV, ProcessorConfig,
};
pub use csv_out::{write_csv, write_csv_to_string, write_csv_to_writer};
pub use error::ExtractError;
pub use grid::detect_column_centers;
pub use image_ops::{OCR_TARGET_WIDTH, load_image};
pub use model::{
    BoundingBox, DetectedTable, ExtractionResponse, ExtractionResult, LineKey, PageTables,
    RawTable, Row, Table, Token,
};
pub use normalize::normalize_table;
pub use note::{Note, NoteCode};
pub use ocr::{
    MIN_TOKEN_CONFIDENCE, OcrEngine, TESSERACT_INSTALL_HINT, TesseractCli, filter_tokens,
    parse_tsv,
};
pub use pdf_tables::{PlumberTableReader, TableReader};
pub use processor::DocumentProcessor;
pub use raster::{POPPLER_INSTALL_HINT, PdfRasterizer, Pdftoppm, RASTER_DPI};
pub use rows::assemble_rows;
