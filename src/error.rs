use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] pdfplumber::PdfError),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("structured table extraction failed: {0}")]
    StructuredExtraction(String),

    #[error("failed to rasterize PDF: {0}")]
    Rasterization(String),

    #[error("OCR engine is unavailable: {0}")]
    EngineUnavailable(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("PDF contains no pages")]
    NoPages,

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

impl ExtractError {
    /// Errors that abort a whole document instead of a single page or table.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::EngineUnavailable(_) | Self::Rasterization(_))
    }
}
