use std::fmt::{Display, Formatter};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteCode {
    StructuredExtraction,
    StructuredFallback,
    LowConfidenceTable,
    RasterizationFailed,
    OcrApplied,
    OcrFailed,
    EngineUnavailable,
    ImageDecodeFailed,
    NoTextDetected,
}

/// A human-readable record of a fallback or degradation taken while extracting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub code: NoteCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl Note {
    #[must_use]
    pub fn new(code: NoteCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

impl Display for Note {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
