//! OCR collaborators and the word-token filter applied to their output.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

use image::RgbImage;
use tracing::debug;

use crate::error::ExtractError;
use crate::model::{BoundingBox, LineKey, Token};

/// Tokens at or below this confidence never reach a table cell.
pub const MIN_TOKEN_CONFIDENCE: f32 = 40.0;

pub const TESSERACT_INSTALL_HINT: &str =
    "Tesseract OCR engine is not installed or not on PATH. Install it and try again.";

/// Word-level OCR over a bitmap.
///
/// Implementations return every word they saw, unfiltered; an unavailable engine
/// must be reported as [`ExtractError::EngineUnavailable`].
pub trait OcrEngine: Send + Sync {
    fn recognize(
        &self,
        image: &RgbImage,
        language: &str,
        config: &str,
    ) -> Result<Vec<Token>, ExtractError>;
}

/// Runs the `tesseract` executable and reads its TSV word table.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: PathBuf,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            command: PathBuf::from("tesseract"),
        }
    }
}

impl TesseractCli {
    #[must_use]
    pub fn with_command(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(
        &self,
        image: &RgbImage,
        language: &str,
        config: &str,
    ) -> Result<Vec<Token>, ExtractError> {
        let extra_args = shlex::split(config).ok_or_else(|| {
            ExtractError::InvalidOption(format!("OCR config has unbalanced quoting: '{config}'"))
        })?;

        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("input.png");
        image.save(&input)?;

        let output = Command::new(&self.command)
            .arg(&input)
            .arg("stdout")
            .args(["-l", language])
            .args(&extra_args)
            .arg("tsv")
            .output()
            .map_err(|error| {
                if error.kind() == ErrorKind::NotFound {
                    ExtractError::EngineUnavailable(format!(
                        "'{}' was not found: {error}",
                        self.command.display()
                    ))
                } else {
                    ExtractError::Ocr(format!("failed to run tesseract: {error}"))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let tokens = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!(tokens = tokens.len(), "tesseract returned words");
        Ok(tokens)
    }
}

fn parse_row(line: &str) -> Option<Token> {
    let fields = line.splitn(12, '\t').collect::<Vec<_>>();
    if fields.len() < 11 {
        return None;
    }

    let number = |index: usize| fields[index].trim().parse::<u32>().ok();
    let coordinate = |index: usize| fields[index].trim().parse::<f32>().ok();

    Some(Token {
        text: fields.get(11).map_or_else(String::new, |text| (*text).to_string()),
        bbox: BoundingBox {
            left: coordinate(6)?,
            top: coordinate(7)?,
            width: coordinate(8)?,
            height: coordinate(9)?,
        },
        confidence: fields[10].trim().parse::<f32>().ok(),
        line: LineKey {
            block: number(2)?,
            paragraph: number(3)?,
            line: number(4)?,
        },
    })
}

/// Parses Tesseract's TSV output
/// (`level page block par line word left top width height conf text`).
pub fn parse_tsv(tsv: &str) -> Vec<Token> {
    tsv.lines()
        .filter(|line| !line.starts_with("level\t"))
        .filter_map(parse_row)
        .collect()
}

/// Drops blank words and words whose confidence is missing or too low.
pub fn filter_tokens(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|token| !token.text.trim().is_empty())
        .filter(|token| {
            token
                .confidence
                .is_some_and(|confidence| confidence > MIN_TOKEN_CONFIDENCE)
        })
        .collect()
}
