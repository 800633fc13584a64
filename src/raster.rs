use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbImage;
use tracing::debug;

use crate::error::ExtractError;

pub const RASTER_DPI: u32 = 300;

pub const POPPLER_INSTALL_HINT: &str =
    "Failed to rasterize PDF for OCR. Install Poppler (provides pdftoppm) and retry.";

/// Renders every page of a PDF to a bitmap, in page order.
pub trait PdfRasterizer: Send + Sync {
    fn rasterize(&self, pdf: &[u8], dpi: u32) -> Result<Vec<RgbImage>, ExtractError>;
}

/// Shells out to Poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    command: PathBuf,
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self {
            command: PathBuf::from("pdftoppm"),
        }
    }
}

impl Pdftoppm {
    #[must_use]
    pub fn with_command(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// Page number from a `pdftoppm` output name such as `page-07.png`.
fn page_index(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let (prefix, number) = stem.rsplit_once('-')?;
    if prefix != "page" || path.extension()? != "png" {
        return None;
    }
    number.parse().ok()
}

impl PdfRasterizer for Pdftoppm {
    fn rasterize(&self, pdf: &[u8], dpi: u32) -> Result<Vec<RgbImage>, ExtractError> {
        let workdir = tempfile::tempdir()
            .map_err(|error| ExtractError::Rasterization(format!("no scratch directory: {error}")))?;
        let input = workdir.path().join("input.pdf");
        std::fs::write(&input, pdf)
            .map_err(|error| ExtractError::Rasterization(format!("cannot stage PDF: {error}")))?;

        let output = Command::new(&self.command)
            .args(["-r", &dpi.to_string(), "-png"])
            .arg(&input)
            .arg(workdir.path().join("page"))
            .output()
            .map_err(|error| {
                let reason = if error.kind() == ErrorKind::NotFound {
                    format!("'{}' was not found", self.command.display())
                } else {
                    error.to_string()
                };
                ExtractError::Rasterization(reason)
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Rasterization(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let mut rendered = std::fs::read_dir(workdir.path())
            .map_err(|error| ExtractError::Rasterization(format!("cannot list pages: {error}")))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter_map(|path| page_index(&path).map(|index| (index, path)))
            .collect::<Vec<_>>();
        rendered.sort_by_key(|(index, _)| *index);
        if rendered.is_empty() {
            return Err(ExtractError::Rasterization(
                "pdftoppm produced no pages".to_string(),
            ));
        }

        debug!(pages = rendered.len(), dpi, "rasterized PDF");
        rendered
            .into_iter()
            .map(|(_, path)| {
                image::open(&path)
                    .map(|page| page.to_rgb8())
                    .map_err(|error| ExtractError::Rasterization(format!("unreadable page: {error}")))
            })
            .collect()
    }
}
