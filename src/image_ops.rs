use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use tracing::debug;

use crate::error::ExtractError;

/// Narrower images are upscaled to this width before OCR.
pub const OCR_TARGET_WIDTH: u32 = 2000;

/// Decodes image bytes to RGB, honoring the EXIF orientation tag.
pub fn load_image(bytes: &[u8]) -> Result<RgbImage, ExtractError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image.to_rgb8())
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn upscale_for_ocr(image: RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || width >= OCR_TARGET_WIDTH {
        return image;
    }

    let scale = f64::from(OCR_TARGET_WIDTH) / f64::from(width);
    let new_height = ((f64::from(height) * scale) as u32).max(1);
    debug!(width, height, new_height, "upscaling image for OCR");
    imageops::resize(&image, OCR_TARGET_WIDTH, new_height, FilterType::CatmullRom)
}
