//! Column centers from the vertical ruling lines of a bordered table.
//!
//! The bitmap is binarized (ink = foreground), vertical strokes are isolated with
//! a tall 1-pixel-wide opening, and only strokes spanning at least half the page
//! height count as separators. Columns sit midway between neighbouring separators.

use image::{GrayImage, Luma, RgbImage};
use image::imageops::grayscale;
use imageproc::contours::{BorderType, find_contours};
use imageproc::contrast::otsu_level;
use tracing::debug;

const FOREGROUND: u8 = 255;
const MORPH_ITERATIONS: usize = 2;
const MIN_KERNEL_HEIGHT: u32 = 10;
const KERNEL_HEIGHT_DIVISOR: u32 = 40;
const MIN_LINE_HEIGHT_RATIO: f32 = 0.5;
const LINE_MERGE_DISTANCE: f32 = 5.0;

fn binarize_inverted(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] <= level {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    })
}

/// Vertical erosion (`keep_all`) or dilation with a `kernel_height` x 1 rectangle.
/// Window rows outside the image are ignored.
fn vertical_morph(image: &GrayImage, kernel_height: u32, keep_all: bool) -> GrayImage {
    let (width, height) = image.dimensions();
    let above = kernel_height / 2;
    let below = kernel_height - 1 - above;
    let mut out = GrayImage::new(width, height);
    let mut prefix = vec![0_u32; height as usize + 1];

    for x in 0..width {
        for y in 0..height {
            let on = u32::from(image.get_pixel(x, y)[0] > 0);
            prefix[y as usize + 1] = prefix[y as usize] + on;
        }
        for y in 0..height {
            let start = y.saturating_sub(above);
            let end = (y + below).min(height - 1);
            let on = prefix[end as usize + 1] - prefix[start as usize];
            let span = end - start + 1;
            let set = if keep_all { on == span } else { on > 0 };
            if set {
                out.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
    }

    out
}

fn isolate_vertical_strokes(binary: &GrayImage) -> GrayImage {
    let kernel_height = (binary.height() / KERNEL_HEIGHT_DIVISOR).max(MIN_KERNEL_HEIGHT);
    let mut strokes = binary.clone();
    for _ in 0..MORPH_ITERATIONS {
        strokes = vertical_morph(&strokes, kernel_height, true);
    }
    for _ in 0..MORPH_ITERATIONS {
        strokes = vertical_morph(&strokes, kernel_height, false);
    }
    strokes
}

/// Horizontal centers of outer contours at least half the image tall.
#[allow(clippy::cast_precision_loss)]
fn separator_positions(strokes: &GrayImage) -> Vec<f32> {
    let min_height = strokes.height() as f32 * MIN_LINE_HEIGHT_RATIO;
    find_contours::<u32>(strokes)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(|contour| {
            let xs = contour.points.iter().map(|point| point.x);
            let ys = contour.points.iter().map(|point| point.y);
            let (min_x, max_x) = (xs.clone().min()?, xs.max()?);
            let (min_y, max_y) = (ys.clone().min()?, ys.max()?);
            let box_width = (max_x - min_x + 1) as f32;
            let box_height = (max_y - min_y + 1) as f32;
            (box_height >= min_height).then_some(min_x as f32 + box_width / 2.0)
        })
        .collect()
}

fn merge_close_positions(mut positions: Vec<f32>) -> Vec<f32> {
    positions.sort_by(f32::total_cmp);
    let mut merged: Vec<f32> = Vec::with_capacity(positions.len());
    for position in positions {
        if merged
            .last()
            .is_none_or(|last| position - last > LINE_MERGE_DISTANCE)
        {
            merged.push(position);
        }
    }
    merged
}

/// Column centers between detected vertical grid lines, or `None` with fewer than two lines.
pub fn detect_column_centers(image: &RgbImage) -> Option<Vec<f32>> {
    if image.width() == 0 || image.height() == 0 {
        return None;
    }

    let binary = binarize_inverted(&grayscale(image));
    let strokes = isolate_vertical_strokes(&binary);
    let lines = merge_close_positions(separator_positions(&strokes));
    debug!(lines = lines.len(), "vertical grid lines detected");
    if lines.len() < 2 {
        return None;
    }

    Some(
        lines
            .windows(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect(),
    )
}
