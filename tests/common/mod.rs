#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bankcsv::{
    BoundingBox, ExtractError, LineKey, OcrEngine, PageTables, PdfRasterizer, TableReader, Token,
};
use image::{ImageFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const TABLE_LEFT: i64 = 72;
const TABLE_TOP: i64 = 680;
const COLUMN_WIDTH: i64 = 110;
const ROW_HEIGHT: i64 = 24;

/// One statement page: letterhead lines over an optional ruled table.
pub struct StatementPage<'a> {
    pub letterhead: Vec<&'a str>,
    pub table: Vec<Vec<&'a str>>,
}

impl<'a> StatementPage<'a> {
    pub fn ruled(table: Vec<Vec<&'a str>>) -> Self {
        Self {
            letterhead: vec!["Banco del Sur", "Estado de cuenta"],
            table,
        }
    }

    pub fn letterhead_only(letterhead: Vec<&'a str>) -> Self {
        Self {
            letterhead,
            table: Vec::new(),
        }
    }
}

/// Letterhead text shown through `TJ` with kerning every few glyphs, the way
/// statement generators lay out their headers.
fn kerned_line(line: &str) -> Object {
    let chars = line.chars().collect::<Vec<_>>();
    let mut parts = Vec::new();
    for (index, chunk) in chars.chunks(3).enumerate() {
        if index > 0 {
            parts.push(Object::Integer(-15));
        }
        parts.push(Object::string_literal(chunk.iter().collect::<String>()));
    }
    Object::Array(parts)
}

fn stroke(operations: &mut Vec<Operation>, from: (i64, i64), to: (i64, i64)) {
    operations.push(Operation::new("m", vec![from.0.into(), from.1.into()]));
    operations.push(Operation::new("l", vec![to.0.into(), to.1.into()]));
    operations.push(Operation::new("S", vec![]));
}

fn page_operations(page: &StatementPage<'_>) -> Vec<Operation> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 11.into()]),
        Operation::new("TL", vec![15.into()]),
        Operation::new("Td", vec![TABLE_LEFT.into(), 750.into()]),
    ];
    for (index, line) in page.letterhead.iter().enumerate() {
        if index > 0 {
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("TJ", vec![kerned_line(line)]));
    }
    operations.push(Operation::new("ET", vec![]));

    let columns = page.table.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return operations;
    }
    let rows = i64::try_from(page.table.len()).expect("row count fits");
    let width = i64::try_from(columns).expect("column count fits") * COLUMN_WIDTH;
    let bottom = TABLE_TOP - rows * ROW_HEIGHT;

    operations.push(Operation::new("q", vec![]));
    operations.push(Operation::new("w", vec![1.into()]));
    for row in 0..=rows {
        let y = TABLE_TOP - row * ROW_HEIGHT;
        stroke(&mut operations, (TABLE_LEFT, y), (TABLE_LEFT + width, y));
    }
    for column in 0..=i64::try_from(columns).expect("column count fits") {
        let x = TABLE_LEFT + column * COLUMN_WIDTH;
        stroke(&mut operations, (x, bottom), (x, TABLE_TOP));
    }
    operations.push(Operation::new("Q", vec![]));

    for (row, cells) in (0_i64..).zip(&page.table) {
        for (column, cell) in (0_i64..).zip(cells) {
            if cell.is_empty() {
                continue;
            }
            let x = TABLE_LEFT + column * COLUMN_WIDTH + 6;
            let y = TABLE_TOP - row * ROW_HEIGHT - 16;
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![x.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(*cell)]),
                Operation::new("ET", vec![]),
            ]);
        }
    }
    operations
}

/// Builds a statement PDF with Helvetica text and stroked table rulings.
pub fn statement_pdf(pages: &[StatementPage<'_>]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut page_ids = Vec::new();
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            },
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

pub fn write_statement_pdf(
    path: &Path,
    pages: &[StatementPage<'_>],
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, statement_pdf(pages)?)?;
    Ok(())
}

pub fn white_page(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
}

/// White page with full-height black rulings, 3 px wide, starting at each `x`.
pub fn ruled_page(width: u32, height: u32, rulings: &[u32]) -> RgbImage {
    let mut image = white_page(width, height);
    for &x in rulings {
        for dx in 0..3 {
            for y in 0..height {
                image.put_pixel(x + dx, y, Rgb([0, 0, 0]));
            }
        }
    }
    image
}

pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("PNG should encode");
    bytes.into_inner()
}

pub fn word(text: &str, left: f32, top: f32, width: f32, line: u32, confidence: f32) -> Token {
    Token {
        text: text.to_string(),
        bbox: BoundingBox {
            left,
            top,
            width,
            height: 30.0,
        },
        confidence: Some(confidence),
        line: LineKey {
            block: 1,
            paragraph: 1,
            line,
        },
    }
}

/// Returns the same words for every bitmap and counts how often it ran.
#[derive(Clone)]
pub struct ScriptedOcr {
    tokens: Vec<Token>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedOcr {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl OcrEngine for ScriptedOcr {
    fn recognize(
        &self,
        _image: &RgbImage,
        _language: &str,
        _config: &str,
    ) -> Result<Vec<Token>, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tokens.clone())
    }
}

pub struct MissingOcr;

impl OcrEngine for MissingOcr {
    fn recognize(
        &self,
        _image: &RgbImage,
        _language: &str,
        _config: &str,
    ) -> Result<Vec<Token>, ExtractError> {
        Err(ExtractError::EngineUnavailable(
            "tesseract is not installed".to_string(),
        ))
    }
}

pub struct BrokenTableReader;

impl TableReader for BrokenTableReader {
    fn read_tables(&self, _pdf: &[u8]) -> Result<Vec<PageTables>, ExtractError> {
        Err(ExtractError::StructuredExtraction(
            "no ruling lines in document".to_string(),
        ))
    }
}

pub struct FixedPages(pub Vec<RgbImage>);

impl PdfRasterizer for FixedPages {
    fn rasterize(&self, _pdf: &[u8], _dpi: u32) -> Result<Vec<RgbImage>, ExtractError> {
        Ok(self.0.clone())
    }
}

pub struct BrokenRasterizer;

impl PdfRasterizer for BrokenRasterizer {
    fn rasterize(&self, _pdf: &[u8], _dpi: u32) -> Result<Vec<RgbImage>, ExtractError> {
        Err(ExtractError::Rasterization("'pdftoppm' was not found".to_string()))
    }
}
