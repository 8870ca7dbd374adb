use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::ReportError;

/// A4 portrait, in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EmbeddedImage {
    id: ObjectId,
    pub width: u32,
    pub height: u32,
}

/// Minimal page-by-page PDF writer over a `lopdf` object graph, using the
/// standard Helvetica faces so no font has to be embedded.
pub struct PdfWriter {
    document: Document,
    pages_id: ObjectId,
    fonts: Dictionary,
    page_ids: Vec<ObjectId>,
}

impl PdfWriter {
    pub fn new() -> PdfWriter {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();

        let mut fonts = Dictionary::new();
        for (font, base) in [(Font::Regular, "Helvetica"), (Font::Bold, "Helvetica-Bold")] {
            let id = document.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base,
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), id);
        }

        PdfWriter {
            document,
            pages_id,
            fonts,
            page_ids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Decodes an image file and stores it as a compressed RGB XObject.
    pub fn embed_image(&mut self, path: &Path) -> Result<EmbeddedImage, ReportError> {
        let pixels = image::open(path)?.to_rgb8();
        let (width, height) = pixels.dimensions();

        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        let id = self.document.add_object(Stream::new(dict, deflate(pixels.as_raw())?));

        Ok(EmbeddedImage { id, width, height })
    }

    pub fn add_page(&mut self, page: Page) -> Result<(), ReportError> {
        let content = Content { operations: page.operations };
        let content_id = self
            .document
            .add_object(Stream::new(dictionary! { "Filter" => "FlateDecode" }, deflate(&content.encode()?)?));

        let mut xobjects = Dictionary::new();
        for (name, id) in page.images {
            xobjects.set(name, id);
        }

        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => self.fonts.clone(),
                "XObject" => xobjects,
            },
        });
        self.page_ids.push(page_id);

        Ok(())
    }

    pub fn save(mut self, path: &Path) -> Result<(), ReportError> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
            }),
        );

        let catalog_id = self.document.add_object(dictionary! { "Type" => "Catalog", "Pages" => self.pages_id });
        self.document.trailer.set("Root", catalog_id);

        let mut writer = BufWriter::new(File::create(path)?);
        self.document.save_to(&mut writer)?;
        writer.flush()?;

        Ok(())
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        PdfWriter::new()
    }
}

/// Drawing operations of one page. Coordinates are PDF points from the
/// bottom-left corner.
#[derive(Default)]
pub struct Page {
    operations: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
}

impl Page {
    pub fn new() -> Page {
        Page::default()
    }

    pub fn text(&mut self, font: Font, size: f32, x: f32, y: f32, text: &str) {
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new("Tf", vec![font.resource_name().into(), size.into()]));
        self.operations.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.operations.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi(text), StringFormat::Literal)],
        ));
        self.operations.push(Operation::new("ET", vec![]));
    }

    /// Draws `text` so that it ends at `right`.
    pub fn text_right(&mut self, font: Font, size: f32, right: f32, y: f32, text: &str) {
        self.text(font, size, right - text_width(text, size), y, text);
    }

    pub fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        self.operations.push(Operation::new("w", vec![0.5.into()]));
        self.operations.push(Operation::new("m", vec![x0.into(), y0.into()]));
        self.operations.push(Operation::new("l", vec![x1.into(), y1.into()]));
        self.operations.push(Operation::new("S", vec![]));
    }

    pub fn image(&mut self, image: &EmbeddedImage, x: f32, y: f32, width: f32, height: f32) {
        let name = format!("Im{}", self.images.len() + 1);
        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new(
            "cm",
            vec![width.into(), 0.into(), 0.into(), height.into(), x.into(), y.into()],
        ));
        self.operations.push(Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]));
        self.operations.push(Operation::new("Q", vec![]));
        self.images.push((name, image.id));
    }
}

fn deflate(bytes: &[u8]) -> Result<Vec<u8>, ReportError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Latin-1 characters keep their code point, anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7e | 0xa0..=0xff) => code as u8,
            0x2019 => 0x92,
            _ => b'?',
        })
        .collect()
}

/// Helvetica advance widths for printable ASCII, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' to '/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // digits
    278, 278, 584, 584, 584, 556, 1015, // ':' to '@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A' to 'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N' to 'Z'
    278, 278, 278, 469, 556, 333, // '[' to '`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a' to 'm'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n' to 'z'
    334, 260, 334, 584, // '{' to '~'
];

pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c as u32 {
            code @ 0x20..=0x7e => HELVETICA_WIDTHS[(code - 0x20) as usize] as u32,
            _ => 556,
        })
        .sum();

    units as f32 * size / 1000.0
}
