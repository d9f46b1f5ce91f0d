//! Drawing surfaces.
//!
//! The table renderer draws through [`Canvas`]; a [`DocumentBackend`] hands out
//! one canvas per page and serializes the finished document. Coordinates are
//! points with the origin at the bottom-left corner of the page.

use std::io::Cursor;

use printpdf::{
    path::PaintMode, BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerIndex, PdfLayerReference, PdfPageIndex, Point, Rect, Rgb,
};

use crate::config::PageGeometry;
use crate::error::RenderError;
use crate::metrics::FontWeight;

// PDF font sizes and our layout are in points; printpdf positions in millimeters.
const PT_TO_MM: f32 = 25.4 / 72.0;

fn mm(pt: f32) -> Mm {
    Mm(pt * PT_TO_MM)
}

pub trait Canvas {
    /// Draw `text` with its baseline starting at (`x`, `y`).
    fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, weight: FontWeight);
    /// Fill a rectangle whose bottom-left corner is (`x`, `y`).
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, gray: f32);
    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, thickness: f32);
    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32);
}

/// Owns the pages of one document while it is being drawn.
pub trait DocumentBackend {
    type Page: Canvas;
    type Output;

    /// Start the next page and return its canvas. The previous page is done.
    fn begin_page(&mut self) -> Result<&mut Self::Page, RenderError>;

    fn finish(self) -> Result<Self::Output, RenderError>;
}

pub struct PdfPage {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Canvas for PdfPage {
    fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, weight: FontWeight) {
        let font = match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        };
        self.layer.use_text(text, font_size, mm(x), mm(y), font);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, gray: f32) {
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(gray, gray, gray, None)));
        let rect = Rect::new(mm(x), mm(y), mm(x + width), mm(y + height)).with_mode(PaintMode::Fill);
        self.layer.add_rect(rect);
        // reset fill to black for text
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, thickness: f32) {
        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        self.layer.set_outline_thickness(thickness);
        let rect = Rect::new(mm(x), mm(y), mm(x + width), mm(y + height)).with_mode(PaintMode::Stroke);
        self.layer.add_rect(rect);
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32) {
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(mm(x1), mm(y1)), false),
                (Point::new(mm(x2), mm(y2)), false),
            ],
            is_closed: false,
        });
    }
}

/// printpdf-backed document.
pub struct PdfBackend {
    doc: PdfDocumentReference,
    page: PageGeometry,
    first: Option<(PdfPageIndex, PdfLayerIndex)>,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    current: Option<PdfPage>,
    pages: usize,
}

impl PdfBackend {
    /// Standard Helvetica pair, matched by [`crate::metrics::StandardMetrics`].
    pub fn builtin(title: &str, page: PageGeometry) -> Result<Self, RenderError> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(title, mm(page.width), mm(page.height), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Font(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Font(e.to_string()))?;
        Ok(Self::assemble(doc, page, (first_page, first_layer), regular, bold))
    }

    /// Embed a TrueType pair, matched by [`crate::metrics::TtfMetrics`].
    pub fn embedded(
        title: &str,
        page: PageGeometry,
        regular: &[u8],
        bold: &[u8],
    ) -> Result<Self, RenderError> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(title, mm(page.width), mm(page.height), "Layer 1");
        let regular = doc
            .add_external_font(Cursor::new(regular))
            .map_err(|e| RenderError::Font(e.to_string()))?;
        let bold = doc
            .add_external_font(Cursor::new(bold))
            .map_err(|e| RenderError::Font(e.to_string()))?;
        Ok(Self::assemble(doc, page, (first_page, first_layer), regular, bold))
    }

    fn assemble(
        doc: PdfDocumentReference,
        page: PageGeometry,
        first: (PdfPageIndex, PdfLayerIndex),
        regular: IndirectFontRef,
        bold: IndirectFontRef,
    ) -> Self {
        Self {
            doc,
            page,
            first: Some(first),
            regular,
            bold,
            current: None,
            pages: 0,
        }
    }
}

impl DocumentBackend for PdfBackend {
    type Page = PdfPage;
    type Output = Vec<u8>;

    fn begin_page(&mut self) -> Result<&mut PdfPage, RenderError> {
        // PdfDocument::new already created page one
        let (page_idx, layer_idx) = match self.first.take() {
            Some(first) => first,
            None => self.doc.add_page(
                mm(self.page.width),
                mm(self.page.height),
                format!("Page {} Layer 1", self.pages + 1),
            ),
        };
        self.pages += 1;
        let layer = self.doc.get_page(page_idx).get_layer(layer_idx);
        Ok(self.current.insert(PdfPage {
            layer,
            regular: self.regular.clone(),
            bold: self.bold.clone(),
        }))
    }

    fn finish(self) -> Result<Vec<u8>, RenderError> {
        drop(self.current);
        let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
        self.doc
            .save(&mut writer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| RenderError::Pdf(e.to_string()))
    }
}

/// One recorded drawing command.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        x: f32,
        y: f32,
        font_size: f32,
        weight: FontWeight,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        gray: f32,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
}

/// A page that keeps its commands instead of rendering them.
#[derive(Debug, Clone, Default)]
pub struct RecordingPage {
    pub ops: Vec<DrawOp>,
}

impl RecordingPage {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }

    pub fn find_text(&self, exact: &str) -> Option<&DrawOp> {
        self.ops
            .iter()
            .find(|op| matches!(op, DrawOp::Text { text, .. } if text == exact))
    }
}

impl Canvas for RecordingPage {
    fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, weight: FontWeight) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            font_size,
            weight,
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, gray: f32) {
        self.ops.push(DrawOp::FillRect {
            x,
            y,
            width,
            height,
            gray,
        });
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, _thickness: f32) {
        self.ops.push(DrawOp::StrokeRect {
            x,
            y,
            width,
            height,
        });
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, _thickness: f32) {
        self.ops.push(DrawOp::Line { x1, y1, x2, y2 });
    }
}

/// Backend that records every page; useful for layout previews and tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pages: Vec<RecordingPage>,
}

impl DocumentBackend for RecordingBackend {
    type Page = RecordingPage;
    type Output = Vec<RecordingPage>;

    fn begin_page(&mut self) -> Result<&mut RecordingPage, RenderError> {
        self.pages.push(RecordingPage::default());
        let last = self.pages.len() - 1;
        Ok(&mut self.pages[last])
    }

    fn finish(self) -> Result<Vec<RecordingPage>, RenderError> {
        Ok(self.pages)
    }
}
