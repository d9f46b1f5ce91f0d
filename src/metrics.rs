//! Text width measurement.
//!
//! Widths are reported in points. A character the font cannot encode is an
//! [`EncodingError`]; callers decide how to degrade.

use crate::error::{EncodingError, RenderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Regular,
    Bold,
}

pub trait TextMeasurer {
    fn width_of(&self, text: &str, font_size: f32, weight: FontWeight) -> Result<f32, EncodingError>;
}

// Advance widths (1/1000 em) for 0x20..=0x7E, from the Adobe core font AFMs.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

/// Metrics for the built-in Helvetica pair. Only printable ASCII is encodable.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMetrics;

impl TextMeasurer for StandardMetrics {
    fn width_of(&self, text: &str, font_size: f32, weight: FontWeight) -> Result<f32, EncodingError> {
        let table = match weight {
            FontWeight::Regular => &HELVETICA_WIDTHS,
            FontWeight::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        let mut units: u32 = 0;
        for ch in text.chars() {
            let idx = (ch as u32)
                .checked_sub(0x20)
                .filter(|i| (*i as usize) < table.len())
                .ok_or_else(|| EncodingError {
                    ch,
                    text: text.to_string(),
                })?;
            units += u32::from(table[idx as usize]);
        }
        Ok(units as f32 / 1000.0 * font_size)
    }
}

/// Metrics read from a pair of parsed TrueType faces.
pub struct TtfMetrics<'a> {
    regular: ttf_parser::Face<'a>,
    bold: ttf_parser::Face<'a>,
}

impl<'a> TtfMetrics<'a> {
    pub fn parse(regular: &'a [u8], bold: &'a [u8]) -> Result<Self, RenderError> {
        let regular = ttf_parser::Face::parse(regular, 0)
            .map_err(|e| RenderError::Font(format!("regular face: {e}")))?;
        let bold = ttf_parser::Face::parse(bold, 0)
            .map_err(|e| RenderError::Font(format!("bold face: {e}")))?;
        Ok(Self { regular, bold })
    }
}

impl TextMeasurer for TtfMetrics<'_> {
    fn width_of(&self, text: &str, font_size: f32, weight: FontWeight) -> Result<f32, EncodingError> {
        let face = match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        };
        let units_per_em = face.units_per_em() as f32;
        if units_per_em <= 0.0 {
            return Ok(0.0);
        }

        let mut width_units: i32 = 0;
        for ch in text.chars() {
            let gid = face.glyph_index(ch).ok_or_else(|| EncodingError {
                ch,
                text: text.to_string(),
            })?;
            width_units += face.glyph_hor_advance(gid).unwrap_or(0) as i32;
        }

        Ok(width_units as f32 / units_per_em * font_size)
    }
}
