//! Report data model: rows, cell values, column layouts and document metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

use crate::config::{layout_presets, ReportLabels};
use crate::error::{DateParseError, RenderError};

/// One primitive cell value as supplied by the report feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Numeric interpretation used for aggregation. Text is parsed leniently.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) if v.is_finite() => Some(*v),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(v) => !v.is_finite(),
            CellValue::Bool(_) => false,
        }
    }

    pub fn display(&self) -> String {
        match self {
            CellValue::Number(v) => format_number(*v),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => (if *b { "Yes" } else { "No" }).to_string(),
            CellValue::Null => String::new(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Whole numbers without decimals, everything else with at most two.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        return format!("{}", v as i64);
    }
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-0" { "0".to_string() } else { s.to_string() }
}

/// A flat record keyed by column key.
pub type ReportRow = BTreeMap<String, CellValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub title: String,
    pub key: String,
    /// Column width in points.
    pub width: f32,
    #[serde(default)]
    pub align: Align,
}

/// Which of the two stock report variants is being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Inward,
    Outward,
}

impl ReportKind {
    pub fn from_variant_a(is_inward: bool) -> Self {
        if is_inward {
            ReportKind::Inward
        } else {
            ReportKind::Outward
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::Inward => "Inward",
            ReportKind::Outward => "Outward",
        }
    }
}

/// Column set, titles, and aggregate settings for one report kind.
///
/// Resolved once before layout so nothing downstream branches on the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLayout {
    pub kind: ReportKind,
    /// Report-kind line, e.g. "Inward Report".
    pub title: String,
    pub columns: Vec<ColumnSpec>,
    /// Column whose cells show the 1-based row number.
    #[serde(default)]
    pub index_key: Option<String>,
    /// Column summed into the aggregate row.
    pub quantity_key: String,
    pub aggregate_label: String,
    #[serde(default)]
    pub labels: ReportLabels,
}

impl ReportLayout {
    /// Pick the embedded preset for `kind`.
    pub fn resolve(kind: ReportKind) -> Result<Self, RenderError> {
        let presets = layout_presets()?;
        let preset = match kind {
            ReportKind::Inward => &presets.inward,
            ReportKind::Outward => &presets.outward,
        };
        let layout = ReportLayout {
            kind,
            title: preset.title.clone(),
            columns: preset.columns.clone(),
            index_key: preset.index_key.clone(),
            quantity_key: preset.quantity_key.clone(),
            aggregate_label: preset.aggregate_label.clone(),
            labels: presets.labels.clone(),
        };
        layout.validate()?;
        Ok(layout)
    }

    pub fn table_width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    pub fn quantity_column_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c.key == self.quantity_key)
    }

    /// Left edge offset (from the table's left edge) of column `index`.
    pub fn column_offset(&self, index: usize) -> f32 {
        self.columns.iter().take(index).map(|c| c.width).sum()
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.columns.is_empty() {
            return Err(RenderError::LayoutInvariantViolation(
                "column list is empty".to_string(),
            ));
        }
        if let Some(bad) = self
            .columns
            .iter()
            .find(|c| !(c.width.is_finite() && c.width > 0.0))
        {
            return Err(RenderError::LayoutInvariantViolation(format!(
                "column {:?} has non-positive width {}",
                bad.key, bad.width
            )));
        }
        if self.quantity_column_index().is_none() {
            return Err(RenderError::LayoutInvariantViolation(format!(
                "quantity column {:?} is not part of the column list",
                self.quantity_key
            )));
        }
        Ok(())
    }
}

/// Title-block and filename inputs for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub customer_name: String,
    pub kind: ReportKind,
    #[serde(with = "report_date")]
    pub from: Date,
    #[serde(with = "report_date")]
    pub to: Date,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Parse a report date as a plain calendar value.
///
/// Accepts `YYYY-MM-DD`, or an ISO timestamp whose date part is taken verbatim.
/// No time-zone conversion is applied, so no day-shift compensation is needed.
pub fn parse_report_date(input: &str) -> Result<Date, DateParseError> {
    let trimmed = input.trim();
    let date_part = match trimmed.char_indices().nth(10) {
        Some((idx, 'T' | 't' | ' ')) => &trimmed[..idx],
        _ => trimmed,
    };
    Date::parse(date_part, format_description!("[year]-[month]-[day]")).map_err(|_| {
        DateParseError {
            input: input.to_string(),
        }
    })
}

/// `YYYY-MM-DD`
pub fn format_iso_date(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

/// `DD-MM-YYYY`
pub fn format_display_date(d: Date) -> String {
    format!("{:02}-{:02}-{:04}", d.day(), u8::from(d.month()), d.year())
}

mod report_date {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_iso_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_report_date(&raw).map_err(D::Error::custom)
    }
}
