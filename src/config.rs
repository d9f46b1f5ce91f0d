//! Renderer configuration and the embedded report layout presets.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RenderError};
use crate::model::ColumnSpec;

/// Fixed page dimensions in points (PDF user space, origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        // A4 portrait
        Self {
            width: 595.28,
            height: 841.89,
            margin: 40.0,
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        (self.width - 2.0 * self.margin).max(0.0)
    }

    pub fn content_height(&self) -> f32 {
        (self.height - 2.0 * self.margin).max(0.0)
    }
}

/// Gray levels (0 = black, 1 = white) and stroke widths for the table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableStyle {
    pub header_gray: f32,
    pub band_gray: f32,
    pub border_thickness: f32,
    pub separator_thickness: f32,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            header_gray: 0.85,
            band_gray: 0.95,
            border_thickness: 0.8,
            separator_thickness: 0.4,
        }
    }
}

/// Which font pair the document is drawn and measured with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FontSource {
    /// Standard Helvetica / Helvetica-Bold with built-in metrics.
    #[default]
    Builtin,
    /// TrueType files, embedded into the PDF and measured with their own tables.
    Files { regular: PathBuf, bold: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RendererConfig {
    pub page: PageGeometry,
    /// Data font size for small reports; larger reports step down from here.
    pub base_font_size: f32,
    pub style: TableStyle,
    pub fonts: FontSource,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            base_font_size: 9.0,
            style: TableStyle::default(),
            fonts: FontSource::Builtin,
        }
    }
}

impl RendererConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

/// Fixed strings drawn around the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportLabels {
    pub continued_suffix: String,
    pub generated_on: String,
    /// `{page}` and `{total}` are substituted.
    pub page_of: String,
    pub from: String,
    pub to: String,
    pub unit: String,
    pub category: String,
}

impl Default for ReportLabels {
    fn default() -> Self {
        Self {
            continued_suffix: "(Continued)".to_string(),
            generated_on: "Generated on".to_string(),
            page_of: "Page {page} of {total}".to_string(),
            from: "From".to_string(),
            to: "to".to_string(),
            unit: "Unit".to_string(),
            category: "Category".to_string(),
        }
    }
}

impl ReportLabels {
    pub fn page_of(&self, page: usize, total: usize) -> String {
        self.page_of
            .replace("{page}", &page.to_string())
            .replace("{total}", &total.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LayoutPreset {
    pub title: String,
    #[serde(default)]
    pub index_key: Option<String>,
    pub quantity_key: String,
    pub aggregate_label: String,
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LayoutPresetsFile {
    #[serde(default)]
    pub labels: ReportLabels,
    pub inward: LayoutPreset,
    pub outward: LayoutPreset,
}

static LAYOUT_PRESETS: OnceLock<Result<LayoutPresetsFile, String>> = OnceLock::new();

pub(crate) fn layout_presets() -> Result<&'static LayoutPresetsFile, RenderError> {
    let file = LAYOUT_PRESETS.get_or_init(|| {
        let json = include_str!("../assets/report_layouts.json");
        serde_json::from_str::<LayoutPresetsFile>(json)
            .map_err(|e| format!("failed to parse embedded assets/report_layouts.json: {e}"))
    });
    file.as_ref()
        .map_err(|e| RenderError::LayoutInvariantViolation(e.clone()))
}
