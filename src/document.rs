//! Drives planning and page drawing for one document and serializes the result.

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::canvas::{DocumentBackend, PdfBackend};
use crate::config::{FontSource, RendererConfig};
use crate::error::RenderError;
use crate::metrics::{StandardMetrics, TextMeasurer, TtfMetrics};
use crate::model::{DocumentMetadata, ReportLayout, ReportRow};
use crate::plan::{plan, PageBudget};
use crate::progress::{self, page_percent, Progress};
use crate::sanitize::{sanitize, sanitize_layout, sanitize_metadata, sanitize_row};
use crate::table::{PageSlice, TableRenderer};

/// Sum of the quantity field over every row. Non-numeric and missing values count as zero.
pub fn aggregate_quantity(rows: &[ReportRow], quantity_key: &str) -> f64 {
    rows.iter()
        .filter_map(|row| row.get(quantity_key))
        .filter_map(|v| v.as_number())
        .sum()
}

fn now_stamp() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:02}-{:02}-{:04} {:02}:{:02}",
        now.day(),
        u8::from(now.month()),
        now.year(),
        now.hour(),
        now.minute()
    )
}

/// Inputs after sanitization, owned by one render call.
struct Prepared {
    rows: Vec<ReportRow>,
    layout: ReportLayout,
    metadata: DocumentMetadata,
    budget: PageBudget,
    generated_at: String,
}

/// Renders reports with one configuration. Holds no per-document state, so one
/// assembler can serve any number of sequential or concurrent renders.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    config: RendererConfig,
    generated_at: Option<String>,
}

impl DocumentAssembler {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            generated_at: None,
        }
    }

    /// Pin the footer timestamp instead of reading the clock at render time.
    pub fn with_generated_at(mut self, stamp: impl Into<String>) -> Self {
        self.generated_at = Some(stamp.into());
        self
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Plan the pages for `row_count` rows with this configuration.
    pub fn plan(&self, row_count: usize) -> Result<PageBudget, RenderError> {
        plan(row_count, &self.config.page, self.config.base_font_size)
    }

    /// Render `rows` into PDF bytes with the configured fonts.
    pub async fn render<P: FnMut(u8, &str)>(
        &self,
        rows: &[ReportRow],
        layout: &ReportLayout,
        metadata: &DocumentMetadata,
        progress: &mut Progress<P>,
    ) -> Result<Vec<u8>, RenderError> {
        progress.report(progress::PREPARING, "Preparing report");
        let title = sanitize(&metadata.title);

        match &self.config.fonts {
            FontSource::Builtin => {
                let backend = PdfBackend::builtin(&title, self.config.page)?;
                self.render_with(backend, &StandardMetrics, rows, layout, metadata, progress)
            }
            FontSource::Files { regular, bold } => {
                let regular_bytes = tokio::fs::read(regular)
                    .await
                    .map_err(|e| RenderError::Font(format!("{}: {e}", regular.display())))?;
                let bold_bytes = tokio::fs::read(bold)
                    .await
                    .map_err(|e| RenderError::Font(format!("{}: {e}", bold.display())))?;
                progress.report(progress::FONTS_LOADED, "Fonts loaded");

                let measurer = TtfMetrics::parse(&regular_bytes, &bold_bytes)?;
                let backend = PdfBackend::embedded(&title, self.config.page, &regular_bytes, &bold_bytes)?;
                self.render_with(backend, &measurer, rows, layout, metadata, progress)
            }
        }
    }

    /// Render onto any backend, measuring with `measurer`.
    ///
    /// The layout is validated and the page plan computed before the first page
    /// is created; a violation aborts with nothing drawn.
    pub fn render_with<B, M, P>(
        &self,
        mut backend: B,
        measurer: &M,
        rows: &[ReportRow],
        layout: &ReportLayout,
        metadata: &DocumentMetadata,
        progress: &mut Progress<P>,
    ) -> Result<B::Output, RenderError>
    where
        B: DocumentBackend,
        M: TextMeasurer + ?Sized,
        P: FnMut(u8, &str),
    {
        let prepared = self.prepare(rows, layout, metadata)?;
        let Prepared {
            rows,
            layout,
            metadata,
            budget,
            generated_at,
        } = &prepared;
        progress.report(progress::LAYOUT_PLANNED, "Layout planned");

        let renderer = TableRenderer {
            measurer,
            layout,
            metadata,
            budget,
            page: &self.config.page,
            style: &self.config.style,
            generated_at,
        };
        let total = aggregate_quantity(rows, &layout.quantity_key);

        progress.report(progress::CREATING_DOCUMENT, "Creating document");
        for index in 0..budget.total_pages {
            let range = budget.row_range(index, rows.len());
            let is_last = index + 1 == budget.total_pages;
            let slice = PageSlice {
                index,
                first_row: range.start,
                rows: &rows[range],
                aggregate: is_last.then_some(total),
            };
            let canvas = backend.begin_page()?;
            renderer.render_page(canvas, &slice);

            debug!(page = index + 1, total_pages = budget.total_pages, rows = slice.rows.len(), "page drawn");
            progress.report(
                page_percent(index, budget.total_pages),
                &format!("Rendered page {} of {}", index + 1, budget.total_pages),
            );
        }

        progress.report(progress::FINALIZING, "Finalizing document");
        let output = backend.finish()?;
        info!(
            rows = rows.len(),
            pages = budget.total_pages,
            kind = layout.kind.label(),
            "report rendered"
        );
        Ok(output)
    }

    fn prepare(
        &self,
        rows: &[ReportRow],
        layout: &ReportLayout,
        metadata: &DocumentMetadata,
    ) -> Result<Prepared, RenderError> {
        layout.validate()?;
        let content_width = self.config.page.content_width();
        if layout.table_width() > content_width {
            return Err(RenderError::LayoutInvariantViolation(format!(
                "table width {} exceeds page content width {content_width}",
                layout.table_width()
            )));
        }
        if layout.kind != metadata.kind {
            return Err(RenderError::LayoutInvariantViolation(format!(
                "layout is for {} reports but metadata is for {}",
                layout.kind.label(),
                metadata.kind.label()
            )));
        }
        let budget = self.plan(rows.len())?;
        let generated_at = self.generated_at.clone().unwrap_or_else(now_stamp);

        Ok(Prepared {
            rows: rows.iter().map(sanitize_row).collect(),
            layout: sanitize_layout(layout),
            metadata: sanitize_metadata(metadata),
            budget,
            generated_at: sanitize(&generated_at),
        })
    }
}
