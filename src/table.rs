//! Draws one page of the report: header block, table, aggregate row, footer.

use tracing::debug;

use crate::canvas::Canvas;
use crate::config::{PageGeometry, TableStyle};
use crate::metrics::{FontWeight, TextMeasurer};
use crate::model::{
    format_display_date, format_number, Align, ColumnSpec, DocumentMetadata, ReportLayout,
    ReportRow,
};
use crate::plan::{PageBudget, CONTINUATION_HEADER_HEIGHT, TITLE_BLOCK_HEIGHT};
use crate::wrap::{block_baselines, line_height, wrap};

const CELL_PAD_X: f32 = 4.0;
const FOOTER_BASELINE_OFFSET: f32 = 12.0;
const PLACEHOLDER: &str = "-";
const ELLIPSIS: &str = "...";

/// The rows drawn on one page, plus what only the last page carries.
#[derive(Debug, Clone, Copy)]
pub struct PageSlice<'r> {
    pub index: usize,
    /// Position of `rows[0]` in the whole document (0-based).
    pub first_row: usize,
    pub rows: &'r [ReportRow],
    /// Quantity total over every row in the document; `Some` on the last page only.
    pub aggregate: Option<f64>,
}

/// Borrowed, read-only inputs shared by every page of one document.
pub struct TableRenderer<'a, M: ?Sized> {
    pub measurer: &'a M,
    pub layout: &'a ReportLayout,
    pub metadata: &'a DocumentMetadata,
    pub budget: &'a PageBudget,
    pub page: &'a PageGeometry,
    pub style: &'a TableStyle,
    /// Already sanitized generation timestamp.
    pub generated_at: &'a str,
}

impl<M: TextMeasurer + ?Sized> TableRenderer<'_, M> {
    pub fn render_page<C: Canvas + ?Sized>(&self, canvas: &mut C, slice: &PageSlice<'_>) {
        let top = self.page.height - self.page.margin;
        let table_top = if slice.index == 0 {
            self.draw_title_block(canvas, top);
            top - TITLE_BLOCK_HEIGHT
        } else {
            self.draw_continuation_header(canvas, top);
            top - CONTINUATION_HEADER_HEIGHT
        };

        let bottom = self.draw_table(canvas, table_top, slice);
        if let Some(total) = slice.aggregate {
            self.draw_aggregate_row(canvas, bottom, total);
        }
        self.draw_footer(canvas, slice.index);
    }

    fn draw_title_block<C: Canvas + ?Sized>(&self, canvas: &mut C, top: f32) {
        let fs = self.budget.font_size;
        let labels = &self.layout.labels;

        self.draw_centered(canvas, &self.metadata.title, top - 16.0, fs + 6.0, FontWeight::Bold);
        if !self.metadata.subtitle.trim().is_empty() {
            self.draw_centered(canvas, &self.metadata.subtitle, top - 34.0, fs + 2.0, FontWeight::Regular);
        }

        let mut kind_line = self.layout.title.clone();
        if let Some(unit) = self.metadata.unit.as_deref().filter(|u| !u.trim().is_empty()) {
            kind_line.push_str(&format!(" | {}: {}", labels.unit, unit));
        }
        if let Some(cat) = self.metadata.category.as_deref().filter(|c| !c.trim().is_empty()) {
            kind_line.push_str(&format!(" | {}: {}", labels.category, cat));
        }
        self.draw_centered(canvas, &kind_line, top - 54.0, fs + 3.0, FontWeight::Bold);

        let range = format!(
            "{} {} {} {}",
            labels.from,
            format_display_date(self.metadata.from),
            labels.to,
            format_display_date(self.metadata.to)
        );
        self.draw_centered(canvas, &range, top - 72.0, fs + 1.0, FontWeight::Regular);
    }

    fn draw_continuation_header<C: Canvas + ?Sized>(&self, canvas: &mut C, top: f32) {
        let text = format!("{} {}", self.layout.title, self.layout.labels.continued_suffix);
        self.draw_centered(canvas, &text, top - 18.0, self.budget.font_size + 2.0, FontWeight::Bold);
    }

    /// Draws header row and data rows; returns the y of the table's bottom edge.
    fn draw_table<C: Canvas + ?Sized>(&self, canvas: &mut C, table_top: f32, slice: &PageSlice<'_>) -> f32 {
        let left = self.page.margin;
        let rh = self.budget.row_height;
        let width = self.layout.table_width();
        let height = (slice.rows.len() + 1) as f32 * rh;
        let bottom = table_top - height;

        // fills first so borders and text stay on top
        canvas.fill_rect(left, table_top - rh, width, rh, self.style.header_gray);
        for i in 0..slice.rows.len() {
            if (slice.first_row + i) % 2 == 1 {
                let row_top = table_top - (i + 1) as f32 * rh;
                canvas.fill_rect(left, row_top - rh, width, rh, self.style.band_gray);
            }
        }

        canvas.stroke_rect(left, bottom, width, height, self.style.border_thickness);
        if let Some((_, inner)) = self.layout.columns.split_last() {
            let mut x = left;
            for col in inner {
                x += col.width;
                canvas.line(x, table_top, x, bottom, self.style.separator_thickness);
            }
        }

        let header_center = table_top - rh / 2.0;
        let mut x = left;
        for col in &self.layout.columns {
            self.draw_cell(
                canvas,
                &col.title,
                x,
                col.width,
                col.align,
                header_center,
                self.budget.header_font_size,
                FontWeight::Bold,
            );
            x += col.width;
        }
        canvas.line(left, table_top - rh, left + width, table_top - rh, self.style.border_thickness);

        for (i, row) in slice.rows.iter().enumerate() {
            let row_top = table_top - (i + 1) as f32 * rh;
            let row_number = slice.first_row + i + 1;
            let mut x = left;
            for col in &self.layout.columns {
                let text = self.cell_text(row, col, row_number);
                self.draw_cell(
                    canvas,
                    &text,
                    x,
                    col.width,
                    col.align,
                    row_top - rh / 2.0,
                    self.budget.font_size,
                    FontWeight::Regular,
                );
                x += col.width;
            }
            canvas.line(left, row_top - rh, left + width, row_top - rh, self.style.separator_thickness);
        }

        bottom
    }

    fn draw_aggregate_row<C: Canvas + ?Sized>(&self, canvas: &mut C, top: f32, total: f64) {
        let left = self.page.margin;
        let rh = self.budget.row_height;
        let width = self.layout.table_width();
        let center = top - rh / 2.0;
        canvas.stroke_rect(left, top - rh, width, rh, self.style.border_thickness);

        let Some(qty_idx) = self.layout.quantity_column_index() else {
            return;
        };
        let qty_col = &self.layout.columns[qty_idx];
        let qty_x = left + self.layout.column_offset(qty_idx);
        canvas.line(qty_x, top, qty_x, top - rh, self.style.separator_thickness);
        let qty_right = qty_x + qty_col.width;
        if qty_idx + 1 < self.layout.columns.len() {
            canvas.line(qty_right, top, qty_right, top - rh, self.style.separator_thickness);
        }

        // label spans the columns left of the quantity, or right of it when it is first
        let (label_x, label_w, label_align) = if qty_idx > 0 {
            (left, qty_x - left, Align::Right)
        } else {
            (qty_right, left + width - qty_right, Align::Left)
        };
        if label_w > 0.0 {
            self.draw_cell(
                canvas,
                &self.layout.aggregate_label,
                label_x,
                label_w,
                label_align,
                center,
                self.budget.font_size,
                FontWeight::Bold,
            );
        }
        self.draw_cell(
            canvas,
            &format_number(total.round()),
            qty_x,
            qty_col.width,
            qty_col.align,
            center,
            self.budget.font_size,
            FontWeight::Bold,
        );
    }

    fn draw_footer<C: Canvas + ?Sized>(&self, canvas: &mut C, page_index: usize) {
        let fs = self.budget.font_size;
        let y = self.page.margin + FOOTER_BASELINE_OFFSET;
        let left = self.page.margin;
        let right = self.page.width - self.page.margin;

        let stamp = format!("{}: {}", self.layout.labels.generated_on, self.generated_at);
        canvas.draw_text(&stamp, left, y, fs, FontWeight::Regular);

        let page_of = self
            .layout
            .labels
            .page_of(page_index + 1, self.budget.total_pages);
        let w = self
            .measurer
            .width_of(&page_of, fs, FontWeight::Regular)
            .unwrap_or(0.0);
        canvas.draw_text(&page_of, (right - w).max(left), y, fs, FontWeight::Regular);
    }

    fn cell_text(&self, row: &ReportRow, col: &ColumnSpec, row_number: usize) -> String {
        if self.layout.index_key.as_deref() == Some(col.key.as_str()) {
            return row_number.to_string();
        }
        match row.get(&col.key) {
            Some(v) if !v.is_blank() => v.display(),
            _ => PLACEHOLDER.to_string(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_cell<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        text: &str,
        x: f32,
        width: f32,
        align: Align,
        center_y: f32,
        font_size: f32,
        weight: FontWeight,
    ) {
        let budget = (width - 2.0 * CELL_PAD_X).max(0.0);
        let max_lines = ((self.budget.row_height / line_height(font_size)).floor() as usize).max(1);

        let mut wrapped = wrap(self.measurer, text, budget, font_size, weight);
        let mut lines: Vec<String> = wrapped.by_ref().take(max_lines).collect();
        if wrapped.next().is_some() {
            debug!(text, max_lines, "cell text truncated to row height");
            if let Some(last) = lines.last_mut() {
                self.mark_truncated(last, budget, font_size, weight);
            }
        }

        let baselines = block_baselines(lines.len(), center_y, font_size);
        for (line, y) in lines.iter().zip(baselines) {
            let line_x = match self.measurer.width_of(line, font_size, weight) {
                Ok(w) => match align {
                    Align::Left => x + CELL_PAD_X,
                    Align::Center => x + (width - w) / 2.0,
                    Align::Right => x + width - CELL_PAD_X - w,
                },
                Err(_) => x + CELL_PAD_X,
            };
            canvas.draw_text(line, line_x.max(x), y, font_size, weight);
        }
    }

    /// End `line` with an ellipsis, dropping trailing characters until it fits.
    fn mark_truncated(&self, line: &mut String, budget: f32, font_size: f32, weight: FontWeight) {
        loop {
            let candidate = format!("{}{ELLIPSIS}", line.trim_end());
            let fits = self
                .measurer
                .width_of(&candidate, font_size, weight)
                .is_ok_and(|w| w <= budget);
            if fits || line.is_empty() {
                *line = candidate;
                return;
            }
            line.pop();
        }
    }

    /// Centered on the content area; lines wider than it are scaled down to fit.
    fn draw_centered<C: Canvas + ?Sized>(&self, canvas: &mut C, text: &str, y: f32, font_size: f32, weight: FontWeight) {
        let left = self.page.margin;
        let content = self.page.content_width();
        let (x, size) = match self.measurer.width_of(text, font_size, weight) {
            Ok(w) if w > content => (left, font_size * content / w),
            Ok(w) => (left + (content - w) / 2.0, font_size),
            Err(_) => (left, font_size),
        };
        canvas.draw_text(text, x, y, size, weight);
    }
}
