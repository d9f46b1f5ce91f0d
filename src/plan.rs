//! Page budget: font size, row height, and rows per page for one document.

use std::ops::Range;

use serde::Serialize;

use crate::config::PageGeometry;
use crate::error::RenderError;

/// Title block drawn above the table on the first page.
pub const TITLE_BLOCK_HEIGHT: f32 = 90.0;
/// Single-line header drawn above the table on continuation pages.
pub const CONTINUATION_HEADER_HEIGHT: f32 = 30.0;
/// Page number and timestamp band at the bottom of every page.
pub const FOOTER_BAND_HEIGHT: f32 = 30.0;

/// Layout plan for one document. Computed once, read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBudget {
    pub font_size: f32,
    pub header_font_size: f32,
    /// First-page reservation: title block plus the column-header row.
    pub header_height: f32,
    /// Continuation-page reservation: condensed header plus the column-header row.
    pub continuation_header_height: f32,
    /// Footer band plus room for the aggregate row.
    pub footer_height: f32,
    pub row_height: f32,
    pub rows_on_first_page: usize,
    pub rows_on_continuation_page: usize,
    pub total_pages: usize,
}

/// Smaller text for larger reports so more rows fit per page.
pub fn font_size_for(row_count: usize, base: f32) -> f32 {
    match row_count {
        0..=10 => base,
        11..=20 => base - 1.0,
        21..=40 => base - 2.0,
        _ => base - 3.0,
    }
}

pub fn plan(row_count: usize, page: &PageGeometry, base_font_size: f32) -> Result<PageBudget, RenderError> {
    let font_size = font_size_for(row_count, base_font_size);
    if !(font_size.is_finite() && font_size > 0.0) {
        return Err(RenderError::LayoutInvariantViolation(format!(
            "font size {font_size} for {row_count} rows is not positive"
        )));
    }

    let row_height = font_size * 5.0;
    let header_height = TITLE_BLOCK_HEIGHT + row_height;
    let continuation_header_height = CONTINUATION_HEADER_HEIGHT + row_height;
    let footer_height = FOOTER_BAND_HEIGHT + row_height;
    let usable = page.height - 2.0 * page.margin;

    let rows_fitting = |reserved: f32| -> usize {
        let avail = usable - reserved;
        if avail <= 0.0 {
            0
        } else {
            (avail / row_height).floor() as usize
        }
    };
    let rows_on_first_page = rows_fitting(header_height + footer_height);
    let rows_on_continuation_page = rows_fitting(continuation_header_height + footer_height);

    if rows_on_first_page == 0 || rows_on_continuation_page == 0 {
        return Err(RenderError::LayoutInvariantViolation(format!(
            "page {}x{} (margin {}) fits no rows at font size {font_size}",
            page.width, page.height, page.margin
        )));
    }

    let overflow = row_count.saturating_sub(rows_on_first_page);
    let total_pages = 1 + overflow.div_ceil(rows_on_continuation_page);

    Ok(PageBudget {
        font_size,
        header_font_size: font_size + 2.0,
        header_height,
        continuation_header_height,
        footer_height,
        row_height,
        rows_on_first_page,
        rows_on_continuation_page,
        total_pages,
    })
}

impl PageBudget {
    pub fn rows_on_page(&self, page_index: usize) -> usize {
        if page_index == 0 {
            self.rows_on_first_page
        } else {
            self.rows_on_continuation_page
        }
    }

    /// Indices into the row list drawn on `page_index`, clipped to `row_count`.
    pub fn row_range(&self, page_index: usize, row_count: usize) -> Range<usize> {
        let start = if page_index == 0 {
            0
        } else {
            self.rows_on_first_page + (page_index - 1) * self.rows_on_continuation_page
        };
        let start = start.min(row_count);
        let end = (start + self.rows_on_page(page_index)).min(row_count);
        start..end
    }

    pub fn capacity(&self) -> usize {
        self.rows_on_first_page + self.rows_on_continuation_page * (self.total_pages - 1)
    }
}
