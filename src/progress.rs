//! Progress reporting for a render-and-save run.
//!
//! Percentages only move forward and never pass 100, whatever order callers
//! report milestones in.

pub const PREPARING: u8 = 0;
pub const FONTS_LOADED: u8 = 5;
pub const LAYOUT_PLANNED: u8 = 10;
pub const CREATING_DOCUMENT: u8 = 25;
pub const PAGES_START: u8 = 30;
pub const FINALIZING: u8 = 80;
pub const RESOLVING_LOCATION: u8 = 85;
pub const WRITING: u8 = 90;
pub const COMPLETE: u8 = 100;

/// Percentage reported once page `index` (0-based) of `total` is drawn.
/// Pages share the 30..=80 band evenly.
pub fn page_percent(index: usize, total: usize) -> u8 {
    let total = total.max(1);
    let done = (index + 1).min(total);
    let span = (FINALIZING - PAGES_START) as usize;
    PAGES_START + (span * done / total) as u8
}

pub struct Progress<P> {
    sink: P,
    last: Option<u8>,
}

impl<P: FnMut(u8, &str)> Progress<P> {
    pub fn new(sink: P) -> Self {
        Self { sink, last: None }
    }

    /// Forward `percent` to the sink unless it would move backwards.
    pub fn report(&mut self, percent: u8, message: &str) {
        let percent = percent.min(COMPLETE);
        if self.last.is_some_and(|last| percent < last) {
            return;
        }
        self.last = Some(percent);
        (self.sink)(percent, message);
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

/// Sink for callers that don't care about progress.
pub fn ignore(_: u8, _: &str) {}
