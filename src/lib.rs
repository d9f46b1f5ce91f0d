//! Paginated stock report rendering.
//!
//! Rows and a column layout go in; a multi-page PDF comes out, with a title
//! block on the first page, continuation headers after it, banded rows, a
//! quantity total on the last page and a page footer everywhere. The result
//! can then be written to platform storage without ever overwriting an
//! existing file.

pub mod canvas;
pub mod config;
pub mod document;
pub mod error;
pub mod metrics;
pub mod model;
pub mod persist;
pub mod plan;
pub mod progress;
pub mod sanitize;
pub mod table;
pub mod wrap;

pub use config::{FontSource, PageGeometry, RendererConfig, ReportLabels, TableStyle};
pub use document::{aggregate_quantity, DocumentAssembler};
pub use error::{ConfigError, EncodingError, ExportError, PersistError, PersistErrorKind, RenderError};
pub use model::{
    parse_report_date, Align, CellValue, ColumnSpec, DocumentMetadata, ReportKind, ReportLayout,
    ReportRow,
};
pub use persist::{
    persist, report_file_name, ArtifactNotifier, FsStorageHost, LogNotifier, PermissionStatus,
    PersistOutcome, PersistResult, PersistWarning, Platform, StorageHost,
};
pub use plan::{plan, PageBudget};
pub use progress::Progress;
pub use sanitize::sanitize;

/// Render, save and announce one report.
///
/// The layout is the preset for `metadata.kind`. `on_progress` sees one
/// nondecreasing sequence from 0 to 100 across rendering and saving. On a
/// persist failure nothing is announced and the error names the cause; the
/// whole call can be retried.
pub async fn export_report<H, N, P>(
    assembler: &DocumentAssembler,
    host: &H,
    notifier: &N,
    rows: &[ReportRow],
    metadata: &DocumentMetadata,
    on_progress: P,
) -> Result<PersistOutcome, ExportError>
where
    H: StorageHost,
    N: ArtifactNotifier + ?Sized,
    P: FnMut(u8, &str),
{
    let mut progress = Progress::new(on_progress);
    let layout = ReportLayout::resolve(metadata.kind)?;
    let bytes = assembler.render(rows, &layout, metadata, &mut progress).await?;

    progress.report(progress::RESOLVING_LOCATION, "Resolving save location");
    let (dir, warning) = persist::resolve_target_dir(host).await;
    if let Some(w) = &warning {
        progress.report(progress::RESOLVING_LOCATION, &w.message());
    }

    progress.report(progress::WRITING, "Writing file");
    let path = persist::write_unique(&dir, &bytes, &report_file_name(metadata)).await?;
    progress.report(progress::COMPLETE, "Report saved");

    notifier.artifact_ready(&path, metadata.kind);
    Ok(PersistOutcome { path, warning })
}
