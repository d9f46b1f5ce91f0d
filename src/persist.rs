//! Writing finished reports to durable storage.
//!
//! Directory choice is delegated to a [`StorageHost`], so the platform decides
//! where "shared" and "private" storage live and whether access is granted.
//! Existing files are never overwritten: a name collision gets a timestamp
//! suffix and the write is retried.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::PersistError;
use crate::model::{format_iso_date, DocumentMetadata, ReportKind};

const MAX_COLLISION_RETRIES: u32 = 16;
const FALLBACK_STEM: &str = "report";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Platform storage capability supplied by the embedding application.
pub trait StorageHost {
    fn platform(&self) -> Platform;

    /// User-visible location (e.g. Downloads). `None` when the platform has none.
    fn shared_dir(&self) -> Option<PathBuf>;

    /// Application-private location; always writable by the app.
    fn private_dir(&self) -> PathBuf;

    /// Check or request write access to [`StorageHost::shared_dir`]. Never fails.
    fn check_permission(&self) -> impl Future<Output = PermissionStatus> + Send;
}

/// Receives the saved artifact, e.g. to open it or post a notification.
pub trait ArtifactNotifier {
    fn artifact_ready(&self, path: &Path, kind: ReportKind);
}

impl<F: Fn(&Path, ReportKind)> ArtifactNotifier for F {
    fn artifact_ready(&self, path: &Path, kind: ReportKind) {
        self(path, kind)
    }
}

/// Notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl ArtifactNotifier for LogNotifier {
    fn artifact_ready(&self, path: &Path, kind: ReportKind) {
        info!(path = %path.display(), kind = kind.label(), "report ready");
    }
}

/// Non-fatal conditions the caller should surface once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PersistWarning {
    /// Shared storage access was denied; the file went to the private directory.
    PermissionDenied { fallback_dir: PathBuf },
    /// The platform reported no shared directory.
    SharedDirUnavailable { fallback_dir: PathBuf },
}

impl PersistWarning {
    pub fn message(&self) -> String {
        match self {
            PersistWarning::PermissionDenied { fallback_dir } => format!(
                "Storage permission denied; report saved to {} instead",
                fallback_dir.display()
            ),
            PersistWarning::SharedDirUnavailable { fallback_dir } => format!(
                "No shared storage available; report saved to {}",
                fallback_dir.display()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistOutcome {
    pub path: PathBuf,
    pub warning: Option<PersistWarning>,
}

pub type PersistResult = Result<PersistOutcome, PersistError>;

/// Resolve, create if needed, and write. Never overwrites an existing file.
pub async fn persist<H: StorageHost>(host: &H, bytes: &[u8], suggested_name: &str) -> PersistResult {
    let (dir, warning) = resolve_target_dir(host).await;
    let path = write_unique(&dir, bytes, suggested_name).await?;
    Ok(PersistOutcome { path, warning })
}

/// Pick the output directory. Permission denial falls back to private storage.
pub async fn resolve_target_dir<H: StorageHost>(host: &H) -> (PathBuf, Option<PersistWarning>) {
    // iOS exposes app documents through the Files app; there is no shared dir to ask for
    if host.platform() == Platform::Ios {
        return (host.private_dir(), None);
    }

    let Some(shared) = host.shared_dir() else {
        let fallback_dir = host.private_dir();
        warn!(fallback = %fallback_dir.display(), "no shared directory, using private storage");
        return (fallback_dir.clone(), Some(PersistWarning::SharedDirUnavailable { fallback_dir }));
    };

    match host.check_permission().await {
        PermissionStatus::Granted => (shared, None),
        PermissionStatus::Denied => {
            let fallback_dir = host.private_dir();
            warn!(
                shared = %shared.display(),
                fallback = %fallback_dir.display(),
                "storage permission denied, using private storage"
            );
            (fallback_dir.clone(), Some(PersistWarning::PermissionDenied { fallback_dir }))
        }
    }
}

/// Write `bytes` into `dir` under `suggested_name`, or a timestamp-suffixed
/// variant of it if that name is taken. Returns the path actually written.
pub async fn write_unique(dir: &Path, bytes: &[u8], suggested_name: &str) -> Result<PathBuf, PersistError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| PersistError::DirectoryCreateFailed {
            path: dir.to_path_buf(),
            source,
        })?;

    let file_name = pdf_file_name(suggested_name);
    let stem = file_name.strip_suffix(".pdf").unwrap_or(&file_name);

    let mut candidate = dir.join(&file_name);
    let mut attempt = 0;
    loop {
        match write_new(&candidate, bytes).await {
            Ok(()) => {
                info!(path = %candidate.display(), bytes = bytes.len(), "report saved");
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_COLLISION_RETRIES => {
                attempt += 1;
                let next = dir.join(suffixed_name(stem, attempt));
                debug!(taken = %candidate.display(), next = %next.display(), "file name collision");
                candidate = next;
            }
            Err(source) => {
                return Err(PersistError::WriteFailed {
                    path: candidate,
                    source,
                })
            }
        }
    }
}

// create_new: existence check and create are one atomic step.
async fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let written: io::Result<()> = async {
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        // the file is ours (create_new), so a partial artifact can go
        if let Err(rm) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %rm, "failed to remove partial report");
        }
        return Err(e);
    }
    Ok(())
}

fn unix_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

fn suffixed_name(stem: &str, attempt: u32) -> String {
    let ts_ms = unix_millis();
    if attempt <= 1 {
        format!("{stem}_{ts_ms}.pdf")
    } else {
        format!("{stem}_{ts_ms}_{attempt}.pdf")
    }
}

/// Restrict a name to `[A-Za-z0-9_.-]` and make sure it ends in `.pdf`.
pub fn pdf_file_name(input: &str) -> String {
    let cleaned: String = input
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect();

    let stem = if cleaned.len() >= 4 && cleaned[cleaned.len() - 4..].eq_ignore_ascii_case(".pdf") {
        &cleaned[..cleaned.len() - 4]
    } else {
        cleaned.as_str()
    };
    let stem = stem.trim_matches('.');
    if stem.is_empty() {
        format!("{FALLBACK_STEM}.pdf")
    } else {
        format!("{stem}.pdf")
    }
}

/// `<Kind>_Report_<Customer>_<from>_to_<to>[-<unit>].pdf`
pub fn report_file_name(metadata: &DocumentMetadata) -> String {
    let customer = metadata.customer_name.trim();
    let customer = if customer.is_empty() { "Customer" } else { customer };
    let mut name = format!(
        "{}_Report_{}_{}_to_{}",
        metadata.kind.label(),
        customer.replace(' ', "_"),
        format_iso_date(metadata.from),
        format_iso_date(metadata.to)
    );
    if let Some(unit) = metadata.unit.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        name.push('-');
        name.push_str(unit);
    }
    pdf_file_name(&name)
}

/// Desktop storage: Downloads as the shared directory, the local data dir as
/// private storage. Permission is a write probe of the shared directory.
#[derive(Debug, Clone)]
pub struct FsStorageHost {
    shared: Option<PathBuf>,
    private: PathBuf,
}

impl FsStorageHost {
    pub fn new(app_name: &str) -> Self {
        let private = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(app_name)
            .join("reports");
        Self {
            shared: dirs::download_dir(),
            private,
        }
    }

    pub fn with_dirs(shared: Option<PathBuf>, private: PathBuf) -> Self {
        Self { shared, private }
    }
}

impl StorageHost for FsStorageHost {
    fn platform(&self) -> Platform {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Desktop
        }
    }

    fn shared_dir(&self) -> Option<PathBuf> {
        self.shared.clone()
    }

    fn private_dir(&self) -> PathBuf {
        self.private.clone()
    }

    fn check_permission(&self) -> impl Future<Output = PermissionStatus> + Send {
        let dir = self.shared.clone();
        async move {
            let Some(dir) = dir else {
                return PermissionStatus::Denied;
            };
            if tokio::fs::create_dir_all(&dir).await.is_err() {
                return PermissionStatus::Denied;
            }
            let marker = dir.join(format!(".stock-report-write-check-{}", std::process::id()));
            match tokio::fs::write(&marker, b"").await {
                Ok(()) => {
                    if let Err(e) = tokio::fs::remove_file(&marker).await {
                        debug!(path = %marker.display(), error = %e, "failed to remove write check file");
                    }
                    PermissionStatus::Granted
                }
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "shared directory not writable");
                    PermissionStatus::Denied
                }
            }
        }
    }
}
