use std::cell::RefCell;
use std::future::Future;
use std::path::{Path, PathBuf};

use stock_report::persist::{resolve_target_dir, write_unique};
use stock_report::{
    export_report, persist, report_file_name, CellValue, DocumentAssembler, DocumentMetadata,
    ExportError, PermissionStatus, PersistError, PersistErrorKind, PersistWarning, Platform,
    ReportKind, ReportRow, StorageHost,
};
use tempfile::TempDir;
use time::{Date, Month};

struct TestHost {
    platform: Platform,
    shared: Option<PathBuf>,
    private: PathBuf,
    permission: PermissionStatus,
}

impl TestHost {
    fn new(tmp: &TempDir, permission: PermissionStatus) -> Self {
        Self {
            platform: Platform::Android,
            shared: Some(tmp.path().join("Download")),
            private: tmp.path().join("app").join("reports"),
            permission,
        }
    }
}

impl StorageHost for TestHost {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn shared_dir(&self) -> Option<PathBuf> {
        self.shared.clone()
    }

    fn private_dir(&self) -> PathBuf {
        self.private.clone()
    }

    fn check_permission(&self) -> impl Future<Output = PermissionStatus> + Send {
        std::future::ready(self.permission)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[tokio::test]
async fn existing_file_gets_timestamped_sibling() {
    let tmp = TempDir::new().unwrap();
    let host = TestHost::new(&tmp, PermissionStatus::Granted);
    let shared = host.shared.clone().unwrap();
    std::fs::create_dir_all(&shared).unwrap();
    std::fs::write(shared.join("Report.pdf"), b"old").unwrap();

    let outcome = persist(&host, b"new", "Report.pdf").await.unwrap();
    assert_eq!(outcome.warning, None);
    assert_eq!(outcome.path.parent(), Some(shared.as_path()));

    let name = file_name(&outcome.path);
    let stamp = name
        .strip_prefix("Report_")
        .and_then(|s| s.strip_suffix(".pdf"))
        .unwrap();
    assert!(!stamp.is_empty() && stamp.chars().all(|c| c.is_ascii_digit()), "{name}");

    assert_eq!(std::fs::read(shared.join("Report.pdf")).unwrap(), b"old");
    assert_eq!(std::fs::read(&outcome.path).unwrap(), b"new");
}

#[tokio::test]
async fn repeated_and_concurrent_saves_never_overwrite() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("out");

    let first = write_unique(&dir, b"one", "Report.pdf").await.unwrap();
    let (second, third) = tokio::join!(
        write_unique(&dir, b"two", "Report.pdf"),
        write_unique(&dir, b"three", "Report.pdf"),
    );
    let (second, third) = (second.unwrap(), third.unwrap());

    assert_ne!(first, second);
    assert_ne!(second, third);
    assert_ne!(first, third);
    assert_eq!(std::fs::read(&first).unwrap(), b"one");
    assert_eq!(std::fs::read(&second).unwrap(), b"two");
    assert_eq!(std::fs::read(&third).unwrap(), b"three");
}

#[tokio::test]
async fn denied_permission_falls_back_to_private_dir() {
    let tmp = TempDir::new().unwrap();
    let host = TestHost::new(&tmp, PermissionStatus::Denied);

    let outcome = persist(&host, b"%PDF-1.3", "Report.pdf").await.unwrap();
    assert_eq!(outcome.path, host.private.join("Report.pdf"));
    assert_eq!(
        outcome.warning,
        Some(PersistWarning::PermissionDenied {
            fallback_dir: host.private.clone()
        })
    );
    assert!(outcome.path.exists());
    assert!(!host.shared.as_ref().unwrap().exists());
}

#[tokio::test]
async fn ios_and_missing_shared_dir_use_private_storage() {
    let tmp = TempDir::new().unwrap();

    let mut ios = TestHost::new(&tmp, PermissionStatus::Denied);
    ios.platform = Platform::Ios;
    let (dir, warning) = resolve_target_dir(&ios).await;
    assert_eq!(dir, ios.private);
    assert_eq!(warning, None);

    let mut no_shared = TestHost::new(&tmp, PermissionStatus::Granted);
    no_shared.shared = None;
    let (dir, warning) = resolve_target_dir(&no_shared).await;
    assert_eq!(dir, no_shared.private);
    assert!(matches!(warning, Some(PersistWarning::SharedDirUnavailable { .. })));
}

#[tokio::test]
async fn blocked_directory_is_a_typed_error() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let err = write_unique(&blocker.join("reports"), b"data", "Report.pdf")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), PersistErrorKind::DirectoryCreateFailed);
    assert!(!err.detail().is_empty());
}

#[test]
fn write_failure_reports_kind_and_cause() {
    let err = PersistError::WriteFailed {
        path: PathBuf::from("/full/Report.pdf"),
        source: std::io::Error::other("No space left on device"),
    };
    assert_eq!(err.kind(), PersistErrorKind::WriteFailed);
    assert_eq!(err.detail(), "No space left on device");
    assert!(err.is_retryable());
    assert!(err.to_string().contains("/full/Report.pdf"));
}

#[tokio::test]
async fn export_report_renders_saves_and_notifies() {
    let tmp = TempDir::new().unwrap();
    let host = TestHost::new(&tmp, PermissionStatus::Granted);
    let metadata = DocumentMetadata {
        title: "Patel Traders".into(),
        subtitle: String::new(),
        customer_name: "Patel Traders".into(),
        kind: ReportKind::Outward,
        from: Date::from_calendar_date(2024, Month::June, 1).unwrap(),
        to: Date::from_calendar_date(2024, Month::June, 30).unwrap(),
        unit: Some("KG".into()),
        category: Some("Grains".into()),
    };
    let rows: Vec<ReportRow> = (0..25)
        .map(|i| {
            let mut r = ReportRow::new();
            r.insert("order_no".into(), CellValue::from(format!("SO-{i}")));
            r.insert("description".into(), CellValue::from("Wheat 50KG bag"));
            r.insert("quantity".into(), CellValue::Number(2.0));
            r
        })
        .collect();

    let notified = RefCell::new(Vec::new());
    let notifier = |path: &Path, kind: ReportKind| notified.borrow_mut().push((path.to_path_buf(), kind));
    let mut percents = Vec::new();

    let outcome = export_report(
        &DocumentAssembler::default(),
        &host,
        &notifier,
        &rows,
        &metadata,
        |p: u8, _: &str| percents.push(p),
    )
    .await
    .unwrap();

    assert_eq!(file_name(&outcome.path), report_file_name(&metadata));
    assert_eq!(
        file_name(&outcome.path),
        "Outward_Report_Patel_Traders_2024-06-01_to_2024-06-30-KG.pdf"
    );
    assert!(std::fs::read(&outcome.path).unwrap().starts_with(b"%PDF"));

    assert_eq!(percents.first(), Some(&0));
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    for milestone in [25u8, 80, 90] {
        assert!(percents.contains(&milestone), "missing {milestone}");
    }

    assert_eq!(notified.into_inner(), vec![(outcome.path.clone(), ReportKind::Outward)]);
}

#[tokio::test]
async fn export_failure_does_not_notify() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();
    let mut host = TestHost::new(&tmp, PermissionStatus::Granted);
    host.shared = Some(blocker.join("Download"));

    let metadata = DocumentMetadata {
        title: "T".into(),
        subtitle: String::new(),
        customer_name: "C".into(),
        kind: ReportKind::Inward,
        from: Date::from_calendar_date(2024, Month::June, 1).unwrap(),
        to: Date::from_calendar_date(2024, Month::June, 2).unwrap(),
        unit: None,
        category: None,
    };
    let calls = RefCell::new(0);
    let notifier = |_: &Path, _: ReportKind| *calls.borrow_mut() += 1;

    let err = export_report(
        &DocumentAssembler::default(),
        &host,
        &notifier,
        &[],
        &metadata,
        |_: u8, _: &str| {},
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        ExportError::Persist(PersistError::DirectoryCreateFailed { .. })
    ));
    assert_eq!(*calls.borrow(), 0);
}
