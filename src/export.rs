//! Report export for The Small Stock.
//!
//! A stock report is handed to a document generator, which turns it into a
//! file on disk, and the resulting artifact is then handed to a share
//! service (the platform's default opener). Both collaborators sit behind
//! traits so the flow can be driven without touching the filesystem.
//!
//! Export only ever reads a report built from a ledger snapshot; a failed
//! export leaves ledger state untouched.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::report::{StockReport, StockReportRow};
use crate::report_renderer;
use crate::settings::StockSettings;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid path encoding: {0}")]
    InvalidPath(PathBuf),
    #[error("Failed to share report: {0}")]
    Share(String),
    #[error("Document generation failed: {0}")]
    Generation(String),
}

impl ExportError {
    fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}

/// What the document generator receives: header metadata, the rows and the
/// pre-rendered HTML body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub export_id: String,
    pub title: String,
    pub date: String,
    pub shift: String,
    pub shift_label: String,
    pub rows: Vec<StockReportRow>,
    #[serde(skip)]
    pub html: String,
}

impl ExportDocument {
    pub fn from_report(report: &StockReport, settings: &StockSettings) -> Self {
        Self {
            export_id: Uuid::new_v4().to_string(),
            title: report.title.clone(),
            date: report.date.clone(),
            shift: report.shift.as_str().to_string(),
            shift_label: report.shift_label.clone(),
            rows: report.rows.clone(),
            html: report_renderer::render_html(report, settings),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub export_id: String,
    pub path: String,
}

pub trait DocumentGenerator: Send + Sync {
    fn generate(&self, document: &ExportDocument) -> Result<PathBuf, ExportError>;
}

pub trait ShareService: Send + Sync {
    fn share(&self, artifact: &Path) -> Result<(), ExportError>;
}

// ---------------------------------------------------------------------------
// HTML file generator
// ---------------------------------------------------------------------------

/// Writes the rendered report as a standalone HTML file, ready for the
/// system print dialog.
#[derive(Debug, Clone)]
pub struct HtmlFileGenerator {
    out_dir: PathBuf,
}

impl HtmlFileGenerator {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl DocumentGenerator for HtmlFileGenerator {
    fn generate(&self, document: &ExportDocument) -> Result<PathBuf, ExportError> {
        // Refuse before touching the disk; callers need a UTF-8 path back.
        if self.out_dir.to_str().is_none() {
            return Err(ExportError::InvalidPath(self.out_dir.clone()));
        }
        fs::create_dir_all(&self.out_dir)
            .map_err(|e| ExportError::io("create reports dir", e))?;
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let short_id: String = document.export_id.chars().take(8).collect();
        let filename = format!("stock_report_{}_{timestamp}_{short_id}.html", document.shift);
        let file_path = self.out_dir.join(filename);
        fs::write(&file_path, &document.html)
            .map_err(|e| ExportError::io("write report file", e))?;
        Ok(file_path)
    }
}

// ---------------------------------------------------------------------------
// System share
// ---------------------------------------------------------------------------

/// Opens the artifact with the platform's default handler, from where the
/// user can print or send it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemShare;

impl ShareService for SystemShare {
    fn share(&self, artifact: &Path) -> Result<(), ExportError> {
        open_with_system(artifact)
    }
}

/// Leaves the artifact on disk without opening it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShare;

impl ShareService for NoShare {
    fn share(&self, _artifact: &Path) -> Result<(), ExportError> {
        Ok(())
    }
}

fn open_with_system(path: &Path) -> Result<(), ExportError> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("explorer")
            .arg(path)
            .spawn()
            .map_err(|e| ExportError::Share(format!("Failed to open report: {e}")))?;
        Ok(())
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()
            .map_err(|e| ExportError::Share(format!("Failed to open report: {e}")))?;
        Ok(())
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()
            .map_err(|e| ExportError::Share(format!("Failed to open report: {e}")))?;
        Ok(())
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", unix)))]
    {
        let _ = path;
        Err(ExportError::Share(
            "Opening reports is not supported on this platform".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Export flow
// ---------------------------------------------------------------------------

/// Generate the document and share it. The first failure is returned.
pub fn export_report(
    document: &ExportDocument,
    generator: &dyn DocumentGenerator,
    sharer: &dyn ShareService,
) -> Result<ExportOutcome, ExportError> {
    let path = generator.generate(document).map_err(|e| {
        error!(export_id = %document.export_id, error = %e, "Report generation failed");
        e
    })?;
    let Some(path_str) = path.to_str().map(str::to_string) else {
        error!(export_id = %document.export_id, "Report path is not valid UTF-8");
        if let Err(e) = fs::remove_file(&path) {
            warn!(error = %e, "Failed to remove unusable report file");
        }
        return Err(ExportError::InvalidPath(path));
    };
    info!(
        export_id = %document.export_id,
        shift = %document.shift,
        rows = document.rows.len(),
        path = %path_str,
        "Stock report generated"
    );

    sharer.share(&path).map_err(|e| {
        error!(export_id = %document.export_id, error = %e, "Report share failed");
        e
    })?;

    Ok(ExportOutcome {
        export_id: document.export_id.clone(),
        path: path_str,
    })
}

/// Run [`export_report`] on a background thread and hand the result to
/// `on_complete`. The IPC export command uses this and reports the outcome
/// through events.
pub fn spawn_export<F>(
    document: ExportDocument,
    generator: Arc<dyn DocumentGenerator>,
    sharer: Arc<dyn ShareService>,
    on_complete: F,
) -> JoinHandle<()>
where
    F: FnOnce(Result<ExportOutcome, ExportError>) + Send + 'static,
{
    std::thread::spawn(move || {
        let result = export_report(&document, generator.as_ref(), sharer.as_ref());
        on_complete(result);
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::ledger::{Shift, StockField, StockLedger};
    use crate::report;
    use std::sync::{mpsc, Mutex};

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("the-small-stock-export-{}", Uuid::new_v4()))
    }

    fn sample_document() -> ExportDocument {
        let mut ledger = StockLedger::from_catalog(&[CatalogEntry {
            name: "Coca".into(),
            total_stock: 24,
        }]);
        ledger.update_field(Shift::Night, "Coca", StockField::Initial, 20);
        let report = report::render(&ledger, Shift::Night, "16/02/2026");
        ExportDocument::from_report(&report, &StockSettings::default())
    }

    struct FailingGenerator;

    impl DocumentGenerator for FailingGenerator {
        fn generate(&self, _document: &ExportDocument) -> Result<PathBuf, ExportError> {
            Err(ExportError::Generation("printer offline".into()))
        }
    }

    struct FailingShare;

    impl ShareService for FailingShare {
        fn share(&self, _artifact: &Path) -> Result<(), ExportError> {
            Err(ExportError::Share("no share target".into()))
        }
    }

    #[derive(Default)]
    struct RecordingShare {
        shared: Mutex<Vec<PathBuf>>,
    }

    impl ShareService for RecordingShare {
        fn share(&self, artifact: &Path) -> Result<(), ExportError> {
            self.shared
                .lock()
                .expect("lock")
                .push(artifact.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn export_document_carries_header_and_rows() {
        let doc = sample_document();
        assert_eq!(doc.title, "Stock Report");
        assert_eq!(doc.date, "16/02/2026");
        assert_eq!(doc.shift_label, "NIGHT");
        assert_eq!(doc.rows.len(), 1);
        assert!(doc.html.contains("Shift: NIGHT"));
    }

    #[test]
    fn html_generator_writes_file_and_share_receives_it() {
        let dir = scratch_dir();
        let doc = sample_document();
        let sharer = RecordingShare::default();

        let outcome = export_report(&doc, &HtmlFileGenerator::new(&dir), &sharer)
            .expect("export should succeed");

        let path = PathBuf::from(&outcome.path);
        assert!(path.starts_with(&dir));
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.starts_with("stock_report_night_"));
        assert!(name.ends_with(".html"));
        assert_eq!(fs::read_to_string(&path).expect("read file"), doc.html);
        assert_eq!(*sharer.shared.lock().unwrap(), vec![path]);
        assert_eq!(outcome.export_id, doc.export_id);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn generation_failure_is_returned() {
        let sharer = RecordingShare::default();
        let err = export_report(&sample_document(), &FailingGenerator, &sharer)
            .expect_err("generation should fail");
        assert!(matches!(err, ExportError::Generation(_)));
        assert!(sharer.shared.lock().unwrap().is_empty());
    }

    #[test]
    fn share_failure_is_returned() {
        let dir = scratch_dir();
        let err = export_report(&sample_document(), &HtmlFileGenerator::new(&dir), &FailingShare)
            .expect_err("share should fail");
        assert!(err.to_string().contains("no share target"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn generator_reports_unwritable_directory() {
        let dir = scratch_dir();
        fs::create_dir_all(dir.parent().expect("parent")).expect("temp dir");
        // A regular file where the output directory should be.
        fs::write(&dir, b"occupied").expect("write blocker");
        let err = HtmlFileGenerator::new(&dir)
            .generate(&sample_document())
            .expect_err("directory creation should fail");
        assert!(matches!(err, ExportError::Io { context: "create reports dir", .. }));
        let _ = fs::remove_file(&dir);
    }

    #[cfg(unix)]
    fn non_utf8_name(prefix: &str) -> std::ffi::OsString {
        use std::os::unix::ffi::OsStringExt;

        let mut bytes = format!("{prefix}-{}-", Uuid::new_v4()).into_bytes();
        bytes.push(0xFF);
        std::ffi::OsString::from_vec(bytes)
    }

    /// Writes its artifact under a name that is not valid UTF-8.
    #[cfg(unix)]
    struct NonUtf8Generator {
        dir: PathBuf,
    }

    #[cfg(unix)]
    impl DocumentGenerator for NonUtf8Generator {
        fn generate(&self, document: &ExportDocument) -> Result<PathBuf, ExportError> {
            fs::create_dir_all(&self.dir).map_err(|e| ExportError::io("create reports dir", e))?;
            let path = self.dir.join(non_utf8_name("stock_report"));
            fs::write(&path, &document.html).map_err(|e| ExportError::io("write report file", e))?;
            Ok(path)
        }
    }

    #[test]
    #[cfg(unix)]
    fn non_utf8_artifact_is_removed_and_reported() {
        let dir = scratch_dir();
        let sharer = RecordingShare::default();
        let err = export_report(
            &sample_document(),
            &NonUtf8Generator { dir: dir.clone() },
            &sharer,
        )
        .expect_err("non-UTF-8 path should fail");

        assert!(matches!(err, ExportError::InvalidPath(_)));
        assert!(sharer.shared.lock().unwrap().is_empty());
        let leftovers = fs::read_dir(&dir).expect("read dir").count();
        assert_eq!(leftovers, 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    #[cfg(unix)]
    fn html_generator_rejects_non_utf8_dir_before_writing() {
        let dir = std::env::temp_dir().join(non_utf8_name("the-small-stock-export"));
        let err = HtmlFileGenerator::new(&dir)
            .generate(&sample_document())
            .expect_err("non-UTF-8 directory should fail");
        assert!(matches!(err, ExportError::InvalidPath(ref p) if *p == dir));
        assert!(!dir.exists());
    }

    #[test]
    fn spawn_export_invokes_continuation() {
        let dir = scratch_dir();
        let (tx, rx) = mpsc::channel();
        let handle = spawn_export(
            sample_document(),
            Arc::new(HtmlFileGenerator::new(&dir)),
            Arc::new(NoShare),
            move |result| {
                tx.send(result.map(|o| o.path)).expect("send result");
            },
        );
        handle.join().expect("export thread");
        let path = rx.recv().expect("continuation ran").expect("export ok");
        assert!(PathBuf::from(path).exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn spawn_export_reports_failure() {
        let (tx, rx) = mpsc::channel();
        spawn_export(
            sample_document(),
            Arc::new(FailingGenerator),
            Arc::new(NoShare),
            move |result| {
                tx.send(result.is_err()).expect("send result");
            },
        )
        .join()
        .expect("export thread");
        assert!(rx.recv().expect("continuation ran"));
    }
}
