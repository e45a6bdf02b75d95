//! Stock sheet service: the managed ledger state and the JSON payload
//! handlers behind the IPC commands.
//!
//! The ledger has a single writer. The mutex only serialises commands that
//! the runtime may dispatch on different worker threads; exports clone a
//! snapshot and release the lock before doing any I/O.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{self, CatalogEntry};
use crate::export::ExportDocument;
use crate::ledger::{Shift, StockField, StockLedger, UpdateOutcome};
use crate::report::{self, StockReport};
use crate::report_renderer;
use crate::settings::StockSettings;

pub struct LedgerState {
    pub ledger: Mutex<StockLedger>,
    pub settings: StockSettings,
    pub data_dir: PathBuf,
}

impl LedgerState {
    pub fn new(catalog: &[CatalogEntry], settings: StockSettings, data_dir: PathBuf) -> Self {
        Self {
            ledger: Mutex::new(StockLedger::from_catalog(catalog)),
            settings,
            data_dir,
        }
    }

    /// Seed from the app data directory: catalog override and settings file
    /// when present, built-in defaults otherwise.
    pub fn init(data_dir: &Path) -> Self {
        let catalog = catalog::resolve_catalog(data_dir);
        let settings = StockSettings::load(data_dir);
        info!(
            products = catalog.len(),
            data_dir = %data_dir.display(),
            "Stock ledger seeded"
        );
        Self::new(&catalog, settings, data_dir.to_path_buf())
    }

    pub fn export_dir(&self) -> PathBuf {
        self.settings.export_dir(&self.data_dir)
    }

    pub fn snapshot(&self) -> Result<StockLedger, String> {
        let ledger = self.ledger.lock().map_err(|e| e.to_string())?;
        Ok(ledger.clone())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ShiftPayload {
    #[serde(default, alias = "turno", alias = "tab")]
    shift: Option<String>,
    #[serde(default, alias = "data")]
    date: Option<String>,
    #[serde(default)]
    share: Option<bool>,
    #[serde(default)]
    width: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateFieldPayload {
    #[serde(alias = "turno")]
    shift: String,
    #[serde(alias = "product_name", alias = "name", alias = "nome")]
    product_name: String,
    #[serde(alias = "campo")]
    field: String,
    #[serde(default, alias = "valor")]
    value: Value,
}

fn parse_shift_payload(arg0: Option<Value>) -> Result<ShiftPayload, String> {
    match arg0 {
        Some(Value::String(shift)) => Ok(ShiftPayload {
            shift: Some(shift),
            ..ShiftPayload::default()
        }),
        Some(v @ Value::Object(_)) => {
            serde_json::from_value(v).map_err(|e| format!("Invalid shift payload: {e}"))
        }
        Some(Value::Null) | None => Ok(ShiftPayload::default()),
        Some(_) => Err("Invalid shift payload".into()),
    }
}

/// Missing shift means the morning tab, which is what the sheet opens on.
fn resolve_shift(raw: Option<&str>) -> Result<Shift, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Shift::Morning),
        Some(s) => Shift::parse(s).ok_or_else(|| format!("Unknown shift: {s}")),
    }
}

fn resolve_date(raw: Option<String>) -> String {
    raw.map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(report::today_label)
}

fn parse_update_payload(arg0: Option<Value>) -> Result<UpdateFieldPayload, String> {
    let payload = arg0.unwrap_or_else(|| serde_json::json!({}));
    let mut parsed: UpdateFieldPayload =
        serde_json::from_value(payload).map_err(|e| format!("Invalid update payload: {e}"))?;
    parsed.product_name = parsed.product_name.trim().to_string();
    if parsed.product_name.is_empty() {
        return Err("Missing productName".into());
    }
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub fn get_products(state: &LedgerState, arg0: Option<Value>) -> Result<Value, String> {
    let payload = parse_shift_payload(arg0)?;
    let shift = resolve_shift(payload.shift.as_deref())?;
    let ledger = state.ledger.lock().map_err(|e| e.to_string())?;
    Ok(serde_json::json!({
        "shift": shift,
        "shiftLabel": shift.label(),
        "fields": StockField::DISPLAY_ORDER,
        "products": ledger.views(shift),
    }))
}

/// Apply one form edit. Unknown products, unknown fields and derived fields
/// are reported back with `applied: false` rather than as errors.
pub fn update_field(state: &LedgerState, arg0: Option<Value>) -> Result<Value, String> {
    let payload = parse_update_payload(arg0)?;
    let shift = Shift::parse(&payload.shift)
        .ok_or_else(|| format!("Unknown shift: {}", payload.shift.trim()))?;

    let Some(field) = StockField::parse(&payload.field) else {
        debug!(field = %payload.field, "Ignoring edit of unknown field");
        return Ok(serde_json::json!({
            "success": true,
            "applied": false,
            "outcome": "unknown_field",
            "product": Value::Null,
        }));
    };

    let mut ledger = state.ledger.lock().map_err(|e| e.to_string())?;
    let outcome = ledger.update_field_raw(shift, &payload.product_name, field, &payload.value);
    let product = ledger
        .product(&payload.product_name)
        .map(|p| p.view(shift));

    match outcome {
        UpdateOutcome::Applied => debug!(
            shift = %shift,
            product = %payload.product_name,
            field = ?field,
            "Stock field updated"
        ),
        UpdateOutcome::UnknownProduct => warn!(
            product = %payload.product_name,
            "Ignoring edit for product not in catalog"
        ),
        UpdateOutcome::ReadOnlyField => debug!(
            field = ?field,
            "Ignoring edit of derived field"
        ),
    }

    Ok(serde_json::json!({
        "success": true,
        "applied": outcome == UpdateOutcome::Applied,
        "outcome": outcome.as_str(),
        "shift": shift,
        "product": product,
    }))
}

/// Build the report for the requested shift from a snapshot, titled from
/// settings.
pub fn build_report(state: &LedgerState, shift: Shift, date: &str) -> Result<StockReport, String> {
    let snapshot = state.snapshot()?;
    Ok(report::render(&snapshot, shift, date).with_title(state.settings.title.clone()))
}

pub fn render_report(state: &LedgerState, arg0: Option<Value>) -> Result<Value, String> {
    let payload = parse_shift_payload(arg0)?;
    let shift = resolve_shift(payload.shift.as_deref())?;
    let report = build_report(state, shift, &resolve_date(payload.date))?;
    let totals = report.totals();
    let mut value = serde_json::to_value(&report).map_err(|e| e.to_string())?;
    if let Value::Object(obj) = &mut value {
        obj.insert(
            "totals".to_string(),
            serde_json::to_value(totals).map_err(|e| e.to_string())?,
        );
    }
    Ok(value)
}

pub fn render_report_text(state: &LedgerState, arg0: Option<Value>) -> Result<Value, String> {
    let payload = parse_shift_payload(arg0)?;
    let shift = resolve_shift(payload.shift.as_deref())?;
    let width = payload
        .width
        .unwrap_or_else(|| state.settings.paper_width().chars());
    let report = build_report(state, shift, &resolve_date(payload.date))?;
    let lines = report_renderer::render_text(&report, width);
    Ok(serde_json::json!({
        "text": lines.join("\n"),
        "lines": lines,
    }))
}

/// Everything an export needs, captured while the ledger is consistent.
#[derive(Debug)]
pub struct ExportRequest {
    pub document: ExportDocument,
    pub out_dir: PathBuf,
    pub share: bool,
}

pub fn prepare_export(state: &LedgerState, arg0: Option<Value>) -> Result<ExportRequest, String> {
    let payload = parse_shift_payload(arg0)?;
    let shift = resolve_shift(payload.shift.as_deref())?;
    let report = build_report(state, shift, &resolve_date(payload.date))?;
    Ok(ExportRequest {
        document: ExportDocument::from_report(&report, &state.settings),
        out_dir: state.export_dir(),
        share: payload.share.unwrap_or(true),
    })
}

/// Render the ESC/POS ticket for the shift and write it next to the HTML
/// reports, ready to be sent to the counter printer.
pub fn write_ticket_file(state: &LedgerState, arg0: Option<Value>) -> Result<Value, String> {
    let payload = parse_shift_payload(arg0)?;
    let shift = resolve_shift(payload.shift.as_deref())?;
    let report = build_report(state, shift, &resolve_date(payload.date))?;
    let bytes = report_renderer::render_escpos(
        &report,
        state.settings.paper_width(),
        state.settings.store_name.as_deref(),
    );

    let out_dir = state.export_dir();
    fs::create_dir_all(&out_dir).map_err(|e| format!("create reports dir: {e}"))?;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let short_id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    let file_path = out_dir.join(format!(
        "stock_ticket_{}_{timestamp}_{short_id}.bin",
        shift.as_str()
    ));
    fs::write(&file_path, &bytes).map_err(|e| format!("write ticket file: {e}"))?;

    let path = file_path.to_string_lossy().to_string();
    info!(shift = %shift, bytes = bytes.len(), path = %path, "Stock ticket generated");
    Ok(serde_json::json!({
        "success": true,
        "path": path,
        "bytes": bytes.len(),
    }))
}

// ===========================================================================
// Tests
// ===========================================================================
