use std::sync::Arc;

use serde_json::Value;
use tauri::Emitter;
use tracing::warn;

use crate::export::{self, HtmlFileGenerator, NoShare, ShareService, SystemShare};
use crate::stock::{self, LedgerState};

#[tauri::command]
pub async fn report_render(
    arg0: Option<Value>,
    state: tauri::State<'_, LedgerState>,
) -> Result<Value, String> {
    stock::render_report(&state, arg0)
}

#[tauri::command]
pub async fn report_render_text(
    arg0: Option<Value>,
    state: tauri::State<'_, LedgerState>,
) -> Result<Value, String> {
    stock::render_report_text(&state, arg0)
}

/// Start writing the HTML report and handing it to the system opener. The
/// ledger is only read while preparing; the file work runs on a background
/// thread and its result arrives as `report_exported` or
/// `report_export_failed`.
#[tauri::command]
pub async fn report_export(
    arg0: Option<Value>,
    state: tauri::State<'_, LedgerState>,
    app: tauri::AppHandle,
) -> Result<Value, String> {
    let request = stock::prepare_export(&state, arg0)?;
    let export_id = request.document.export_id.clone();
    let sharer: Arc<dyn ShareService> = if request.share {
        Arc::new(SystemShare)
    } else {
        Arc::new(NoShare)
    };

    export::spawn_export(
        request.document,
        Arc::new(HtmlFileGenerator::new(request.out_dir)),
        sharer,
        {
            let export_id = export_id.clone();
            move |result| match result {
                Ok(outcome) => {
                    let _ = app.emit("report_exported", &outcome);
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(export_id = %export_id, error = %message, "Report export failed");
                    let _ = app.emit(
                        "report_export_failed",
                        serde_json::json!({ "exportId": export_id, "error": message }),
                    );
                }
            }
        },
    );

    Ok(serde_json::json!({
        "success": true,
        "exportId": export_id,
        "status": "started",
    }))
}

#[tauri::command]
pub async fn report_print_ticket(
    arg0: Option<Value>,
    state: tauri::State<'_, LedgerState>,
) -> Result<Value, String> {
    stock::write_ticket_file(&state, arg0)
}
