use serde_json::Value;
use tauri::Emitter;

use crate::stock::{self, LedgerState};

#[tauri::command]
pub async fn ledger_get_products(
    arg0: Option<Value>,
    state: tauri::State<'_, LedgerState>,
) -> Result<Value, String> {
    stock::get_products(&state, arg0)
}

#[tauri::command]
pub async fn ledger_update_field(
    arg0: Option<Value>,
    state: tauri::State<'_, LedgerState>,
    app: tauri::AppHandle,
) -> Result<Value, String> {
    let result = stock::update_field(&state, arg0)?;
    if result.get("applied").and_then(Value::as_bool) == Some(true) {
        let _ = app.emit(
            "ledger_updated",
            serde_json::json!({
                "shift": result.get("shift"),
                "product": result.get("product"),
            }),
        );
    }
    Ok(result)
}
