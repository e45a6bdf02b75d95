//! The Small Stock - Tauri v2 Backend
//!
//! Keeps the per-shift stock sheet for the counter (initial count, sales,
//! derived replenishment and final) and renders the end-of-shift report.
//! The desktop shell registers the IPC commands the frontend calls via
//! `@tauri-apps/api/core::invoke()`; the ledger and report modules are
//! plain library code and build without it.

use std::sync::atomic::AtomicU64;

/// App start time for uptime calculation (epoch seconds).
pub(crate) static APP_START_EPOCH: AtomicU64 = AtomicU64::new(0);

pub mod catalog;
#[cfg(feature = "desktop")]
mod commands;
pub mod diagnostics;
pub mod escpos;
pub mod export;
pub mod ledger;
pub mod report;
pub mod report_renderer;
pub mod settings;
pub mod stock;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::atomic::Ordering;
    use tracing::{error, info};

    // Record start time for uptime tracking
    let epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    APP_START_EPOCH.store(epoch, Ordering::Relaxed);

    match diagnostics::init_logging(&diagnostics::get_log_dir()) {
        // The app runs until process exit; dropping the guard would stop
        // the file writer.
        Ok(guard) => std::mem::forget(guard),
        Err(e) => eprintln!("Logging unavailable: {e}"),
    }

    info!("Starting The Small Stock v{}", env!("CARGO_PKG_VERSION"));

    let result = tauri::Builder::default()
        .setup(|app| {
            use tauri::Manager;

            let app_data_dir = app.path().app_data_dir()?;
            app.manage(stock::LedgerState::init(&app_data_dir));

            info!("Stock ledger registered");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // App lifecycle
            commands::runtime::app_get_version,
            commands::runtime::diagnostics_get_about,
            // Stock sheet
            commands::ledger::ledger_get_products,
            commands::ledger::ledger_update_field,
            // Reports
            commands::reports::report_render,
            commands::reports::report_render_text,
            commands::reports::report_export,
            commands::reports::report_print_ticket,
        ])
        .run(tauri::generate_context!());

    if let Err(e) = result {
        error!("error while running The Small Stock: {e}");
        std::process::exit(1);
    }
}
