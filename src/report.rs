//! Shift stock report.
//!
//! Turns a ledger snapshot into a header plus one row per product, in
//! catalog order. Rendering to HTML/text/ESC-POS lives in
//! `report_renderer`; writing and sharing files lives in `export`.

use serde::{Deserialize, Serialize};

use crate::ledger::{Shift, StockLedger};

pub const DEFAULT_TITLE: &str = "Stock Report";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StockReportRow {
    pub name: String,
    pub initial: u32,
    pub sales: u32,
    pub replenishment: u32,
    #[serde(rename = "final")]
    pub final_count: i64,
    pub total_stock: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StockReportTotals {
    pub initial: u64,
    pub sales: u64,
    pub replenishment: u64,
    #[serde(rename = "final")]
    pub final_count: i64,
    pub total_stock: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StockReport {
    pub title: String,
    pub date: String,
    pub shift: Shift,
    pub shift_label: String,
    pub rows: Vec<StockReportRow>,
}

impl StockReport {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        if !title.trim().is_empty() {
            self.title = title.trim().to_string();
        }
        self
    }

    pub fn totals(&self) -> StockReportTotals {
        self.rows
            .iter()
            .fold(StockReportTotals::default(), |mut acc, row| {
                acc.initial += u64::from(row.initial);
                acc.sales += u64::from(row.sales);
                acc.replenishment += u64::from(row.replenishment);
                acc.final_count += row.final_count;
                acc.total_stock += u64::from(row.total_stock);
                acc
            })
    }
}

/// Build the report for one shift. No I/O; an empty ledger yields no rows.
pub fn render(ledger: &StockLedger, shift: Shift, date: &str) -> StockReport {
    let rows = ledger
        .products()
        .iter()
        .map(|product| {
            let record = product.record(shift);
            StockReportRow {
                name: product.name().to_string(),
                initial: record.initial(),
                sales: record.sales(),
                replenishment: record.replenishment(),
                final_count: product.derived_final(shift),
                total_stock: product.total_stock(),
            }
        })
        .collect();

    StockReport {
        title: DEFAULT_TITLE.to_string(),
        date: date.trim().to_string(),
        shift,
        shift_label: shift.label().to_string(),
        rows,
    }
}

/// Report date in the `dd/mm/yyyy` form the counter staff write by hand.
pub fn today_label() -> String {
    chrono::Local::now().format("%d/%m/%Y").to_string()
}
