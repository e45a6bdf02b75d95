//! Shift stock ledger for The Small Stock.
//!
//! Holds the fixed product catalog and, per product, one record for the
//! morning shift and one for the night shift. Only `initial` and `sales` are
//! stored as entered; `replenishment` is recomputed on every edit and
//! `final` is derived on read.
//!
//! Replenishment rule: `max(0, total_stock - initial + sales)`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::CatalogEntry;

// ---------------------------------------------------------------------------
// Shift
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    #[serde(alias = "manha", alias = "MORNING", alias = "Morning")]
    Morning,
    #[serde(alias = "noite", alias = "NIGHT", alias = "Night")]
    Night,
}

impl Shift {
    pub const ALL: [Shift; 2] = [Shift::Morning, Shift::Night];

    /// Parse a shift name as sent by the frontend. Accepts the legacy
    /// `manha`/`noite` tab names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "morning" | "manha" | "manhã" => Some(Self::Morning),
            "night" | "noite" => Some(Self::Night),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Shift::Morning => "morning",
            Shift::Night => "night",
        }
    }

    /// Upper-case label printed in report headers.
    pub fn label(self) -> &'static str {
        match self {
            Shift::Morning => "MORNING",
            Shift::Night => "NIGHT",
        }
    }
}

impl std::fmt::Display for Shift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// The five values shown per product and shift, in display order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StockField {
    Initial,
    Sales,
    Replenishment,
    Final,
    TotalStock,
}

impl StockField {
    pub const DISPLAY_ORDER: [StockField; 5] = [
        StockField::Initial,
        StockField::Sales,
        StockField::Replenishment,
        StockField::Final,
        StockField::TotalStock,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "initial" | "inicial" => Some(Self::Initial),
            "sales" | "vendas" => Some(Self::Sales),
            "replenishment" | "reposicao" | "reposição" => Some(Self::Replenishment),
            "final" => Some(Self::Final),
            "totalstock" | "total_stock" | "estoque" => Some(Self::TotalStock),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StockField::Initial => "Initial",
            StockField::Sales => "Sales",
            StockField::Replenishment => "Replenishment",
            StockField::Final => "Final",
            StockField::TotalStock => "Total Stock",
        }
    }
}

// ---------------------------------------------------------------------------
// Input coercion
// ---------------------------------------------------------------------------

/// Coerce a raw form value into a unit count.
///
/// Numbers are truncated toward zero, negatives and anything non-numeric
/// become 0, and values past `u32::MAX` saturate.
pub fn coerce_quantity(value: &Value) -> u32 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u.min(u32::MAX as u64) as u32
            } else {
                n.as_f64().map(quantity_from_f64).unwrap_or(0)
            }
        }
        Value::String(s) => coerce_quantity_str(s),
        _ => 0,
    }
}

pub fn coerce_quantity_str(text: &str) -> u32 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0;
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return u.min(u32::MAX as u64) as u32;
    }
    trimmed.parse::<f64>().map(quantity_from_f64).unwrap_or(0)
}

fn quantity_from_f64(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    // `as` saturates at u32::MAX
    value.trunc() as u32
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRecord {
    initial: u32,
    sales: u32,
    replenishment: u32,
}

impl ShiftRecord {
    pub fn initial(&self) -> u32 {
        self.initial
    }

    pub fn sales(&self) -> u32 {
        self.sales
    }

    pub fn replenishment(&self) -> u32 {
        self.replenishment
    }

    /// Units left at the end of the shift. Not clamped: a negative value
    /// means more was sold than was counted at shift start.
    pub fn final_count(&self) -> i64 {
        i64::from(self.initial) - i64::from(self.sales)
    }

    fn recompute(&mut self, total_stock: u32) {
        self.replenishment = replenishment_for(total_stock, self.initial, self.sales);
    }
}

/// Units needed to bring the shift back to nominal stock, floored at zero.
pub fn replenishment_for(total_stock: u32, initial: u32, sales: u32) -> u32 {
    let needed = i64::from(total_stock) - i64::from(initial) + i64::from(sales);
    needed.clamp(0, i64::from(u32::MAX)) as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ShiftRecords {
    morning: ShiftRecord,
    night: ShiftRecord,
}

impl ShiftRecords {
    fn get(&self, shift: Shift) -> &ShiftRecord {
        match shift {
            Shift::Morning => &self.morning,
            Shift::Night => &self.night,
        }
    }

    fn get_mut(&mut self, shift: Shift) -> &mut ShiftRecord {
        match shift {
            Shift::Morning => &mut self.morning,
            Shift::Night => &mut self.night,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    name: String,
    total_stock: u32,
    shifts: ShiftRecords,
}

impl Product {
    fn new(name: impl Into<String>, total_stock: u32) -> Self {
        Self {
            name: name.into(),
            total_stock,
            shifts: ShiftRecords::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_stock(&self) -> u32 {
        self.total_stock
    }

    pub fn record(&self, shift: Shift) -> &ShiftRecord {
        self.shifts.get(shift)
    }

    pub fn derived_final(&self, shift: Shift) -> i64 {
        self.record(shift).final_count()
    }

    pub fn view(&self, shift: Shift) -> ProductView {
        let record = self.record(shift);
        ProductView {
            name: self.name.clone(),
            initial: record.initial,
            sales: record.sales,
            replenishment: record.replenishment,
            final_count: record.final_count(),
            total_stock: self.total_stock,
        }
    }
}

/// Flat, serializable view of one product for one shift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub name: String,
    pub initial: u32,
    pub sales: u32,
    pub replenishment: u32,
    #[serde(rename = "final")]
    pub final_count: i64,
    pub total_stock: u32,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    UnknownProduct,
    ReadOnlyField,
}

impl UpdateOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOutcome::Applied => "applied",
            UpdateOutcome::UnknownProduct => "unknown_product",
            UpdateOutcome::ReadOnlyField => "read_only_field",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockLedger {
    products: Vec<Product>,
}

impl StockLedger {
    /// Seed a ledger from catalog entries with both shifts zeroed.
    ///
    /// Entries repeating an earlier name are skipped; the catalog loader
    /// already rejects them, this only guards hand-built lists.
    pub fn from_catalog(entries: &[CatalogEntry]) -> Self {
        let mut products: Vec<Product> = Vec::with_capacity(entries.len());
        for entry in entries {
            if products.iter().any(|p| p.name == entry.name) {
                continue;
            }
            let mut product = Product::new(entry.name.clone(), entry.total_stock);
            for shift in Shift::ALL {
                product.shifts.get_mut(shift).recompute(product.total_stock);
            }
            products.push(product);
        }
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Set `initial` or `sales` on one product's shift record and restore the
    /// replenishment rule. Unknown products and derived fields are ignored.
    pub fn update_field(
        &mut self,
        shift: Shift,
        product_name: &str,
        field: StockField,
        value: u32,
    ) -> UpdateOutcome {
        // Only the counts typed in by staff are editable; everything else is
        // derived from them.
        let set: fn(&mut ShiftRecord, u32) = match field {
            StockField::Initial => |record, v| record.initial = v,
            StockField::Sales => |record, v| record.sales = v,
            StockField::Replenishment | StockField::Final | StockField::TotalStock => {
                return UpdateOutcome::ReadOnlyField
            }
        };
        let Some(product) = self.products.iter_mut().find(|p| p.name == product_name) else {
            return UpdateOutcome::UnknownProduct;
        };

        let total_stock = product.total_stock;
        let record = product.shifts.get_mut(shift);
        set(record, value);
        record.recompute(total_stock);
        UpdateOutcome::Applied
    }

    /// Same as [`update_field`](Self::update_field) but takes the raw form
    /// value and coerces it first.
    pub fn update_field_raw(
        &mut self,
        shift: Shift,
        product_name: &str,
        field: StockField,
        value: &Value,
    ) -> UpdateOutcome {
        self.update_field(shift, product_name, field, coerce_quantity(value))
    }

    pub fn derived_final(&self, product_name: &str, shift: Shift) -> Option<i64> {
        self.product(product_name).map(|p| p.derived_final(shift))
    }

    pub fn views(&self, shift: Shift) -> Vec<ProductView> {
        self.products.iter().map(|p| p.view(shift)).collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
