use crate::escpos::{EscPosBuilder, PaperWidth};
use crate::ledger::StockField;
use crate::report::{StockReport, StockReportTotals};
use crate::settings::StockSettings;

/// Short headers for narrow paper.
const NARROW_HEADERS: [&str; 5] = ["Ini", "Sal", "Rep", "Fin", "Tot"];

fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn html_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<title>{}</title>
<style>
body {{ font-family: Arial, sans-serif; font-size: 10px; margin: 24px; }}
h1, h2 {{ text-align: center; margin: 4px 0; }}
.store {{ text-align: center; font-size: 11px; }}
table {{ width: 100%; border-collapse: collapse; margin-top: 10px; }}
th, td {{ border: 1px solid #000; padding: 4px; text-align: center; }}
th {{ background-color: #f0f0f0; }}
td.negative {{ color: #c00; font-weight: bold; }}
tfoot td {{ font-weight: bold; }}
</style>
</head>
<body>{}</body>
</html>"#,
        esc(title),
        body
    )
}

pub fn render_html(report: &StockReport, settings: &StockSettings) -> String {
    let mut body = String::with_capacity(256 + report.rows.len() * 160);
    if let Some(store) = settings
        .store_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        body.push_str(&format!("<div class=\"store\">{}</div>", esc(store)));
    }
    body.push_str(&format!(
        "<h1>{}</h1><h2>Date: {} - Shift: {}</h2>",
        esc(&report.title),
        esc(&report.date),
        esc(&report.shift_label)
    ));

    body.push_str("<table><thead><tr><th>Product</th>");
    for field in StockField::DISPLAY_ORDER {
        body.push_str(&format!("<th>{}</th>", field.label()));
    }
    body.push_str("</tr></thead><tbody>");

    for row in &report.rows {
        let final_cls = if row.final_count < 0 {
            " class=\"negative\""
        } else {
            ""
        };
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td{final_cls}>{}</td><td>{}</td></tr>",
            esc(&row.name),
            row.initial,
            row.sales,
            row.replenishment,
            row.final_count,
            row.total_stock
        ));
    }
    body.push_str("</tbody>");

    if !report.rows.is_empty() {
        let t = report.totals();
        body.push_str(&format!(
            "<tfoot><tr><td>Total</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr></tfoot>",
            t.initial, t.sales, t.replenishment, t.final_count, t.total_stock
        ));
    }
    body.push_str("</table>");

    html_shell(&format!("{} {}", report.title, report.date), &body)
}

// ---------------------------------------------------------------------------
// Fixed-width text
// ---------------------------------------------------------------------------

/// Narrowest number cell, including the leading gap.
const MIN_NUM_COL: usize = 5;
const MIN_NAME_COL: usize = 6;

fn truncate(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        let mut out = text.to_string();
        out.extend(std::iter::repeat(' ').take(width - count));
        return out;
    }
    if width <= 1 {
        return text.chars().take(width).collect();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('.');
    out
}

fn number_cells(values: &[String; 5], num_col: usize) -> String {
    values
        .iter()
        .map(|v| format!("{v:>num_col$}"))
        .collect::<Vec<_>>()
        .join("")
}

fn total_cells(t: &StockReportTotals) -> [String; 5] {
    [
        t.initial.to_string(),
        t.sales.to_string(),
        t.replenishment.to_string(),
        t.final_count.to_string(),
        t.total_stock.to_string(),
    ]
}

/// Table lines `width` characters wide: header, separator, one line per
/// product and a totals line. Number cells fit the widest value and keep a
/// one-space gap; the product name gets what is left and is truncated.
/// When even the minimum name column does not fit, lines grow past `width`.
pub fn render_text(report: &StockReport, width: usize) -> Vec<String> {
    let header_cells = NARROW_HEADERS.map(str::to_string);
    let row_cells: Vec<[String; 5]> = report
        .rows
        .iter()
        .map(|row| {
            [
                row.initial.to_string(),
                row.sales.to_string(),
                row.replenishment.to_string(),
                row.final_count.to_string(),
                row.total_stock.to_string(),
            ]
        })
        .collect();
    let totals = total_cells(&report.totals());

    let widest = std::iter::once(&header_cells)
        .chain(row_cells.iter())
        .chain(std::iter::once(&totals))
        .flat_map(|cells| cells.iter().map(|c| c.chars().count()))
        .max()
        .unwrap_or(0);
    let num_col = (widest + 1).max(MIN_NUM_COL);
    let width = width.max(num_col * 5 + MIN_NAME_COL);
    let name_col = width - num_col * 5;

    let mut lines = Vec::with_capacity(report.rows.len() + 6);
    lines.push(report.title.clone());
    lines.push(format!("Date: {}  Shift: {}", report.date, report.shift_label));
    lines.push("-".repeat(width));
    lines.push(format!(
        "{}{}",
        truncate("Product", name_col),
        number_cells(&header_cells, num_col)
    ));
    lines.push("-".repeat(width));
    for (row, cells) in report.rows.iter().zip(&row_cells) {
        lines.push(format!(
            "{}{}",
            truncate(&row.name, name_col),
            number_cells(cells, num_col)
        ));
    }
    lines.push("-".repeat(width));
    lines.push(format!(
        "{}{}",
        truncate("Total", name_col),
        number_cells(&totals, num_col)
    ));
    lines
}

// ---------------------------------------------------------------------------
// ESC/POS
// ---------------------------------------------------------------------------

pub fn render_escpos(report: &StockReport, paper: PaperWidth, store_name: Option<&str>) -> Vec<u8> {
    let mut builder = EscPosBuilder::new().with_paper(paper);
    builder.init().portuguese_mode().center();

    if let Some(store) = store_name.map(str::trim).filter(|s| !s.is_empty()) {
        builder.line(store);
    }
    builder
        .bold(true)
        .double_height()
        .line(&report.title)
        .normal_size()
        .bold(false)
        .line(&format!("Date: {}", report.date))
        .line(&format!("Shift: {}", report.shift_label))
        .left()
        .separator();

    // render_text already lays out the table; skip its own title block
    let lines = render_text(report, paper.chars());
    for (idx, line) in lines.iter().skip(3).enumerate() {
        if idx == 0 {
            builder.bold(true).line(line).bold(false);
        } else if line.starts_with('-') {
            builder.separator();
        } else {
            builder.line(line);
        }
    }

    builder.feed(3).cut();
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::ledger::{Shift, StockField, StockLedger};
    use crate::report;

    fn sample_report() -> StockReport {
        let mut ledger = StockLedger::from_catalog(&[
            CatalogEntry {
                name: "Coca".into(),
                total_stock: 24,
            },
            CatalogEntry {
                name: "Del Valle <Maracujá>".into(),
                total_stock: 6,
            },
        ]);
        ledger.update_field(Shift::Morning, "Coca", StockField::Initial, 20);
        ledger.update_field(Shift::Morning, "Coca", StockField::Sales, 5);
        ledger.update_field(Shift::Morning, "Del Valle <Maracujá>", StockField::Sales, 2);
        report::render(&ledger, Shift::Morning, "16/02/2026")
    }

    #[test]
    fn html_has_header_and_one_row_per_product() {
        let html = render_html(&sample_report(), &StockSettings::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Stock Report</h1>"));
        assert!(html.contains("<h2>Date: 16/02/2026 - Shift: MORNING</h2>"));
        assert_eq!(html.matches("<tr>").count(), 1 + 2 + 1);
        assert!(html.contains(
            "<tr><td>Coca</td><td>20</td><td>5</td><td>9</td><td>15</td><td>24</td></tr>"
        ));
    }

    #[test]
    fn html_escapes_names_and_flags_negative_final() {
        let html = render_html(&sample_report(), &StockSettings::default());
        assert!(html.contains("Del Valle &lt;Maracujá&gt;"));
        assert!(!html.contains("<Maracujá>"));
        assert!(html.contains("<td class=\"negative\">-2</td>"));
    }

    #[test]
    fn html_prints_store_name_when_configured() {
        let settings = StockSettings {
            store_name: Some("Bar & Grill".into()),
            ..StockSettings::default()
        };
        let html = render_html(&sample_report(), &settings);
        assert!(html.contains("<div class=\"store\">Bar &amp; Grill</div>"));
    }

    #[test]
    fn html_for_empty_report_has_no_body_rows() {
        let report = report::render(&StockLedger::default(), Shift::Night, "01/01/2026");
        let html = render_html(&report, &StockSettings::default());
        assert_eq!(html.matches("<tr>").count(), 1);
        assert!(!html.contains("<tfoot>"));
    }

    #[test]
    fn text_lines_fit_width() {
        let lines = render_text(&sample_report(), 48);
        for line in &lines[2..] {
            assert_eq!(line.chars().count(), 48, "{line:?}");
        }
        let coca = lines.iter().find(|l| l.starts_with("Coca")).expect("coca line");
        assert!(coca.ends_with("   20    5    9   15   24"));
        assert!(lines.last().unwrap().starts_with("Total"));
    }

    #[test]
    fn text_truncates_long_names() {
        let lines = render_text(&sample_report(), 32);
        let maracuja = lines
            .iter()
            .find(|l| l.starts_with("Del V"))
            .expect("row");
        assert_eq!(maracuja.chars().count(), 32);
        assert!(maracuja.contains('.'));
    }

    #[test]
    fn text_columns_stay_separated_for_wide_values() {
        let mut ledger = StockLedger::from_catalog(&[
            CatalogEntry {
                name: "Coca".into(),
                total_stock: 24,
            },
            CatalogEntry {
                name: "Mate".into(),
                total_stock: 12,
            },
        ]);
        ledger.update_field(Shift::Night, "Coca", StockField::Initial, 1000);
        ledger.update_field(Shift::Night, "Coca", StockField::Sales, 12000);
        ledger.update_field(Shift::Night, "Mate", StockField::Initial, 15000);
        let report = report::render(&ledger, Shift::Night, "16/02/2026");

        let width = 48;
        let lines = render_text(&report, width);
        for line in &lines[2..] {
            assert_eq!(line.chars().count(), width, "{line:?}");
        }

        let columns = |prefix: &str| -> Vec<String> {
            let line = lines
                .iter()
                .find(|l| l.starts_with(prefix))
                .expect("table line");
            line[prefix.len()..]
                .split_whitespace()
                .map(str::to_string)
                .collect()
        };
        assert_eq!(columns("Coca"), ["1000", "12000", "11024", "-11000", "24"]);
        assert_eq!(columns("Mate"), ["15000", "0", "0", "15000", "12"]);
        assert_eq!(columns("Total"), ["16000", "12000", "11024", "4000", "36"]);

        let ticket = render_escpos(&report, PaperWidth::Mm58, None);
        assert!(ticket.windows(13).any(|w| w == b" 11024 -11000"));
    }

    #[test]
    fn html_headers_follow_field_order() {
        let html = render_html(&sample_report(), &StockSettings::default());
        assert!(html.contains(
            "<th>Product</th><th>Initial</th><th>Sales</th><th>Replenishment</th><th>Final</th><th>Total Stock</th>"
        ));
    }

    #[test]
    fn escpos_starts_with_init_and_ends_with_cut() {
        let bytes = render_escpos(&sample_report(), PaperWidth::Mm80, Some("Bar"));
        assert_eq!(&bytes[..2], &[0x1B, 0x40]);
        assert_eq!(&bytes[bytes.len() - 4..], &[0x1D, 0x56, 0x41, 0x10]);
        assert!(bytes.windows(4).any(|w| w == b"Coca"));
    }
}
