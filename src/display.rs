//! ASCII rendering of panels for logs and terminal debugging.
//!
//! The dashboard draws its own widgets; this renderer exists so a panel can
//! be eyeballed in a log line or a REPL without the frontend. Column order
//! is the caller's array, matching what the dashboard would show.

use crate::pivot::Panel;

/// Format a panel as a fixed-width ASCII table.
///
/// Absent cells and NaN summaries print as `-`. Curve panels get an extra
/// `Rate` column.
#[must_use]
pub fn format_panel_table(panel: &Panel, columns: &[String]) -> String {
    let mut output = String::new();
    output.push_str(&format!("Panel: {}\n", panel.label));

    let has_rates = panel.rows.iter().any(|r| r.target_rate.is_some());

    let mut header = format!("{:<24}", "Row");
    if has_rates {
        header.push_str(&format!("{:>8}", "Rate"));
    }
    for column in columns {
        header.push_str(&format!("{:>10}", column));
    }
    header.push_str(&format!("{:>10}", "Avg"));
    output.push_str(&header);
    output.push('\n');
    output.push_str(&"-".repeat(header.len()));
    output.push('\n');

    for row in &panel.rows {
        let mut line = format!("{:<24}", row.name);
        if has_rates {
            match row.target_rate {
                Some(rate) => line.push_str(&format!("{rate:>8.2}")),
                None => line.push_str(&format!("{:>8}", "-")),
            }
        }
        for column in columns {
            let cell = row.column_values.get(column).copied().flatten();
            line.push_str(&format_cell(cell));
        }
        let average = (!row.average.is_nan()).then_some(row.average);
        line.push_str(&format_cell(average));
        output.push_str(&line);
        output.push('\n');
    }

    output
}

fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{v:>10.3}"),
        _ => format!("{:>10}", "-"),
    }
}
