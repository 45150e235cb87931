use crate::feed::projection::{Payload, RowView};
use std::fmt::Write;

const HEADER: [&str; 7] = ["#", "ID", "DEVICE", "CODE", "ACTION", "INDEX", "CREATED"];

/// Formats rows as a plain-text table. Expanded payloads are printed indented below their row.
pub fn render_table(rows: &[RowView]) -> String {
    let cells: Vec<[String; 7]> = rows
        .iter()
        .map(|row| {
            [
                row.seq.to_string(),
                row.id.clone(),
                row.device.clone(),
                row.code.clone(),
                row.action.clone(),
                row.index.to_string(),
                row.created.clone(),
            ]
        })
        .collect();

    let mut widths = HEADER.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_line(&mut out, &HEADER.map(str::to_string), &widths);
    for (row, cells) in rows.iter().zip(&cells) {
        write_line(&mut out, cells, &widths);
        match &row.payload {
            Payload::Collapsed => {}
            Payload::Expanded(json) => json.lines().for_each(|line| {
                let _ = writeln!(out, "    {}", line);
            }),
            Payload::Failed(e) => {
                let _ = writeln!(out, "    ⚠️ unable to format payload: {}", e);
            }
        }
    }
    out
}

fn write_line(out: &mut String, cells: &[String; 7], widths: &[usize; 7]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}
