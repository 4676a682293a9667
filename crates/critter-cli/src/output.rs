use critter_core::{ActionEvent, PipelineReport};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").trim_end());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

/// One human-readable line per completed stage.
pub fn describe(event: &ActionEvent) -> String {
    match event {
        ActionEvent::ReviewCreated { id } => format!("created review {id}"),
        ActionEvent::ReviewersAdded { count } => format!("added {count} reviewer(s)"),
        ActionEvent::ChangesetsAdded { count } => format!("added {count} changeset(s)"),
        ActionEvent::PatchesAdded { attempted, failed } if *failed > 0 => {
            format!("added {} of {attempted} patch(es)", attempted - failed)
        }
        ActionEvent::PatchesAdded { attempted, .. } => format!("added {attempted} patch(es)"),
        ActionEvent::ReviewStarted => "started review".to_string(),
    }
}

pub fn print_report(report: &PipelineReport) {
    if let Some(id) = &report.review_id {
        println!("Review {id}");
    }
    for event in &report.events {
        println!("  {}", describe(event));
    }
    for failure in &report.failures {
        eprintln!("warning: {} failed: {}", failure.stage, failure.message);
    }
}
