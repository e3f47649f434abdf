use super::display_name;
use crate::conflict::conflict_counts;
use crate::planner::{PreviewRow, RowStatus};
use comfy_table::{Cell, Color, ContentArrangement, Table};
use std::io::{self, IsTerminal};

fn cell_color(status: RowStatus) -> Color {
    match status {
        RowStatus::Ok => Color::Green,
        RowStatus::IllegalName => Color::Red,
        RowStatus::DuplicateTarget => Color::Yellow,
        RowStatus::ExistingConflict => Color::Magenta,
    }
}

/// Render preview rows as a table, one line per file
pub fn render_table(rows: &[PreviewRow], use_color: bool) -> String {
    let mut table = Table::new();

    if io::stdout().is_terminal() {
        table.set_content_arrangement(ContentArrangement::Dynamic);
    } else {
        table.set_content_arrangement(ContentArrangement::Disabled);
    }

    // Force styling even in non-TTY environments when colors are explicitly requested
    if use_color {
        table.enforce_styling();
        table.set_header(vec![
            Cell::new("#").fg(Color::Cyan),
            Cell::new("Current").fg(Color::Cyan),
            Cell::new("New").fg(Color::Cyan),
            Cell::new("Status").fg(Color::Cyan),
        ]);
    } else {
        table.set_header(vec!["#", "Current", "New", "Status"]);
    }

    for (index, row) in rows.iter().enumerate() {
        let number = (index + 1).to_string();
        let old_name = display_name(&row.old_path);
        let new_name = if row.is_noop() {
            "(unchanged)".to_string()
        } else {
            display_name(&row.new_path)
        };

        if use_color {
            table.add_row(vec![
                Cell::new(number).fg(Color::DarkGrey),
                Cell::new(old_name),
                Cell::new(new_name).fg(Color::Magenta),
                Cell::new(row.status.label()).fg(cell_color(row.status)),
            ]);
        } else {
            table.add_row(vec![number, old_name, new_name, row.status.label().to_string()]);
        }
    }

    let counts = conflict_counts(rows);
    let totals = format!(
        "{} to rename, {} unchanged, {} blocked",
        counts.ok - counts.unchanged,
        counts.unchanged,
        counts.blocking()
    );

    if use_color {
        table.add_row(vec![
            Cell::new("TOTALS").fg(Color::Cyan),
            Cell::new(format!("{} files", rows.len())).fg(Color::White),
            Cell::new(""),
            Cell::new(totals).fg(if counts.blocking() > 0 {
                Color::Red
            } else {
                Color::Green
            }),
        ]);
    } else {
        table.add_row(vec![
            "TOTALS".to_string(),
            format!("{} files", rows.len()),
            String::new(),
            totals,
        ]);
    }

    table.to_string()
}
