mod json;
mod summary;
mod table;

pub use json::render_json;
pub use summary::render_summary;
pub use table::render_table;

use crate::planner::{PreviewRow, RowStatus};
use anyhow::Result;
use nu_ansi_term::Color as AnsiColor;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preview {
    Table,
    Summary,
    Json,
    None,
}

impl std::str::FromStr for Preview {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "summary" => Ok(Self::Summary),
            "json" => Ok(Self::Json),
            "none" => Ok(Self::None),
            _ => Err(format!("Invalid preview format: {}", s)),
        }
    }
}

/// Determine whether to use colors based on explicit preference or terminal detection
pub fn should_use_color_with_detector<F>(use_color: Option<bool>, is_terminal: F) -> bool
where
    F: Fn() -> bool,
{
    match use_color {
        Some(explicit_color) => explicit_color,
        None => is_terminal(),
    }
}

/// Determine whether to use colors based on explicit preference or terminal detection
pub fn should_use_color(use_color: Option<bool>) -> bool {
    should_use_color_with_detector(use_color, || io::stdout().is_terminal())
}

/// Render preview rows in the specified format
pub fn render_rows(rows: &[PreviewRow], format: Preview, use_color: Option<bool>) -> String {
    let use_color = should_use_color(use_color);

    match format {
        Preview::Table => render_table(rows, use_color),
        Preview::Summary => render_summary(rows, use_color),
        Preview::Json => render_json(rows),
        Preview::None => String::new(),
    }
}

/// Write the preview to stdout
pub fn write_preview(rows: &[PreviewRow], format: Preview, use_color: Option<bool>) -> Result<()> {
    let output = render_rows(rows, format, use_color);
    let mut stdout = io::stdout();
    write!(stdout, "{}", output)?;
    stdout.flush()?;
    Ok(())
}

pub(crate) fn status_color(status: RowStatus) -> AnsiColor {
    match status {
        RowStatus::Ok => AnsiColor::Green,
        RowStatus::IllegalName => AnsiColor::Red,
        RowStatus::DuplicateTarget => AnsiColor::Yellow,
        RowStatus::ExistingConflict => AnsiColor::Magenta,
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
