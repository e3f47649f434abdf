use super::{display_name, status_color};
use crate::conflict::conflict_counts;
use crate::planner::PreviewRow;
use std::fmt::Write;

/// Render rows as a plain line-per-file summary
pub fn render_summary(rows: &[PreviewRow], use_color: bool) -> String {
    let mut output = String::new();
    let counts = conflict_counts(rows);

    let _ = writeln!(output, "[PREVIEW]");
    let _ = writeln!(output, "Files: {}", rows.len());
    let _ = writeln!(output, "Rename: {}", counts.ok - counts.unchanged);
    let _ = writeln!(output, "Unchanged: {}", counts.unchanged);
    let _ = writeln!(output, "Blocked: {}", counts.blocking());
    let _ = writeln!(output);

    for row in rows {
        let line = format!(
            "{} -> {}",
            display_name(&row.old_path),
            display_name(&row.new_path)
        );
        if row.status.is_ok() {
            let _ = writeln!(output, "{line}");
        } else if use_color {
            let _ = writeln!(
                output,
                "{line} [{}]",
                status_color(row.status).paint(row.status.label())
            );
        } else {
            let _ = writeln!(output, "{line} [{}]", row.status.label());
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::tests::sample_rows;

    #[test]
    fn test_render_summary() {
        let result = render_summary(&sample_rows(), false);

        assert!(result.starts_with("[PREVIEW]\n"));
        assert!(result.contains("Files: 3\n"));
        assert!(result.contains("Rename: 1\n"));
        assert!(result.contains("Unchanged: 1\n"));
        assert!(result.contains("Blocked: 1\n"));
        assert!(result.contains("IMG_0003.jpg -> Trip_001.jpg\n"));
        assert!(result.contains("scan.TIF -> Trip_003.TIF [conflicts with existing file]\n"));
    }

    #[test]
    fn test_render_empty_summary() {
        let result = render_summary(&[], false);
        assert!(result.contains("Files: 0"));
        assert!(result.contains("Blocked: 0"));
    }
}
