use crate::conflict::{conflict_counts, has_conflicts};
use crate::planner::PreviewRow;
use serde_json::json;

/// Render rows as pretty JSON
pub fn render_json(rows: &[PreviewRow]) -> String {
    serde_json::to_string_pretty(&json!({
        "has_conflicts": has_conflicts(rows),
        "counts": conflict_counts(rows),
        "rows": rows,
    }))
    .unwrap_or_else(|_| "null".to_string())
}
