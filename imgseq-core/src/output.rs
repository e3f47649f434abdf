use crate::conflict::ConflictCounts;
use crate::executor::{RenameResult, RollbackNote};
use crate::planner::PreviewRow;
use crate::recover::{RecoveryReport, StrandedFile};
use crate::summary::RenameSummary;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

/// Result of a preview operation
#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResult {
    pub directory: PathBuf,
    pub prefix: String,
    pub rows: Vec<PreviewRow>,
    pub counts: ConflictCounts,
    pub has_conflicts: bool,
    /// Files left under temp names by an earlier batch
    pub stranded: Vec<StrandedFile>,
}

/// Result of a rename operation
#[derive(Debug, Serialize, Deserialize)]
pub struct RenameReport {
    pub batch_id: String,
    pub directory: PathBuf,
    pub prefix: String,
    pub dry_run: bool,
    /// The user declined the confirmation prompt
    pub aborted: bool,
    /// Mappings that needed a rename
    pub planned: usize,
    pub results: Vec<RenameResult>,
    pub summary: RenameSummary,
    /// Image count after re-listing the directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_after: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

impl RenameReport {
    pub fn is_success(&self) -> bool {
        self.summary.is_success()
    }
}

/// Result of a recover operation
#[derive(Debug, Serialize, Deserialize)]
pub struct RecoverResult {
    pub directory: PathBuf,
    pub dry_run: bool,
    pub stranded: Vec<StrandedFile>,
    pub report: RecoveryReport,
}

/// Result of a list operation
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResult {
    pub directory: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Result of a version command
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResult {
    pub name: String,
    pub version: String,
}

/// Trait for formatting output in different formats
pub trait OutputFormatter {
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.format_json(),
            OutputFormat::Summary => self.format_summary(),
        }
    }
    fn format_json(&self) -> String;
    fn format_summary(&self) -> String;
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

impl OutputFormatter for PreviewResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": !self.has_conflicts,
            "operation": "preview",
            "directory": self.directory,
            "prefix": self.prefix,
            "has_conflicts": self.has_conflicts,
            "summary": self.counts,
            "rows": self.rows,
            "stranded": self.stranded,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(
            output,
            "{} images, {} to rename, {} unchanged",
            self.rows.len(),
            self.counts.ok - self.counts.unchanged,
            self.counts.unchanged
        );

        if self.has_conflicts {
            let _ = writeln!(
                output,
                "Conflicts: {} illegal names, {} duplicate targets, {} existing files",
                self.counts.illegal_name,
                self.counts.duplicate_target,
                self.counts.existing_conflict
            );
            output.push_str("Rename is blocked until every row is OK\n");
        }

        if !self.stranded.is_empty() {
            let _ = writeln!(
                output,
                "Warning: {} files are still under temp names; run `imgseq recover` first",
                self.stranded.len()
            );
        }

        output
    }
}

impl OutputFormatter for RenameReport {
    fn format_json(&self) -> String {
        let operation = if self.dry_run { "dry_run" } else { "rename" };
        serde_json::to_string(&json!({
            "success": self.is_success() && !self.aborted,
            "operation": operation,
            "batch_id": self.batch_id,
            "directory": self.directory,
            "prefix": self.prefix,
            "aborted": self.aborted,
            "planned": self.planned,
            "summary": self.summary,
            "results": self.results,
            "files_after": self.files_after,
            "log_path": self.log_path,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.aborted {
            return "Aborted.\n".to_string();
        }
        if self.planned == 0 {
            return "Nothing to rename.\n".to_string();
        }
        if self.dry_run {
            return format!("Dry run: {} files would be renamed\n", self.planned);
        }

        let mut output = String::new();
        let _ = writeln!(
            output,
            "✓ Renamed {} of {} files",
            self.summary.success_count, self.summary.total
        );

        if !self.is_success() {
            let _ = writeln!(output, "✗ {} failed:", self.summary.failed_count);
            for message in &self.summary.error_messages {
                let _ = writeln!(output, "  {message}");
            }
        }

        for result in &self.results {
            match &result.rollback {
                Some(RollbackNote::SlotOccupied { temp_path, .. } | RollbackNote::Failed { temp_path, .. }) => {
                    let _ = writeln!(
                        output,
                        "! {} was left at {}",
                        file_name(&result.source),
                        file_name(temp_path)
                    );
                },
                Some(RollbackNote::Restored { .. }) | None => {},
            }
        }

        if let Some(count) = self.files_after {
            let _ = writeln!(output, "Directory now holds {count} images");
        }

        if let Some(ref path) = self.log_path {
            let _ = writeln!(output, "Log: {}", path.display());
        }

        output
    }
}

impl OutputFormatter for RecoverResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.report.is_clean(),
            "operation": "recover",
            "directory": self.directory,
            "dry_run": self.dry_run,
            "stranded": self.stranded,
            "restored": self.report.restored,
            "skipped": self.report.skipped,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        if self.stranded.is_empty() {
            return "No stranded temp files found.\n".to_string();
        }

        let mut output = String::new();
        if self.dry_run {
            for file in &self.stranded {
                let note = if file.slot_free { "" } else { " (name taken)" };
                let _ = writeln!(
                    output,
                    "{} -> {}{}",
                    file_name(&file.temp_path),
                    file_name(&file.original_path),
                    note
                );
            }
            return output;
        }

        for file in &self.report.restored {
            let _ = writeln!(
                output,
                "✓ {} -> {}",
                file_name(&file.temp_path),
                file_name(&file.original_path)
            );
        }
        for file in &self.report.skipped {
            let _ = writeln!(
                output,
                "✗ {}: {}",
                file_name(&file.temp_path),
                file.reason
            );
        }
        let _ = writeln!(
            output,
            "Restored {}, skipped {}",
            self.report.restored.len(),
            self.report.skipped.len()
        );

        output
    }
}

impl OutputFormatter for ListResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "directory": self.directory,
            "count": self.files.len(),
            "files": self.files,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();
        for file in &self.files {
            let _ = writeln!(output, "{}", file_name(file));
        }
        let _ = writeln!(output, "{} images", self.files.len());
        output
    }
}

impl OutputFormatter for VersionResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "name": self.name,
            "version": self.version,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::RowStatus;
    use crate::recover::{RestoredFile, SkippedFile};

    fn report(results: Vec<RenameResult>) -> RenameReport {
        let summary = RenameSummary::from_results(&results);
        RenameReport {
            batch_id: "abc123".to_string(),
            directory: PathBuf::from("/photos"),
            prefix: "Trip_".to_string(),
            dry_run: false,
            aborted: false,
            planned: results.len(),
            results,
            summary,
            files_after: Some(2),
            log_path: None,
        }
    }

    fn ok_result(old: &str, new: &str) -> RenameResult {
        RenameResult {
            source: PathBuf::from(old),
            reported_old: PathBuf::from(new),
            reported_new: PathBuf::from(new),
            success: true,
            error: None,
            rollback: None,
        }
    }

    #[test]
    fn test_preview_result_summary_and_json() {
        let rows = vec![
            PreviewRow {
                old_path: PathBuf::from("/photos/a.jpg"),
                new_path: PathBuf::from("/photos/Trip_001.jpg"),
                status: RowStatus::Ok,
            },
            PreviewRow {
                old_path: PathBuf::from("/photos/b.jpg"),
                new_path: PathBuf::from("/photos/Trip_002.jpg"),
                status: RowStatus::ExistingConflict,
            },
        ];
        let counts = crate::conflict::conflict_counts(&rows);
        let result = PreviewResult {
            directory: PathBuf::from("/photos"),
            prefix: "Trip_".to_string(),
            rows,
            counts,
            has_conflicts: true,
            stranded: vec![],
        };

        let summary = result.format_summary();
        assert!(summary.contains("2 images, 1 to rename, 0 unchanged"));
        assert!(summary.contains("1 existing files"));
        assert!(summary.contains("blocked"));

        let json: serde_json::Value = serde_json::from_str(&result.format_json()).unwrap();
        assert_eq!(json["operation"], "preview");
        assert_eq!(json["has_conflicts"], true);
        assert_eq!(json["rows"][1]["status"], "existing_conflict");
        assert_eq!(json["summary"]["existing_conflict"], 1);
    }

    #[test]
    fn test_rename_report_success() {
        let report = report(vec![
            ok_result("/photos/b.jpg", "/photos/Trip_001.jpg"),
            ok_result("/photos/a.jpg", "/photos/Trip_002.jpg"),
        ]);

        let summary = report.format_summary();
        assert!(summary.contains("✓ Renamed 2 of 2 files"));
        assert!(summary.contains("Directory now holds 2 images"));
        assert!(!summary.contains("failed"));

        let json: serde_json::Value = serde_json::from_str(&report.format_json()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["summary"]["success_count"], 2);
        assert_eq!(json["results"][0]["reported_new"], "/photos/Trip_001.jpg");
    }

    #[test]
    fn test_rename_report_failures_and_stranded_files() {
        let mut failed = ok_result("/photos/c.jpg", "/photos/Trip_003.jpg");
        failed.success = false;
        failed.error = Some("phase B failed: file is locked".to_string());
        failed.reported_old = PathBuf::from("/photos/c.__tmp__0123.jpg");
        failed.rollback = Some(RollbackNote::SlotOccupied {
            temp_path: PathBuf::from("/photos/c.__tmp__0123.jpg"),
            original_path: PathBuf::from("/photos/c.jpg"),
        });
        let report = report(vec![ok_result("/photos/a.jpg", "/photos/Trip_001.jpg"), failed]);

        let summary = report.format_summary();
        assert!(summary.contains("✓ Renamed 1 of 2 files"));
        assert!(summary.contains("✗ 1 failed:"));
        assert!(summary.contains("  c.jpg: phase B failed: file is locked"));
        assert!(summary.contains("! c.jpg was left at c.__tmp__0123.jpg"));

        let json: serde_json::Value = serde_json::from_str(&report.format_json()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["results"][1]["rollback"]["outcome"], "slot_occupied");
    }

    #[test]
    fn test_rename_report_short_forms() {
        let mut aborted = report(vec![]);
        aborted.aborted = true;
        assert_eq!(aborted.format_summary(), "Aborted.\n");

        let nothing = report(vec![]);
        assert_eq!(nothing.format_summary(), "Nothing to rename.\n");

        let mut dry_run = report(vec![]);
        dry_run.planned = 3;
        dry_run.dry_run = true;
        assert_eq!(dry_run.format_summary(), "Dry run: 3 files would be renamed\n");
        assert!(dry_run.format_json().contains("\"operation\":\"dry_run\""));
    }

    #[test]
    fn test_recover_result_formats() {
        let result = RecoverResult {
            directory: PathBuf::from("/photos"),
            dry_run: false,
            stranded: vec![StrandedFile {
                temp_path: PathBuf::from("/photos/a.__tmp__1.jpg"),
                original_path: PathBuf::from("/photos/a.jpg"),
                slot_free: true,
            }],
            report: RecoveryReport {
                restored: vec![RestoredFile {
                    temp_path: PathBuf::from("/photos/a.__tmp__1.jpg"),
                    original_path: PathBuf::from("/photos/a.jpg"),
                }],
                skipped: vec![SkippedFile {
                    temp_path: PathBuf::from("/photos/b.__tmp__2.jpg"),
                    original_path: PathBuf::from("/photos/b.jpg"),
                    reason: "original name is occupied".to_string(),
                }],
            },
        };

        let summary = result.format_summary();
        assert!(summary.contains("✓ a.__tmp__1.jpg -> a.jpg"));
        assert!(summary.contains("✗ b.__tmp__2.jpg: original name is occupied"));
        assert!(summary.contains("Restored 1, skipped 1"));
        assert!(result.format_json().contains("\"success\":false"));
    }

    #[test]
    fn test_empty_recover_result() {
        let result = RecoverResult {
            directory: PathBuf::from("/photos"),
            dry_run: true,
            stranded: vec![],
            report: RecoveryReport::default(),
        };
        assert_eq!(result.format_summary(), "No stranded temp files found.\n");
    }

    #[test]
    fn test_list_result_formats() {
        let result = ListResult {
            directory: PathBuf::from("/photos"),
            files: vec![PathBuf::from("/photos/a.jpg"), PathBuf::from("/photos/b.png")],
        };
        assert_eq!(result.format_summary(), "a.jpg\nb.png\n2 images\n");
        assert!(result.format_json().contains("\"count\":2"));
    }

    #[test]
    fn test_version_result_formats() {
        let result = VersionResult {
            name: "imgseq".to_string(),
            version: "1.0.0".to_string(),
        };

        assert_eq!(result.format(OutputFormat::Summary), "imgseq 1.0.0");
        let json = result.format(OutputFormat::Json);
        assert!(json.contains("\"name\":\"imgseq\""));
        assert!(json.contains("\"version\":\"1.0.0\""));
    }
}
