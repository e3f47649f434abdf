use crate::executor::RenameResult;
use serde::{Deserialize, Serialize};

/// Counts and per-file error messages for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameSummary {
    pub total: usize,
    pub success_count: usize,
    pub failed_count: usize,
    /// One `<file name>: <cause>` line per failed mapping, in result order
    pub error_messages: Vec<String>,
}

impl RenameSummary {
    pub fn from_results(results: &[RenameResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };

        for result in results {
            if result.success {
                summary.success_count += 1;
                continue;
            }
            summary.failed_count += 1;
            let name = result
                .source
                .file_name()
                .map_or_else(|| result.source.display().to_string(), |n| {
                    n.to_string_lossy().into_owned()
                });
            let cause = result.error.as_deref().unwrap_or("unknown error");
            summary.error_messages.push(format!("{name}: {cause}"));
        }

        summary
    }

    pub fn is_success(&self) -> bool {
        self.failed_count == 0
    }
}
