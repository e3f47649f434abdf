#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod config;
pub mod conflict;
pub mod error;
pub mod executor;
pub mod interrupt;
pub mod listing;
pub mod lock;
pub mod log;
pub mod operations;
pub mod output;
pub mod planner;
pub mod preview;
pub mod progress;
pub mod recover;
pub mod retry;
pub mod summary;
pub mod temp_name;

pub use config::Config;
pub use conflict::{conflict_counts, has_conflicts, rename_mappings, ConflictCounts, RenameMapping};
pub use error::RenameError;
pub use executor::{two_phase_rename, ExecuteOptions, RenameExecutor, RenameResult, RollbackNote};
pub use interrupt::{on_interrupt, CancelToken, ConfirmationPromptGuard, InterruptAction};
pub use listing::{list_images, DirectoryLister, DEFAULT_IMAGE_EXTENSIONS};
pub use lock::LockFile;
pub use log::OperationLog;
pub use operations::{
    list_operation, preview_operation, recover_operation, rename_operation, RenameOptions,
};
pub use output::{
    ListResult, OutputFormat, OutputFormatter, PreviewResult, RecoverResult, RenameReport,
    VersionResult,
};
pub use planner::{
    plan_names, plan_names_with_snapshot, sequence_name, DirectorySnapshot, PreviewRow, RowStatus,
};
pub use preview::{render_rows, write_preview, Preview};
pub use progress::{
    spawn_batch, BatchEvent, BatchHandle, BatchOutcome, Generation, NoProgress, Progress,
    ProgressSink,
};
pub use recover::{find_stranded, recover_stranded, RecoveryReport, StrandedFile};
pub use retry::{
    classify_io_error, rename_with_retry, ErrorClass, RenameFs, RetryPolicy, StdFs,
};
pub use summary::RenameSummary;
