//! Interrupt routing for Ctrl-C and SIGTERM.
//!
//! While the confirmation prompt is waiting nothing has been touched, so an
//! interrupt exits immediately. Once a batch runs, an interrupt only asks the
//! executor to stop starting new renames; files already under temp names are
//! still moved to their targets.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tracks whether we are currently prompting the user for confirmation.
static CONFIRMATION_PROMPT_ACTIVE: AtomicBool = AtomicBool::new(false);

/// RAII helper that marks the confirmation prompt as active while it is in scope.
pub struct ConfirmationPromptGuard;

impl ConfirmationPromptGuard {
    pub fn activate() -> Self {
        CONFIRMATION_PROMPT_ACTIVE.store(true, Ordering::SeqCst);
        Self
    }
}

impl Drop for ConfirmationPromptGuard {
    fn drop(&mut self) {
        CONFIRMATION_PROMPT_ACTIVE.store(false, Ordering::SeqCst);
    }
}

/// Returns true when the confirmation prompt is currently waiting for input.
pub fn confirmation_prompt_active() -> bool {
    CONFIRMATION_PROMPT_ACTIVE.load(Ordering::SeqCst)
}

/// Shared cancellation request, cloned into signal handlers and the executor.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// The flag handed to `ExecuteOptions::cancel`.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Nothing has been renamed yet; exit right away
    ExitNow,
    /// A batch may be running; let it wind down
    CancelBatch,
}

/// Decide what an interrupt means right now, recording a cancellation if needed.
pub fn on_interrupt(token: &CancelToken) -> InterruptAction {
    if confirmation_prompt_active() {
        InterruptAction::ExitNow
    } else {
        token.cancel();
        InterruptAction::CancelBatch
    }
}
