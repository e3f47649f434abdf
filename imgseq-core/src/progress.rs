//! Progress reporting and the background batch pipeline.
//!
//! A batch runs on a worker thread and reports back over a channel. Every
//! event carries the generation that was current when the batch started; the
//! receiving side drops events whose generation is no longer current, so a
//! view that moved on (new directory, new preview) never sees updates from a
//! batch it no longer cares about.

use crate::conflict::RenameMapping;
use crate::executor::{ExecuteOptions, RenameExecutor, RenameResult};
use crate::log::OperationLog;
use crate::retry::RenameFs;
use crate::summary::RenameSummary;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Completed units out of the batch total. A batch of `n` mappings has
/// `2 * n` units, one per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Fraction done in `0.0..=1.0`; an empty batch counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Receives one tick per completed unit.
pub trait ProgressSink {
    fn tick(&mut self, progress: Progress);
}

impl<F: FnMut(Progress)> ProgressSink for F {
    fn tick(&mut self, progress: Progress) {
        self(progress);
    }
}

/// Discards every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn tick(&mut self, _progress: Progress) {}
}

/// Shared counter identifying the batch a view currently cares about.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Invalidate every batch started so far. Returns the new generation.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Everything a finished batch produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<RenameResult>,
    pub summary: RenameSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Progress { generation: u64, progress: Progress },
    Finished { generation: u64, outcome: BatchOutcome },
}

impl BatchEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Progress { generation, .. } | Self::Finished { generation, .. } => *generation,
        }
    }
}

/// Receiving end of a background batch.
pub struct BatchHandle {
    receiver: Receiver<BatchEvent>,
    generation: Generation,
    started_at: u64,
    worker: Option<JoinHandle<()>>,
}

impl BatchHandle {
    /// Generation the batch was started under.
    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn is_stale(&self) -> bool {
        !self.generation.is_current(self.started_at)
    }

    fn accept(&self, event: BatchEvent) -> Option<BatchEvent> {
        self.generation
            .is_current(event.generation())
            .then_some(event)
    }

    /// Block for the next event that is still current. `None` once the
    /// worker has hung up.
    pub fn recv(&self) -> Option<BatchEvent> {
        while let Ok(event) = self.receiver.recv() {
            if let Some(event) = self.accept(event) {
                return Some(event);
            }
        }
        None
    }

    /// Next current event without blocking.
    pub fn try_recv(&self) -> Option<BatchEvent> {
        while let Ok(event) = self.receiver.try_recv() {
            if let Some(event) = self.accept(event) {
                return Some(event);
            }
        }
        None
    }

    /// Drain the batch, forwarding progress, and join the worker.
    ///
    /// Returns `None` when the batch went stale before it finished; its
    /// renames still ran to completion on disk.
    pub fn wait(mut self, mut on_progress: impl FnMut(Progress)) -> Result<Option<BatchOutcome>> {
        let mut outcome = None;
        while let Some(event) = self.recv() {
            match event {
                BatchEvent::Progress { progress, .. } => on_progress(progress),
                BatchEvent::Finished { outcome: done, .. } => outcome = Some(done),
            }
        }
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| anyhow!("Rename worker thread panicked"))?;
        }
        Ok(outcome)
    }
}

/// Run a batch on a worker thread.
pub fn spawn_batch<F>(
    fs: F,
    mappings: Vec<RenameMapping>,
    options: ExecuteOptions,
    log: OperationLog,
    generation: &Generation,
) -> Result<BatchHandle>
where
    F: RenameFs + Send + 'static,
{
    let started_at = generation.current();
    let (sender, receiver) = mpsc::channel();

    let worker = thread::Builder::new()
        .name("imgseq-rename".to_string())
        .spawn(move || {
            let progress_sender = sender.clone();
            let mut sink = |progress: Progress| {
                let _ = progress_sender.send(BatchEvent::Progress {
                    generation: started_at,
                    progress,
                });
            };
            let results = RenameExecutor::new(&fs, options)
                .with_log(log)
                .run(&mappings, &mut sink);
            let summary = RenameSummary::from_results(&results);
            let _ = sender.send(BatchEvent::Finished {
                generation: started_at,
                outcome: BatchOutcome { results, summary },
            });
        })
        .context("Failed to start rename worker thread")?;

    Ok(BatchHandle {
        receiver,
        generation: generation.clone(),
        started_at,
        worker: Some(worker),
    })
}
