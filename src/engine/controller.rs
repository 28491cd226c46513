use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::{DiagnosticRun, RunProgress, SweepSnapshot};

use super::error::{SweepError, SweepResult};
use super::orchestrator::SweepEngine;

/// A sweep running in the background, with its own snapshot channel.
pub struct SweepHandle {
    snapshot_rx: watch::Receiver<SweepSnapshot>,
    task: JoinHandle<SweepResult<DiagnosticRun>>,
}

impl SweepHandle {
    /// Latest published state of this sweep.
    pub fn snapshot(&self) -> SweepSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that wakes on every publication.
    pub fn subscribe(&self) -> watch::Receiver<SweepSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the sweep to settle and take its run.
    pub async fn finish(self) -> SweepResult<DiagnosticRun> {
        self.task
            .await
            .map_err(|e| SweepError::TaskFailed(e.to_string()))?
    }
}

/// Entry point for the surrounding application: owns at most one current sweep.
///
/// Starting a run replaces the previous handle. The superseded task keeps going
/// on its own state until it settles, but nobody observes it any more.
pub struct SweepController {
    engine: Arc<SweepEngine>,
    current: Option<SweepHandle>,
}

impl SweepController {
    pub fn new(engine: Arc<SweepEngine>) -> Self {
        Self {
            engine,
            current: None,
        }
    }

    /// Validate the grid and spawn a fresh sweep on the tokio runtime.
    ///
    /// Must be called from inside a runtime. An empty axis fails here and
    /// leaves any current sweep untouched.
    pub fn start_run(
        &mut self,
        symbols: Vec<String>,
        timeframes: Vec<String>,
    ) -> SweepResult<&SweepHandle> {
        let total = SweepEngine::validate_grid(&symbols, &timeframes)?;

        let (tx, rx) = watch::channel(SweepSnapshot {
            loading: true,
            progress: RunProgress::new(total),
            results: Vec::new(),
            summary: None,
        });

        let engine = self.engine.clone();
        let task = tokio::spawn(async move {
            engine
                .run_with_observer(&symbols, &timeframes, &tx)
                .await
        });

        if self.current.is_some() {
            log::info!("New sweep requested, discarding previous sweep state");
        }

        let handle = self.current.insert(SweepHandle {
            snapshot_rx: rx,
            task,
        });
        Ok(&*handle)
    }

    pub fn current(&self) -> Option<&SweepHandle> {
        self.current.as_ref()
    }

    pub fn take_current(&mut self) -> Option<SweepHandle> {
        self.current.take()
    }

    /// Current sweep's snapshot, or an idle default when none was started.
    pub fn snapshot(&self) -> SweepSnapshot {
        self.current
            .as_ref()
            .map(SweepHandle::snapshot)
            .unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot().loading
    }
}
