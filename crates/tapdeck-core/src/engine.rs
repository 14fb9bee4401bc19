/*
[INPUT]:  A task tree, a presenter, and a cancellation token.
[OUTPUT]: A depth-first replay with timed tap effects and a per-run report.
[POS]:    Execution layer - drives block trees against the presenter seam.
[UPDATE]: When block semantics, pacing, or the error policy change.
*/

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::block::{Block, BlockId};
use crate::geometry::{DevicePoint, Region};
use crate::presenter::Presenter;
use crate::task::Task;

/// Pause for one simulated tap. This constant sets the playback pace of
/// every run; it is not configuration.
pub const TAP_FEEDBACK: Duration = Duration::from_millis(800);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long one simulated tap suspends the walk. Defaults to
    /// [`TAP_FEEDBACK`]; overridden in tests to keep them fast.
    pub tap_feedback: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tap_feedback: TAP_FEEDBACK,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a replay is already in flight")]
    Busy,
}

/// What one replay did.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub blocks_entered: u32,
    pub taps_performed: u32,
    /// Taps skipped because no region was assigned.
    pub taps_skipped: u32,
    /// Failures swallowed at block boundaries.
    pub errors: u32,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Replays one task at a time against a [`Presenter`].
///
/// The walk is strictly sequential: depth first, left to right, one simulated
/// tap in flight at any moment. A failure inside a block is caught at that
/// block's boundary, logged, and counted; the outer sequence keeps going.
pub struct Engine {
    presenter: Arc<dyn Presenter>,
    config: EngineConfig,
    busy: AtomicBool,
    shutdown: CancellationToken,
}

impl Engine {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self::with_config(presenter, EngineConfig::default())
    }

    pub fn with_config(presenter: Arc<dyn Presenter>, config: EngineConfig) -> Self {
        Self {
            presenter,
            config,
            busy: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops replays at the next block boundary and interrupts an
    /// in-flight tap suspension. A cancelled run still returns its report.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Replay `task` from the first root block. A second call while a run is
    /// in flight is rejected with [`EngineError::Busy`]; the guard releases
    /// when the run finishes on any path.
    pub async fn execute_task(&self, task: &Task) -> Result<RunReport, EngineError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            warn!(task_id = %task.id, "replay rejected; another run is in flight");
            return Err(EngineError::Busy);
        }
        let _busy = BusyGuard(&self.busy);

        let cancel = self.shutdown.child_token();
        Ok(self.run(task, &cancel).await)
    }

    async fn run(&self, task: &Task, cancel: &CancellationToken) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport::default();

        info!(task_id = %task.id, blocks = task.block_count(), "replay started");
        for block in &task.blocks {
            if cancel.is_cancelled() {
                break;
            }
            self.execute_block(block, &mut report, cancel).await;
        }

        report.cancelled = cancel.is_cancelled();
        report.elapsed = started.elapsed();
        info!(
            task_id = %task.id,
            taps = report.taps_performed,
            skipped = report.taps_skipped,
            errors = report.errors,
            cancelled = report.cancelled,
            "replay finished"
        );
        report
    }

    fn execute_block<'a>(
        &'a self,
        block: &'a Block,
        report: &'a mut RunReport,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            report.blocks_entered += 1;
            self.notify(self.presenter.block_entered(block.id()), block.id());
            debug!(block_id = %block.id(), kind = block.kind(), "block entered");

            if let Err(error) = self.dispatch(block, report, cancel).await {
                report.errors += 1;
                warn!(
                    block_id = %block.id(),
                    kind = block.kind(),
                    error = %error,
                    "block failed; continuing with the rest of the run"
                );
            }

            self.notify(self.presenter.block_exited(block.id()), block.id());
        })
    }

    async fn dispatch(
        &self,
        block: &Block,
        report: &mut RunReport,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        match block {
            Block::Tap { region: None, .. } => {
                report.taps_skipped += 1;
                debug!(block_id = %block.id(), "tap has no region; skipping");
                Ok(())
            }
            Block::Tap {
                region: Some(region),
                ..
            } => self.perform_tap(*region, report, cancel).await,
            Block::Loop { blocks, .. } => {
                let runs = block.effective_iterations();
                for iteration in 0..runs {
                    if cancel.is_cancelled() {
                        break;
                    }
                    debug!(
                        block_id = %block.id(),
                        iteration = iteration + 1,
                        total = runs,
                        "loop iteration"
                    );
                    for child in blocks {
                        if cancel.is_cancelled() {
                            break;
                        }
                        self.execute_block(child, report, cancel).await;
                    }
                }
                Ok(())
            }
            Block::Function { blocks, .. } => {
                for child in blocks {
                    if cancel.is_cancelled() {
                        break;
                    }
                    self.execute_block(child, report, cancel).await;
                }
                Ok(())
            }
        }
    }

    async fn perform_tap(
        &self,
        region: Region,
        report: &mut RunReport,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let point = sample_point(region);
        self.presenter.tap_feedback(point)?;
        report.taps_performed += 1;
        debug!(x = point.x, y = point.y, "simulated tap");

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.config.tap_feedback) => {}
        }
        Ok(())
    }

    fn notify(&self, outcome: anyhow::Result<()>, block_id: BlockId) {
        if let Err(error) = outcome {
            warn!(block_id = %block_id, error = %error, "presenter notification failed");
        }
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Uniform point in the region's bounding box. Each axis samples
/// `min + unit * extent`, so a zero-extent axis lands exactly on its line.
fn sample_point(region: Region) -> DevicePoint {
    let mut rng = rand::thread_rng();
    DevicePoint {
        x: region.min_x() + rng.gen_range(0.0..1.0) * region.width(),
        y: region.min_y() + rng.gen_range(0.0..1.0) * region.height(),
    }
}
