/*
[INPUT]:  User intents from a surface: task CRUD, block edits, pointer
          events, replay requests.
[OUTPUT]: Mutated collection state, persisted documents, presenter
          notifications, run reports.
[POS]:    Application layer - owns the collection, selector, engine, storage.
[UPDATE]: When user intents or the autosave policy change.
*/

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};

use crate::block::{Block, BlockError, BlockId};
use crate::config::AppConfig;
use crate::engine::{Engine, RunReport};
use crate::geometry::{Region, ScreenPoint, SurfaceBounds};
use crate::presenter::Presenter;
use crate::selector::{RegionSelector, SelectionOverlay};
use crate::storage::{StorageError, TaskStorage};
use crate::task::{Task, TaskId, allocate_task_id};

/// Where a new block lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTarget {
    /// Append to the current task's root sequence.
    Root,
    /// Append to a loop or function block's children.
    Inside(BlockId),
}

/// One object owning everything the simulator mutates: the task collection,
/// the current selection, the drag selector, storage, the engine, and the
/// presenter handle. Methods are the only mutation surface.
pub struct AppState {
    tasks: Vec<Task>,
    current: Option<TaskId>,
    selector: RegionSelector,
    storage: TaskStorage,
    engine: Engine,
    presenter: Arc<dyn Presenter>,
    autosave: bool,
}

impl AppState {
    /// Bring the app up from configuration: open the store, load the
    /// collection, wire a default-paced engine.
    pub async fn load(config: &AppConfig, presenter: Arc<dyn Presenter>) -> Result<Self> {
        let storage = match &config.data_dir {
            Some(dir) => TaskStorage::in_dir(dir.clone())
                .await
                .context("opening task store")?,
            None => TaskStorage::open_default()
                .await
                .context("opening task store")?,
        };
        let engine = Engine::new(presenter.clone());
        Self::with_engine(storage, engine, presenter, config.autosave).await
    }

    /// Explicit wiring, used by [`AppState::load`] and by callers that need
    /// their own engine pacing.
    pub async fn with_engine(
        storage: TaskStorage,
        engine: Engine,
        presenter: Arc<dyn Presenter>,
        autosave: bool,
    ) -> Result<Self> {
        let tasks = match storage.load().await {
            Ok(tasks) => tasks,
            // A corrupt store must not brick the app: start empty, keep the
            // file untouched until the next save.
            Err(StorageError::DataCorruption(error)) => {
                warn!(error = %error, "stored tasks unreadable; starting empty");
                Vec::new()
            }
            Err(error) => return Err(error).context("loading stored tasks"),
        };

        info!(count = tasks.len(), "task collection loaded");
        Ok(Self {
            tasks,
            current: None,
            selector: RegionSelector::new(),
            storage,
            engine,
            presenter,
            autosave,
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn current_id(&self) -> Option<TaskId> {
        self.current
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.current
            .and_then(|id| self.tasks.iter().find(|task| task.id == id))
    }

    pub fn armed_block(&self) -> Option<BlockId> {
        self.selector.armed()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    // ---- task collection ----

    /// New task with a fresh monotonic id; it becomes the current task.
    pub async fn create_task(&mut self) -> Result<TaskId> {
        let id = allocate_task_id(&self.tasks);
        self.tasks.push(Task::new(id));
        self.current = Some(id);
        info!(task_id = %id, "task created");

        self.persist().await?;
        self.notify(self.presenter.task_list_changed());
        Ok(id)
    }

    /// Switching tasks disarms the selector: a stale armed block must never
    /// receive a region from a later drag.
    pub fn select_task(&mut self, id: TaskId) -> Result<()> {
        if !self.tasks.iter().any(|task| task.id == id) {
            return Err(anyhow!("task '{id}' not found"));
        }
        self.current = Some(id);
        self.selector.disarm();
        debug!(task_id = %id, "task selected");
        Ok(())
    }

    pub async fn rename_task(&mut self, id: TaskId, name: &str) -> Result<()> {
        self.task_mut(id)?.name = name.to_string();
        self.persist().await?;
        self.notify(self.presenter.task_list_changed());
        Ok(())
    }

    pub async fn delete_task(&mut self, id: TaskId) -> Result<()> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| anyhow!("task '{id}' not found"))?;
        self.tasks.remove(index);

        if self.current == Some(id) {
            self.current = None;
            self.selector.disarm();
        }
        info!(task_id = %id, "task deleted");

        self.persist().await?;
        self.notify(self.presenter.task_list_changed());
        Ok(())
    }

    // ---- block editing ----

    pub async fn add_tap(&mut self, target: BlockTarget) -> Result<BlockId> {
        self.add_block(target, Block::tap()).await
    }

    pub async fn add_loop(&mut self, target: BlockTarget, iterations: u32) -> Result<BlockId> {
        self.add_block(target, Block::loop_with(iterations, Vec::new()))
            .await
    }

    pub async fn add_function(&mut self, target: BlockTarget) -> Result<BlockId> {
        self.add_block(target, Block::function(Vec::new())).await
    }

    async fn add_block(&mut self, target: BlockTarget, block: Block) -> Result<BlockId> {
        let id = block.id();
        let kind = block.kind();
        let task = self.current_task_mut()?;

        match target {
            BlockTarget::Root => task.blocks.push(block),
            BlockTarget::Inside(parent) => {
                task.find_block_mut(parent)
                    .ok_or(BlockError::NotFound(parent))?
                    .push_child(block)?;
            }
        }
        debug!(block_id = %id, kind, "block added");

        self.persist().await?;
        Ok(id)
    }

    pub async fn set_iterations(&mut self, block_id: BlockId, count: u32) -> Result<()> {
        self.current_task_mut()?
            .find_block_mut(block_id)
            .ok_or(BlockError::NotFound(block_id))?
            .set_iterations(count)?;
        self.persist().await
    }

    // ---- region selection ----

    /// Arm the selector for one tap block of the current task. When the
    /// block already has a region, the returned overlay shows it at its
    /// screen-projected position.
    pub fn arm_block(
        &mut self,
        block_id: BlockId,
        surface: SurfaceBounds,
    ) -> Result<Option<SelectionOverlay>> {
        let existing = {
            let task = self
                .current_task()
                .ok_or_else(|| anyhow!("no task selected"))?;
            let block = task
                .find_block(block_id)
                .ok_or(BlockError::NotFound(block_id))?;
            match block {
                Block::Tap { .. } => block.region(),
                _ => return Err(BlockError::NotATap(block_id).into()),
            }
        };

        debug!(block_id = %block_id, "selection armed");
        Ok(self.selector.arm(block_id, existing, surface))
    }

    pub fn disarm(&mut self) {
        self.selector.disarm();
    }

    pub fn pointer_down(&mut self, point: ScreenPoint) -> Option<SelectionOverlay> {
        self.selector.begin(point)
    }

    pub fn pointer_moved(&mut self, point: ScreenPoint) -> Option<SelectionOverlay> {
        self.selector.update(point)
    }

    /// Complete a drag: the selection becomes the armed block's region,
    /// degenerate rectangles included, then the change is persisted and
    /// announced. Without a drag in progress this is a no-op.
    pub async fn pointer_up(&mut self, surface: SurfaceBounds) -> Result<Option<Region>> {
        let Some(selection) = self.selector.end(surface) else {
            return Ok(None);
        };

        self.current_task_mut()?
            .find_block_mut(selection.block_id)
            .ok_or(BlockError::NotFound(selection.block_id))?
            .set_region(selection.region)?;
        info!(block_id = %selection.block_id, "region assigned");

        self.persist().await?;
        self.notify(
            self.presenter
                .region_changed(selection.block_id, selection.region),
        );
        Ok(Some(selection.region))
    }

    // ---- replay ----

    /// Replay the current task against the engine. The task is snapshotted
    /// for the run, so edits land on the next run; the engine's busy guard
    /// rejects overlapping calls.
    pub async fn execute_current(&self) -> Result<RunReport> {
        let task = self
            .current_task()
            .ok_or_else(|| anyhow!("no task selected"))?
            .clone();
        let report = self.engine.execute_task(&task).await?;
        Ok(report)
    }

    // ---- persistence ----

    /// Write the collection out now, regardless of the autosave setting.
    pub async fn save(&self) -> Result<()> {
        self.storage
            .save(&self.tasks)
            .await
            .context("saving tasks")?;
        debug!(count = self.tasks.len(), "task collection saved");
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        if !self.autosave {
            return Ok(());
        }
        self.save().await
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| anyhow!("task '{id}' not found"))
    }

    fn current_task_mut(&mut self) -> Result<&mut Task> {
        let id = self.current.ok_or_else(|| anyhow!("no task selected"))?;
        self.task_mut(id)
    }

    fn notify(&self, outcome: Result<()>) {
        if let Err(error) = outcome {
            warn!(error = %error, "presenter notification failed");
        }
    }
}
