/*
[INPUT]:  Replay progress and model changes from the engine and app state.
[OUTPUT]: Fire-and-forget notifications a UI can render.
[POS]:    Presentation seam - the only path from the core to a surface.
[UPDATE]: When the notification set or delivery guarantees change.
*/

use std::collections::HashSet;

use tokio::sync::mpsc;

use crate::block::BlockId;
use crate::geometry::{DevicePoint, Region};

/// Everything the core tells a surface about.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// Replay entered a block (highlight on).
    BlockEntered(BlockId),

    /// Replay left a block (highlight off).
    BlockExited(BlockId),

    /// A simulated tap landed at a device point.
    TapFeedback(DevicePoint),

    /// A tap block's region was assigned or replaced.
    RegionChanged(BlockId, Region),

    /// Task membership or names changed.
    TaskListChanged,
}

/// Receives core notifications. Callers treat every method as
/// fire-and-forget: a failed notification is logged and skipped, so a broken
/// surface can never stall or reorder a replay.
pub trait Presenter: Send + Sync {
    fn block_entered(&self, id: BlockId) -> anyhow::Result<()>;
    fn block_exited(&self, id: BlockId) -> anyhow::Result<()>;
    fn tap_feedback(&self, point: DevicePoint) -> anyhow::Result<()>;
    fn region_changed(&self, id: BlockId, region: Region) -> anyhow::Result<()>;
    fn task_list_changed(&self) -> anyhow::Result<()>;
}

/// Forwards every notification as a [`SurfaceEvent`] over an unbounded
/// channel. Send failures are dropped: a surface that went away must not
/// take the core with it.
pub struct ChannelPresenter {
    events: mpsc::UnboundedSender<SurfaceEvent>,
}

impl ChannelPresenter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SurfaceEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self { events }, receiver)
    }

    fn forward(&self, event: SurfaceEvent) {
        let _ = self.events.send(event);
    }
}

impl Presenter for ChannelPresenter {
    fn block_entered(&self, id: BlockId) -> anyhow::Result<()> {
        self.forward(SurfaceEvent::BlockEntered(id));
        Ok(())
    }

    fn block_exited(&self, id: BlockId) -> anyhow::Result<()> {
        self.forward(SurfaceEvent::BlockExited(id));
        Ok(())
    }

    fn tap_feedback(&self, point: DevicePoint) -> anyhow::Result<()> {
        self.forward(SurfaceEvent::TapFeedback(point));
        Ok(())
    }

    fn region_changed(&self, id: BlockId, region: Region) -> anyhow::Result<()> {
        self.forward(SurfaceEvent::RegionChanged(id, region));
        Ok(())
    }

    fn task_list_changed(&self) -> anyhow::Result<()> {
        self.forward(SurfaceEvent::TaskListChanged);
        Ok(())
    }
}

/// Discards every notification, for headless runs.
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn block_entered(&self, _id: BlockId) -> anyhow::Result<()> {
        Ok(())
    }

    fn block_exited(&self, _id: BlockId) -> anyhow::Result<()> {
        Ok(())
    }

    fn tap_feedback(&self, _point: DevicePoint) -> anyhow::Result<()> {
        Ok(())
    }

    fn region_changed(&self, _id: BlockId, _region: Region) -> anyhow::Result<()> {
        Ok(())
    }

    fn task_list_changed(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Folds enter/exit events into the set of currently highlighted blocks.
/// The core only ever speaks block ids; whatever per-block handle a surface
/// keeps is looked up on this side of the seam.
#[derive(Debug, Default)]
pub struct ExecutionHighlights {
    active: HashSet<BlockId>,
}

impl ExecutionHighlights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &SurfaceEvent) {
        match event {
            SurfaceEvent::BlockEntered(id) => {
                self.active.insert(*id);
            }
            SurfaceEvent::BlockExited(id) => {
                self.active.remove(id);
            }
            _ => {}
        }
    }

    pub fn is_highlighted(&self, id: BlockId) -> bool {
        self.active.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
