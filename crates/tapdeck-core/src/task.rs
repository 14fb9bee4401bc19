/*
[INPUT]:  Task creation and lookup requests from the app layer.
[OUTPUT]: Task records grouping an ordered block tree under a stable id.
[POS]:    Data layer - the unit of persistence and replay.
[UPDATE]: When task fields or id allocation rules change.
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId};

pub const DEFAULT_TASK_NAME: &str = "New Task";

/// Identifier for one task: its creation time in epoch milliseconds.
/// Allocation bumps past the newest existing id, so ids stay unique and
/// ordered even when two tasks are created within the same millisecond.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub blocks: Vec<Block>,
    pub created: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId) -> Self {
        Self::named(id, DEFAULT_TASK_NAME)
    }

    pub fn named(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            blocks: Vec::new(),
            created: Utc::now(),
        }
    }

    pub fn find_block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find_map(|block| block.find(id))
    }

    pub fn find_block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find_map(|block| block.find_mut(id))
    }

    /// Total number of blocks in the tree, nested children included.
    pub fn block_count(&self) -> usize {
        self.blocks.iter().map(Block::subtree_len).sum()
    }
}

/// Next id for a creation-ordered collection: the current wall clock, pushed
/// past the newest existing id.
pub fn allocate_task_id(tasks: &[Task]) -> TaskId {
    let now = Utc::now().timestamp_millis();
    match tasks.iter().map(|task| task.id.0).max() {
        Some(newest) if newest >= now => TaskId(newest + 1),
        _ => TaskId(now),
    }
}
