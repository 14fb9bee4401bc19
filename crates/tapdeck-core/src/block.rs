/*
[INPUT]:  Editor operations building the block tree, persisted JSON documents.
[OUTPUT]: The Block tree - taps, loops, and functions with stable ids.
[POS]:    Data layer - tree types shared by editor, engine, and storage.
[UPDATE]: When block kinds or their persisted shape change.
*/

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::geometry::Region;

/// Identifier for one block. Assigned once at creation and preserved
/// verbatim across persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("block {0} not found")]
    NotFound(BlockId),
    #[error("block {0} cannot contain children")]
    NotAContainer(BlockId),
    #[error("block {0} cannot hold a region")]
    NotATap(BlockId),
    #[error("block {0} has no iteration count")]
    NotALoop(BlockId),
}

/// One node of a task's tree. Loops and functions own their children, so the
/// tree is finite and acyclic by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Tap {
        id: BlockId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<Region>,
    },
    Loop {
        id: BlockId,
        #[serde(default = "default_iterations")]
        iterations: u32,
        #[serde(default)]
        blocks: Vec<Block>,
    },
    Function {
        id: BlockId,
        #[serde(default)]
        blocks: Vec<Block>,
    },
}

fn default_iterations() -> u32 {
    1
}

impl Block {
    /// A tap with no region yet. Unconfigured taps replay as silent no-ops.
    pub fn tap() -> Self {
        Block::Tap {
            id: BlockId::new(),
            region: None,
        }
    }

    pub fn tap_in(region: Region) -> Self {
        Block::Tap {
            id: BlockId::new(),
            region: Some(region),
        }
    }

    pub fn loop_with(iterations: u32, blocks: Vec<Block>) -> Self {
        Block::Loop {
            id: BlockId::new(),
            iterations: iterations.max(1),
            blocks,
        }
    }

    pub fn function(blocks: Vec<Block>) -> Self {
        Block::Function {
            id: BlockId::new(),
            blocks,
        }
    }

    pub fn id(&self) -> BlockId {
        match self {
            Block::Tap { id, .. } | Block::Loop { id, .. } | Block::Function { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Block::Tap { .. } => "tap",
            Block::Loop { .. } => "loop",
            Block::Function { .. } => "function",
        }
    }

    pub fn region(&self) -> Option<Region> {
        match self {
            Block::Tap { region, .. } => *region,
            _ => None,
        }
    }

    pub fn set_region(&mut self, region: Region) -> Result<(), BlockError> {
        match self {
            Block::Tap { region: slot, .. } => {
                *slot = Some(region);
                Ok(())
            }
            _ => Err(BlockError::NotATap(self.id())),
        }
    }

    /// Clamps to at least one; a loop that exists runs at least once.
    pub fn set_iterations(&mut self, count: u32) -> Result<(), BlockError> {
        match self {
            Block::Loop { iterations, .. } => {
                *iterations = count.max(1);
                Ok(())
            }
            _ => Err(BlockError::NotALoop(self.id())),
        }
    }

    /// How many times the body runs. A stored zero (possible in hand-edited
    /// documents) executes once, same as an absent count.
    pub fn effective_iterations(&self) -> u32 {
        match self {
            Block::Loop { iterations, .. } => (*iterations).max(1),
            _ => 1,
        }
    }

    pub fn children(&self) -> &[Block] {
        match self {
            Block::Tap { .. } => &[],
            Block::Loop { blocks, .. } | Block::Function { blocks, .. } => blocks,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Block>> {
        match self {
            Block::Tap { .. } => None,
            Block::Loop { blocks, .. } | Block::Function { blocks, .. } => Some(blocks),
        }
    }

    pub fn push_child(&mut self, child: Block) -> Result<(), BlockError> {
        match self.children_mut() {
            Some(blocks) => {
                blocks.push(child);
                Ok(())
            }
            None => Err(BlockError::NotAContainer(self.id())),
        }
    }

    /// Depth-first search over the subtree, this block included.
    pub fn find(&self, id: BlockId) -> Option<&Block> {
        if self.id() == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        if self.id() == id {
            return Some(self);
        }
        self.children_mut()?
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    /// Size of the subtree, this block included.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(Block::subtree_len)
            .sum::<usize>()
    }
}
