/*
[INPUT]:  Public API exports for tapdeck-core crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod app;
pub mod block;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod presenter;
pub mod selector;
pub mod storage;
pub mod task;

// Re-export main types for convenience
pub use app::{AppState, BlockTarget};
pub use block::{Block, BlockError, BlockId};
pub use config::AppConfig;
pub use engine::{Engine, EngineConfig, EngineError, RunReport, TAP_FEEDBACK};
pub use geometry::{
    DEVICE_HEIGHT, DEVICE_WIDTH, DevicePoint, Region, ScreenPoint, SurfaceBounds,
};
pub use presenter::{
    ChannelPresenter, ExecutionHighlights, NullPresenter, Presenter, SurfaceEvent,
};
pub use selector::{RegionSelection, RegionSelector, SelectionOverlay, SelectorState};
pub use storage::{StorageError, TaskStorage};
pub use task::{DEFAULT_TASK_NAME, Task, TaskId};
