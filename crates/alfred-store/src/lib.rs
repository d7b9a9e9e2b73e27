//! On-disk task state.
//!
//! One directory per task under the workspace root:
//!
//! ```text
//! {workspace_root}/
//!   {task_id}/
//!     task_state.json      # authoritative TaskState
//!     .state.lock          # advisory lock file (never removed)
//!     manifest.json        # TaskManifest index
//!     scratchpad.md        # derived view, regenerated on submit
//!     turns/
//!       001-{state}-{ts}.json
//! ```
//!
//! Every write goes through the temp-file-then-rename pattern so
//! readers never observe a partial file, and every read-modify-write
//! caller holds the task's exclusive advisory lock.

mod error;
mod lock;
mod scratchpad;
mod store;
mod turns;

pub use error::{Error, Result};
pub use lock::TaskLock;
pub use scratchpad::ScratchpadHeader;
pub use store::TaskStore;
pub use turns::NewTurn;
