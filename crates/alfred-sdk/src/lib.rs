//! alfred-sdk: drive alfred workflows programmatically.
//!
//! # Overview
//!
//! `alfred-sdk` is the stable surface over the engine internals. It
//! wires the runtime (registry, store, provider, templates) into a
//! [`Client`] and exposes the same operations the MCP tool surface
//! offers, plus the MCP stdio server itself.
//!
//! # Quickstart
//!
//! ```no_run
//! use alfred_sdk::Client;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Opens `.alfred` in the current directory (or ALFRED_PATH).
//!     let client = Client::connect_default()?;
//!
//!     let next = client.get_next_task();
//!     println!("{}", next.message);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! This SDK acts as a facade over:
//! - `alfred-types`: core domain model (TaskState, Turn, ToolResponse)
//! - `alfred-engine`: pure state-machine evaluation and validation
//! - `alfred-store`: lock-guarded on-disk task state
//! - `alfred-providers`: task definition sources
//! - `alfred-runtime`: the generic handler and transition drivers

pub mod client;
pub mod error;
pub mod mcp;
pub mod query;

pub use client::Client;
pub use error::{Error, Result};

/// Extension points for tools built on the SDK: implement
/// [`TaskProvider`] to plug in a remote tracker, use [`TaskStore`] to
/// inspect a workspace directly.
pub use alfred_providers::TaskProvider;
pub use alfred_store::TaskStore;

/// Re-exports of the domain types appearing in SDK responses.
pub mod types {
    pub use alfred_types::{
        ResponseStatus, Task, TaskManifest, TaskState, TaskStatus, ToolResponse, Turn,
        WorkflowState,
    };
}
