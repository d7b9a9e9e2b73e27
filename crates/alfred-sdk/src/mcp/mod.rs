//! MCP (Model Context Protocol) server for alfred.
//!
//! Speaks JSON-RPC 2.0 over stdio: `initialize`, `tools/list` and
//! `tools/call`. Tool input schemas are generated from the structs in
//! [`crate::query`].

mod server;
mod tools;

pub use server::run_server;
