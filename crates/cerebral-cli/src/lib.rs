//! # cerebral-cli
//!
//! Command-line front-end for the Cerebral client.
//!
//! ## Commands
//!
//! - `cerebral load <branch>`: show a branch's memories
//! - `cerebral search <query>`: search one branch or all of them
//! - `cerebral add <branch>`: author a memory
//! - `cerebral stats`: per-branch statistics
//! - `cerebral chat`: talk to the conversation service
//! - `cerebral agents` / `cerebral flows`: introspect the conversation service

pub mod commands;
pub mod context;

pub use commands::Cli;
pub use context::AppContext;
