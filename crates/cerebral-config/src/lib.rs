//! # cerebral-config
//!
//! Configuration for the Cerebral client. Reads from `cerebral.toml` and
//! environment variables, in that precedence order (env wins).

pub mod schema;
pub mod loader;

pub use schema::CerebralConfig;
pub use schema::{ConfigWarning, ConversationConfig, LoggingConfig, MemoryConfig, UserConfig, WarningSeverity};
pub use loader::ConfigLoader;
