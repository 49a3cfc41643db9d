//! # cerebral-memory
//!
//! Client side of the memory service:
//!
//! - **Backend port**: [`MemoryBackend`] with an HTTP adapter and an in-process mock.
//! - **Normalizer**: turns raw backend records into canonical [`Memory`] values
//!   and decides their provenance.
//! - **Fallback**: demo memories and stats for degraded mode, plus a local
//!   SQLite store for memories created while the backend is down.
//! - **Client**: [`MemoryClient`], which ties the above together and keeps
//!   the cache of the branch currently shown.
//!
//! [`Memory`]: cerebral_core::Memory

pub mod backend;
pub mod client;
pub mod fallback;
pub mod http;
pub mod local_store;
pub mod mock;
pub mod normalizer;

pub use backend::{AddRequest, DeleteRequest, MemoryBackend, RegionStats, SearchRequest, StatsResponse};
pub use client::{AddOutcome, MemoryClient, filter_by_provenance};
pub use fallback::{DEMO_TAG, FallbackProvider, LOCAL_TAG};
pub use http::HttpMemoryBackend;
pub use local_store::LocalMemoryStore;
pub use mock::{MockCall, MockMemoryBackend};
pub use normalizer::{normalize, normalize_batch, provenance_for_kind};
