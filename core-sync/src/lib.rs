//! # Sync Engine
//!
//! Local-first synchronization shared by every catalog entity.
//!
//! ## Overview
//!
//! A synchronized read emits whatever the local store holds, decides whether
//! that data is stale, refreshes it from the remote source and persists the
//! result, reporting progress as a stream of [`Resource`] values.
//!
//! ## Components
//!
//! - **Result Normalizer** (`remote`): Classifies every remote failure into [`RemoteError`]
//! - **Resource** (`resource`): Tri-state `Loading` / `Success` / `Error` value
//! - **Cache Orchestrator** (`orchestrator`): The local-then-remote read sequence
//! - **Freshness Policies** (`freshness`): Staleness predicates and expiry windows
//! - **Versioned Merge** (`merge`): Highest-version-wins persistence of remote batches
//! - **Sync Context** (`context`): Process-local last-update instant of one entity

pub mod context;
pub mod error;
pub mod freshness;
pub mod merge;
pub mod orchestrator;
pub mod remote;
pub mod resource;

pub use context::SyncContext;
pub use error::{RemoteError, Result, SyncError};
pub use freshness::{
    expiry_cutoff, fetch_or_default, is_expired, is_remote_only_page, FreshnessPolicy,
    FreshnessSnapshot,
};
pub use merge::{append_page, apply_remote_batch, persist_page, stamp_refreshed, MergeStats};
pub use orchestrator::{collect_resources, last_resource, synced_read, LocalData};
pub use remote::{safe_call, RemoteCaller};
pub use resource::Resource;
