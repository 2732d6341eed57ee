// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

//! The parallel-version storage the transaction scheduler executes over.
//!
//! Every mutation is tagged with the version of the transaction that made
//! it; reads resolve the greatest version at or below the reader's own.
//! Speculative executors validate their read sets with `written_after`
//! and re-run on conflict. Keys shard across locked buckets as in the
//! memory engine; each key's version chain is a lock-free skiplist, so
//! resolution happens outside the bucket lock.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use statum_type::Result;

mod chain;
mod iter;
mod storage;
mod view;

pub use chain::VersionChain;
pub use iter::VersionRangeIter;
pub use storage::VersionedStorage;
pub use view::VersionView;

/// Transaction/commit version. Higher is newer.
pub type Version = u64;
