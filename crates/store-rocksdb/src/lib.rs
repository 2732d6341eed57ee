// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

//! RocksDB-backed implementation of the storage protocol.
//!
//! All RocksDB calls are synchronous blocking I/O and run under
//! `spawn_blocking`; range scans pin a snapshot inside a background task
//! that streams batches back, so the iterator observes a point in time
//! regardless of concurrent writers.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use statum_type::Result;

mod config;
mod iterator;
mod storage;

pub use config::RocksConfig;
pub use iterator::RocksRangeIter;
pub use storage::RocksStorage;
