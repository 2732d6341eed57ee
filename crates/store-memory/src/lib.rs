// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

//! The generic sharded concurrent map backing every in-memory cache layer.
//!
//! Behavior is selected at compile time through three policy parameters:
//! the index (hashed or ordered; only ordered indices can `seek`), the
//! slot (plain values or tombstoning logical deletion) and the eviction
//! policy (none, or a per-bucket LRU byte budget). Unused policies are
//! zero-sized and cost nothing at runtime.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use statum_type::Result;

mod eviction;
mod index;
mod iter;
mod slot;
mod storage;

pub use eviction::{Eviction, LruEviction, NoEviction};
pub use index::{HashIndex, Index, OrderedIndex, SortedIndex};
pub use iter::MemorySeekIter;
pub use slot::{Slot, Tombstoned};
pub use storage::MemoryStorage;

/// Hashed buckets, physical deletion, no eviction.
pub type ConcurrentStorage<K, V> = MemoryStorage<K, V, HashIndex<K, V>, V, NoEviction>;

/// Ordered buckets (seekable), physical deletion, no eviction.
pub type OrderedStorage<K, V> = MemoryStorage<K, V, OrderedIndex<K, V>, V, NoEviction>;

/// Hashed buckets with an LRU byte budget; the shape used for read caches.
pub type CacheStorage<K, V> = MemoryStorage<K, V, HashIndex<K, V>, V, LruEviction<K>>;

/// Ordered buckets with logical deletion; the shape used for overlay
/// layers that must shadow a storage below them.
pub type TombstoneStorage<K, V> =
	MemoryStorage<K, V, OrderedIndex<K, Tombstoned<V>>, Tombstoned<V>, NoEviction>;
