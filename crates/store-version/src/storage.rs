// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::{
	collections::BTreeMap,
	collections::hash_map::DefaultHasher,
	hash::{Hash, Hasher},
	sync::Arc,
};

use parking_lot::Mutex;
use statum_core::storage::{DrainStorage, ReadState, SeekTo};
use tracing::instrument;

use crate::{Version, chain::VersionChain, iter::VersionRangeIter, view::VersionView};

pub(crate) const DEFAULT_BUCKET_COUNT: usize = 64;

pub(crate) type VersionBucket<K, V> = BTreeMap<K, Arc<VersionChain<V>>>;

/// Sharded multi-version map.
///
/// Buckets follow the memory engine's lock discipline; the per-key chains
/// are shared out of the bucket under `Arc`, so version resolution and
/// conflict checks run outside the lock. Cloning shares the storage.
#[derive(Clone)]
pub struct VersionedStorage<K, V> {
	buckets: Vec<Arc<Mutex<VersionBucket<K, V>>>>,
}

impl<K, V> VersionedStorage<K, V>
where
	K: Clone + Ord + Hash + Send + Sync + 'static,
	V: Clone + Send + Sync + 'static,
{
	pub fn new() -> Self {
		Self::with_buckets(DEFAULT_BUCKET_COUNT)
	}

	pub fn with_buckets(count: usize) -> Self {
		let count = count.max(1);
		let buckets = (0..count).map(|_| Arc::new(Mutex::new(BTreeMap::new()))).collect();
		Self { buckets }
	}

	pub fn bucket_count(&self) -> usize {
		self.buckets.len()
	}

	fn bucket_of(&self, key: &K) -> usize {
		if self.buckets.len() == 1 {
			return 0;
		}
		let mut hasher = DefaultHasher::new();
		key.hash(&mut hasher);
		(hasher.finish() as usize) % self.buckets.len()
	}

	fn chain_of(&self, key: &K) -> Option<Arc<VersionChain<V>>> {
		self.buckets[self.bucket_of(key)].lock().get(key).cloned()
	}

	fn chain_or_insert(&self, key: &K) -> Arc<VersionChain<V>> {
		let mut guard = self.buckets[self.bucket_of(key)].lock();
		guard.entry(key.clone()).or_insert_with(|| Arc::new(VersionChain::new())).clone()
	}

	/// Writes `entries` tagged with `version`.
	#[instrument(name = "store::version::write", level = "trace", skip(self, entries), fields(version, entries = entries.len()))]
	pub fn write_some(&self, version: Version, entries: Vec<(K, V)>) {
		for (key, value) in entries {
			self.chain_or_insert(&key).insert(version, Some(value));
		}
	}

	pub fn write_one(&self, version: Version, key: K, value: V) {
		self.write_some(version, vec![(key, value)]);
	}

	/// Tombstones `keys` at `version`. An absent key still gets a chain
	/// with a tombstone, so the deletion shadows lower layers when the
	/// storage is merged down.
	#[instrument(name = "store::version::remove", level = "trace", skip(self, keys), fields(version, keys = keys.len()))]
	pub fn remove_some(&self, version: Version, keys: Vec<K>) {
		for key in keys {
			self.chain_or_insert(&key).insert(version, None);
		}
	}

	/// Reads as of `version`, one slot per key in input order.
	pub fn read_some(&self, keys: &[K], version: Version) -> Vec<Option<V>> {
		self.read_states(keys, version).into_iter().map(ReadState::into_value).collect()
	}

	pub fn read_states(&self, keys: &[K], version: Version) -> Vec<ReadState<V>> {
		keys.iter()
			.map(|key| match self.chain_of(key) {
				None => ReadState::Missing,
				Some(chain) => chain.resolve(version),
			})
			.collect()
	}

	/// Whether `key` was written by any transaction after `version`; the
	/// scheduler aborts and re-runs speculative executions this reports
	/// `true` for.
	pub fn written_after(&self, key: &K, version: Version) -> bool {
		match self.chain_of(key) {
			None => false,
			Some(chain) => chain.written_after(version),
		}
	}

	/// A reader pinned to `version`, implementing the storage protocol.
	pub fn view(&self, version: Version) -> VersionView<K, V> {
		VersionView::new(self.clone(), version)
	}

	/// Ordered scan resolving every key at `version`. Tombstoned keys
	/// appear with no value; keys without a write at or below `version`
	/// are skipped.
	pub fn range_at(&self, version: Version, seek: SeekTo<K>) -> VersionRangeIter<K, V> {
		VersionRangeIter::new(self.buckets.clone(), version, seek)
	}

	/// Absorbs a drained storage's entries at one version; tombstones
	/// carry over as tombstones.
	pub fn merge_from<S>(&self, version: Version, source: S)
	where
		S: DrainStorage<Key = K, Value = V>,
	{
		for (key, value) in source.drain() {
			self.chain_or_insert(&key).insert(version, value);
		}
	}

	/// Best-effort, per-bucket: true iff no key holds any version.
	pub fn empty(&self) -> bool {
		self.buckets.iter().all(|bucket| bucket.lock().is_empty())
	}

	pub fn key_count(&self) -> usize {
		self.buckets.iter().map(|bucket| bucket.lock().len()).sum()
	}
}

impl<K, V> Default for VersionedStorage<K, V>
where
	K: Clone + Ord + Hash + Send + Sync + 'static,
	V: Clone + Send + Sync + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}
