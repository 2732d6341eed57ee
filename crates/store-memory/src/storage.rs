// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::{
	collections::hash_map::DefaultHasher,
	hash::{Hash, Hasher},
	marker::PhantomData,
	mem,
	sync::Arc,
};

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use statum_core::storage::{
	ByteSize, DrainStorage, IterateStorage, ReadState, ReadStorage, SeekTo, ShadowReadStorage,
	WriteStorage,
};
use statum_type::Result;
use tracing::instrument;

use crate::{
	eviction::Eviction,
	index::{Index, SortedIndex},
	iter::MemorySeekIter,
	slot::Slot,
};

pub(crate) const DEFAULT_BUCKET_COUNT: usize = 64;

pub(crate) struct Bucket<I, E> {
	pub(crate) index: I,
	pub(crate) eviction: E,
}

/// The bucketed concurrent map.
///
/// Key space is partitioned across a fixed number of independently locked
/// buckets; operations on different buckets run fully in parallel, same
/// bucket serializes. There is no global lock, and therefore no ordering
/// guarantee across buckets.
pub struct MemoryStorage<K, V, I = crate::HashIndex<K, V>, S = V, E = crate::NoEviction> {
	pub(crate) buckets: Vec<Arc<Mutex<Bucket<I, E>>>>,
	_marker: PhantomData<fn() -> (K, V, S)>,
}

impl<K, V, I, S, E> MemoryStorage<K, V, I, S, E>
where
	K: Clone + Eq + Hash + ByteSize + Send + Sync + 'static,
	V: Clone + ByteSize + Send + Sync + 'static,
	I: Index<K, S>,
	S: Slot<V>,
	E: Eviction<K>,
{
	pub fn new() -> Self {
		Self::with_buckets(DEFAULT_BUCKET_COUNT)
	}

	/// One bucket covering the whole key space; the shape to use when a
	/// `seek` must observe global key order.
	pub fn single() -> Self {
		Self::with_buckets(1)
	}

	pub fn with_buckets(count: usize) -> Self {
		let count = count.max(1);
		let buckets = (0..count)
			.map(|_| Arc::new(Mutex::new(Bucket { index: I::default(), eviction: E::unbounded() })))
			.collect();
		Self { buckets, _marker: PhantomData }
	}

	/// Buckets with an eviction budget of `max_capacity_bytes` split
	/// evenly across them.
	pub fn with_capacity(count: usize, max_capacity_bytes: usize) -> Self {
		let count = count.max(1);
		let per_bucket = max_capacity_bytes / count;
		let buckets = (0..count)
			.map(|_| {
				Arc::new(Mutex::new(Bucket { index: I::default(), eviction: E::bounded(per_bucket) }))
			})
			.collect();
		Self { buckets, _marker: PhantomData }
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

	fn evict_excess(bucket: &mut Bucket<I, E>) {
		while let Some(victim) = bucket.eviction.pop_excess() {
			bucket.index.remove(&victim);
		}
	}

	/// Never suspends; the async protocol impls below wrap the `_sync`
	/// operations.
	pub fn read_states_sync(&self, keys: &[K]) -> Vec<ReadState<V>> {
		keys.iter()
			.map(|key| {
				let mut guard = self.buckets[self.bucket_of(key)].lock();
				let state = match guard.index.get(key) {
					None => ReadState::Missing,
					Some(slot) => match slot.value() {
						Some(value) => ReadState::Value(value.clone()),
						None => ReadState::Tombstone,
					},
				};
				if E::ENABLED && state.found() {
					guard.eviction.on_access(key);
					Self::evict_excess(&mut guard);
				}
				state
			})
			.collect()
	}

	pub fn write_some_sync(&self, entries: Vec<(K, V)>) {
		for (key, value) in entries {
			let mut guard = self.buckets[self.bucket_of(&key)].lock();
			let bytes = key.byte_size() + value.byte_size();
			let Bucket { index, eviction } = &mut *guard;
			match index.get_mut(&key) {
				Some(slot) => {
					slot.replace(value);
					if E::ENABLED {
						eviction.on_update(&key, bytes);
					}
				}
				None => {
					if E::ENABLED {
						eviction.on_insert(&key, bytes);
					}
					index.insert(key, S::occupied(value));
				}
			}
			if E::ENABLED {
				Self::evict_excess(&mut guard);
			}
		}
	}

	pub fn remove_some_sync(&self, keys: Vec<K>) {
		for key in keys {
			let mut guard = self.buckets[self.bucket_of(&key)].lock();
			let Bucket { index, eviction } = &mut *guard;
			if !S::LOGICAL_DELETION {
				if index.remove(&key).is_some() && E::ENABLED {
					eviction.on_remove(&key);
				}
				continue;
			}
			match index.get(&key).map(Slot::is_tombstone) {
				// Removing an already tombstoned key is a no-op.
				Some(true) => {}
				Some(false) => {
					if let Some(tombstone) = S::tombstone() {
						if let Some(slot) = index.get_mut(&key) {
							*slot = tombstone;
						}
						if E::ENABLED {
							eviction.on_update(&key, key.byte_size());
						}
					}
				}
				// Absent key: a fresh tombstone still goes in, so the
				// deletion shadows whatever a lower layer holds.
				None => {
					if let Some(tombstone) = S::tombstone() {
						if E::ENABLED {
							eviction.on_insert(&key, key.byte_size());
						}
						index.insert(key, tombstone);
					}
				}
			}
		}
	}

	/// Bucket-wise absorption of `other`'s entries, draining it. Existing
	/// entries win: merge inserts only keys this storage does not hold.
	pub fn merge(&self, other: &Self) {
		assert_eq!(
			self.buckets.len(),
			other.buckets.len(),
			"merge requires identically sharded storages"
		);
		for (mine, theirs) in self.buckets.iter().zip(&other.buckets) {
			let (mut destination, mut source) = lock_pair(mine, theirs);
			let drained = mem::take(&mut source.index);
			source.eviction.reset();
			let Bucket { index, eviction } = &mut *destination;
			for (key, slot) in drained.into_entries() {
				if index.get(&key).is_none() {
					if E::ENABLED {
						let bytes = key.byte_size()
							+ slot.value().map(ByteSize::byte_size).unwrap_or(0);
						eviction.on_insert(&key, bytes);
					}
					index.insert(key, slot);
				}
			}
			if E::ENABLED {
				Self::evict_excess(&mut destination);
			}
		}
	}

	/// Exchanges each bucket's contents with `other`; used for snapshot
	/// rotation.
	pub fn swap(&self, other: &Self) {
		assert_eq!(
			self.buckets.len(),
			other.buckets.len(),
			"swap requires identically sharded storages"
		);
		for (mine, theirs) in self.buckets.iter().zip(&other.buckets) {
			let (mut a, mut b) = lock_pair(mine, theirs);
			mem::swap(&mut *a, &mut *b);
		}
	}

	/// Best-effort: takes and releases each bucket lock in turn, so this
	/// is not a consistent snapshot under concurrent mutation.
	pub fn empty(&self) -> bool {
		self.buckets.iter().all(|bucket| bucket.lock().index.is_empty())
	}

	/// Resident entries, tombstones included. Same consistency caveat as
	/// [`MemoryStorage::empty`].
	pub fn len(&self) -> usize {
		self.buckets.iter().map(|bucket| bucket.lock().index.len()).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.empty()
	}

	/// Tracked bytes under an eviction policy; zero otherwise.
	pub fn resident_bytes(&self) -> usize {
		self.buckets.iter().map(|bucket| bucket.lock().eviction.used_bytes()).sum()
	}
}

impl<K, V, I, S, E> MemoryStorage<K, V, I, S, E>
where
	K: Clone + Eq + Hash + ByteSize + Send + Sync + 'static,
	V: Clone + ByteSize + Send + Sync + 'static,
	I: SortedIndex<K, S>,
	S: Slot<V>,
	E: Eviction<K>,
{
	/// A forward iterator from the first key >= the seek position (or the
	/// very first key). It holds each bucket's lock while positioned in
	/// it; release it promptly or run it to exhaustion. Buckets are
	/// visited in index order; global key order requires a single bucket.
	pub fn seek(&self, seek: SeekTo<K>) -> MemorySeekIter<K, V, I, S, E> {
		MemorySeekIter::new(self.buckets.clone(), seek)
	}
}

/// Locks a corresponding bucket pair. The pair is ordered by address so
/// two opposing merges over the same storages cannot deadlock; across
/// bucket indices both operands advance in lockstep ascending order.
fn lock_pair<'a, T>(
	first: &'a Arc<Mutex<T>>,
	second: &'a Arc<Mutex<T>>,
) -> (MutexGuard<'a, T>, MutexGuard<'a, T>) {
	if Arc::as_ptr(first) <= Arc::as_ptr(second) {
		let a = first.lock();
		let b = second.lock();
		(a, b)
	} else {
		let b = second.lock();
		let a = first.lock();
		(a, b)
	}
}

impl<K, V, I, S, E> Default for MemoryStorage<K, V, I, S, E>
where
	K: Clone + Eq + Hash + ByteSize + Send + Sync + 'static,
	V: Clone + ByteSize + Send + Sync + 'static,
	I: Index<K, S>,
	S: Slot<V>,
	E: Eviction<K>,
{
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl<K, V, I, S, E> ReadStorage for MemoryStorage<K, V, I, S, E>
where
	K: Clone + Eq + Hash + ByteSize + Send + Sync + 'static,
	V: Clone + ByteSize + Send + Sync + 'static,
	I: Index<K, S>,
	S: Slot<V>,
	E: Eviction<K>,
{
	type Key = K;
	type Value = V;

	#[instrument(name = "store::memory::read", level = "trace", skip(self, keys), fields(keys = keys.len()))]
	async fn read_some(&self, keys: &[K]) -> Result<Vec<Option<V>>> {
		Ok(self.read_states_sync(keys).into_iter().map(ReadState::into_value).collect())
	}
}

#[async_trait]
impl<K, V, I, S, E> ShadowReadStorage for MemoryStorage<K, V, I, S, E>
where
	K: Clone + Eq + Hash + ByteSize + Send + Sync + 'static,
	V: Clone + ByteSize + Send + Sync + 'static,
	I: Index<K, S>,
	S: Slot<V>,
	E: Eviction<K>,
{
	async fn read_states(&self, keys: &[K]) -> Result<Vec<ReadState<V>>> {
		Ok(self.read_states_sync(keys))
	}
}

#[async_trait]
impl<K, V, I, S, E> WriteStorage for MemoryStorage<K, V, I, S, E>
where
	K: Clone + Eq + Hash + ByteSize + Send + Sync + 'static,
	V: Clone + ByteSize + Send + Sync + 'static,
	I: Index<K, S>,
	S: Slot<V>,
	E: Eviction<K>,
{
	#[instrument(name = "store::memory::write", level = "trace", skip(self, entries), fields(entries = entries.len()))]
	async fn write_some(&self, entries: Vec<(K, V)>) -> Result<()> {
		self.write_some_sync(entries);
		Ok(())
	}

	#[instrument(name = "store::memory::remove", level = "trace", skip(self, keys), fields(keys = keys.len()))]
	async fn remove_some(&self, keys: Vec<K>) -> Result<()> {
		self.remove_some_sync(keys);
		Ok(())
	}
}

#[async_trait]
impl<K, V, I, S, E> IterateStorage for MemoryStorage<K, V, I, S, E>
where
	K: Clone + Eq + Hash + Ord + ByteSize + Send + Sync + 'static,
	V: Clone + ByteSize + Send + Sync + 'static,
	I: SortedIndex<K, S>,
	S: Slot<V>,
	E: Eviction<K>,
{
	type Iter = MemorySeekIter<K, V, I, S, E>;

	async fn range(&self, seek: SeekTo<K>) -> Result<Self::Iter> {
		Ok(self.seek(seek))
	}
}

impl<K, V, I, S, E> DrainStorage for MemoryStorage<K, V, I, S, E>
where
	K: Clone + Eq + Hash + ByteSize + Send + Sync + 'static,
	V: Clone + ByteSize + Send + Sync + 'static,
	I: Index<K, S>,
	S: Slot<V>,
	E: Eviction<K>,
{
	type Key = K;
	type Value = V;
	type Drain = std::vec::IntoIter<(K, Option<V>)>;

	fn drain(self) -> Self::Drain {
		let mut out = Vec::new();
		for bucket in &self.buckets {
			let mut guard = bucket.lock();
			let index = mem::take(&mut guard.index);
			guard.eviction.reset();
			for (key, slot) in index.into_entries() {
				out.push((key, slot.into_value()));
			}
		}
		out.into_iter()
	}
}
