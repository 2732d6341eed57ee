// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::{
	collections::{BTreeMap, HashMap},
	hash::Hash,
};

/// Per-bucket eviction bookkeeping.
///
/// `NoEviction` is a zero-sized no-op so storages without a capacity
/// budget pay nothing. `LruEviction` keeps a recency sequence plus a byte
/// budget; the engine asks `pop_excess` for victims after every mutation
/// or access until the bucket is back under budget.
pub trait Eviction<K>: Send + 'static {
	const ENABLED: bool;

	fn unbounded() -> Self;

	fn bounded(capacity_bytes: usize) -> Self;

	fn on_insert(&mut self, key: &K, bytes: usize);

	fn on_update(&mut self, key: &K, bytes: usize);

	/// A read hit refreshes recency.
	fn on_access(&mut self, key: &K);

	fn on_remove(&mut self, key: &K);

	/// Next victim while the tracked size exceeds the budget.
	fn pop_excess(&mut self) -> Option<K>;

	fn used_bytes(&self) -> usize;

	fn reset(&mut self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoEviction;

impl<K: Send + 'static> Eviction<K> for NoEviction {
	const ENABLED: bool = false;

	fn unbounded() -> Self {
		NoEviction
	}

	fn bounded(_capacity_bytes: usize) -> Self {
		NoEviction
	}

	fn on_insert(&mut self, _key: &K, _bytes: usize) {}

	fn on_update(&mut self, _key: &K, _bytes: usize) {}

	fn on_access(&mut self, _key: &K) {}

	fn on_remove(&mut self, _key: &K) {}

	fn pop_excess(&mut self) -> Option<K> {
		None
	}

	fn used_bytes(&self) -> usize {
		0
	}

	fn reset(&mut self) {}
}

/// Least-recently-used byte-budget tracking for one bucket.
#[derive(Debug)]
pub struct LruEviction<K> {
	capacity: usize,
	used: usize,
	sequence: u64,
	/// Recency order, oldest first.
	queue: BTreeMap<u64, K>,
	/// Key -> (recency sequence, tracked bytes).
	entries: HashMap<K, (u64, usize)>,
}

impl<K> LruEviction<K>
where
	K: Clone + Eq + Hash + Send + 'static,
{
	fn touch(&mut self, key: &K) {
		if let Some((sequence, _)) = self.entries.get_mut(key) {
			self.queue.remove(sequence);
			self.sequence += 1;
			*sequence = self.sequence;
			self.queue.insert(self.sequence, key.clone());
		}
	}
}

impl<K> Eviction<K> for LruEviction<K>
where
	K: Clone + Eq + Hash + Send + 'static,
{
	const ENABLED: bool = true;

	fn unbounded() -> Self {
		Self::bounded(usize::MAX)
	}

	fn bounded(capacity_bytes: usize) -> Self {
		Self {
			capacity: capacity_bytes,
			used: 0,
			sequence: 0,
			queue: BTreeMap::new(),
			entries: HashMap::new(),
		}
	}

	fn on_insert(&mut self, key: &K, bytes: usize) {
		self.sequence += 1;
		self.queue.insert(self.sequence, key.clone());
		self.entries.insert(key.clone(), (self.sequence, bytes));
		self.used += bytes;
	}

	fn on_update(&mut self, key: &K, bytes: usize) {
		if let Some((_, tracked)) = self.entries.get_mut(key) {
			self.used = self.used - *tracked + bytes;
			*tracked = bytes;
		}
		self.touch(key);
	}

	fn on_access(&mut self, key: &K) {
		self.touch(key);
	}

	fn on_remove(&mut self, key: &K) {
		if let Some((sequence, bytes)) = self.entries.remove(key) {
			self.queue.remove(&sequence);
			self.used -= bytes;
		}
	}

	fn pop_excess(&mut self) -> Option<K> {
		if self.used <= self.capacity {
			return None;
		}
		let (_, key) = self.queue.pop_first()?;
		if let Some((_, bytes)) = self.entries.remove(&key) {
			self.used -= bytes;
		}
		Some(key)
	}

	fn used_bytes(&self) -> usize {
		self.used
	}

	fn reset(&mut self) {
		self.used = 0;
		self.queue.clear();
		self.entries.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_lru_pops_oldest_first() {
		let mut lru = LruEviction::<String>::bounded(10);
		lru.on_insert(&"a".to_string(), 6);
		lru.on_insert(&"b".to_string(), 6);
		assert_eq!(lru.used_bytes(), 12);

		assert_eq!(lru.pop_excess(), Some("a".to_string()));
		assert_eq!(lru.used_bytes(), 6);
		assert_eq!(lru.pop_excess(), None);
	}

	#[test]
	fn test_access_refreshes_recency() {
		let mut lru = LruEviction::<String>::bounded(10);
		lru.on_insert(&"a".to_string(), 6);
		lru.on_access(&"a".to_string());
		lru.on_insert(&"b".to_string(), 6);
		lru.on_access(&"a".to_string());

		// "b" is now the least recently used.
		assert_eq!(lru.pop_excess(), Some("b".to_string()));
	}

	#[test]
	fn test_update_adjusts_used_bytes() {
		let mut lru = LruEviction::<String>::bounded(100);
		lru.on_insert(&"a".to_string(), 10);
		lru.on_update(&"a".to_string(), 4);
		assert_eq!(lru.used_bytes(), 4);

		lru.on_remove(&"a".to_string());
		assert_eq!(lru.used_bytes(), 0);
	}
}
