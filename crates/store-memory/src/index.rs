// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::{
	collections::{BTreeMap, HashMap},
	hash::Hash,
	ops::Bound,
};

/// The per-bucket container. Implemented directly on the std maps; buckets
/// pick hashed or ordered through this parameter.
pub trait Index<K, S>: Default + Send + 'static {
	/// Whether iteration follows key order. Only ordered indices support
	/// positional seeks.
	const ORDERED: bool;

	type IntoEntries: Iterator<Item = (K, S)> + Send;

	fn get(&self, key: &K) -> Option<&S>;
	fn get_mut(&mut self, key: &K) -> Option<&mut S>;
	fn insert(&mut self, key: K, slot: S) -> Option<S>;
	fn remove(&mut self, key: &K) -> Option<S>;
	fn len(&self) -> usize;
	fn is_empty(&self) -> bool {
		self.len() == 0
	}
	fn into_entries(self) -> Self::IntoEntries;
}

/// A type alias for the hashed index variant.
pub type HashIndex<K, S> = HashMap<K, S>;

/// A type alias for the ordered (seekable) index variant.
pub type OrderedIndex<K, S> = BTreeMap<K, S>;

impl<K, S> Index<K, S> for HashMap<K, S>
where
	K: Eq + Hash + Send + 'static,
	S: Send + 'static,
{
	const ORDERED: bool = false;

	type IntoEntries = std::collections::hash_map::IntoIter<K, S>;

	fn get(&self, key: &K) -> Option<&S> {
		HashMap::get(self, key)
	}

	fn get_mut(&mut self, key: &K) -> Option<&mut S> {
		HashMap::get_mut(self, key)
	}

	fn insert(&mut self, key: K, slot: S) -> Option<S> {
		HashMap::insert(self, key, slot)
	}

	fn remove(&mut self, key: &K) -> Option<S> {
		HashMap::remove(self, key)
	}

	fn len(&self) -> usize {
		HashMap::len(self)
	}

	fn into_entries(self) -> Self::IntoEntries {
		self.into_iter()
	}
}

impl<K, S> Index<K, S> for BTreeMap<K, S>
where
	K: Ord + Send + 'static,
	S: Send + 'static,
{
	const ORDERED: bool = true;

	type IntoEntries = std::collections::btree_map::IntoIter<K, S>;

	fn get(&self, key: &K) -> Option<&S> {
		BTreeMap::get(self, key)
	}

	fn get_mut(&mut self, key: &K) -> Option<&mut S> {
		BTreeMap::get_mut(self, key)
	}

	fn insert(&mut self, key: K, slot: S) -> Option<S> {
		BTreeMap::insert(self, key, slot)
	}

	fn remove(&mut self, key: &K) -> Option<S> {
		BTreeMap::remove(self, key)
	}

	fn len(&self) -> usize {
		BTreeMap::len(self)
	}

	fn into_entries(self) -> Self::IntoEntries {
		self.into_iter()
	}
}

/// Positional access for ordered indices; what `seek` iterates with.
///
/// Cursor-style stepping (rather than handing out a borrowing iterator)
/// lets the seek iterator own its bucket guard without borrowing from it.
pub trait SortedIndex<K, S>: Index<K, S> {
	/// First entry with key >= `from`.
	fn first_from(&self, from: &K) -> Option<(&K, &S)>;

	/// First entry with key strictly greater than `after`, or the very
	/// first entry when `after` is `None`.
	fn first_after(&self, after: Option<&K>) -> Option<(&K, &S)>;
}

impl<K, S> SortedIndex<K, S> for BTreeMap<K, S>
where
	K: Ord + Send + 'static,
	S: Send + 'static,
{
	fn first_from(&self, from: &K) -> Option<(&K, &S)> {
		self.range(from..).next()
	}

	fn first_after(&self, after: Option<&K>) -> Option<(&K, &S)> {
		match after {
			None => self.iter().next(),
			Some(after) => self.range((Bound::Excluded(after), Bound::Unbounded)).next(),
		}
	}
}
