// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::hash::Hash;

use async_trait::async_trait;
use statum_core::storage::{
	IterateStorage, ReadState, ReadStorage, SeekTo, ShadowReadStorage,
};
use statum_type::Result;

use crate::{Version, iter::VersionRangeIter, storage::VersionedStorage};

/// A version-pinned reader handed to speculative executors.
///
/// Read-only by construction: writes keep going through the owning
/// [`VersionedStorage`] with their own version tags.
#[derive(Clone)]
pub struct VersionView<K, V> {
	storage: VersionedStorage<K, V>,
	version: Version,
}

impl<K, V> VersionView<K, V>
where
	K: Clone + Ord + Hash + Send + Sync + 'static,
	V: Clone + Send + Sync + 'static,
{
	pub(crate) fn new(storage: VersionedStorage<K, V>, version: Version) -> Self {
		Self { storage, version }
	}

	pub fn version(&self) -> Version {
		self.version
	}

	/// Read-set validation: whether `key` changed after this view's
	/// version.
	pub fn conflicts_on(&self, key: &K) -> bool {
		self.storage.written_after(key, self.version)
	}
}

#[async_trait]
impl<K, V> ReadStorage for VersionView<K, V>
where
	K: Clone + Ord + Hash + Send + Sync + 'static,
	V: Clone + Send + Sync + 'static,
{
	type Key = K;
	type Value = V;

	async fn read_some(&self, keys: &[K]) -> Result<Vec<Option<V>>> {
		Ok(self.storage.read_some(keys, self.version))
	}
}

#[async_trait]
impl<K, V> ShadowReadStorage for VersionView<K, V>
where
	K: Clone + Ord + Hash + Send + Sync + 'static,
	V: Clone + Send + Sync + 'static,
{
	async fn read_states(&self, keys: &[K]) -> Result<Vec<ReadState<V>>> {
		Ok(self.storage.read_states(keys, self.version))
	}
}

#[async_trait]
impl<K, V> IterateStorage for VersionView<K, V>
where
	K: Clone + Ord + Hash + Send + Sync + 'static,
	V: Clone + Send + Sync + 'static,
{
	type Iter = VersionRangeIter<K, V>;

	async fn range(&self, seek: SeekTo<K>) -> Result<Self::Iter> {
		Ok(self.storage.range_at(self.version, seek))
	}
}
