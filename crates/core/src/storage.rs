// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

//! The storage protocol: the minimal capability surface every backend
//! (memory, RocksDB, parallel-version) implements, so layered composition
//! never needs to know which concrete backend it is talking to.
//!
//! One small trait per concern; backends implement what they can support.
//! Missing keys are never errors; every read reports absence explicitly.

use async_trait::async_trait;
use statum_type::Result;

/// Resident byte size of a key or value, feeding eviction budgets.
pub trait ByteSize {
	fn byte_size(&self) -> usize;
}

impl ByteSize for String {
	fn byte_size(&self) -> usize {
		self.len()
	}
}

impl ByteSize for Vec<u8> {
	fn byte_size(&self) -> usize {
		self.len()
	}
}

impl ByteSize for &str {
	fn byte_size(&self) -> usize {
		self.len()
	}
}

/// Result of a shadow-aware read.
///
/// Overlay composition needs three states, not two: a key deleted in the
/// front layer must not fall through to the back layer, while a key the
/// front has never seen must.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadState<V> {
	/// Never written here.
	Missing,
	/// Logically deleted here; shadows any lower layer.
	Tombstone,
	Value(V),
}

impl<V> ReadState<V> {
	pub fn into_value(self) -> Option<V> {
		match self {
			ReadState::Value(value) => Some(value),
			_ => None,
		}
	}

	/// Whether the key has a record here, tombstone included.
	pub fn found(&self) -> bool {
		!matches!(self, ReadState::Missing)
	}
}

/// Where a range scan starts.
#[derive(Debug, Clone)]
pub enum SeekTo<K> {
	/// The begin sentinel: start at the first key.
	First,
	/// Start at the first key greater than or equal to this one.
	Key(K),
}

#[async_trait]
pub trait ReadStorage: Send + Sync {
	type Key: Clone + Send + Sync + 'static;
	type Value: Clone + Send + Sync + 'static;

	/// One result slot per input key, in input order. A missing key is
	/// `None`, never an error.
	async fn read_some(&self, keys: &[Self::Key]) -> Result<Vec<Option<Self::Value>>>;

	async fn read_one(&self, key: &Self::Key) -> Result<Option<Self::Value>> {
		let mut values = self.read_some(std::slice::from_ref(key)).await?;
		Ok(values.pop().flatten())
	}
}

/// Reads that distinguish "deleted here" from "never written".
#[async_trait]
pub trait ShadowReadStorage: ReadStorage {
	async fn read_states(&self, keys: &[Self::Key]) -> Result<Vec<ReadState<Self::Value>>>;
}

#[async_trait]
pub trait WriteStorage: ReadStorage {
	async fn write_some(&self, entries: Vec<(Self::Key, Self::Value)>) -> Result<()>;

	async fn write_one(&self, key: Self::Key, value: Self::Value) -> Result<()> {
		self.write_some(vec![(key, value)]).await
	}

	/// Physical or logical removal, per the backend's configuration.
	async fn remove_some(&self, keys: Vec<Self::Key>) -> Result<()>;

	/// Upserts and deletes in one batch; `None` deletes. Backends that
	/// can make the batch atomic override this.
	async fn apply(&self, batch: Vec<(Self::Key, Option<Self::Value>)>) -> Result<()> {
		let mut writes = Vec::new();
		let mut removals = Vec::new();
		for (key, value) in batch {
			match value {
				Some(value) => writes.push((key, value)),
				None => removals.push(key),
			}
		}
		if !writes.is_empty() {
			self.write_some(writes).await?;
		}
		if !removals.is_empty() {
			self.remove_some(removals).await?;
		}
		Ok(())
	}
}

/// A single-pass forward cursor over a storage.
///
/// `next` is the suspension point: disk-backed iterators block on I/O
/// there, in-memory ones resolve immediately. `key`/`value` are only valid
/// after `next` returned `true`. Any locks or snapshots the iterator pins
/// are released by `release`, and on drop on every exit path.
#[async_trait]
pub trait StorageIter: Send {
	type Key: Send;
	type Value: Send;

	async fn next(&mut self) -> Result<bool>;

	fn key(&self) -> &Self::Key;

	/// `false` marks a tombstone on backends with logical deletion: the
	/// key exists in the scan but carries no value.
	fn has_value(&self) -> bool {
		self.value().is_some()
	}

	fn value(&self) -> Option<&Self::Value>;

	/// Early-release held locks/snapshots; the iterator is exhausted
	/// afterwards.
	fn release(&mut self);
}

#[async_trait]
pub trait IterateStorage: ReadStorage {
	type Iter: StorageIter<Key = Self::Key, Value = Self::Value> + 'static;

	/// A forward-only, single-pass scan. Disk backends pin a point-in-time
	/// snapshot for the iterator's lifetime.
	async fn range(&self, seek: SeekTo<Self::Key>) -> Result<Self::Iter>;
}

/// A storage whose whole content can be drained away, consuming it.
/// Tombstones drain as `(key, None)`.
pub trait DrainStorage: Send {
	type Key: Send;
	type Value: Send;
	type Drain: Iterator<Item = (Self::Key, Option<Self::Value>)> + Send;

	fn drain(self) -> Self::Drain;
}

/// Drains `source` into `destination` as one batch, tombstones becoming
/// deletes rather than being skipped.
pub async fn merge_into<D, S>(destination: &D, source: S) -> Result<()>
where
	D: WriteStorage + ?Sized,
	S: DrainStorage<Key = D::Key, Value = D::Value>,
{
	destination.apply(source.drain().collect()).await
}

/// Drains every source into `destination` as a single batch.
pub async fn merge_many<D, S>(destination: &D, sources: Vec<S>) -> Result<()>
where
	D: WriteStorage + ?Sized,
	S: DrainStorage<Key = D::Key, Value = D::Value>,
{
	let mut batch = Vec::new();
	for source in sources {
		batch.extend(source.drain());
	}
	destination.apply(batch).await
}
