// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use statum_core::{
	Condition, Entry, Status,
	storage::{ReadState, SeekTo, StorageIter, WriteStorage},
};
use statum_store_memory::OrderedStorage;
use statum_type::{BlockVersion, Digest, HashAlgorithm, Result};
use tracing::instrument;

use crate::{key::StateKey, reader::StateReader};

/// One block's transient state: an `Entry`-valued concurrent cache in
/// front of an optional previous layer.
///
/// Deletion is carried inside the entries themselves (status `Deleted`),
/// so a locally deleted row masks a value the previous layer still holds.
/// Rows imported from the previous layer are cached with status `Normal`
/// and therefore stay out of the dirty set, the state root and commits.
pub struct StateStorage {
	cache: OrderedStorage<StateKey, Entry>,
	prev: Option<Arc<dyn StateReader>>,
}

impl StateStorage {
	pub fn new() -> Self {
		Self { cache: OrderedStorage::new(), prev: None }
	}

	pub fn with_prev(prev: Arc<dyn StateReader>) -> Self {
		Self { cache: OrderedStorage::new(), prev: Some(prev) }
	}

	/// The row as this layer sees it: local hit (a deleted entry reads as
	/// absent), else fall through to the previous layer and cache the
	/// import as `Normal`.
	#[instrument(name = "state::get_row", level = "trace", skip(self), fields(table, key))]
	pub async fn get_row(&self, table: &str, key: &str) -> Result<Option<Entry>> {
		let state_key = StateKey::new(table, key);
		if let Some(ReadState::Value(entry)) =
			self.cache.read_states_sync(std::slice::from_ref(&state_key)).pop()
		{
			if entry.status() == Status::Deleted {
				return Ok(None);
			}
			return Ok(Some(entry));
		}
		let Some(prev) = &self.prev else {
			return Ok(None);
		};
		match prev.row(table, key).await? {
			None => Ok(None),
			Some(mut imported) => {
				imported.set_status(Status::Normal);
				self.cache.write_some_sync(vec![(state_key, imported.clone())]);
				Ok(Some(imported))
			}
		}
	}

	/// One slot per key, in input order.
	pub async fn get_rows(&self, table: &str, keys: &[String]) -> Result<Vec<Option<Entry>>> {
		let mut rows = Vec::with_capacity(keys.len());
		for key in keys {
			rows.push(self.get_row(table, key).await?);
		}
		Ok(rows)
	}

	/// Stores `entry` as dirty state. Anything that is not already a
	/// tombstone is marked `Modified`.
	#[instrument(name = "state::set_row", level = "trace", skip(self, entry), fields(table, key))]
	pub async fn set_row(&self, table: &str, key: &str, mut entry: Entry) -> Result<()> {
		if entry.status() != Status::Deleted {
			entry.set_status(Status::Modified);
		}
		self.cache.write_some_sync(vec![(StateKey::new(table, key), entry)]);
		Ok(())
	}

	/// Stores a tombstone entry, shadowing the previous layer.
	pub async fn remove_row(&self, table: &str, key: &str) -> Result<()> {
		self.cache.write_some_sync(vec![(StateKey::new(table, key), Entry::deleted())]);
		Ok(())
	}

	/// Keys of `table` matching `condition`, merged with the previous
	/// layer (a locally deleted key masks a remotely present one),
	/// sorted, with the condition's `(offset, limit)` applied.
	#[instrument(name = "state::primary_keys", level = "debug", skip(self, condition), fields(table))]
	pub async fn primary_keys(&self, table: &str, condition: &Condition) -> Result<Vec<String>> {
		let keys = self.merged_keys(table, condition).await?;
		Ok(match condition.limit_range() {
			Some((offset, count)) => keys.into_iter().skip(offset).take(count).collect(),
			None => keys,
		})
	}

	async fn merged_keys(&self, table: &str, condition: &Condition) -> Result<Vec<String>> {
		if condition.has_conflict() {
			return Ok(Vec::new());
		}

		// Key -> locally deleted. Local state always wins the merge.
		let mut merged: BTreeMap<String, bool> = BTreeMap::new();
		let mut iter = self.cache.seek(SeekTo::Key(StateKey::new(table, "")));
		while iter.next().await? {
			// Buckets interleave tables during the scan; filter, don't
			// stop.
			if iter.key().table != table {
				continue;
			}
			let key = iter.key().key.clone();
			if !condition.is_valid(&key) {
				continue;
			}
			let deleted =
				iter.value().map(|entry| entry.status() == Status::Deleted).unwrap_or(false);
			merged.insert(key, deleted);
		}

		if let Some(prev) = &self.prev {
			for key in prev.table_keys(table, condition).await? {
				merged.entry(key).or_insert(false);
			}
		}

		Ok(merged.into_iter().filter(|(_, deleted)| !deleted).map(|(key, _)| key).collect())
	}

	/// The state root: XOR fold of every dirty entry's digest. Clean and
	/// imported entries contribute nothing, and the fold is independent
	/// of iteration order.
	#[instrument(name = "state::hash", level = "debug", skip(self, algo), fields(block_version = %block_version))]
	pub async fn hash(
		&self,
		algo: &dyn HashAlgorithm,
		block_version: BlockVersion,
	) -> Result<Digest> {
		let mut root = Digest::ZERO;
		let mut iter = self.cache.seek(SeekTo::First);
		while iter.next().await? {
			if let Some(entry) = iter.value() {
				if entry.dirty() {
					let state_key = iter.key();
					root ^= entry.hash(&state_key.table, &state_key.key, algo, block_version);
				}
			}
		}
		Ok(root)
	}

	/// Drains the dirty set into a persistent backend as one batch:
	/// tombstones delete their row, modified entries upsert theirs. The
	/// cache itself is left untouched.
	#[instrument(name = "state::commit", level = "debug", skip(self, backend))]
	pub async fn commit_into<B>(&self, backend: &B) -> Result<()>
	where
		B: WriteStorage<Key = Vec<u8>, Value = Vec<u8>>,
	{
		let mut batch = Vec::new();
		let mut iter = self.cache.seek(SeekTo::First);
		while iter.next().await? {
			let Some(entry) = iter.value() else {
				continue;
			};
			match entry.status() {
				Status::Modified => batch.push((iter.key().db_key(), Some(entry.get().to_vec()))),
				Status::Deleted => batch.push((iter.key().db_key(), None)),
				Status::Empty | Status::Normal => {}
			}
		}
		backend.apply(batch).await
	}
}

impl Default for StateStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StateReader for StateStorage {
	async fn row(&self, table: &str, key: &str) -> Result<Option<Entry>> {
		self.get_row(table, key).await
	}

	async fn table_keys(&self, table: &str, condition: &Condition) -> Result<Vec<String>> {
		self.merged_keys(table, condition).await
	}
}
