// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::sync::Arc;

use async_trait::async_trait;
use rocksdb::{BlockBasedOptions, Cache, DB, DBCompressionType, Options, WriteBatch};
use statum_core::storage::{IterateStorage, ReadStorage, SeekTo, WriteStorage};
use statum_type::{Error, Result};
use tokio::task;
use tracing::instrument;

use crate::{
	config::RocksConfig,
	iterator::{RocksRangeIter, spawn_range_task},
};

pub(crate) fn backend_err(error: rocksdb::Error) -> Error {
	Error::backend(error.to_string())
}

fn join_err(error: task::JoinError) -> Error {
	Error::backend(format!("blocking task failed: {error}"))
}

/// Persistent storage over a single RocksDB column family.
///
/// Rows are keyed by the `table ":" key` composite produced by
/// `statum_core::key::to_db_key`; removal is physical (a tombstoning
/// overlay belongs in front of this storage, not inside it).
#[derive(Clone)]
pub struct RocksStorage {
	db: Arc<DB>,
}

impl RocksStorage {
	#[instrument(name = "store::rocksdb::open", level = "debug", skip(config), fields(path = %config.path.display()))]
	pub fn open(config: RocksConfig) -> Result<Self> {
		let mut options = Options::default();
		options.create_if_missing(config.create_if_missing);
		options.set_compression_type(if config.lz4_compression {
			DBCompressionType::Lz4
		} else {
			DBCompressionType::None
		});

		let mut block_options = BlockBasedOptions::default();
		if let Some(cache_bytes) = config.block_cache_bytes {
			let cache = Cache::new_lru_cache(cache_bytes);
			block_options.set_block_cache(&cache);
		}
		if let Some(bits) = config.bloom_bits_per_key {
			block_options.set_bloom_filter(bits, false);
		}
		options.set_block_based_table_factory(&block_options);

		let db = DB::open(&options, &config.path).map_err(backend_err)?;
		Ok(Self { db: Arc::new(db) })
	}
}

#[async_trait]
impl ReadStorage for RocksStorage {
	type Key = Vec<u8>;
	type Value = Vec<u8>;

	#[instrument(name = "store::rocksdb::read", level = "trace", skip(self, keys), fields(keys = keys.len()))]
	async fn read_some(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>> {
		let db = self.db.clone();
		let keys = keys.to_vec();
		task::spawn_blocking(move || {
			db.multi_get(&keys).into_iter().map(|row| row.map_err(backend_err)).collect()
		})
		.await
		.map_err(join_err)?
	}
}

#[async_trait]
impl WriteStorage for RocksStorage {
	async fn write_some(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
		self.apply(entries.into_iter().map(|(key, value)| (key, Some(value))).collect()).await
	}

	async fn remove_some(&self, keys: Vec<Vec<u8>>) -> Result<()> {
		self.apply(keys.into_iter().map(|key| (key, None)).collect()).await
	}

	/// One `WriteBatch`: the whole batch lands atomically or not at all.
	#[instrument(name = "store::rocksdb::apply", level = "debug", skip(self, batch), fields(ops = batch.len()))]
	async fn apply(&self, batch: Vec<(Vec<u8>, Option<Vec<u8>>)>) -> Result<()> {
		let db = self.db.clone();
		task::spawn_blocking(move || {
			let mut write_batch = WriteBatch::default();
			for (key, value) in batch {
				match value {
					Some(value) => write_batch.put(&key, &value),
					None => write_batch.delete(&key),
				}
			}
			db.write(write_batch).map_err(backend_err)
		})
		.await
		.map_err(join_err)?
	}
}

#[async_trait]
impl IterateStorage for RocksStorage {
	type Iter = RocksRangeIter;

	/// Pins a snapshot for the iterator's lifetime; concurrent writers
	/// stay invisible to the scan.
	async fn range(&self, seek: SeekTo<Vec<u8>>) -> Result<Self::Iter> {
		spawn_range_task(self.db.clone(), seek).await
	}
}
