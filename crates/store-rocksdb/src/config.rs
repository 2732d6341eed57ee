// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::path::{Path, PathBuf};

/// Construction options for [`crate::RocksStorage`].
#[derive(Debug, Clone)]
pub struct RocksConfig {
	pub path: PathBuf,
	pub create_if_missing: bool,
	/// LRU block cache size; `None` uses RocksDB's default cache.
	pub block_cache_bytes: Option<usize>,
	/// Bloom filter bits per key for point-read pruning.
	pub bloom_bits_per_key: Option<f64>,
	pub lz4_compression: bool,
}

impl RocksConfig {
	pub fn new(path: impl AsRef<Path>) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
			create_if_missing: true,
			block_cache_bytes: Some(64 * 1024 * 1024),
			bloom_bits_per_key: Some(10.0),
			lz4_compression: true,
		}
	}

	/// Minimal tuning for tests: no cache sizing, no compression.
	pub fn fast(path: impl AsRef<Path>) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
			create_if_missing: true,
			block_cache_bytes: None,
			bloom_bits_per_key: None,
			lz4_compression: false,
		}
	}
}
