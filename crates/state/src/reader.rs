// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use async_trait::async_trait;
use statum_core::{Condition, Entry};
use statum_type::Result;

/// What a state layer needs from the layer below it.
///
/// [`crate::StateStorage`] implements this itself, so per-block layers
/// chain: each block's transient state sits in front of the last
/// committed one.
#[async_trait]
pub trait StateReader: Send + Sync {
	/// The entry for `(table, key)`, or `None` if absent or deleted at
	/// this layer's view.
	async fn row(&self, table: &str, key: &str) -> Result<Option<Entry>>;

	/// Keys of `table` matching `condition` in this layer's view,
	/// unsorted and unpaginated; the caller merges, masks, sorts and
	/// applies the condition's limit.
	async fn table_keys(&self, table: &str, condition: &Condition) -> Result<Vec<String>>;
}
