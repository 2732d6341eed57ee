// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::ops::Bound;

use crossbeam_skiplist::SkipMap;
use statum_core::storage::ReadState;

use crate::Version;

/// All versions ever written for one key, newest resolvable in O(log n).
///
/// A `None` value is a tombstone at that version. The skiplist is
/// lock-free, so readers resolve without holding the owning bucket's
/// lock.
pub struct VersionChain<V> {
	versions: SkipMap<Version, Option<V>>,
}

impl<V> VersionChain<V>
where
	V: Clone + Send + 'static,
{
	pub(crate) fn new() -> Self {
		Self { versions: SkipMap::new() }
	}

	pub(crate) fn insert(&self, version: Version, value: Option<V>) {
		self.versions.insert(version, value);
	}

	/// State of this key as of `version`: the greatest write at or below
	/// it.
	pub fn resolve(&self, version: Version) -> ReadState<V> {
		match self.versions.upper_bound(Bound::Included(&version)) {
			None => ReadState::Missing,
			Some(entry) => match entry.value() {
				Some(value) => ReadState::Value(value.clone()),
				None => ReadState::Tombstone,
			},
		}
	}

	/// Whether any write to this key is tagged strictly after `version`.
	/// Read-set validation for speculative execution.
	pub fn written_after(&self, version: Version) -> bool {
		self.versions.lower_bound(Bound::Excluded(&version)).is_some()
	}

	pub fn is_empty(&self) -> bool {
		self.versions.is_empty()
	}

	pub fn version_count(&self) -> usize {
		self.versions.len()
	}
}
