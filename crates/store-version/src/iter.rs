// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::{collections::VecDeque, ops::Bound, sync::Arc};

use async_trait::async_trait;
use parking_lot::{Mutex, lock_api::ArcMutexGuard};
use statum_core::storage::{ReadState, SeekTo, StorageIter};
use statum_type::Result;

use crate::{Version, storage::VersionBucket};

type BucketGuard<K, V> = ArcMutexGuard<parking_lot::RawMutex, VersionBucket<K, V>>;

/// Ordered scan of a [`crate::VersionedStorage`] resolved at one version.
///
/// Same locking shape as the memory engine's seek iterator: the current
/// bucket's lock is held while positioned in it. Keys with no write at or
/// below the pinned version are stepped over; tombstoned keys yield with
/// `has_value() == false`.
pub struct VersionRangeIter<K, V> {
	remaining: VecDeque<Arc<Mutex<VersionBucket<K, V>>>>,
	guard: Option<BucketGuard<K, V>>,
	version: Version,
	seek: Option<K>,
	cursor: Option<K>,
	current: Option<(K, Option<V>)>,
}

impl<K, V> VersionRangeIter<K, V>
where
	K: Clone + Ord + Send + Sync + 'static,
	V: Clone + Send + Sync + 'static,
{
	pub(crate) fn new(
		buckets: Vec<Arc<Mutex<VersionBucket<K, V>>>>,
		version: Version,
		seek: SeekTo<K>,
	) -> Self {
		Self {
			remaining: buckets.into(),
			guard: None,
			version,
			seek: match seek {
				SeekTo::First => None,
				SeekTo::Key(key) => Some(key),
			},
			cursor: None,
			current: None,
		}
	}

	fn advance(&mut self) -> bool {
		loop {
			let Some(bucket) = self.guard.as_ref() else {
				let Some(next) = self.remaining.pop_front() else {
					self.current = None;
					return false;
				};
				self.guard = Some(Mutex::lock_arc(&next));
				self.cursor = None;
				continue;
			};
			let entry = match (&self.cursor, &self.seek) {
				(None, Some(from)) => {
					bucket.range((Bound::Included(from), Bound::Unbounded)).next()
				}
				(None, None) => bucket.iter().next(),
				(Some(last), _) => {
					bucket.range((Bound::Excluded(last), Bound::Unbounded)).next()
				}
			};
			match entry {
				Some((key, chain)) => {
					let key = key.clone();
					let resolved = chain.resolve(self.version);
					self.cursor = Some(key.clone());
					match resolved {
						// No write at or below the pinned version:
						// invisible to this scan.
						ReadState::Missing => continue,
						ReadState::Tombstone => {
							self.current = Some((key, None));
							return true;
						}
						ReadState::Value(value) => {
							self.current = Some((key, Some(value)));
							return true;
						}
					}
				}
				None => {
					self.guard = None;
				}
			}
		}
	}
}

#[async_trait]
impl<K, V> StorageIter for VersionRangeIter<K, V>
where
	K: Clone + Ord + Send + Sync + 'static,
	V: Clone + Send + Sync + 'static,
{
	type Key = K;
	type Value = V;

	async fn next(&mut self) -> Result<bool> {
		Ok(self.advance())
	}

	fn key(&self) -> &K {
		&self.current.as_ref().expect("iterator is not positioned, call next() first").0
	}

	fn value(&self) -> Option<&V> {
		self.current.as_ref().and_then(|(_, value)| value.as_ref())
	}

	fn release(&mut self) {
		self.guard = None;
		self.remaining.clear();
		self.current = None;
	}
}
