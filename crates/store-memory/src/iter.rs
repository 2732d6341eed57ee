// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::{collections::VecDeque, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use parking_lot::{Mutex, lock_api::ArcMutexGuard};
use statum_core::storage::{SeekTo, StorageIter};
use statum_type::Result;

use crate::{
	eviction::Eviction,
	index::SortedIndex,
	slot::Slot,
	storage::Bucket,
};

type BucketGuard<I, E> = ArcMutexGuard<parking_lot::RawMutex, Bucket<I, E>>;

/// Forward iterator over an ordered storage.
///
/// Holds the lock of the bucket it is currently positioned in for as long
/// as it stays there; writers to that bucket block until the iterator
/// moves on, is released or is dropped. Stepping is cursor-based (first
/// key after the last yielded one) so the iterator owns its guard instead
/// of borrowing from it.
pub struct MemorySeekIter<K, V, I, S, E> {
	remaining: VecDeque<Arc<Mutex<Bucket<I, E>>>>,
	guard: Option<BucketGuard<I, E>>,
	/// Seek position applied when entering each bucket.
	seek: Option<K>,
	/// Last key yielded within the current bucket.
	cursor: Option<K>,
	current: Option<(K, Option<V>)>,
	_marker: PhantomData<fn() -> (V, S)>,
}

impl<K, V, I, S, E> MemorySeekIter<K, V, I, S, E>
where
	K: Clone + Send + Sync + 'static,
	V: Clone + Send + Sync + 'static,
	I: SortedIndex<K, S>,
	S: Slot<V>,
	E: Eviction<K>,
{
	pub(crate) fn new(buckets: Vec<Arc<Mutex<Bucket<I, E>>>>, seek: SeekTo<K>) -> Self {
		Self {
			remaining: buckets.into(),
			guard: None,
			seek: match seek {
				SeekTo::First => None,
				SeekTo::Key(key) => Some(key),
			},
			cursor: None,
			current: None,
			_marker: PhantomData,
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
			let entry = match &self.cursor {
				None => match &self.seek {
					Some(from) => bucket.index.first_from(from),
					None => bucket.index.first_after(None),
				},
				Some(last) => bucket.index.first_after(Some(last)),
			};
			match entry {
				Some((key, slot)) => {
					self.cursor = Some(key.clone());
					self.current = Some((key.clone(), slot.value().cloned()));
					return true;
				}
				// Bucket exhausted: drop its lock, move to the next.
				None => {
					self.guard = None;
				}
			}
		}
	}
}

#[async_trait]
impl<K, V, I, S, E> StorageIter for MemorySeekIter<K, V, I, S, E>
where
	K: Clone + Send + Sync + 'static,
	V: Clone + Send + Sync + 'static,
	I: SortedIndex<K, S>,
	S: Slot<V>,
	E: Eviction<K>,
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
