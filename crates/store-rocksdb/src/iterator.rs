// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::{mem, sync::Arc};

use async_trait::async_trait;
use rocksdb::DB;
use statum_core::storage::{SeekTo, StorageIter};
use statum_type::{Error, Result};
use tokio::{
	sync::{mpsc, oneshot},
	task,
};

use crate::storage::backend_err;

const ITER_BATCH: usize = 128;

type EntryBatch = Vec<(Vec<u8>, Vec<u8>)>;

/// Spawns the blocking reader task and waits until its snapshot is
/// pinned, so every write that completes before this returns is visible
/// and everything after is not.
pub(crate) async fn spawn_range_task(db: Arc<DB>, seek: SeekTo<Vec<u8>>) -> Result<RocksRangeIter> {
	let (batch_tx, batch_rx) = mpsc::channel::<Result<EntryBatch>>(2);
	let (ready_tx, ready_rx) = oneshot::channel::<()>();

	task::spawn_blocking(move || {
		let snapshot = db.snapshot();
		let mut iter = snapshot.raw_iterator();
		let _ = ready_tx.send(());

		match &seek {
			SeekTo::First => iter.seek_to_first(),
			SeekTo::Key(key) => iter.seek(key),
		}

		let mut batch = Vec::with_capacity(ITER_BATCH);
		while iter.valid() {
			let (Some(key), Some(value)) = (iter.key(), iter.value()) else {
				break;
			};
			batch.push((key.to_vec(), value.to_vec()));
			if batch.len() >= ITER_BATCH {
				// A closed channel means the iterator was released;
				// stop and let the snapshot go.
				if batch_tx.blocking_send(Ok(mem::take(&mut batch))).is_err() {
					return;
				}
				batch.reserve(ITER_BATCH);
			}
			iter.next();
		}
		if let Err(error) = iter.status() {
			let _ = batch_tx.blocking_send(Err(backend_err(error)));
			return;
		}
		if !batch.is_empty() {
			let _ = batch_tx.blocking_send(Ok(batch));
		}
	});

	ready_rx.await.map_err(|_| Error::backend("range reader task exited before pinning"))?;
	Ok(RocksRangeIter { receiver: Some(batch_rx), buffer: Vec::new().into_iter(), current: None })
}

/// Streaming cursor over a pinned snapshot.
///
/// `next` suspends while the background task reads from disk. Dropping or
/// releasing the iterator closes the channel, which stops the task and
/// releases the snapshot.
pub struct RocksRangeIter {
	receiver: Option<mpsc::Receiver<Result<EntryBatch>>>,
	buffer: std::vec::IntoIter<(Vec<u8>, Vec<u8>)>,
	current: Option<(Vec<u8>, Vec<u8>)>,
}

#[async_trait]
impl StorageIter for RocksRangeIter {
	type Key = Vec<u8>;
	type Value = Vec<u8>;

	async fn next(&mut self) -> Result<bool> {
		if let Some(entry) = self.buffer.next() {
			self.current = Some(entry);
			return Ok(true);
		}
		let Some(receiver) = self.receiver.as_mut() else {
			self.current = None;
			return Ok(false);
		};
		match receiver.recv().await {
			Some(Ok(batch)) => {
				self.buffer = batch.into_iter();
				match self.buffer.next() {
					Some(entry) => {
						self.current = Some(entry);
						Ok(true)
					}
					None => {
						self.current = None;
						Ok(false)
					}
				}
			}
			Some(Err(error)) => {
				self.release();
				Err(error)
			}
			None => {
				self.receiver = None;
				self.current = None;
				Ok(false)
			}
		}
	}

	fn key(&self) -> &Vec<u8> {
		&self.current.as_ref().expect("iterator is not positioned, call next() first").0
	}

	/// Disk rows always carry a value; deletions are physical here.
	fn value(&self) -> Option<&Vec<u8>> {
		self.current.as_ref().map(|(_, value)| value)
	}

	fn release(&mut self) {
		self.receiver = None;
		self.buffer = Vec::new().into_iter();
		self.current = None;
	}
}
