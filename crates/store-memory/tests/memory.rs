// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use statum_core::{
	LayeredStorage, ReadState, ReadStorage, SeekTo, ShadowReadStorage, StorageIter, WriteStorage,
	merge_into,
};
use statum_store_memory::{CacheStorage, ConcurrentStorage, OrderedStorage, TombstoneStorage};

fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
	entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn keys(keys: &[&str]) -> Vec<String> {
	keys.iter().map(|k| k.to_string()).collect()
}

#[tokio::test]
async fn test_write_then_read_round_trip() {
	let storage = ConcurrentStorage::<String, String>::new();
	storage.write_some(pairs(&[("k1", "v1"), ("k2", "v2")])).await.unwrap();

	let values = storage.read_some(&keys(&["k2", "missing", "k1"])).await.unwrap();
	assert_eq!(values, vec![Some("v2".to_string()), None, Some("v1".to_string())]);

	assert_eq!(storage.read_one(&"k1".to_string()).await.unwrap(), Some("v1".to_string()));
	assert_eq!(storage.read_one(&"nope".to_string()).await.unwrap(), None);
}

#[tokio::test]
async fn test_update_in_place() {
	let storage = ConcurrentStorage::<String, String>::new();
	storage.write_one("k".to_string(), "v1".to_string()).await.unwrap();
	storage.write_one("k".to_string(), "v2".to_string()).await.unwrap();

	assert_eq!(storage.read_one(&"k".to_string()).await.unwrap(), Some("v2".to_string()));
	assert_eq!(storage.len(), 1);
}

#[tokio::test]
async fn test_remove_is_idempotent_physical() {
	let storage = ConcurrentStorage::<String, String>::new();
	storage.write_one("k".to_string(), "v".to_string()).await.unwrap();

	storage.remove_some(keys(&["k"])).await.unwrap();
	storage.remove_some(keys(&["k"])).await.unwrap();

	assert_eq!(storage.read_one(&"k".to_string()).await.unwrap(), None);
	assert!(storage.empty());
}

#[tokio::test]
async fn test_remove_is_idempotent_logical() {
	let storage = TombstoneStorage::<String, String>::new();
	storage.write_one("k".to_string(), "v".to_string()).await.unwrap();

	storage.remove_some(keys(&["k"])).await.unwrap();
	let first = storage.read_states(&keys(&["k"])).await.unwrap();
	storage.remove_some(keys(&["k"])).await.unwrap();
	let second = storage.read_states(&keys(&["k"])).await.unwrap();

	assert_eq!(first, vec![ReadState::Tombstone]);
	assert_eq!(first, second);
	assert_eq!(storage.len(), 1);
}

#[tokio::test]
async fn test_logical_deletion_distinguishes_absent_from_deleted() {
	let storage = TombstoneStorage::<String, String>::new();
	storage.write_one("present".to_string(), "v".to_string()).await.unwrap();
	storage.remove_some(keys(&["deleted"])).await.unwrap();

	let states = storage.read_states(&keys(&["present", "deleted", "absent"])).await.unwrap();
	assert_eq!(
		states,
		vec![ReadState::Value("v".to_string()), ReadState::Tombstone, ReadState::Missing]
	);

	// Through the plain read contract a tombstone is just "no value".
	let values = storage.read_some(&keys(&["deleted", "absent"])).await.unwrap();
	assert_eq!(values, vec![None, None]);
}

#[tokio::test]
async fn test_tombstones_appear_in_scans() {
	let storage = TombstoneStorage::<String, String>::single();
	storage.write_some(pairs(&[("a", "1"), ("b", "2")])).await.unwrap();
	storage.remove_some(keys(&["b"])).await.unwrap();

	let mut scanned = Vec::new();
	let mut iter = storage.seek(SeekTo::First);
	while iter.next().await.unwrap() {
		scanned.push((iter.key().clone(), iter.has_value()));
	}
	assert_eq!(scanned, vec![("a".to_string(), true), ("b".to_string(), false)]);
}

#[tokio::test]
async fn test_seek_starts_at_first_key_not_below() {
	let storage = OrderedStorage::<String, String>::single();
	storage.write_some(pairs(&[("a", "1"), ("c", "3"), ("e", "5")])).await.unwrap();

	let mut iter = storage.seek(SeekTo::Key("b".to_string()));
	let mut scanned = Vec::new();
	while iter.next().await.unwrap() {
		scanned.push(iter.key().clone());
	}
	assert_eq!(scanned, vec!["c".to_string(), "e".to_string()]);
}

#[tokio::test]
async fn test_seek_release_unblocks_writers() {
	let storage = OrderedStorage::<String, String>::single();
	storage.write_one("a".to_string(), "1".to_string()).await.unwrap();

	let mut iter = storage.seek(SeekTo::First);
	assert!(iter.next().await.unwrap());
	iter.release();

	// The bucket lock is free again.
	storage.write_one("b".to_string(), "2".to_string()).await.unwrap();
	assert_eq!(storage.len(), 2);
}

#[tokio::test]
async fn test_mru_capacity_bound() {
	// One bucket, budget for roughly two entries of 11 bytes each.
	let storage = CacheStorage::<String, String>::with_capacity(1, 30);
	storage.write_one("a".to_string(), "0123456789".to_string()).await.unwrap();
	storage.write_one("b".to_string(), "0123456789".to_string()).await.unwrap();
	storage.write_one("c".to_string(), "0123456789".to_string()).await.unwrap();

	// The earliest write went over budget and was evicted.
	assert_eq!(storage.read_one(&"a".to_string()).await.unwrap(), None);
	assert_eq!(
		storage.read_one(&"b".to_string()).await.unwrap(),
		Some("0123456789".to_string())
	);
	assert_eq!(
		storage.read_one(&"c".to_string()).await.unwrap(),
		Some("0123456789".to_string())
	);
	assert!(storage.resident_bytes() <= 30);
}

#[tokio::test]
async fn test_mru_read_refreshes_recency() {
	let storage = CacheStorage::<String, String>::with_capacity(1, 30);
	storage.write_one("a".to_string(), "0123456789".to_string()).await.unwrap();
	storage.write_one("b".to_string(), "0123456789".to_string()).await.unwrap();

	// Touch "a" so "b" becomes the eviction candidate.
	storage.read_one(&"a".to_string()).await.unwrap();
	storage.write_one("c".to_string(), "0123456789".to_string()).await.unwrap();

	assert_eq!(storage.read_one(&"b".to_string()).await.unwrap(), None);
	assert!(storage.read_one(&"a".to_string()).await.unwrap().is_some());
	assert!(storage.read_one(&"c".to_string()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_merge_keeps_existing_destination_entries() {
	let destination = ConcurrentStorage::<String, String>::new();
	let source = ConcurrentStorage::<String, String>::new();
	destination.write_one("a".to_string(), "1".to_string()).await.unwrap();
	source.write_some(pairs(&[("a", "2"), ("b", "2")])).await.unwrap();

	destination.merge(&source);

	assert_eq!(destination.read_one(&"a".to_string()).await.unwrap(), Some("1".to_string()));
	assert_eq!(destination.read_one(&"b".to_string()).await.unwrap(), Some("2".to_string()));
	assert!(source.empty());
}

#[tokio::test]
async fn test_swap_exchanges_contents() {
	let left = ConcurrentStorage::<String, String>::new();
	let right = ConcurrentStorage::<String, String>::new();
	left.write_one("l".to_string(), "1".to_string()).await.unwrap();
	right.write_some(pairs(&[("r1", "1"), ("r2", "2")])).await.unwrap();

	left.swap(&right);

	assert_eq!(left.len(), 2);
	assert_eq!(right.len(), 1);
	assert_eq!(left.read_one(&"r1".to_string()).await.unwrap(), Some("1".to_string()));
	assert_eq!(right.read_one(&"l".to_string()).await.unwrap(), Some("1".to_string()));
}

#[tokio::test]
async fn test_merge_into_backend_honors_tombstones() {
	let backend = ConcurrentStorage::<String, String>::new();
	backend.write_some(pairs(&[("stale", "old"), ("kept", "yes")])).await.unwrap();

	let overlay = TombstoneStorage::<String, String>::new();
	overlay.write_one("fresh".to_string(), "new".to_string()).await.unwrap();
	overlay.remove_some(keys(&["stale"])).await.unwrap();

	merge_into(&backend, overlay).await.unwrap();

	assert_eq!(backend.read_one(&"stale".to_string()).await.unwrap(), None);
	assert_eq!(backend.read_one(&"fresh".to_string()).await.unwrap(), Some("new".to_string()));
	assert_eq!(backend.read_one(&"kept".to_string()).await.unwrap(), Some("yes".to_string()));
}

#[tokio::test]
async fn test_layered_storage_shadowing() {
	let back = ConcurrentStorage::<String, String>::new();
	back.write_some(pairs(&[("shared", "below"), ("only_below", "below")])).await.unwrap();

	let layered = LayeredStorage::new(TombstoneStorage::<String, String>::new(), back);
	layered.write_one("shared".to_string(), "above".to_string()).await.unwrap();
	layered.remove_some(keys(&["only_below"])).await.unwrap();

	// Front value wins, front tombstone hides the back, misses fall
	// through.
	assert_eq!(
		layered.read_one(&"shared".to_string()).await.unwrap(),
		Some("above".to_string())
	);
	assert_eq!(layered.read_one(&"only_below".to_string()).await.unwrap(), None);

	let back = layered.flush_down().await.unwrap();
	assert_eq!(back.read_one(&"shared".to_string()).await.unwrap(), Some("above".to_string()));
	assert_eq!(back.read_one(&"only_below".to_string()).await.unwrap(), None);
}

#[test]
fn test_concurrent_disjoint_writes() {
	let storage = std::sync::Arc::new(ConcurrentStorage::<String, String>::with_buckets(64));

	let handles: Vec<_> = (0..8)
		.map(|worker: usize| {
			let storage = storage.clone();
			std::thread::spawn(move || {
				for i in 0..100 {
					storage.write_some_sync(vec![(
						format!("w{}-{}", worker, i),
						format!("v{}", i),
					)]);
				}
			})
		})
		.collect();
	for handle in handles {
		handle.join().unwrap();
	}

	assert_eq!(storage.len(), 800);
	let states = storage.read_states_sync(&["w3-42".to_string()]);
	assert_eq!(states, vec![ReadState::Value("v42".to_string())]);
}
