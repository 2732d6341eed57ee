// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::sync::Arc;

use statum_core::{Condition, Entry, ReadStorage, Status, WriteStorage, key::to_db_key};
use statum_state::StateStorage;
use statum_store_memory::ConcurrentStorage;
use statum_type::{BlockVersion, Digest, Sha3};

#[tokio::test]
async fn test_set_then_get_round_trip() {
	let state = StateStorage::new();
	state.set_row("t", "k", Entry::from_bytes(b"v")).await.unwrap();

	let row = state.get_row("t", "k").await.unwrap().unwrap();
	assert_eq!(row.get(), b"v");
	assert_eq!(row.status(), Status::Modified);

	assert!(state.get_row("t", "missing").await.unwrap().is_none());
	assert!(state.get_row("other", "k").await.unwrap().is_none());
}

#[tokio::test]
async fn test_remove_masks_row() {
	let state = StateStorage::new();
	state.set_row("t", "k", Entry::from_bytes(b"v")).await.unwrap();
	state.remove_row("t", "k").await.unwrap();

	assert!(state.get_row("t", "k").await.unwrap().is_none());
}

#[tokio::test]
async fn test_fallthrough_imports_as_normal() {
	let prev = Arc::new(StateStorage::new());
	prev.set_row("t", "k", Entry::from_bytes(b"below")).await.unwrap();

	let state = StateStorage::with_prev(prev);
	let row = state.get_row("t", "k").await.unwrap().unwrap();
	assert_eq!(row.get(), b"below");
	assert_eq!(row.status(), Status::Normal);

	// Imported rows are clean: they contribute nothing to the root.
	let root = state.hash(&Sha3, BlockVersion::V3_2).await.unwrap();
	assert!(root.is_zero());
}

#[tokio::test]
async fn test_local_deletion_shadows_prev() {
	let prev = Arc::new(StateStorage::new());
	prev.set_row("t", "k", Entry::from_bytes(b"below")).await.unwrap();

	let state = StateStorage::with_prev(prev.clone());
	state.remove_row("t", "k").await.unwrap();

	assert!(state.get_row("t", "k").await.unwrap().is_none());
	// The layer below still holds it.
	assert!(prev.get_row("t", "k").await.unwrap().is_some());
}

#[tokio::test]
async fn test_primary_keys_merge_and_mask() {
	let prev = Arc::new(StateStorage::new());
	prev.set_row("t", "a", Entry::from_bytes(b"1")).await.unwrap();
	prev.set_row("t", "masked", Entry::from_bytes(b"1")).await.unwrap();

	let state = StateStorage::with_prev(prev);
	state.set_row("t", "b", Entry::from_bytes(b"2")).await.unwrap();
	state.remove_row("t", "masked").await.unwrap();
	state.set_row("unrelated", "x", Entry::from_bytes(b"3")).await.unwrap();

	let keys = state.primary_keys("t", &Condition::new()).await.unwrap();
	assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn test_primary_keys_condition_and_limit() {
	let state = StateStorage::new();
	for key in ["k1", "k2", "k3", "k4", "skip"] {
		state.set_row("t", key, Entry::from_bytes(b"v")).await.unwrap();
	}

	let mut condition = Condition::new();
	condition.starts_with("k");
	let keys = state.primary_keys("t", &condition).await.unwrap();
	assert_eq!(keys, vec!["k1", "k2", "k3", "k4"]);

	condition.limit(1, 2);
	let keys = state.primary_keys("t", &condition).await.unwrap();
	assert_eq!(keys, vec!["k2", "k3"]);

	let mut conflicted = Condition::new();
	conflicted.gt("5").lt("3");
	assert!(state.primary_keys("t", &conflicted).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_state_root_is_xor_of_dirty_entry_hashes() {
	let state = StateStorage::new();
	state.set_row("t", "a", Entry::from_bytes(b"1")).await.unwrap();
	state.set_row("t", "b", Entry::from_bytes(b"2")).await.unwrap();
	state.remove_row("t", "c").await.unwrap();

	let expected = Entry::from_bytes(b"1").hash("t", "a", &Sha3, BlockVersion::V3_1)
		^ Entry::from_bytes(b"2").hash("t", "b", &Sha3, BlockVersion::V3_1)
		^ Entry::deleted().hash("t", "c", &Sha3, BlockVersion::V3_1);

	let root = state.hash(&Sha3, BlockVersion::V3_1).await.unwrap();
	assert_eq!(root, expected);

	// The two protocol branches produce different roots.
	let legacy = state.hash(&Sha3, BlockVersion::V3_0).await.unwrap();
	assert_ne!(root, legacy);
	assert_ne!(legacy, Digest::ZERO);
}

#[tokio::test]
async fn test_state_root_is_insertion_order_independent() {
	let forward = StateStorage::new();
	forward.set_row("t", "a", Entry::from_bytes(b"1")).await.unwrap();
	forward.set_row("t", "b", Entry::from_bytes(b"2")).await.unwrap();

	let reverse = StateStorage::new();
	reverse.set_row("t", "b", Entry::from_bytes(b"2")).await.unwrap();
	reverse.set_row("t", "a", Entry::from_bytes(b"1")).await.unwrap();

	assert_eq!(
		forward.hash(&Sha3, BlockVersion::V3_2).await.unwrap(),
		reverse.hash(&Sha3, BlockVersion::V3_2).await.unwrap(),
	);
}

#[tokio::test]
async fn test_commit_writes_dirty_set_only() {
	let prev = Arc::new(StateStorage::new());
	prev.set_row("t", "imported", Entry::from_bytes(b"old")).await.unwrap();

	let state = StateStorage::with_prev(prev);
	// Pull the import into the cache as Normal.
	state.get_row("t", "imported").await.unwrap();
	state.set_row("t", "written", Entry::from_bytes(b"new")).await.unwrap();
	state.remove_row("t", "dropped").await.unwrap();

	let backend = ConcurrentStorage::<Vec<u8>, Vec<u8>>::new();
	backend.write_one(to_db_key("t", "dropped"), b"stale".to_vec()).await.unwrap();

	state.commit_into(&backend).await.unwrap();

	assert_eq!(
		backend.read_one(&to_db_key("t", "written")).await.unwrap(),
		Some(b"new".to_vec())
	);
	assert_eq!(backend.read_one(&to_db_key("t", "dropped")).await.unwrap(), None);
	// The clean import was not committed.
	assert_eq!(backend.read_one(&to_db_key("t", "imported")).await.unwrap(), None);
}
