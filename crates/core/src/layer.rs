// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

//! Overlay composition: a fast transient storage in front of a slower
//! persistent one. Reads fall through on miss, a front tombstone shadows
//! the back, writes land in the front until flushed down.

use async_trait::async_trait;
use statum_type::Result;

use crate::storage::{
	DrainStorage, ReadState, ReadStorage, ShadowReadStorage, WriteStorage, merge_into,
};

pub struct LayeredStorage<F, B> {
	front: F,
	back: B,
}

impl<F, B> LayeredStorage<F, B> {
	pub fn new(front: F, back: B) -> Self {
		Self { front, back }
	}

	pub fn front(&self) -> &F {
		&self.front
	}

	pub fn back(&self) -> &B {
		&self.back
	}

	pub fn into_parts(self) -> (F, B) {
		(self.front, self.back)
	}
}

impl<F, B> LayeredStorage<F, B>
where
	F: DrainStorage,
	B: WriteStorage<Key = F::Key, Value = F::Value>,
{
	/// Drains the front into the back as one batch (tombstones become
	/// deletes) and returns the back.
	pub async fn flush_down(self) -> Result<B> {
		merge_into(&self.back, self.front).await?;
		Ok(self.back)
	}
}

#[async_trait]
impl<F, B> ReadStorage for LayeredStorage<F, B>
where
	F: ShadowReadStorage,
	B: ReadStorage<Key = F::Key, Value = F::Value>,
{
	type Key = F::Key;
	type Value = F::Value;

	async fn read_some(&self, keys: &[Self::Key]) -> Result<Vec<Option<Self::Value>>> {
		let states = self.front.read_states(keys).await?;

		let mut out = Vec::with_capacity(keys.len());
		let mut fallthrough_slots = Vec::new();
		let mut fallthrough_keys = Vec::new();
		for (slot, state) in states.into_iter().enumerate() {
			match state {
				ReadState::Value(value) => out.push(Some(value)),
				// Deleted in front: the back layer's stale value stays
				// hidden.
				ReadState::Tombstone => out.push(None),
				ReadState::Missing => {
					out.push(None);
					fallthrough_slots.push(slot);
					fallthrough_keys.push(keys[slot].clone());
				}
			}
		}

		if !fallthrough_keys.is_empty() {
			let values = self.back.read_some(&fallthrough_keys).await?;
			for (slot, value) in fallthrough_slots.into_iter().zip(values) {
				out[slot] = value;
			}
		}
		Ok(out)
	}
}

#[async_trait]
impl<F, B> ShadowReadStorage for LayeredStorage<F, B>
where
	F: ShadowReadStorage,
	B: ReadStorage<Key = F::Key, Value = F::Value>,
{
	async fn read_states(&self, keys: &[Self::Key]) -> Result<Vec<ReadState<Self::Value>>> {
		let mut states = self.front.read_states(keys).await?;

		let mut fallthrough_slots = Vec::new();
		let mut fallthrough_keys = Vec::new();
		for (slot, state) in states.iter().enumerate() {
			if matches!(state, ReadState::Missing) {
				fallthrough_slots.push(slot);
				fallthrough_keys.push(keys[slot].clone());
			}
		}

		if !fallthrough_keys.is_empty() {
			let values = self.back.read_some(&fallthrough_keys).await?;
			for (slot, value) in fallthrough_slots.into_iter().zip(values) {
				if let Some(value) = value {
					states[slot] = ReadState::Value(value);
				}
			}
		}
		Ok(states)
	}
}

#[async_trait]
impl<F, B> WriteStorage for LayeredStorage<F, B>
where
	F: ShadowReadStorage + WriteStorage,
	B: ReadStorage<Key = F::Key, Value = F::Value>,
{
	async fn write_some(&self, entries: Vec<(Self::Key, Self::Value)>) -> Result<()> {
		self.front.write_some(entries).await
	}

	async fn remove_some(&self, keys: Vec<Self::Key>) -> Result<()> {
		self.front.remove_some(keys).await
	}
}
