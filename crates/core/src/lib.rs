// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use statum_type::Result;

mod condition;
mod entry;
pub mod key;
mod layer;
pub mod storage;

pub use condition::Condition;
pub use entry::{Entry, SharedBytes, Status};
pub use layer::LayeredStorage;
pub use storage::{
	ByteSize, DrainStorage, IterateStorage, ReadState, ReadStorage, SeekTo, ShadowReadStorage,
	StorageIter, WriteStorage, merge_into, merge_many,
};
