// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::{fmt, sync::Arc};

use smallvec::SmallVec;
use statum_type::{BlockVersion, Digest, Error, HashAlgorithm, Result};

use crate::storage::ByteSize;

/// Values up to this length live inline in the entry, no allocation.
const INLINE_CAPACITY: usize = 32;

/// Lifecycle status of an entry.
///
/// Only `Modified` and `Deleted` entries are dirty; they are the ones that
/// participate in incremental hashing and in commits. `Normal` marks data
/// imported unmodified from a lower storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
	#[default]
	Empty,
	Normal,
	Modified,
	Deleted,
}

/// A type-erased payload an entry can hold by shared pointer instead of
/// copying into its own buffer. Decoded table rows use this to avoid
/// re-serializing on every cache hop.
pub trait SharedBytes: Send + Sync + fmt::Debug {
	fn bytes(&self) -> &[u8];
}

impl SharedBytes for Vec<u8> {
	fn bytes(&self) -> &[u8] {
		self
	}
}

impl SharedBytes for String {
	fn bytes(&self) -> &[u8] {
		self.as_bytes()
	}
}

#[derive(Debug, Clone, Default)]
enum Buffer {
	#[default]
	Empty,
	/// Exclusively owned bytes; deep-copied on clone, never aliased.
	Owned(SmallVec<[u8; INLINE_CAPACITY]>),
	/// Shared pointer to an opaque payload; clone is an `Arc` bump.
	Shared(Arc<dyn SharedBytes>),
}

impl Buffer {
	fn as_slice(&self) -> &[u8] {
		match self {
			Buffer::Empty => &[],
			Buffer::Owned(data) => data,
			Buffer::Shared(payload) => payload.bytes(),
		}
	}
}

/// One stored field: a status-tagged value container.
///
/// This is the unit exchanged at every storage boundary. An entry starts
/// `Empty`, turns `Modified` on any set, and turns into a tombstone via
/// `set_status(Status::Deleted)`, which also releases its buffer.
#[derive(Debug, Clone, Default)]
pub struct Entry {
	buffer: Buffer,
	status: Status,
}

impl Entry {
	pub fn new() -> Self {
		Self::default()
	}

	/// An entry pre-populated with `data` and marked `Modified`.
	pub fn from_bytes(data: impl AsRef<[u8]>) -> Self {
		let mut entry = Self::new();
		entry.set(data);
		entry
	}

	/// A tombstone entry.
	pub fn deleted() -> Self {
		Self { buffer: Buffer::Empty, status: Status::Deleted }
	}

	pub fn status(&self) -> Status {
		self.status
	}

	/// `Deleted` releases the buffer: a tombstone carries no value.
	pub fn set_status(&mut self, status: Status) {
		if status == Status::Deleted {
			self.buffer = Buffer::Empty;
		}
		self.status = status;
	}

	pub fn dirty(&self) -> bool {
		matches!(self.status, Status::Modified | Status::Deleted)
	}

	/// Read-only view of the held value. Empty slice for `Empty`/`Deleted`.
	pub fn get(&self) -> &[u8] {
		self.buffer.as_slice()
	}

	/// Copies `data` into the owned buffer and marks the entry `Modified`.
	pub fn set(&mut self, data: impl AsRef<[u8]>) {
		self.buffer = Buffer::Owned(SmallVec::from_slice(data.as_ref()));
		self.status = Status::Modified;
	}

	/// Stores a shared payload without copying and marks the entry
	/// `Modified`. Copies of this entry share the payload.
	pub fn set_shared(&mut self, payload: Arc<dyn SharedBytes>) {
		self.buffer = Buffer::Shared(payload);
		self.status = Status::Modified;
	}

	/// Entries hold exactly one field; only index 0 is valid.
	pub fn field(&self, index: usize) -> Result<&[u8]> {
		if index != 0 {
			return Err(Error::FieldIndexOutOfRange { index });
		}
		Ok(self.get())
	}

	/// Entries hold exactly one field; only index 0 is valid.
	pub fn set_field(&mut self, index: usize, data: impl AsRef<[u8]>) -> Result<()> {
		if index != 0 {
			return Err(Error::FieldIndexOutOfRange { index });
		}
		self.set(data);
		Ok(())
	}

	/// Resident size, used by capacity-bounded caches.
	pub fn size(&self) -> usize {
		std::mem::size_of::<Self>() + self.get().len()
	}

	/// Digest of this entry for state-root computation.
	///
	/// Both branches are frozen consensus behavior. Blocks produced before
	/// 3.1 hashed the raw value only (with a fixed sentinel for deletions);
	/// 3.1 added table and key to close collisions between same-valued
	/// rows. Clean entries contribute a zero digest in either branch so
	/// they vanish from the XOR fold.
	pub fn hash(
		&self,
		table: &str,
		key: &str,
		algo: &dyn HashAlgorithm,
		block_version: BlockVersion,
	) -> Digest {
		if block_version >= BlockVersion::V3_1 {
			match self.status {
				Status::Empty | Status::Normal => Digest::ZERO,
				Status::Deleted => algo.digest_parts(&[table.as_bytes(), key.as_bytes()]),
				Status::Modified => {
					algo.digest_parts(&[table.as_bytes(), key.as_bytes(), self.get()])
				}
			}
		} else {
			match self.status {
				Status::Empty | Status::Normal => Digest::ZERO,
				Status::Deleted => algo.digest(b""),
				Status::Modified => algo.digest(self.get()),
			}
		}
	}
}

impl ByteSize for Entry {
	fn byte_size(&self) -> usize {
		self.size()
	}
}

#[cfg(test)]
mod tests {
	use statum_type::Sha3;

	use super::*;

	#[test]
	fn test_starts_empty_and_clean() {
		let entry = Entry::new();
		assert_eq!(entry.status(), Status::Empty);
		assert!(!entry.dirty());
		assert!(entry.get().is_empty());
	}

	#[test]
	fn test_set_marks_modified() {
		let mut entry = Entry::new();
		entry.set(b"value");
		assert_eq!(entry.status(), Status::Modified);
		assert!(entry.dirty());
		assert_eq!(entry.get(), b"value");
	}

	#[test]
	fn test_set_field_zero_only() {
		let mut entry = Entry::new();
		entry.set_field(0, b"v").unwrap();
		assert_eq!(entry.field(0).unwrap(), b"v");

		assert!(matches!(
			entry.set_field(1, b"v"),
			Err(Error::FieldIndexOutOfRange { index: 1 })
		));
		assert!(matches!(entry.field(3), Err(Error::FieldIndexOutOfRange { index: 3 })));
	}

	#[test]
	fn test_delete_releases_buffer() {
		let mut entry = Entry::from_bytes(b"some value that is long enough to allocate");
		entry.set_status(Status::Deleted);
		assert_eq!(entry.status(), Status::Deleted);
		assert!(entry.dirty());
		assert!(entry.get().is_empty());
	}

	#[test]
	fn test_normal_is_not_dirty() {
		let mut entry = Entry::from_bytes(b"imported");
		entry.set_status(Status::Normal);
		assert!(!entry.dirty());
		assert_eq!(entry.get(), b"imported");
	}

	#[test]
	fn test_owned_clone_is_deep() {
		let mut a = Entry::from_bytes(b"original");
		let b = a.clone();
		a.set(b"changed");
		assert_eq!(b.get(), b"original");
	}

	#[test]
	fn test_shared_payload() {
		let payload: Arc<dyn SharedBytes> = Arc::new(b"shared row".to_vec());
		let mut entry = Entry::new();
		entry.set_shared(payload.clone());
		assert_eq!(entry.status(), Status::Modified);
		assert_eq!(entry.get(), b"shared row");

		let copy = entry.clone();
		assert_eq!(copy.get(), b"shared row");
		// Two entries plus the local handle.
		assert_eq!(Arc::strong_count(&payload), 3);
	}

	// The vectors below freeze the consensus hashing contract; they must
	// never change.

	#[test]
	fn test_hash_modified_post_3_1() {
		let entry = Entry::from_bytes(b"v");
		let digest = entry.hash("t", "k", &Sha3, BlockVersion::V3_1);
		assert_eq!(
			digest.to_hex(),
			"03b8c1abf5d67254633dfff15c196a2d089447c762b8490f72d192655c6deebe"
		);
		// Any later version takes the same branch.
		assert_eq!(entry.hash("t", "k", &Sha3, BlockVersion::V3_2), digest);
	}

	#[test]
	fn test_hash_deleted_post_3_1() {
		let entry = Entry::deleted();
		assert_eq!(
			entry.hash("t", "k", &Sha3, BlockVersion::V3_1).to_hex(),
			"a148863d0d5e123680dbc5d0766be5708d4b342ed3ae91f2e029c2b552d14e67"
		);
	}

	#[test]
	fn test_hash_modified_pre_3_1() {
		let entry = Entry::from_bytes(b"v");
		assert_eq!(
			entry.hash("t", "k", &Sha3, BlockVersion::V3_0).to_hex(),
			"453c8391bbd41309b79d7acc1382c2b0fb5f6b67f686d77c410666336ff9dabb"
		);
	}

	#[test]
	fn test_hash_deleted_pre_3_1_sentinel() {
		let entry = Entry::deleted();
		// The pre-3.1 deletion sentinel: the algorithm's empty digest,
		// independent of table and key.
		assert_eq!(
			entry.hash("t", "k", &Sha3, BlockVersion::V3_0),
			entry.hash("other", "key", &Sha3, BlockVersion::V3_0),
		);
		assert_eq!(
			entry.hash("t", "k", &Sha3, BlockVersion::V3_0).to_hex(),
			"a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
		);
	}

	#[test]
	fn test_hash_clean_is_zero_in_both_branches() {
		let mut entry = Entry::from_bytes(b"v");
		entry.set_status(Status::Normal);
		assert!(entry.hash("t", "k", &Sha3, BlockVersion::V3_0).is_zero());
		assert!(entry.hash("t", "k", &Sha3, BlockVersion::V3_2).is_zero());
		assert!(Entry::new().hash("t", "k", &Sha3, BlockVersion::V3_2).is_zero());
	}
}
