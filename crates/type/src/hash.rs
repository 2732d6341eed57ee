// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use std::{
	fmt,
	ops::{BitXor, BitXorAssign},
};

use tiny_keccak::Hasher as _;

/// A 32 byte cryptographic digest.
///
/// State roots fold per-entry digests with XOR, so the fold is independent
/// of iteration order across buckets.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Digest(pub [u8; 32]);

impl Digest {
	pub const ZERO: Digest = Digest([0u8; 32]);

	pub const fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}

	pub fn is_zero(&self) -> bool {
		self.0 == [0u8; 32]
	}

	pub fn to_hex(&self) -> String {
		let mut out = String::with_capacity(64);
		for byte in self.0 {
			out.push_str(&format!("{:02x}", byte));
		}
		out
	}
}

impl BitXor for Digest {
	type Output = Digest;

	fn bitxor(mut self, rhs: Digest) -> Digest {
		self ^= rhs;
		self
	}
}

impl BitXorAssign for Digest {
	fn bitxor_assign(&mut self, rhs: Digest) {
		for (lhs, rhs) in self.0.iter_mut().zip(rhs.0) {
			*lhs ^= rhs;
		}
	}
}

impl fmt::Debug for Digest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", self.to_hex())
	}
}

impl fmt::Display for Digest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", self.to_hex())
	}
}

/// A consensus-grade hash routine.
///
/// Implementations must be deterministic across platforms and releases;
/// every digest produced here can end up inside a block header.
pub trait HashAlgorithm: Send + Sync {
	fn digest(&self, data: &[u8]) -> Digest;

	/// Digest over the concatenation of `parts`, without materializing it.
	fn digest_parts(&self, parts: &[&[u8]]) -> Digest;
}

/// SHA3-256 (the FIPS-202 padding).
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha3;

impl HashAlgorithm for Sha3 {
	fn digest(&self, data: &[u8]) -> Digest {
		self.digest_parts(&[data])
	}

	fn digest_parts(&self, parts: &[&[u8]]) -> Digest {
		let mut hasher = tiny_keccak::Sha3::v256();
		for part in parts {
			hasher.update(part);
		}
		let mut out = [0u8; 32];
		hasher.finalize(&mut out);
		Digest(out)
	}
}

/// Legacy Keccak-256 (pre-FIPS padding), kept for chains deployed on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak;

impl HashAlgorithm for Keccak {
	fn digest(&self, data: &[u8]) -> Digest {
		self.digest_parts(&[data])
	}

	fn digest_parts(&self, parts: &[&[u8]]) -> Digest {
		let mut hasher = tiny_keccak::Keccak::v256();
		for part in parts {
			hasher.update(part);
		}
		let mut out = [0u8; 32];
		hasher.finalize(&mut out);
		Digest(out)
	}
}
