// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod error;
mod hash;
mod version;

pub use error::Error;
pub use hash::{Digest, HashAlgorithm, Keccak, Sha3};
pub use version::BlockVersion;

pub type Result<T> = std::result::Result<T, Error>;
