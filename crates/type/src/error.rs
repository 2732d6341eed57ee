// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

use thiserror::Error;

/// Errors surfaced by the storage core.
///
/// Not-found is never an error: every read path reports absence through
/// `Option`/`ReadState`. What remains falls into two classes, programmer
/// misuse and backend I/O failure, and neither is retried at this layer.
#[derive(Debug, Error)]
pub enum Error {
	/// An entry holds exactly one field; any other index is a defect at
	/// the call site, not a data condition.
	#[error("field index {index} out of range, entries hold a single field")]
	FieldIndexOutOfRange { index: usize },

	/// A persistent backend reported a native failure. The message carries
	/// the backend's own status string; the commit/apply path above
	/// decides whether to retry the whole operation.
	#[error("storage backend failure: {message}")]
	Backend { message: String },

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl Error {
	pub fn backend(message: impl Into<String>) -> Self {
		Self::Backend { message: message.into() }
	}
}
