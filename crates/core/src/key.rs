// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later

//! The composite row key persistent backends store entries under.
//!
//! Every entry is keyed by `table ":" key`. Table names never contain a
//! colon, so splitting on the first one is unambiguous even when the key
//! part does.

pub const DB_KEY_SEPARATOR: u8 = b':';

pub fn to_db_key(table: &str, key: &str) -> Vec<u8> {
	let mut out = Vec::with_capacity(table.len() + 1 + key.len());
	out.extend_from_slice(table.as_bytes());
	out.push(DB_KEY_SEPARATOR);
	out.extend_from_slice(key.as_bytes());
	out
}

pub fn split_db_key(raw: &[u8]) -> Option<(&str, &str)> {
	let separator = raw.iter().position(|byte| *byte == DB_KEY_SEPARATOR)?;
	let table = std::str::from_utf8(&raw[..separator]).ok()?;
	let key = std::str::from_utf8(&raw[separator + 1..]).ok()?;
	Some((table, key))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_round_trip() {
		let raw = to_db_key("s_tables", "user_1");
		assert_eq!(raw, b"s_tables:user_1");
		assert_eq!(split_db_key(&raw), Some(("s_tables", "user_1")));
	}

	#[test]
	fn test_key_part_may_contain_separator() {
		let raw = to_db_key("t", "a:b:c");
		assert_eq!(split_db_key(&raw), Some(("t", "a:b:c")));
	}

	#[test]
	fn test_missing_separator() {
		assert_eq!(split_db_key(b"no-separator"), None);
	}
}
