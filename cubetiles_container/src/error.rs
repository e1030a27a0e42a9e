//! The error-kind taxonomy (§7), layered under `anyhow::Error` so callers that need to
//! branch on kind can `downcast_ref::<TileError>` while everything else just propagates
//! `anyhow::Result` with `.context(...)`.

use std::fmt;

/// The five error kinds of §7. Each variant documents its own propagation policy.
#[derive(Debug, Clone, PartialEq)]
pub enum TileError {
	/// Request outside the tile grid, a non-sparsity-aligned slice, an unknown dataset or
	/// parameter, or a malformed message. Surfaced to the client; does not taint other
	/// requests in the group.
	InvalidInput(String),
	/// Backing array I/O error. The proxy retries once on the same chunk; on second failure
	/// this is surfaced and the affected tile's progress is marked failed (still counted
	/// toward `done`).
	SourceReadFailed { axis: String, chunk_index: (u64, u64, u64) },
	/// Compressor/decoder rejected the input. Fatal for the single tile; a `NAN_TILE` is
	/// synthesized in its place so rendering can continue.
	CodecError(String),
	/// Magic or version mismatch on tile decode. Fatal to the caller of decode.
	TileFormatError(String),
	/// Block file header and body are inconsistent (size sum overflows the file). Fatal for
	/// that block; the metadata pipeline schedules regeneration.
	StorageCorruption(String),
}

impl fmt::Display for TileError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TileError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
			TileError::SourceReadFailed { axis, chunk_index } => {
				write!(f, "source read failed on axis {axis}, chunk {chunk_index:?}")
			}
			TileError::CodecError(msg) => write!(f, "codec error: {msg}"),
			TileError::TileFormatError(msg) => write!(f, "tile format error: {msg}"),
			TileError::StorageCorruption(msg) => write!(f, "storage corruption: {msg}"),
		}
	}
}

impl std::error::Error for TileError {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn downcast_from_anyhow() {
		let err: anyhow::Error = TileError::CodecError("bad tolerance".into()).into();
		let wrapped = err.context("while encoding tile");
		let kind = wrapped.downcast_ref::<TileError>();
		assert_eq!(kind, Some(&TileError::CodecError("bad tolerance".into())));
	}
}
