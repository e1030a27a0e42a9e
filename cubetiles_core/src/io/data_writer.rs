//! This module defines the `DataWriterTrait` for writing data to various destinations.
//!
//! # Overview
//!
//! The `DataWriterTrait` trait provides an interface for writing data to different sinks
//! (in-memory blobs, files, ...). Implementations track a write position so that `append`
//! always writes at the end while `write_start` can overwrite the beginning of the data
//! without disturbing the current position.
//!
//! # Examples
//!
//! ```rust
//! use cubetiles_core::{io::{DataWriterBlob, DataWriterTrait}, Blob};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let mut writer = DataWriterBlob::new()?;
//!     writer.append(&Blob::from(vec![1, 2, 3]))?;
//!     assert_eq!(writer.get_position()?, 3);
//!     Ok(())
//! }
//! ```

use crate::{Blob, ByteRange};
use anyhow::Result;
use async_trait::async_trait;

/// A trait for writing data to a sink, tracking append position and supporting in-place
/// overwrites at the start of the data.
#[async_trait]
pub trait DataWriterTrait: Send + Sync {
	/// Appends data at the current write position.
	///
	/// # Returns
	/// A `ByteRange` describing where the data landed.
	fn append(&mut self, blob: &Blob) -> Result<ByteRange>;

	/// Overwrites data starting at byte 0, leaving the write position unchanged.
	fn write_start(&mut self, blob: &Blob) -> Result<()>;

	/// Returns the current write position in bytes.
	fn get_position(&mut self) -> Result<u64>;

	/// Sets the current write position in bytes.
	fn set_position(&mut self, position: u64) -> Result<()>;
}
