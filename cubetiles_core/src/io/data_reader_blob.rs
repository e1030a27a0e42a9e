//! This module provides functionality for reading data from an in-memory blob.
//!
//! # Overview
//!
//! The `DataReaderBlob` struct wraps a `Blob` already held in memory and implements
//! `DataReaderTrait` over it, so in-memory data can be passed to anything that expects a
//! `DataReader` without a real file or network round-trip.
//!
//! # Examples
//!
//! ```rust
//! use cubetiles_core::{io::{DataReaderBlob, DataReaderTrait}, Blob, ByteRange};
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let reader = DataReaderBlob::from(Blob::from(vec![1, 2, 3, 4]));
//!     let range = ByteRange::new(1, 2);
//!     assert_eq!(reader.read_range(&range).await?.as_slice(), &[2, 3]);
//!     Ok(())
//! }
//! ```

#![allow(dead_code)]

use super::{DataReaderTrait, DataWriterBlob};
use crate::{Blob, ByteRange};
use anyhow::{Result, bail};
use async_trait::async_trait;

/// A struct that provides reading capabilities from an in-memory blob of data.
#[derive(Debug, Clone)]
pub struct DataReaderBlob {
	blob: Blob,
	name: String,
}

impl From<Blob> for DataReaderBlob {
	fn from(blob: Blob) -> Self {
		DataReaderBlob {
			blob,
			name: "memory".to_string(),
		}
	}
}

impl From<Vec<u8>> for DataReaderBlob {
	fn from(data: Vec<u8>) -> Self {
		DataReaderBlob::from(Blob::from(data))
	}
}

impl From<DataWriterBlob> for DataReaderBlob {
	fn from(writer: DataWriterBlob) -> Self {
		DataReaderBlob::from(writer.into_blob())
	}
}

#[async_trait]
impl DataReaderTrait for DataReaderBlob {
	async fn read_range(&self, range: &ByteRange) -> Result<Blob> {
		let start = range.offset as usize;
		let end = start + range.length as usize;
		if end > self.blob.len() as usize {
			bail!("range {range} exceeds blob length {}", self.blob.len());
		}
		Ok(Blob::from(self.blob.as_slice()[start..end].to_vec()))
	}

	async fn read_all(&self) -> Result<Blob> {
		Ok(self.blob.clone())
	}

	fn get_name(&self) -> &str {
		&self.name
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_read_range() -> Result<()> {
		let reader = DataReaderBlob::from(Blob::from(vec![1, 2, 3, 4, 5]));
		let range = ByteRange::new(1, 3);
		assert_eq!(reader.read_range(&range).await?.as_slice(), &[2, 3, 4]);
		Ok(())
	}

	#[tokio::test]
	async fn test_read_range_out_of_bounds() -> Result<()> {
		let reader = DataReaderBlob::from(Blob::from(vec![1, 2, 3]));
		let range = ByteRange::new(1, 10);
		assert!(reader.read_range(&range).await.is_err());
		Ok(())
	}

	#[tokio::test]
	async fn test_read_all() -> Result<()> {
		let blob = Blob::from(vec![9, 8, 7]);
		let reader = DataReaderBlob::from(blob.clone());
		assert_eq!(reader.read_all().await?, blob);
		Ok(())
	}

	#[test]
	fn test_get_name() {
		let reader = DataReaderBlob::from(Blob::from(vec![1]));
		assert_eq!(reader.get_name(), "memory");
	}
}
