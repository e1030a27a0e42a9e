//! This module provides the `ValueReaderFile` struct for reading values directly from a file.
//!
//! # Overview
//!
//! The `ValueReaderFile` struct allows for reading various data types from a file on disk using
//! either little-endian or big-endian byte order. It implements the `ValueReader` trait the same
//! way `ValueReaderBlob`/`ValueReaderSlice` do, but backed by a `BufReader<File>` instead of an
//! in-memory cursor, so large files can be read without loading them fully into memory.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cubetiles_core::io::{ValueReader, ValueReaderFile};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let mut reader = ValueReaderFile::new_le(std::env::current_dir()?.join("data.bin"))?;
//!     let value = reader.read_u32()?;
//!     println!("{value}");
//!     Ok(())
//! }
//! ```

#![allow(dead_code)]

use super::{SeekRead, ValueReader, ValueReaderBlob};
use crate::Blob;
use anyhow::{Result, bail};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::{
	fs::File,
	io::{BufReader, Read, Seek, SeekFrom},
	marker::PhantomData,
	path::Path,
};

/// A struct that provides reading capabilities from a file on disk using a specified byte order.
pub struct ValueReaderFile<E: ByteOrder> {
	_phantom: PhantomData<E>,
	reader: BufReader<File>,
	len: u64,
}

impl<E: ByteOrder> ValueReaderFile<E> {
	/// Opens the file at `path` for reading.
	///
	/// # Errors
	/// Returns an error if the file cannot be opened or its length cannot be determined.
	pub fn new(path: &Path) -> Result<ValueReaderFile<E>> {
		let file = File::open(path)?;
		let len = file.metadata()?.len();
		Ok(ValueReaderFile {
			_phantom: PhantomData,
			reader: BufReader::new(file),
			len,
		})
	}
}

impl ValueReaderFile<LittleEndian> {
	/// Opens the file at `path` for little-endian reading.
	///
	/// # Errors
	/// Returns an error if the file cannot be opened.
	pub fn new_le(path: &Path) -> Result<ValueReaderFile<LittleEndian>> {
		ValueReaderFile::new(path)
	}
}

impl ValueReaderFile<BigEndian> {
	/// Opens the file at `path` for big-endian reading.
	///
	/// # Errors
	/// Returns an error if the file cannot be opened.
	pub fn new_be(path: &Path) -> Result<ValueReaderFile<BigEndian>> {
		ValueReaderFile::new(path)
	}
}

impl SeekRead for BufReader<File> {}

impl<'a, E: ByteOrder + 'a> ValueReader<'a, E> for ValueReaderFile<E> {
	fn get_reader(&mut self) -> &mut dyn SeekRead {
		&mut self.reader
	}

	fn len(&self) -> u64 {
		self.len
	}

	fn position(&mut self) -> u64 {
		self.reader.stream_position().unwrap_or(0)
	}

	fn set_position(&mut self, position: u64) -> Result<()> {
		if position > self.len {
			bail!("set position outside length")
		}
		self.reader.seek(SeekFrom::Start(position))?;
		Ok(())
	}

	fn get_sub_reader<'b>(&'b mut self, length: u64) -> Result<Box<dyn ValueReader<'b, E> + 'b>>
	where
		E: 'b,
	{
		let start = self.reader.stream_position()?;
		let end = start + length;
		if end > self.len {
			bail!("Requested sub-reader length exceeds remaining data");
		}

		let mut buf = vec![0u8; length as usize];
		self.reader.read_exact(&mut buf)?;

		Ok(Box::new(ValueReaderBlob::new(Blob::from(buf))))
	}
}
