//! The `CompressionKind` enum describes which transport compression, if any, wraps a
//! block of bytes — a tile body, a cache entry, a metadata blob.
//!
//! # Examples
//!
//! ```
//! use cubetiles_core::CompressionKind;
//!
//! assert_eq!(CompressionKind::Uncompressed.extension(), "");
//! assert_eq!(CompressionKind::Gzip.extension(), ".gz");
//! assert_eq!(CompressionKind::Brotli.extension(), ".br");
//! ```

use anyhow::{bail, Result};
#[cfg(feature = "cli")]
use clap::ValueEnum;
use enumset::EnumSetType;
use std::fmt::Display;

/// Enum representing possible compression algorithms.
#[cfg_attr(feature = "cli", derive(ValueEnum))]
#[derive(Debug, EnumSetType, PartialOrd)]
pub enum CompressionKind {
	Uncompressed,
	Gzip,
	Brotli,
}

impl Display for CompressionKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			CompressionKind::Uncompressed => "none",
			CompressionKind::Gzip => "gzip",
			CompressionKind::Brotli => "brotli",
		})
	}
}

impl CompressionKind {
	/// Returns the file extension associated with the compression type.
	pub fn extension(&self) -> &str {
		match self {
			CompressionKind::Uncompressed => "",
			CompressionKind::Gzip => ".gz",
			CompressionKind::Brotli => ".br",
		}
	}

	/// Determines the compression type from a given filename, stripping the
	/// matching extension in place.
	///
	/// # Examples
	///
	/// ```
	/// use cubetiles_core::CompressionKind;
	///
	/// let mut filename = String::from("file.txt.gz");
	/// assert_eq!(CompressionKind::from_filename(&mut filename), CompressionKind::Gzip);
	/// assert_eq!(filename, "file.txt");
	/// ```
	pub fn from_filename(filename: &mut String) -> CompressionKind {
		if let Some(index) = filename.rfind('.') {
			let compression = match filename.get(index..).unwrap() {
				".gz" => CompressionKind::Gzip,
				".br" => CompressionKind::Brotli,
				_ => CompressionKind::Uncompressed,
			};

			if compression != CompressionKind::Uncompressed {
				filename.truncate(index);
			}
			return compression;
		}
		CompressionKind::Uncompressed
	}

	pub fn parse_str(value: &str) -> Result<Self> {
		Ok(match value.to_lowercase().trim() {
			"br" => CompressionKind::Brotli,
			"brotli" => CompressionKind::Brotli,
			"gz" => CompressionKind::Gzip,
			"gzip" => CompressionKind::Gzip,
			"none" => CompressionKind::Uncompressed,
			"raw" => CompressionKind::Uncompressed,
			_ => bail!("unknown compression kind, expected brotli, gzip or none"),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_compression_to_extension() {
		fn test(compression: CompressionKind, expected_extension: &str) {
			assert_eq!(
				compression.extension(),
				expected_extension,
				"Extension does not match {expected_extension}"
			);
		}

		test(CompressionKind::Uncompressed, "");
		test(CompressionKind::Gzip, ".gz");
		test(CompressionKind::Brotli, ".br");
	}

	#[test]
	fn test_extract_compression() {
		fn test(expected_compression: CompressionKind, filename: &str, expected_remainder: &str) {
			let mut filename_string = String::from(filename);
			assert_eq!(
				CompressionKind::from_filename(&mut filename_string),
				expected_compression,
				"Extracted compression does not match expected for filename: {filename}"
			);
			assert_eq!(
				filename_string, expected_remainder,
				"Filename remainder does not match expected for filename: {filename}"
			);
		}

		test(CompressionKind::Gzip, "file.txt.gz", "file.txt");
		test(CompressionKind::Brotli, "archive.tar.br", "archive.tar");
		test(CompressionKind::Uncompressed, "image.png", "image.png");
		test(
			CompressionKind::Uncompressed,
			"document.pdf",
			"document.pdf",
		);
		test(
			CompressionKind::Uncompressed,
			"noextensionfile",
			"noextensionfile",
		);
	}
}
