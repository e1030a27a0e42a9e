//! # Compression Module
//!
//! This module provides functionalities to compress and decompress data blobs
//! using various compression algorithms such as Gzip and Brotli. It also allows
//! optimizing compression based on target preferences and handling recompression.
//!
//! ## Features
//! - Compress and decompress data using Gzip and Brotli.
//! - Optimize compression based on target settings.
//! - Recompress data from one compression format to another.
//!
//! ## Usage
//! ```rust
//! use cubetiles_core::compression::{compress_gzip, decompress_gzip};
//! use cubetiles_core::Blob;
//!
//! let data = Blob::from(vec![1, 2, 3, 4, 5]);
//! let compressed = compress_gzip(&data)?;
//! let decompressed = decompress_gzip(&compressed)?;
//! assert_eq!(data, decompressed);
//! # Ok::<(), anyhow::Error>(())
//! ```
use super::{
	compression_goal::CompressionGoal,
	method_brotli::{compress_brotli, decompress_brotli},
	method_gzip::{compress_gzip, decompress_gzip},
	target_compression::TargetCompression,
};
use crate::{Blob, CompressionKind};
use anyhow::{Context, Result, bail};

/// Optimizes the compression of a data blob based on the target compression settings.
///
/// This function attempts to compress or decompress the input blob to match the desired compression
/// settings. It ensures that the resulting blob adheres to the allowed compression algorithms and
/// the specified compression goal.
///
/// # Arguments
///
/// * `blob` - The input data blob to compress or decompress.
/// * `input_compression` - The current compression algorithm of the blob.
/// * `target` - The target compression settings.
///
/// # Returns
///
/// * `Ok((Blob, CompressionKind))` containing the optimized blob and its compression algorithm.
/// * `Err(anyhow::Error)` if the optimization fails.
///
/// # Errors
///
/// * If no compression algorithms are allowed in the target.
/// * If 'Uncompressed' is not included in the allowed compressions.
/// * If decompression or compression operations fail.
pub fn optimize_compression(
	blob: Blob,
	input_compression: &CompressionKind,
	target: &TargetCompression,
) -> Result<(Blob, CompressionKind)> {
	if target.compressions.is_empty() {
		bail!("At least one compression algorithm must be allowed");
	}

	if !target.compressions.contains(CompressionKind::Uncompressed) {
		bail!("'Uncompressed' must always be supported");
	}

	use CompressionGoal::*;

	// If the target is not seeking the best compression and the current compression is allowed,
	// retain the current compression.
	if target.compression_goal != UseBestCompression && target.compressions.contains(*input_compression) {
		return Ok((blob, *input_compression));
	}

	match input_compression {
		CompressionKind::Uncompressed => {
			if target.compression_goal != IsIncompressible {
				if target.compressions.contains(CompressionKind::Brotli) {
					return Ok((compress_brotli(&blob)?, CompressionKind::Brotli));
				}

				if target.compressions.contains(CompressionKind::Gzip) {
					return Ok((compress_gzip(&blob)?, CompressionKind::Gzip));
				}
			}

			Ok((blob, CompressionKind::Uncompressed))
		}
		CompressionKind::Gzip => {
			if target.compression_goal != IsIncompressible && target.compressions.contains(CompressionKind::Brotli) {
				let decompressed = decompress_gzip(&blob)?;
				let compressed_brotli = compress_brotli(&decompressed)?;
				return Ok((compressed_brotli, CompressionKind::Brotli));
			}

			if target.compressions.contains(CompressionKind::Gzip) {
				return Ok((blob, CompressionKind::Gzip));
			}

			// Fallback to Uncompressed if Gzip is not allowed
			let decompressed = decompress_gzip(&blob)?;
			Ok((decompressed, CompressionKind::Uncompressed))
		}
		CompressionKind::Brotli => {
			if target.compressions.contains(CompressionKind::Brotli) {
				return Ok((blob, CompressionKind::Brotli));
			}
			let decompressed = decompress_brotli(&blob)?;

			if target.compression_goal != IsIncompressible && target.compressions.contains(CompressionKind::Gzip) {
				let compressed_gzip = compress_gzip(&decompressed)?;
				return Ok((compressed_gzip, CompressionKind::Gzip));
			}

			Ok((decompressed, CompressionKind::Uncompressed))
		}
	}
}

/// Recompresses a data blob from one compression algorithm to another.
///
/// This function first decompresses the blob using the input compression algorithm and then
/// compresses it using the output compression algorithm.
///
/// # Arguments
///
/// * `blob` - The input data blob to recompress.
/// * `input_compression` - The current compression algorithm of the blob.
/// * `output_compression` - The desired compression algorithm.
///
/// # Returns
///
/// * `Ok(Blob)` containing the recompressed data.
/// * `Err(anyhow::Error)` if decompression or compression fails.
///
/// # Errors
///
/// * If decompression or compression operations fail.
pub fn recompress(
	blob: Blob,
	input_compression: &CompressionKind,
	output_compression: &CompressionKind,
) -> Result<Blob> {
	if input_compression == output_compression {
		return Ok(blob);
	}
	let decompressed = decompress(blob, input_compression)
		.with_context(|| format!("recompressing blob from {input_compression:?} to {output_compression:?}"))?;
	let recompressed = compress(decompressed, output_compression)?;
	Ok(recompressed)
}

/// Compresses data based on the specified compression algorithm.
///
/// # Arguments
///
/// * `blob` - The data blob to compress.
/// * `compression` - The compression algorithm to use.
///
/// # Returns
///
/// * `Ok(Blob)` containing the compressed data.
/// * `Err(anyhow::Error)` if compression fails.
///
/// # Errors
///
/// * If the specified compression algorithm is unsupported.
pub fn compress(blob: Blob, compression: &CompressionKind) -> Result<Blob> {
	match compression {
		CompressionKind::Uncompressed => Ok(blob),
		CompressionKind::Gzip => compress_gzip(&blob),
		CompressionKind::Brotli => compress_brotli(&blob),
	}
}

/// Decompresses data based on the specified compression algorithm.
///
/// # Arguments
///
/// * `blob` - The data blob to decompress.
/// * `compression` - The compression algorithm used for compression.
///
/// # Returns
///
/// * `Ok(Blob)` containing the decompressed data.
/// * `Err(anyhow::Error)` if decompression fails.
///
/// # Errors
///
/// * If the specified compression algorithm is unsupported.
pub fn decompress(blob: Blob, compression: &CompressionKind) -> Result<Blob> {
	match compression {
		CompressionKind::Uncompressed => Ok(blob),
		CompressionKind::Gzip => decompress_gzip(&blob),
		CompressionKind::Brotli => decompress_brotli(&blob),
	}
}

#[cfg(test)]
mod tests {
	use super::super::tests::generate_test_data;
	use super::*;
	use enumset::{EnumSet, enum_set};

	#[test]
	/// Tests the `optimize_compression` function across various compression scenarios.
	fn should_optimize_compression_correctly() -> Result<()> {
		let original_blob = generate_test_data(100);
		let gzip_blob = compress_gzip(&original_blob)?;
		let brotli_blob = compress_brotli(&original_blob)?;

		let test_case = |input_compression: CompressionKind,
		                 allowed_compressions: EnumSet<CompressionKind>,
		                 goal: CompressionGoal,
		                 expected_compression: CompressionKind|
		 -> Result<()> {
			let target = TargetCompression {
				compressions: allowed_compressions,
				compression_goal: goal,
			};
			let input_blob = match input_compression {
				CompressionKind::Uncompressed => original_blob.clone(),
				CompressionKind::Gzip => gzip_blob.clone(),
				CompressionKind::Brotli => brotli_blob.clone(),
			};
			let expected_blob = match expected_compression {
				CompressionKind::Uncompressed => original_blob.clone(),
				CompressionKind::Gzip => gzip_blob.clone(),
				CompressionKind::Brotli => brotli_blob.clone(),
			};
			let (result_blob, result_compression) = optimize_compression(input_blob, &input_compression, &target)?;
			assert_eq!(result_compression, expected_compression);
			assert_eq!(result_blob, expected_blob);
			Ok(())
		};

		let uncompressed = CompressionKind::Uncompressed;
		let gzip = CompressionKind::Gzip;
		let brotli = CompressionKind::Brotli;

		let allowed_uncompressed = enum_set!(CompressionKind::Uncompressed);
		let allowed_gzip = enum_set!(CompressionKind::Uncompressed | CompressionKind::Gzip);
		let allowed_brotli = enum_set!(CompressionKind::Uncompressed | CompressionKind::Brotli);
		let allowed_all = enum_set!(CompressionKind::Uncompressed | CompressionKind::Gzip | CompressionKind::Brotli);

		use CompressionGoal::*;

		// Test using best compression
		test_case(uncompressed, allowed_all, UseBestCompression, brotli)?;
		test_case(gzip, allowed_all, UseBestCompression, brotli)?;
		test_case(brotli, allowed_all, UseBestCompression, brotli)?;

		// Test using fast compression
		test_case(uncompressed, allowed_all, UseFastCompression, uncompressed)?;
		test_case(gzip, allowed_gzip, UseFastCompression, gzip)?;
		test_case(gzip, allowed_brotli, UseFastCompression, brotli)?;
		test_case(brotli, allowed_all, UseFastCompression, brotli)?;

		// Test treating data as incompressible
		test_case(uncompressed, allowed_uncompressed, IsIncompressible, uncompressed)?;
		test_case(gzip, allowed_gzip, IsIncompressible, gzip)?;
		test_case(brotli, allowed_brotli, IsIncompressible, brotli)?;

		Ok(())
	}

	#[test]
	fn should_recompress_correctly() -> Result<()> {
		let original_data = generate_test_data(1_000);
		let gzip_data = compress_gzip(&original_data)?;
		let brotli_data = compress_brotli(&original_data)?;

		// Recompress Gzip to Brotli
		let recompressed = recompress(gzip_data.clone(), &CompressionKind::Gzip, &CompressionKind::Brotli)?;
		let decompressed = decompress_brotli(&recompressed)?;
		assert_eq!(original_data, decompressed);

		// Recompress Brotli to Gzip
		let recompressed = recompress(brotli_data.clone(), &CompressionKind::Brotli, &CompressionKind::Gzip)?;
		let decompressed = decompress_gzip(&recompressed)?;
		assert_eq!(original_data, decompressed);

		// Recompress Gzip to Gzip (no change)
		let recompressed = recompress(gzip_data.clone(), &CompressionKind::Gzip, &CompressionKind::Gzip)?;
		assert_eq!(recompressed, gzip_data);

		// Recompress Uncompressed to Gzip
		let recompressed = recompress(
			original_data.clone(),
			&CompressionKind::Uncompressed,
			&CompressionKind::Gzip,
		)?;
		let decompressed = decompress_gzip(&recompressed)?;
		assert_eq!(original_data, decompressed);

		Ok(())
	}

	#[test]
	fn should_handle_no_compression_correctly() -> Result<()> {
		let data = generate_test_data(500);
		let result = optimize_compression(
			data.clone(),
			&CompressionKind::Uncompressed,
			&TargetCompression::from(CompressionKind::Uncompressed),
		)?;
		assert_eq!(result.0, data);
		assert_eq!(result.1, CompressionKind::Uncompressed);
		Ok(())
	}

	#[test]
	fn should_fail_when_no_compressions_allowed() {
		let data = generate_test_data(100);
		let target = TargetCompression {
			compressions: EnumSet::empty(),
			compression_goal: CompressionGoal::UseBestCompression,
		};
		let result = optimize_compression(data, &CompressionKind::Uncompressed, &target);
		assert!(result.is_err());
	}

	#[test]
	fn should_fail_when_uncompressed_not_allowed() {
		let data = generate_test_data(100);
		let target = TargetCompression {
			compressions: enum_set!(CompressionKind::Gzip | CompressionKind::Brotli),
			compression_goal: CompressionGoal::UseBestCompression,
		};
		let result = optimize_compression(data, &CompressionKind::Uncompressed, &target);
		assert!(result.is_err());
	}

	#[test]
	fn should_handle_empty_compression_set_in_recompress() -> Result<()> {
		let original_data = generate_test_data(100);
		let recompressed = recompress(
			original_data.clone(),
			&CompressionKind::Uncompressed,
			&CompressionKind::Uncompressed,
		)?;
		assert_eq!(recompressed, original_data);
		Ok(())
	}

	#[test]
	fn test_generic_compress_dispatch() -> Result<()> {
		let data = generate_test_data(1024);
		// Uncompressed should return original data
		let result = compress(data.clone(), &CompressionKind::Uncompressed)?;
		assert_eq!(result, data);
		// Gzip should match compress_gzip
		let gzip = compress(data.clone(), &CompressionKind::Gzip)?;
		assert_eq!(gzip, compress_gzip(&data)?);
		// Brotli should match compress_brotli
		let brotli = compress(data.clone(), &CompressionKind::Brotli)?;
		assert_eq!(brotli, compress_brotli(&data)?);
		Ok(())
	}

	#[test]
	fn test_generic_decompress_dispatch() -> Result<()> {
		let data = generate_test_data(512);
		let gzip = compress_gzip(&data)?;
		let brotli = compress_brotli(&data)?;
		// Uncompressed decompress returns original
		let res_u = decompress(data.clone(), &CompressionKind::Uncompressed)?;
		assert_eq!(res_u, data);
		// Gzip decompress matches decompress_gzip
		let res_g = decompress(gzip.clone(), &CompressionKind::Gzip)?;
		assert_eq!(res_g, decompress_gzip(&gzip)?);
		// Brotli decompress matches decompress_brotli
		let res_b = decompress(brotli.clone(), &CompressionKind::Brotli)?;
		assert_eq!(res_b, decompress_brotli(&brotli)?);
		Ok(())
	}

	#[test]
	fn test_optimize_compression_decompress_when_only_uncompressed_allowed() -> Result<()> {
		let original = generate_test_data(256);
		let gzip_blob = compress_gzip(&original)?;
		let target = TargetCompression::from_none(); // only Uncompressed allowed
		let (out_blob, out_comp) = optimize_compression(gzip_blob.clone(), &CompressionKind::Gzip, &target)?;
		assert_eq!(out_comp, CompressionKind::Uncompressed);
		assert_eq!(out_blob, original);
		// Brotli case
		let brotli_blob = compress_brotli(&original)?;
		let (out_blob2, out_comp2) = optimize_compression(brotli_blob.clone(), &CompressionKind::Brotli, &target)?;
		assert_eq!(out_comp2, CompressionKind::Uncompressed);
		assert_eq!(out_blob2, original);
		Ok(())
	}
}
