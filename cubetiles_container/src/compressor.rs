//! C2: the lossy/lossless tile body codec (§4.2).

use crate::error::TileError;
use crate::types::TileId;
use anyhow::{Context, Result, bail};
use cubetiles_core::compression::{compress_brotli, compress_brotli_fast, decompress_brotli};
use cubetiles_core::types::Blob;
use serde::Deserialize;

/// Absolute-error targets for the lossy codec: one for regular parameters, one for the
/// "anomaly" parameter class recognized by [`TileId::is_anomaly_parameter`] (§2b).
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ToleranceConfig {
	#[serde(default = "default_tolerance")]
	pub default_tolerance: f64,
	#[serde(default = "default_anomaly_tolerance")]
	pub anomaly_tolerance: f64,
}

fn default_tolerance() -> f64 {
	0.01
}

fn default_anomaly_tolerance() -> f64 {
	0.05
}

impl Default for ToleranceConfig {
	fn default() -> Self {
		Self {
			default_tolerance: default_tolerance(),
			anomaly_tolerance: default_anomaly_tolerance(),
		}
	}
}

impl ToleranceConfig {
	pub fn tolerance_for(&self, tile_id: &TileId) -> f64 {
		if tile_id.is_anomaly_parameter() {
			self.anomaly_tolerance
		} else {
			self.default_tolerance
		}
	}
}

/// Which codec a tile body was (or should be) encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecMode {
	Lossy,
	Lossless,
}

/// A decoded tile body: the `T * T` row-major matrix and the error bound that applies to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBody {
	pub values: Vec<f64>,
	pub max_error: f64,
}

/// Encodes a `T * T` row-major matrix (NaN = missing) into the compressed body + optional
/// NaN-mask bytes described by §6. Stats (min/max/mean/var) are computed by the caller
/// ([`crate::tile`]) since they're needed for the header regardless of codec mode.
pub fn encode_body(values: &[f64], mode: CodecMode, tolerance: f64) -> Result<(Blob, Option<Blob>, f64)> {
	match mode {
		CodecMode::Lossless => {
			let mut raw = Vec::with_capacity(values.len() * 8);
			for &v in values {
				raw.extend_from_slice(&v.to_le_bytes());
			}
			let body = compress_brotli(&Blob::from(raw)).context("compressing lossless tile body")?;
			Ok((body, None, -2.0))
		}
		CodecMode::Lossy => encode_lossy(values, tolerance),
	}
}

fn encode_lossy(values: &[f64], tolerance: f64) -> Result<(Blob, Option<Blob>, f64)> {
	if tolerance <= 0.0 {
		bail!(TileError::CodecError(format!("tolerance must be positive, got {tolerance}")));
	}
	let step = 2.0 * tolerance;

	let mut mask_raw = Vec::with_capacity(values.len() * 4);
	let mut body_raw = Vec::with_capacity(values.len() * 4);
	let mut max_error = 0.0_f64;

	for &v in values {
		if v.is_nan() {
			mask_raw.extend_from_slice(&f32::NAN.to_le_bytes());
			body_raw.extend_from_slice(&0.0f32.to_le_bytes());
		} else {
			mask_raw.extend_from_slice(&0.0f32.to_le_bytes());
			let quantized = (v / step).round() * step;
			let quantized_f32 = quantized as f32;
			let error = (quantized_f32 as f64 - v).abs();
			if error > max_error {
				max_error = error;
			}
			body_raw.extend_from_slice(&quantized_f32.to_le_bytes());
		}
	}

	let body = compress_brotli(&Blob::from(body_raw)).context("compressing lossy tile body")?;
	let mask = compress_brotli_fast(&Blob::from(mask_raw)).context("compressing NaN mask")?;
	Ok((body, Some(mask), max_error))
}

/// Decodes a tile body given the header's declared error sentinel/value, matrix length, and
/// the optional compressed NaN mask.
pub fn decode_body(body: &Blob, max_error: f64, mask: Option<&Blob>, len: usize) -> Result<DecodedBody> {
	if max_error == -2.0 {
		let raw = decompress_brotli(body).context("decompressing lossless tile body")?;
		let raw = raw.as_slice();
		if raw.len() != len * 8 {
			bail!(TileError::TileFormatError(format!(
				"lossless body has {} bytes, expected {}",
				raw.len(),
				len * 8
			)));
		}
		let values = raw
			.chunks_exact(8)
			.map(|c| f64::from_le_bytes(c.try_into().unwrap()))
			.collect();
		return Ok(DecodedBody { values, max_error: 0.0 });
	}

	let raw = decompress_brotli(body).context("decompressing lossy tile body")?;
	let raw = raw.as_slice();
	if raw.len() != len * 4 {
		bail!(TileError::TileFormatError(format!(
			"lossy body has {} bytes, expected {}",
			raw.len(),
			len * 4
		)));
	}
	let mut values: Vec<f64> = raw
		.chunks_exact(4)
		.map(|c| f32::from_le_bytes(c.try_into().unwrap()) as f64)
		.collect();

	if let Some(mask) = mask {
		let mask_raw = decompress_brotli(mask).context("decompressing NaN mask")?;
		let mask_raw = mask_raw.as_slice();
		if mask_raw.len() != len * 4 {
			bail!(TileError::TileFormatError(format!(
				"NaN mask has {} bytes, expected {}",
				mask_raw.len(),
				len * 4
			)));
		}
		for (v, c) in values.iter_mut().zip(mask_raw.chunks_exact(4)) {
			let m = f32::from_le_bytes(c.try_into().unwrap()) as f64;
			*v += m;
		}
	}

	Ok(DecodedBody { values, max_error })
}
