//! C3: tile extraction, downsampling, padding, and the bit-exact wire encoding of §6.

use crate::compressor::{CodecMode, decode_body, encode_body};
use crate::error::TileError;
use crate::source::DataSourceProxy;
use crate::types::SliceAxis;
use anyhow::{Context, Result, ensure};
use byteorder::LittleEndian;
use cubetiles_core::io::{ValueReader, ValueReaderBlob, ValueWriter, ValueWriterBlob};
use cubetiles_core::types::Blob;

pub const TILE_MAGIC: &[u8; 4] = b"lexc";
pub const TILE_VERSION: u32 = 2;
pub const NAN_TILE: f64 = -1.0;
pub const LOSSLESS_TILE: f64 = -2.0;

/// A `T * T` row-major window extracted (and possibly downsampled/padded) from the source,
/// smaller than `T * T` wherever the source window ran past the array bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct TileWindow {
	pub values: Vec<f64>,
	pub height: usize,
	pub width: usize,
}

impl TileWindow {
	fn get(&self, y: usize, x: usize) -> f64 {
		self.values[y * self.width + x]
	}
}

/// A decoded tile: a fixed `T * T` matrix plus the error bound that applies to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTile {
	pub values: Vec<f64>,
	pub tile_size: usize,
	pub max_error: f64,
	pub resample_resolution: u32,
}

/// §4.3.1 Extraction + §4.3.2 downsampling + §4.3.3 resample-resolution padding, producing the
/// window that §4.3.4 then pads to `T * T` and encodes.
pub async fn extract_tile_window(
	proxy: &DataSourceProxy,
	axis: SliceAxis,
	slice_index: u64,
	lod: u32,
	tx: u64,
	ty: u64,
	tile_size: u64,
	resample_resolution: u32,
) -> Result<TileWindow> {
	let (rz, ry, rx) = axis.pixel_window(slice_index, lod, tx, ty, tile_size);
	let arr = proxy.read(rz, ry, rx).await?;
	let native = window_2d_from_array(axis, &arr);

	let resample_prime = effective_resample_resolution(resample_resolution, lod);
	let resampled = if resample_prime > 1 {
		apply_resample_padding(&native, resample_prime, tx, ty, tile_size)
	} else {
		native
	};

	if lod == 0 {
		return Ok(resampled);
	}

	let scale = 1u64 << lod;
	if uses_strided_downsample(proxy, axis, tile_size, scale) {
		Ok(downsample_strided(&resampled, scale))
	} else {
		Ok(downsample_average(&resampled, scale))
	}
}

/// Picks the two free axes out of a 3D [`cubetiles_core`]-agnostic array window, in the
/// `(horizontal, vertical)` order [`SliceAxis::pixel_window`] used to build the request.
fn window_2d_from_array(axis: SliceAxis, arr: &crate::types::ArrayWindow) -> TileWindow {
	let (sz, sy, sx) = arr.shape;
	let (height, width, pick): (u64, u64, Box<dyn Fn(u64, u64) -> f64 + '_>) = match axis {
		SliceAxis::Z => (sy, sx, Box::new(move |v, u| arr.get(0, v, u))),
		SliceAxis::Y => (sz, sx, Box::new(move |v, u| arr.get(v, 0, u))),
		SliceAxis::X => (sz, sy, Box::new(move |v, u| arr.get(v, u, 0))),
	};
	let mut values = Vec::with_capacity((height * width) as usize);
	for v in 0..height {
		for u in 0..width {
			values.push(pick(v, u));
		}
	}
	TileWindow {
		values,
		height: height as usize,
		width: width as usize,
	}
}

/// §4.3.3: `R' = max(1, R * 2^-lod)` when that value is an integer, else `1`.
fn effective_resample_resolution(resample_resolution: u32, lod: u32) -> u64 {
	if resample_resolution == 0 {
		return 1;
	}
	let r = resample_resolution as u64;
	let scale = 1u64 << lod;
	if r % scale == 0 {
		(r / scale).max(1)
	} else {
		1
	}
}

/// Edge-replicates per §2b's non-triviality guard, then stride-samples by `r_prime`. Whether an
/// edge is padded (and always by exactly `r_prime - 1` pixels) depends on the tile's position on
/// the `R'`-grid, not on the extracted window's (possibly array-truncated) size: an edge already
/// aligned to `r_prime` is left untouched.
fn apply_resample_padding(window: &TileWindow, r_prime: u64, tx: u64, ty: u64, tile_size: u64) -> TileWindow {
	let pad_needed = |coord: u64| -> usize {
		let start = r_prime - ((coord * tile_size) % r_prime);
		let end = (tile_size as i64 - start as i64).rem_euclid(r_prime as i64) as u64;
		if start > 0 && end > 0 && start + end < r_prime { (r_prime - 1) as usize } else { 0 }
	};
	let pad_h = pad_needed(ty);
	let pad_w = pad_needed(tx);

	let padded_h = window.height + pad_h;
	let padded_w = window.width + pad_w;

	let mut padded = vec![f64::NAN; padded_h * padded_w];
	for y in 0..padded_h {
		let src_y = y.min(window.height.saturating_sub(1));
		for x in 0..padded_w {
			let src_x = x.min(window.width.saturating_sub(1));
			if src_y < window.height && src_x < window.width {
				padded[y * padded_w + x] = window.get(src_y, src_x);
			}
		}
	}

	let out_h = padded_h.div_ceil(r_prime as usize);
	let out_w = padded_w.div_ceil(r_prime as usize);
	let mut values = Vec::with_capacity(out_h * out_w);
	for oy in 0..out_h {
		for ox in 0..out_w {
			values.push(padded[(oy * r_prime as usize) * padded_w + ox * r_prime as usize]);
		}
	}
	TileWindow {
		values,
		height: out_h,
		width: out_w,
	}
}

/// Whether native chunking along either free axis is fine enough that a full-resolution,
/// bilinear-averaged extraction would drag in more chunks than the tile grid has pixels (§4.3.2).
fn uses_strided_downsample(proxy: &DataSourceProxy, axis: SliceAxis, tile_size: u64, scale: u64) -> bool {
	let Some((cz, cy, cx)) = proxy.chunking() else {
		return false;
	};
	let window_extent = scale * tile_size;
	let (c_u, c_v) = match axis {
		SliceAxis::Z => (cx, cy),
		SliceAxis::Y => (cx, cz),
		SliceAxis::X => (cy, cz),
	};
	let chunks_u = if c_u == 0 { 1 } else { window_extent.div_ceil(c_u) };
	let chunks_v = if c_v == 0 { 1 } else { window_extent.div_ceil(c_v) };
	chunks_u > tile_size || chunks_v > tile_size
}

fn downsample_average(window: &TileWindow, scale: u64) -> TileWindow {
	let scale = scale as usize;
	let out_h = window.height.div_ceil(scale);
	let out_w = window.width.div_ceil(scale);
	let mut values = Vec::with_capacity(out_h * out_w);
	for oy in 0..out_h {
		for ox in 0..out_w {
			let y0 = oy * scale;
			let y1 = (y0 + scale).min(window.height);
			let x0 = ox * scale;
			let x1 = (x0 + scale).min(window.width);
			let mut sum = 0.0;
			let mut count = 0u32;
			for y in y0..y1 {
				for x in x0..x1 {
					let v = window.get(y, x);
					if !v.is_nan() {
						sum += v;
						count += 1;
					}
				}
			}
			values.push(if count == 0 { f64::NAN } else { sum / count as f64 });
		}
	}
	TileWindow {
		values,
		height: out_h,
		width: out_w,
	}
}

fn downsample_strided(window: &TileWindow, scale: u64) -> TileWindow {
	let scale = scale as usize;
	let out_h = window.height.div_ceil(scale);
	let out_w = window.width.div_ceil(scale);
	let mut values = Vec::with_capacity(out_h * out_w);
	for oy in 0..out_h {
		for ox in 0..out_w {
			values.push(window.get(oy * scale, ox * scale));
		}
	}
	TileWindow {
		values,
		height: out_h,
		width: out_w,
	}
}

/// §4.3.4: pads `window` into a `tile_size * tile_size` matrix (NaN elsewhere), computes stats,
/// and encodes the bit-exact wire format of §6.
pub fn encode_tile(
	window: &TileWindow,
	tile_size: u64,
	resample_resolution: u32,
	mode: CodecMode,
	tolerance: f64,
) -> Result<Blob> {
	let t = tile_size as usize;
	ensure!(
		window.height <= t && window.width <= t,
		TileError::CodecError(format!(
			"extracted window {}x{} does not fit tile size {}",
			window.height, window.width, t
		))
	);

	let mut matrix = vec![f64::NAN; t * t];
	for y in 0..window.height {
		for x in 0..window.width {
			matrix[y * t + x] = window.get(y, x);
		}
	}

	let mut writer = ValueWriterBlob::<LittleEndian>::new_le();
	writer.write_slice(TILE_MAGIC).context("writing tile magic")?;
	writer.write_u32(TILE_VERSION)?;
	writer.write_u32(resample_resolution)?;

	if matrix.iter().all(|v| v.is_nan()) {
		writer.write_u32(0)?;
		writer.write_f64(NAN_TILE)?;
		return Ok(writer.into_blob());
	}

	let (min, max, mean, var) = stats(&matrix);
	let (body, mask, max_error) = encode_body(&matrix, mode, tolerance)?;

	writer.write_u32(mask.as_ref().map_or(0, |m| m.len() as u32))?;
	writer.write_f64(max_error)?;
	writer.write_f64(min)?;
	writer.write_f64(max)?;
	writer.write_f64(mean)?;
	writer.write_f64(var)?;
	if let Some(mask) = &mask {
		writer.write_slice(mask.as_slice())?;
	}
	writer.write_slice(body.as_slice())?;

	Ok(writer.into_blob())
}

fn stats(values: &[f64]) -> (f64, f64, f64, f64) {
	let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
	let n = valid.len() as f64;
	let min = valid.iter().cloned().fold(f64::INFINITY, f64::min);
	let max = valid.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
	let mean = valid.iter().sum::<f64>() / n;
	let var = valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
	(min, max, mean, var)
}

/// §4.3.5: decodes the bit-exact wire format of §6. `tile_size` is the `T` the tile was
/// encoded with (tile identity is external to the blob, so the caller always knows it).
pub fn decode_tile(blob: &Blob, tile_size: u64) -> Result<DecodedTile> {
	let t = tile_size as usize;
	let mut reader = ValueReaderBlob::<LittleEndian>::new_le(blob.clone());
	let magic_buf = reader.read_blob(4)?;
	ensure!(
		magic_buf.as_slice() == TILE_MAGIC,
		TileError::TileFormatError(format!("bad tile magic {:?}", magic_buf.as_slice()))
	);

	let version = reader.read_u32()?;
	ensure!(
		version == TILE_VERSION,
		TileError::TileFormatError(format!("unsupported tile version {version}"))
	);

	let resample_resolution = reader.read_u32()?;
	let nan_mask_length = reader.read_u32()? as u64;
	let max_error = reader.read_f64()?;

	if max_error == NAN_TILE {
		return Ok(DecodedTile {
			values: vec![f64::NAN; t * t],
			tile_size: t,
			max_error: 0.0,
			resample_resolution,
		});
	}

	let _min = reader.read_f64()?;
	let _max = reader.read_f64()?;
	let _mean = reader.read_f64()?;
	let _var = reader.read_f64()?;

	let mask = if max_error == LOSSLESS_TILE {
		None
	} else {
		Some(reader.read_blob(nan_mask_length)?)
	};

	let remaining = reader.remaining();
	let body = reader.read_blob(remaining)?;

	let decoded = decode_body(&body, max_error, mask.as_ref(), t * t)?;
	ensure!(
		decoded.values.len() == t * t,
		TileError::StorageCorruption(format!("decoded tile has {} values, expected {}", decoded.values.len(), t * t))
	);

	Ok(DecodedTile {
		values: decoded.values,
		tile_size: t,
		max_error: decoded.max_error,
		resample_resolution,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn window(height: usize, width: usize, values: Vec<f64>) -> TileWindow {
		assert_eq!(values.len(), height * width);
		TileWindow { values, height, width }
	}

	#[test]
	fn encodes_all_nan_tile_per_s1() {
		let w = window(2, 2, vec![f64::NAN; 4]);
		let blob = encode_tile(&w, 2, 0, CodecMode::Lossless, 0.1).unwrap();
		assert_eq!(blob.len(), 24);
		assert_eq!(&blob.as_slice()[0..4], TILE_MAGIC);
		assert_eq!(u32::from_le_bytes(blob.as_slice()[4..8].try_into().unwrap()), 2);
		assert_eq!(u32::from_le_bytes(blob.as_slice()[8..12].try_into().unwrap()), 0);
		assert_eq!(u32::from_le_bytes(blob.as_slice()[12..16].try_into().unwrap()), 0);
		assert_eq!(f64::from_le_bytes(blob.as_slice()[16..24].try_into().unwrap()), NAN_TILE);

		let decoded = decode_tile(&blob, 2).unwrap();
		assert!(decoded.values.iter().all(|v| v.is_nan()));
		assert_eq!(decoded.max_error, 0.0);
	}

	#[test]
	fn roundtrips_lossless_per_s2() {
		let w = window(2, 2, vec![0.0, 1.0, 2.0, 3.0]);
		let blob = encode_tile(&w, 2, 0, CodecMode::Lossless, 0.1).unwrap();
		let decoded = decode_tile(&blob, 2).unwrap();
		assert_eq!(decoded.values, vec![0.0, 1.0, 2.0, 3.0]);
		assert_eq!(decoded.max_error, 0.0);
	}

	#[test]
	fn pads_partial_window_with_nan_per_s3() {
		let mut values = Vec::new();
		for y in 0..3u32 {
			for x in 0..3u32 {
				values.push((y * 3 + x) as f64);
			}
		}
		let w = window(3, 3, values);
		let blob = encode_tile(&w, 4, 0, CodecMode::Lossless, 0.1).unwrap();
		let decoded = decode_tile(&blob, 4).unwrap();
		for y in 0..4 {
			for x in 0..4 {
				let v = decoded.values[y * 4 + x];
				if y < 3 && x < 3 {
					assert_eq!(v, (y * 3 + x) as f64);
				} else {
					assert!(v.is_nan());
				}
			}
		}
	}

	#[test]
	fn downsample_average_matches_s4() {
		// x[z,y,x] = x over a 4x4x4 cube; averaging the 2x2 block at x=0..2 gives 0.5,
		// and at x=2..4 gives 2.5.
		let w = window(4, 4, {
			let mut v = Vec::new();
			for _y in 0..4u32 {
				for x in 0..4u32 {
					v.push(x as f64);
				}
			}
			v
		});
		let down = downsample_average(&w, 2);
		assert_eq!(down.height, 2);
		assert_eq!(down.width, 2);
		assert_eq!(down.values, vec![0.5, 2.5, 0.5, 2.5]);
	}

	#[test]
	fn resample_padding_noop_below_threshold() {
		assert_eq!(effective_resample_resolution(1, 0), 1);
		assert_eq!(effective_resample_resolution(1, 2), 1);
		assert_eq!(effective_resample_resolution(4, 2), 1);
		assert_eq!(effective_resample_resolution(4, 1), 2);
	}
}
