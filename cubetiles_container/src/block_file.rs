//! C5: the on-disk block-file format packing every tile of one
//! `(dataset, parameter, slice_axis, slice_index)` across all LoDs (§4.5).

use crate::error::TileError;
use crate::types::SliceAxis;
use anyhow::{Result, ensure};
use cubetiles_core::io::{DataReaderTrait, DataWriterTrait};
use cubetiles_core::types::{Blob, ByteRange};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The on-disk path of the block file holding one `(dataset, parameter, axis, slice_index)`:
/// `{root}/{dataset}/{parameter}/{axis}/{slice_index}.block`.
pub fn block_file_path(root: &Path, dataset_id: &str, parameter: &str, axis: SliceAxis, slice_index: u64) -> PathBuf {
	root.join(dataset_id).join(parameter).join(axis.name()).join(format!("{slice_index}.block"))
}

/// The tile-grid geometry shared by the build and read paths: which LoDs exist and how many
/// tiles each holds, in the canonical order (`LoD` ascending, then row-major `y * gw + x`).
#[derive(Debug, Clone, Copy)]
pub struct BlockFileLayout {
	pub axis: SliceAxis,
	pub shape: (u64, u64, u64),
	pub tile_size: u64,
	pub max_lod: u32,
}

impl BlockFileLayout {
	pub fn grid_dims(&self, lod: u32) -> (u64, u64) {
		self.axis.grid_dims(self.shape, lod, self.tile_size)
	}

	pub fn tile_count(&self, lod: u32) -> u64 {
		let (gw, gh) = self.grid_dims(lod);
		gw * gh
	}

	pub fn total_tiles(&self) -> u64 {
		(0..=self.max_lod).map(|lod| self.tile_count(lod)).sum()
	}

	/// The flat index of tile `(lod, x, y)` in canonical order.
	pub fn flat_index(&self, lod: u32, x: u64, y: u64) -> u64 {
		let prior: u64 = (0..lod).map(|l| self.tile_count(l)).sum();
		let (gw, _) = self.grid_dims(lod);
		prior + y * gw + x
	}
}

/// Walks every tile in canonical order, pulling each encoded blob from `fetch_tile`, and writes
/// the §4.5 header + body layout: the write position is advanced past the header region before
/// any body is appended, and the header itself is backpatched once every tile's size is known.
pub fn build_block_file(
	writer: &mut dyn DataWriterTrait,
	layout: &BlockFileLayout,
	mut fetch_tile: impl FnMut(u32, u64, u64) -> Result<Blob>,
) -> Result<()> {
	let total = layout.total_tiles();
	writer.set_position(total * 4)?;

	let mut sizes = Vec::with_capacity(total as usize);
	for lod in 0..=layout.max_lod {
		let (gw, gh) = layout.grid_dims(lod);
		for y in 0..gh {
			for x in 0..gw {
				let blob = fetch_tile(lod, x, y)?;
				sizes.push(blob.len() as u32);
				writer.append(&blob)?;
			}
		}
	}

	let mut header = Vec::with_capacity(sizes.len() * 4);
	for size in &sizes {
		header.extend_from_slice(&size.to_le_bytes());
	}
	writer.write_start(&Blob::from(header))?;
	Ok(())
}

/// Reads the tiles named by `xys` (all the same `lod`), grouping adjacent flat indices into a
/// single contiguous read per run (§4.5's read path), and returns the concatenated bytes plus a
/// parallel per-tile size array, both in request order.
pub async fn read_tiles(
	reader: &dyn DataReaderTrait,
	layout: &BlockFileLayout,
	lod: u32,
	xys: &[(u64, u64)],
) -> Result<(Blob, Vec<u32>)> {
	let total = layout.total_tiles();
	let header_blob = reader.read_range(&ByteRange::new(0, total * 4)).await?;
	let header_bytes = header_blob.as_slice();
	ensure!(
		header_bytes.len() as u64 == total * 4,
		TileError::StorageCorruption(format!(
			"block file header is {} bytes, expected {}",
			header_bytes.len(),
			total * 4
		))
	);
	let sizes: Vec<u32> = header_bytes
		.chunks_exact(4)
		.map(|c| u32::from_le_bytes(c.try_into().unwrap()))
		.collect();

	let body_start = total * 4;
	let mut offsets = Vec::with_capacity(sizes.len() + 1);
	offsets.push(body_start);
	for size in &sizes {
		offsets.push(offsets.last().unwrap() + *size as u64);
	}

	let flat_indices: Vec<usize> = xys
		.iter()
		.map(|&(x, y)| {
			let idx = layout.flat_index(lod, x, y) as usize;
			ensure!(
				idx < sizes.len(),
				TileError::InvalidInput(format!("tile ({x}, {y}) at lod {lod} is outside the grid"))
			);
			Ok(idx)
		})
		.collect::<Result<_>>()?;

	let mut sorted = flat_indices.clone();
	sorted.sort_unstable();
	sorted.dedup();

	let mut runs: Vec<(usize, usize)> = Vec::new();
	for idx in sorted {
		if let Some(last) = runs.last_mut() {
			if last.1 + 1 == idx {
				last.1 = idx;
				continue;
			}
		}
		runs.push((idx, idx));
	}

	let mut tile_bytes: HashMap<usize, Blob> = HashMap::new();
	for (start, end) in runs {
		let range = ByteRange::new(offsets[start], offsets[end + 1] - offsets[start]);
		let run_blob = reader.read_range(&range).await?;
		let run_bytes = run_blob.as_slice();
		let mut cursor = 0usize;
		for i in start..=end {
			let len = sizes[i] as usize;
			tile_bytes.insert(i, Blob::from(run_bytes[cursor..cursor + len].to_vec()));
			cursor += len;
		}
	}

	let mut out = Vec::new();
	let mut out_sizes = Vec::with_capacity(flat_indices.len());
	for &i in &flat_indices {
		let blob = &tile_bytes[&i];
		out.extend_from_slice(blob.as_slice());
		out_sizes.push(sizes[i]);
	}
	Ok((Blob::from(out), out_sizes))
}

#[cfg(test)]
mod tests {
	use super::*;
	use cubetiles_core::io::{DataReaderBlob, DataWriterBlob};

	fn layout() -> BlockFileLayout {
		// gw(0)=gh(0)=2, gw(1)=gh(1)=1, matching S5.
		BlockFileLayout {
			axis: SliceAxis::Z,
			shape: (1, 4, 4),
			tile_size: 2,
			max_lod: 1,
		}
	}

	#[test]
	fn block_file_path_follows_convention() {
		let path = block_file_path(Path::new("/data"), "ds1", "temp", SliceAxis::Y, 7);
		assert_eq!(path, Path::new("/data/ds1/temp/y/7.block"));
	}

	#[test]
	fn layout_matches_s5_grid_sizes() {
		let l = layout();
		assert_eq!(l.grid_dims(0), (2, 2));
		assert_eq!(l.grid_dims(1), (1, 1));
		assert_eq!(l.total_tiles(), 5);
		assert_eq!(l.flat_index(0, 0, 0), 0);
		assert_eq!(l.flat_index(0, 1, 0), 1);
		assert_eq!(l.flat_index(0, 0, 1), 2);
		assert_eq!(l.flat_index(0, 1, 1), 3);
		assert_eq!(l.flat_index(1, 0, 0), 4);
	}

	#[tokio::test]
	async fn build_then_read_matches_header_entries_per_s5() {
		let l = layout();
		let tiles: Vec<Blob> = vec![
			Blob::from(vec![0u8; 3]),
			Blob::from(vec![1u8; 5]),
			Blob::from(vec![2u8; 2]),
			Blob::from(vec![3u8; 7]),
			Blob::from(vec![4u8; 1]),
		];

		let mut writer = DataWriterBlob::new().unwrap();
		build_block_file(&mut writer, &l, |lod, x, y| {
			Ok(tiles[l.flat_index(lod, x, y) as usize].clone())
		})
		.unwrap();

		let reader = DataReaderBlob::from(writer.into_blob());
		let (bytes, sizes) = read_tiles(&reader, &l, 0, &[(0, 1), (1, 1)]).await.unwrap();
		assert_eq!(sizes, vec![2, 7]);
		assert_eq!(bytes.as_slice(), [vec![2u8; 2], vec![3u8; 7]].concat().as_slice());
	}
}
