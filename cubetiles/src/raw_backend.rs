//! A minimal [`ArrayBackend`] over a flat, row-major `f64` file, loaded once into memory.
//!
//! Real storage-format loaders (netCDF, zarr, ...) are an external collaborator, not something
//! this crate implements; this backend exists so `cubetiles serve`/`cubetiles build` have
//! something concrete to run against without one. Embedders with a real backend implement
//! [`ArrayBackend`] themselves and skip this module entirely.

use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use cubetiles_container::types::{ArrayBackend, ArrayWindow, Chunking, ReadWindow};
use std::path::Path;

pub struct RawArrayBackend {
	shape: (u64, u64, u64),
	chunking: Option<Chunking>,
	values: Vec<f64>,
}

impl RawArrayBackend {
	/// Loads `path` as `Nz * Ny * Nx` little-endian `f64` values in row-major (z, y, x) order.
	pub async fn open(path: &Path, shape: (u64, u64, u64), chunking: Option<Chunking>) -> Result<Self> {
		let bytes = tokio::fs::read(path)
			.await
			.with_context(|| format!("reading raw cube file '{}'", path.display()))?;
		let (nz, ny, nx) = shape;
		let expected = nz as usize * ny as usize * nx as usize * 8;
		ensure!(
			bytes.len() == expected,
			"raw cube file '{}' is {} bytes, expected {} for shape {:?}",
			path.display(),
			bytes.len(),
			expected,
			shape
		);
		let values = bytes.chunks_exact(8).map(|c| f64::from_le_bytes(c.try_into().unwrap())).collect();
		Ok(RawArrayBackend { shape, chunking, values })
	}
}

#[async_trait]
impl ArrayBackend for RawArrayBackend {
	fn shape(&self) -> (u64, u64, u64) {
		self.shape
	}

	async fn read(&self, window: ReadWindow) -> Result<ArrayWindow> {
		let (rz, ry, rx) = window;
		let (_, ny, nx) = self.shape;
		let out_shape = (rz.end - rz.start, ry.end - ry.start, rx.end - rx.start);
		let mut values = Vec::with_capacity((out_shape.0 * out_shape.1 * out_shape.2) as usize);
		for z in rz.clone() {
			for y in ry.clone() {
				for x in rx.clone() {
					let idx = (z * ny + y) * nx + x;
					values.push(self.values[idx as usize]);
				}
			}
		}
		Ok(ArrayWindow { shape: out_shape, values })
	}

	fn chunking(&self) -> Option<Chunking> {
		self.chunking
	}
}
