//! C1: a rank-3 random-access view over a [`DataSource`] with native-chunk caching.

use crate::error::TileError;
use crate::types::{ArrayWindow, DType, DataSource};
use anyhow::Result;
use cubetiles_core::cache::{Cache, CacheValue};
use cubetiles_core::cache::InMemoryCache;
use std::ops::Range;
use tokio::sync::Mutex;

impl CacheValue for ArrayWindow {
	fn to_cache_buffer(&self) -> Vec<u8> {
		serde_json::to_vec(self).expect("ArrayWindow serializes")
	}

	fn from_cache_buffer(buf: &[u8]) -> Self {
		serde_json::from_slice(buf).expect("cached ArrayWindow deserializes")
	}
}

/// Accepts arbitrary rank-3 subrange requests against a [`DataSource`] and answers them,
/// loading and caching whole native chunks when chunking is present.
pub struct DataSourceProxy {
	source: DataSource,
	chunk_cache: Mutex<InMemoryCache<String, ArrayWindow>>,
}

impl DataSourceProxy {
	pub fn new(source: DataSource) -> Self {
		DataSourceProxy {
			source,
			chunk_cache: Mutex::new(InMemoryCache::new()),
		}
	}

	pub fn shape(&self) -> (u64, u64, u64) {
		self.source.shape()
	}

	pub fn dtype(&self) -> DType {
		self.source.dtype()
	}

	pub fn chunking(&self) -> Option<(u64, u64, u64)> {
		self.source.chunking()
	}

	/// Reads the rectangular window `(rz, ry, rx)`, clamped to the array shape.
	pub async fn read(&self, rz: Range<u64>, ry: Range<u64>, rx: Range<u64>) -> Result<ArrayWindow> {
		let (nz, ny, nx) = self.source.shape();
		let rz = clamp_range(rz, nz);
		let ry = clamp_range(ry, ny);
		let rx = clamp_range(rx, nx);

		let Some(chunking) = self.source.chunking() else {
			return self.source.reader().read((rz, ry, rx)).await;
		};

		self.read_chunked(rz, ry, rx, chunking).await
	}

	async fn read_chunked(
		&self,
		rz: Range<u64>,
		ry: Range<u64>,
		rx: Range<u64>,
		(cz, cy, cx): (u64, u64, u64),
	) -> Result<ArrayWindow> {
		let (nz, ny, nx) = self.source.shape();
		let out_shape = (rz.end - rz.start, ry.end - ry.start, rx.end - rx.start);
		let mut values = vec![f64::NAN; (out_shape.0 * out_shape.1 * out_shape.2) as usize];

		let z_chunks = chunk_index_range(&rz, cz);
		let y_chunks = chunk_index_range(&ry, cy);
		let x_chunks = chunk_index_range(&rx, cx);

		for iz in z_chunks.clone() {
			for iy in y_chunks.clone() {
				for ix in x_chunks.clone() {
					let chunk_window = (
						iz * cz..((iz + 1) * cz).min(nz),
						iy * cy..((iy + 1) * cy).min(ny),
						ix * cx..((ix + 1) * cx).min(nx),
					);
					let chunk = self.get_or_load_chunk((iz, iy, ix), chunk_window.clone()).await?;
					copy_intersection(&chunk, chunk_window, &mut values, out_shape, (&rz, &ry, &rx));
				}
			}
		}

		Ok(ArrayWindow {
			shape: out_shape,
			values,
		})
	}

	async fn get_or_load_chunk(
		&self,
		index: (u64, u64, u64),
		window: (Range<u64>, Range<u64>, Range<u64>),
	) -> Result<ArrayWindow> {
		let key = chunk_key(index);
		{
			let cache = self.chunk_cache.lock().await;
			if let Some(mut hit) = cache.get_clone(&key)? {
				if let Some(chunk) = hit.pop() {
					return Ok(chunk);
				}
			}
		}

		let chunk = self.load_chunk_with_retry(index, window).await?;

		let mut cache = self.chunk_cache.lock().await;
		cache.insert(&key, vec![chunk.clone()])?;
		Ok(chunk)
	}

	async fn load_chunk_with_retry(
		&self,
		(iz, iy, ix): (u64, u64, u64),
		window: (Range<u64>, Range<u64>, Range<u64>),
	) -> Result<ArrayWindow> {
		match self.source.reader().read(window.clone()).await {
			Ok(chunk) => Ok(chunk),
			Err(first_err) => {
				log::warn!("chunk read failed, retrying once: {first_err}");
				self.source.reader().read(window).await.map_err(|_| {
					anyhow::Error::new(TileError::SourceReadFailed {
						axis: "z,y,x".to_string(),
						chunk_index: (iz, iy, ix),
					})
				})
			}
		}
	}
}

fn chunk_key((iz, iy, ix): (u64, u64, u64)) -> String {
	format!("{iz},{iy},{ix}")
}

fn clamp_range(range: Range<u64>, len: u64) -> Range<u64> {
	range.start.min(len)..range.end.min(len)
}

/// The inclusive-on-both-ends chunk index range covering `range`, derived from the
/// prefix-sum boundaries `0, chunk_size, 2*chunk_size, ...` by binary search.
fn chunk_index_range(range: &Range<u64>, chunk_size: u64) -> Range<u64> {
	if range.is_empty() || chunk_size == 0 {
		return 0..0;
	}
	let boundaries_len = (range.end - 1) / chunk_size + 1;
	let start_chunk = partition_point_chunk(range.start, chunk_size);
	let end_chunk = partition_point_chunk(range.end - 1, chunk_size);
	start_chunk..(end_chunk + 1).min(boundaries_len.max(end_chunk + 1))
}

/// Binary search over the implicit prefix-sum boundary array `[0, chunk_size, 2*chunk_size, ...]`
/// for the chunk index containing `pos`.
fn partition_point_chunk(pos: u64, chunk_size: u64) -> u64 {
	let mut lo = 0u64;
	let mut hi = pos / chunk_size + 1;
	while lo < hi {
		let mid = lo + (hi - lo) / 2;
		if mid * chunk_size <= pos {
			lo = mid + 1;
		} else {
			hi = mid;
		}
	}
	lo - 1
}

#[allow(clippy::too_many_arguments)]
fn copy_intersection(
	chunk: &ArrayWindow,
	chunk_window: (Range<u64>, Range<u64>, Range<u64>),
	out: &mut [f64],
	out_shape: (u64, u64, u64),
	request: (&Range<u64>, &Range<u64>, &Range<u64>),
) {
	let (cz, cy, cx) = chunk_window;
	let (rz, ry, rx) = request;

	let iz_start = cz.start.max(rz.start);
	let iz_end = cz.end.min(rz.end);
	let iy_start = cy.start.max(ry.start);
	let iy_end = cy.end.min(ry.end);
	let ix_start = cx.start.max(rx.start);
	let ix_end = cx.end.min(rx.end);

	for z in iz_start..iz_end {
		for y in iy_start..iy_end {
			for x in ix_start..ix_end {
				let value = chunk.get(z - cz.start, y - cy.start, x - cx.start);
				let out_z = z - rz.start;
				let out_y = y - ry.start;
				let out_x = x - rx.start;
				let idx = (out_z * out_shape.1 + out_y) * out_shape.2 + out_x;
				out[idx as usize] = value;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::ArrayBackend;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	struct CountingBackend {
		shape: (u64, u64, u64),
		chunking: Option<(u64, u64, u64)>,
		fetches: Arc<AtomicUsize>,
	}

	#[async_trait]
	impl ArrayBackend for CountingBackend {
		fn shape(&self) -> (u64, u64, u64) {
			self.shape
		}

		async fn read(&self, window: crate::types::ReadWindow) -> Result<ArrayWindow> {
			self.fetches.fetch_add(1, Ordering::SeqCst);
			let (rz, ry, rx) = window;
			let shape = (rz.end - rz.start, ry.end - ry.start, rx.end - rx.start);
			let mut values = Vec::with_capacity((shape.0 * shape.1 * shape.2) as usize);
			for z in rz.clone() {
				for y in ry.clone() {
					for x in rx.clone() {
						values.push((z * self.shape.1 + y) as f64 * self.shape.2 as f64 + x as f64);
					}
				}
			}
			Ok(ArrayWindow { shape, values })
		}

		fn chunking(&self) -> Option<(u64, u64, u64)> {
			self.chunking
		}
	}

	fn make_proxy(fetches: Arc<AtomicUsize>) -> DataSourceProxy {
		let backend = CountingBackend {
			shape: (4, 4, 4),
			chunking: Some((2, 2, 2)),
			fetches,
		};
		DataSourceProxy::new(DataSource::Unlabeled {
			shape: (4, 4, 4),
			dtype: DType::F64,
			reader: Box::new(backend),
		})
	}

	#[tokio::test]
	async fn chunk_cache_hit_skips_second_fetch() {
		let fetches = Arc::new(AtomicUsize::new(0));
		let proxy = make_proxy(fetches.clone());

		let first = proxy.read(0..1, 0..4, 0..4).await.unwrap();
		let fetches_after_first = fetches.load(Ordering::SeqCst);
		assert!(fetches_after_first > 0);

		let second = proxy.read(0..1, 0..4, 0..4).await.unwrap();
		assert_eq!(fetches.load(Ordering::SeqCst), fetches_after_first);
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn read_matches_backend_values() {
		let fetches = Arc::new(AtomicUsize::new(0));
		let proxy = make_proxy(fetches);
		let window = proxy.read(0..4, 0..4, 0..4).await.unwrap();
		assert_eq!(window.get(2, 1, 3), 2.0 * 16.0 + 1.0 * 4.0 + 3.0);
	}

	#[tokio::test]
	async fn read_clamps_out_of_bounds_range() {
		let fetches = Arc::new(AtomicUsize::new(0));
		let proxy = make_proxy(fetches);
		let window = proxy.read(0..100, 0..4, 0..4).await.unwrap();
		assert_eq!(window.shape, (4, 4, 4));
	}
}
