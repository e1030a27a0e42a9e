//! C4: the concurrent encoded-tile cache sitting in front of generation.

use crate::types::TileId;
use cubetiles_core::types::Blob;
use dashmap::DashMap;

/// Maps tile identity to its encoded blob. Unbounded; a stored value is never mutated, only
/// possibly evicted by the embedder (not done here). Sharded locking (via `DashMap`) gives
/// "reads never block writers" without a hand-rolled striped lock.
#[derive(Default)]
pub struct TileMemoryCache {
	blobs: DashMap<String, Blob>,
}

impl TileMemoryCache {
	pub fn new() -> Self {
		TileMemoryCache::default()
	}

	pub fn get(&self, id: &TileId) -> Option<Blob> {
		self.blobs.get(&id.path_suffix()).map(|entry| entry.value().clone())
	}

	pub fn insert(&self, id: &TileId, blob: Blob) {
		self.blobs.insert(id.path_suffix(), blob);
	}

	pub fn contains(&self, id: &TileId) -> bool {
		self.blobs.contains_key(&id.path_suffix())
	}

	pub fn len(&self) -> usize {
		self.blobs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.blobs.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::SliceAxis;

	fn id(tx: u64, ty: u64) -> TileId {
		TileId::new("ds", "param", SliceAxis::Z, 0, 0, tx, ty)
	}

	#[test]
	fn miss_then_hit_returns_stored_bytes() {
		let cache = TileMemoryCache::new();
		assert!(cache.get(&id(0, 0)).is_none());

		let blob = Blob::from(vec![1, 2, 3]);
		cache.insert(&id(0, 0), blob.clone());
		assert_eq!(cache.get(&id(0, 0)), Some(blob));
		assert!(cache.contains(&id(0, 0)));
	}

	#[test]
	fn distinct_tile_ids_do_not_collide() {
		let cache = TileMemoryCache::new();
		cache.insert(&id(0, 0), Blob::from(vec![1]));
		cache.insert(&id(1, 0), Blob::from(vec![2]));
		assert_eq!(cache.get(&id(0, 0)), Some(Blob::from(vec![1])));
		assert_eq!(cache.get(&id(1, 0)), Some(Blob::from(vec![2])));
		assert_eq!(cache.len(), 2);
	}
}
