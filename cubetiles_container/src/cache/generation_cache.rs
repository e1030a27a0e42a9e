//! C6: the in-memory-or-on-disk cache used during bulk block-file construction, when the full
//! tile set for a build doesn't fit in C4.

use crate::types::TileId;
use anyhow::Result;
use cubetiles_core::cache::{Cache, CacheMap};
use cubetiles_core::config::CacheKind;
use cubetiles_core::types::Blob;

pub struct TileGenerationCache {
	map: CacheMap<String, Vec<u8>>,
}

impl TileGenerationCache {
	pub fn new(kind: &CacheKind) -> Self {
		TileGenerationCache { map: CacheMap::new(kind) }
	}

	pub fn get(&self, id: &TileId) -> Result<Option<Blob>> {
		let key = id.path_suffix();
		Ok(self.map.get_clone(&key)?.and_then(|mut v| v.pop()).map(Blob::from))
	}

	pub fn insert(&mut self, id: &TileId, blob: &Blob) -> Result<()> {
		let key = id.path_suffix();
		self.map.insert(&key, vec![blob.clone().into_vec()])
	}

	pub fn contains(&self, id: &TileId) -> bool {
		self.map.contains_key(&id.path_suffix())
	}
}
