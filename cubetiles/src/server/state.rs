//! Shared state behind every route: the single active source widget-mode dispatch reads from
//! (§4.7), the caches and metadata store standalone-mode dispatch reads from, and the
//! per-request-group progress broadcast (§6, §9(c)).

use crate::config::{ActiveSourceConfig, Config};
use crate::raw_backend::RawArrayBackend;
use anyhow::Result;
use arc_swap::ArcSwapOption;
use cubetiles_container::cache::TileMemoryCache;
use cubetiles_container::compressor::ToleranceConfig;
use cubetiles_container::metadata::MetadataStore;
use cubetiles_container::source::DataSourceProxy;
use cubetiles_container::types::{DType, DataSource};
use dashmap::DashMap;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// The single dataset/parameter widget-mode requests resolve against (§4.7: "parameter and
/// dataset are fixed to the single active source").
pub struct ActiveSource {
	pub dataset_id: String,
	pub parameter: String,
	pub proxy: DataSourceProxy,
}

impl ActiveSource {
	pub async fn load(config: &ActiveSourceConfig) -> Result<Self> {
		let backend = RawArrayBackend::open(&config.raw_path, config.shape, config.chunking).await?;
		let source = DataSource::Unlabeled {
			shape: config.shape,
			dtype: DType::F64,
			reader: Box::new(backend),
		};
		Ok(ActiveSource {
			dataset_id: config.dataset_id.clone(),
			parameter: config.parameter.clone(),
			proxy: DataSourceProxy::new(source),
		})
	}
}

/// A progress push frame (§6, redesigned per §9(c) to carry `failed` alongside `done`/`total`).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProgressFrame {
	pub done: u64,
	pub total: u64,
	pub failed: u64,
}

pub struct TileServerState {
	pub tile_cache: TileMemoryCache,
	pub metadata: MetadataStore,
	pub datasets_root: PathBuf,
	pub tolerance: ToleranceConfig,
	pub tile_size: u64,
	pub pre_generation_sparsity: u64,
	pub active_source: ArcSwapOption<ActiveSource>,
	group_counter: AtomicU64,
	progress: DashMap<u64, broadcast::Sender<ProgressFrame>>,
}

impl TileServerState {
	pub async fn from_config(config: &Config) -> Result<Self> {
		let datasets_root = config.datasets_root()?.to_path_buf();
		let active_source = match &config.active_source {
			Some(active) => Some(ActiveSource::load(active).await?),
			None => None,
		};

		Ok(TileServerState {
			tile_cache: TileMemoryCache::new(),
			metadata: MetadataStore::new(datasets_root.clone()),
			datasets_root,
			tolerance: config.tolerance,
			tile_size: config.tile_size,
			pre_generation_sparsity: config.pre_generation_sparsity,
			active_source: ArcSwapOption::from_pointee(active_source),
			group_counter: AtomicU64::new(0),
			progress: DashMap::new(),
		})
	}

	pub fn set_active_source(&self, source: ActiveSource) {
		self.active_source.store(Some(std::sync::Arc::new(source)));
	}

	/// Allocates a fresh request-group id and its progress broadcast channel, for a caller that
	/// wants to subscribe to progress before the group's first dispatch request lands.
	pub fn register_progress_group(&self) -> (u64, broadcast::Receiver<ProgressFrame>) {
		let group_id = self.group_counter.fetch_add(1, Ordering::SeqCst);
		let (tx, rx) = broadcast::channel(256);
		self.progress.insert(group_id, tx);
		(group_id, rx)
	}

	/// Subscribes to an already-registered group's progress stream, if it's still open.
	pub fn subscribe_progress(&self, group_id: u64) -> Option<broadcast::Receiver<ProgressFrame>> {
		self.progress.get(&group_id).map(|tx| tx.subscribe())
	}

	/// Publishes a progress frame, dropping the group's channel once it's done (per §9(c),
	/// `done` already counts synthesized-failure tiles, so `done + failed >= total` is complete).
	pub fn publish_progress(&self, group_id: u64, frame: ProgressFrame) {
		if let Some(tx) = self.progress.get(&group_id) {
			let _ = tx.send(frame);
		}
		if frame.done >= frame.total {
			self.progress.remove(&group_id);
		}
	}
}
