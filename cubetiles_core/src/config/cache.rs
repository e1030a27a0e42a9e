use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheKind {
	InMemory,
	Disk { path: PathBuf },
}

impl CacheKind {
	pub fn new_disk() -> Self {
		Self::Disk {
			path: std::env::temp_dir(),
		} // default to system temp directory
	}
	pub fn new_memory() -> Self {
		Self::InMemory
	}
}
