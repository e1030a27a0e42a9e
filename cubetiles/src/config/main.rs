//! Top-level server configuration loader for CubeTiles.
//!
//! ## YAML shape
//!
//! ```yaml
//! server:
//!   ip: 0.0.0.0
//!   port: 8080
//!
//! cors:
//!   allowed_origins:
//!     - https://example.org
//!   max_age_seconds: 86400
//!
//! datasets_root: /data/cubes
//! tile_size: 256
//! pre_generation_sparsity: 1
//!
//! tolerance:
//!   default_tolerance: 0.01
//!   anomaly_tolerance: 0.05
//!
//! cache:
//!   kind: disk
//!   path: /var/cache/cubetiles
//!
//! active_source:
//!   dataset_id: example
//!   parameter: temperature
//!   raw_path: /data/cubes/example/temperature.f64
//!   shape: [12, 720, 1440]
//! ```

use super::{CorsConfig, ServerConfig};
use anyhow::{Context, Result};
use cubetiles_container::compressor::ToleranceConfig;
use cubetiles_core::config::CacheKind;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Identifies the single widget-mode active source (§4.7): a flat, row-major `f64` cube file
/// loaded by [`crate::raw_backend::RawArrayBackend`]. Real deployments with an actual storage
/// backend construct a [`cubetiles_container::types::DataSource`] themselves and call
/// [`crate::server::TileServerState::set_active_source`] directly instead of going through
/// config; this section only covers the local/flat-file case the CLI can drive end to end.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ActiveSourceConfig {
	pub dataset_id: String,
	pub parameter: String,
	pub raw_path: PathBuf,
	/// `(Nz, Ny, Nx)`.
	pub shape: (u64, u64, u64),
	#[serde(default)]
	pub chunking: Option<(u64, u64, u64)>,
}

/// Top-level server configuration. All sections are optional except `datasets_root`, which
/// must be set before the server can serve anything (checked at startup, not at parse time, so
/// a config can still be round-tripped in isolation by tests).
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
	#[serde(default)]
	pub server: ServerConfig,

	#[serde(default)]
	pub cors: CorsConfig,

	/// Root directory holding dataset metadata (C8) and block files (C5).
	#[serde(default)]
	pub datasets_root: Option<PathBuf>,

	/// Pixel width/height `T` of a tile.
	#[serde(default = "default_tile_size")]
	pub tile_size: u64,

	/// Standalone-mode block files only exist at slices where `slice_index % sparsity == 0`.
	#[serde(default = "default_sparsity")]
	pub pre_generation_sparsity: u64,

	#[serde(default)]
	pub tolerance: ToleranceConfig,

	#[serde(default = "CacheKind::new_memory")]
	pub cache: CacheKind,

	#[serde(default)]
	pub active_source: Option<ActiveSourceConfig>,
}

fn default_tile_size() -> u64 {
	256
}

fn default_sparsity() -> u64 {
	1
}

impl Default for Config {
	fn default() -> Self {
		Self {
			server: ServerConfig::default(),
			cors: CorsConfig::default(),
			datasets_root: None,
			tile_size: default_tile_size(),
			pre_generation_sparsity: default_sparsity(),
			tolerance: ToleranceConfig::default(),
			cache: CacheKind::new_memory(),
			active_source: None,
		}
	}
}

impl Config {
	/// Parse a YAML config from any `Read` implementor.
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	/// Parse a YAML config from a string slice.
	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	/// Parse from a file path.
	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("reading config file '{}'", path.display()))?;
		Config::from_reader(BufReader::new(file)).with_context(|| format!("parsing config file '{}'", path.display()))
	}

	/// The directory serving as the root for C8 metadata and C5 block files, or an error if
	/// the config never set one.
	pub fn datasets_root(&self) -> Result<&Path> {
		self
			.datasets_root
			.as_deref()
			.context("`datasets_root` is not set in the configuration")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_empty_config() {
		assert_eq!(Config::from_string("").unwrap(), Config::default());
	}

	#[test]
	fn parse_invalid_config() {
		let err = Config::from_string("server:\n  ip: 1\n  bogus: true").unwrap_err();
		assert!(err.to_string().contains("bogus"));
	}

	#[test]
	fn datasets_root_defaults_to_error() {
		let config = Config::default();
		assert!(config.datasets_root().is_err());
	}

	#[test]
	fn full_config_round_trips() {
		let yaml = r#"
datasets_root: /data/cubes
tile_size: 512
pre_generation_sparsity: 4
tolerance:
  default_tolerance: 0.02
  anomaly_tolerance: 0.1
cache:
  kind: disk
  path: /var/cache/cubetiles
"#;
		let config = Config::from_string(yaml).unwrap();
		assert_eq!(config.datasets_root().unwrap(), Path::new("/data/cubes"));
		assert_eq!(config.tile_size, 512);
		assert_eq!(config.pre_generation_sparsity, 4);
		assert_eq!(config.tolerance.default_tolerance, 0.02);
		assert_eq!(config.cache, CacheKind::Disk {
			path: PathBuf::from("/var/cache/cubetiles")
		});
	}

	#[test]
	fn active_source_round_trips() {
		let yaml = r#"
datasets_root: /data/cubes
active_source:
  dataset_id: example
  parameter: temperature
  raw_path: /data/cubes/example/temperature.f64
  shape: [12, 720, 1440]
"#;
		let config = Config::from_string(yaml).unwrap();
		let active = config.active_source.unwrap();
		assert_eq!(active.dataset_id, "example");
		assert_eq!(active.shape, (12, 720, 1440));
		assert!(active.chunking.is_none());
	}
}
