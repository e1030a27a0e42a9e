//! C8: persisted dataset and parameter metadata (§4.8, §6).

use crate::dims::{normalize_latitude, reorder_axes};
use crate::error::TileError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// §6's dataset metadata field set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetMetadata {
	pub axis_labels: AxisLabels,
	pub x_max: u64,
	pub y_max: u64,
	pub z_max: u64,
	pub x_dimension_name: String,
	pub y_dimension_name: String,
	pub z_dimension_name: String,
	pub dataset_dict: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AxisLabels {
	pub x: Vec<f64>,
	pub y: Vec<f64>,
	pub z: Vec<f64>,
}

/// §6's per-parameter metadata field set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterMetadata {
	pub first_valid_time_slice: i64,
	pub last_valid_time_slice: i64,
	pub minimum_value: f64,
	pub maximum_value: f64,
	pub median_of_1quantiles: f64,
	pub median_of_99quantiles: f64,
	pub resample_resolution: u32,
	pub min_max_values_approximate_only: bool,
}

/// Raw, pre-normalization stats a discovery pass hands in for one parameter; fields are
/// `Option` because discovery may fail to compute some of them, in which case the parameter
/// is dropped entirely (§7's metadata-discovery error policy) rather than persisted with holes.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredParameterStats {
	pub first_valid_time_slice: Option<i64>,
	pub last_valid_time_slice: Option<i64>,
	pub minimum_value: Option<f64>,
	pub maximum_value: Option<f64>,
	pub median_of_1quantiles: Option<f64>,
	pub median_of_99quantiles: Option<f64>,
	pub resample_resolution: u32,
	pub min_max_values_approximate_only: bool,
}

impl DiscoveredParameterStats {
	/// Promotes discovered stats to persisted metadata, or `None` if any required stat is
	/// missing — the caller skips this parameter from the advertised list instead of failing
	/// the whole dataset.
	pub fn into_metadata(self) -> Option<ParameterMetadata> {
		Some(ParameterMetadata {
			first_valid_time_slice: self.first_valid_time_slice?,
			last_valid_time_slice: self.last_valid_time_slice?,
			minimum_value: self.minimum_value?,
			maximum_value: self.maximum_value?,
			median_of_1quantiles: self.median_of_1quantiles?,
			median_of_99quantiles: self.median_of_99quantiles?,
			resample_resolution: self.resample_resolution,
			min_max_values_approximate_only: self.min_max_values_approximate_only,
		})
	}
}

/// Builds a [`DatasetMetadata`] from raw dimension names, coordinate vectors, and sizes,
/// applying the §6 dimension-alias normalization: `(time, lon, lat)` axis order is reordered
/// to `(lon, lat)`, and an ascending latitude vector is flipped descending.
pub fn build_dataset_metadata(
	dimension_names: [&str; 3],
	coords: [Vec<f64>; 3],
	dataset_dict: Value,
) -> DatasetMetadata {
	let names = reorder_axes(dimension_names, dimension_names);
	let mut coords = reorder_axes(dimension_names, coords);

	let lat_index = names.iter().position(|n| crate::dims::classify_dimension(n) == crate::dims::DimKind::Latitude);
	if let Some(i) = lat_index {
		normalize_latitude(&mut coords[i]);
	}

	let [x_coords, y_coords, z_coords] = coords;
	DatasetMetadata {
		x_max: x_coords.len() as u64,
		y_max: y_coords.len() as u64,
		z_max: z_coords.len() as u64,
		axis_labels: AxisLabels {
			x: x_coords,
			y: y_coords,
			z: z_coords,
		},
		x_dimension_name: names[0].to_string(),
		y_dimension_name: names[1].to_string(),
		z_dimension_name: names[2].to_string(),
		dataset_dict,
	}
}

/// Reads and writes dataset/parameter metadata JSON files under a root directory, one file per
/// dataset (`{dataset}.json`) and one per parameter (`{dataset}/{parameter}.json`). Writes are
/// atomic by rename (§2b): the new content lands at a temp path in the same directory first, so
/// a crash mid-write never leaves a partially-written file in place of the old one.
pub struct MetadataStore {
	root: PathBuf,
}

impl MetadataStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		MetadataStore { root: root.into() }
	}

	fn dataset_path(&self, dataset_id: &str) -> PathBuf {
		self.root.join(format!("{dataset_id}.json"))
	}

	fn parameter_dir(&self, dataset_id: &str) -> PathBuf {
		self.root.join(dataset_id)
	}

	fn parameter_path(&self, dataset_id: &str, parameter: &str) -> PathBuf {
		self.parameter_dir(dataset_id).join(format!("{parameter}.json"))
	}

	pub fn load_dataset(&self, dataset_id: &str) -> Result<Option<DatasetMetadata>> {
		read_json(&self.dataset_path(dataset_id))
	}

	pub fn store_dataset(&self, dataset_id: &str, metadata: &DatasetMetadata) -> Result<()> {
		fs::create_dir_all(&self.root).with_context(|| format!("creating metadata root {}", self.root.display()))?;
		write_json_atomic(&self.dataset_path(dataset_id), metadata)
	}

	pub fn load_parameter(&self, dataset_id: &str, parameter: &str) -> Result<Option<ParameterMetadata>> {
		read_json(&self.parameter_path(dataset_id, parameter))
	}

	pub fn store_parameter(&self, dataset_id: &str, parameter: &str, metadata: &ParameterMetadata) -> Result<()> {
		let dir = self.parameter_dir(dataset_id);
		fs::create_dir_all(&dir).with_context(|| format!("creating parameter dir {}", dir.display()))?;
		write_json_atomic(&self.parameter_path(dataset_id, parameter), metadata)
	}

	/// Lists every parameter with persisted metadata for a dataset. Parameters whose discovery
	/// pass never produced a complete [`ParameterMetadata`] were never written here, so this
	/// naturally implements the skip-on-missing-stats policy: absence from this list, not an
	/// error, is how a stats-incomplete parameter is excluded.
	pub fn list_parameters(&self, dataset_id: &str) -> Result<Vec<String>> {
		let dir = self.parameter_dir(dataset_id);
		if !dir.exists() {
			return Ok(Vec::new());
		}
		let mut names = Vec::new();
		for entry in fs::read_dir(&dir).with_context(|| format!("reading parameter dir {}", dir.display()))? {
			let entry = entry?;
			if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
				if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
					names.push(stem.to_string());
				}
			}
		}
		names.sort();
		Ok(names)
	}

	/// Persists every parameter in `stats` whose discovered values are complete, skipping (and
	/// not failing on) incomplete ones.
	pub fn store_discovered_parameters(
		&self,
		dataset_id: &str,
		stats: HashMap<String, DiscoveredParameterStats>,
	) -> Result<()> {
		for (parameter, discovered) in stats {
			match discovered.into_metadata() {
				Some(metadata) => self.store_parameter(dataset_id, &parameter, &metadata)?,
				None => log::warn!("skipping parameter {parameter} of dataset {dataset_id}: incomplete stats"),
			}
		}
		Ok(())
	}
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>> {
	if !path.exists() {
		return Ok(None);
	}
	let bytes = fs::read(path).with_context(|| format!("reading metadata file {}", path.display()))?;
	let value = serde_json::from_slice(&bytes)
		.map_err(|e| TileError::StorageCorruption(format!("{}: {e}", path.display())))?;
	Ok(Some(value))
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
	let bytes = serde_json::to_vec_pretty(value).context("serializing metadata")?;
	let tmp_path = path.with_extension("json.tmp");
	fs::write(&tmp_path, bytes).with_context(|| format!("writing {}", tmp_path.display()))?;
	fs::rename(&tmp_path, path).with_context(|| format!("renaming {} to {}", tmp_path.display(), path.display()))?;
	Ok(())
}
