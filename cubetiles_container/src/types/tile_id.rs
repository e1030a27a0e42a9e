//! Tile identity: the pure key that determines a tile's content.

use super::SliceAxis;
use std::fmt;

/// `(dataset_id, parameter, slice_axis, slice_index, lod, tx, ty)`. Two tiles with equal
/// identity must have byte-equal payloads given the same source data and codec configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileId {
	pub dataset_id: String,
	pub parameter: String,
	pub slice_axis: SliceAxis,
	pub slice_index: u64,
	pub lod: u32,
	pub tx: u64,
	pub ty: u64,
}

impl TileId {
	pub fn new(
		dataset_id: impl Into<String>,
		parameter: impl Into<String>,
		slice_axis: SliceAxis,
		slice_index: u64,
		lod: u32,
		tx: u64,
		ty: u64,
	) -> Self {
		TileId {
			dataset_id: dataset_id.into(),
			parameter: parameter.into(),
			slice_axis,
			slice_index,
			lod,
			tx,
			ty,
		}
	}

	/// Whether `parameter` names a derived "anomaly" series, by the reserved-suffix convention.
	pub fn is_anomaly_parameter(&self) -> bool {
		self.parameter.ends_with(ANOMALY_PARAMETER_SUFFIX)
	}

	/// The on-disk path suffix of this tile's position inside its block file's directory tree,
	/// used by the on-disk generation cache: `{dataset}/{parameter}/{axis}/{slice}.{lod}.{x}.{y}`.
	pub fn path_suffix(&self) -> String {
		format!(
			"{}/{}/{}/{}.{}.{}.{}",
			self.dataset_id, self.parameter, self.slice_axis.name(), self.slice_index, self.lod, self.tx, self.ty
		)
	}
}

/// Parameter-id suffix that selects the anomaly-tile tolerance instead of the default one.
pub const ANOMALY_PARAMETER_SUFFIX: &str = "_lxc_anomaly";

impl fmt::Display for TileId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.path_suffix())
	}
}
