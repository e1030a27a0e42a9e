//! The source data model: a sum type over labeled and unlabeled dense arrays (§9).
//!
//! Replaces runtime type checks ("is this array type A or B?") with a single enum that every
//! call site matches on explicitly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Numeric precision of the backing array's stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
	F32,
	F64,
}

/// Native contiguous storage block sizes along each of the three axes, when the backing
/// array exposes chunking.
pub type Chunking = (u64, u64, u64);

/// A rank-3 read window, one range per axis, as used by [`ArrayBackend::read`].
pub type ReadWindow = (Range<u64>, Range<u64>, Range<u64>);

/// A materialized read result: row-major `f64` values over the requested window's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayWindow {
	pub shape: (u64, u64, u64),
	pub values: Vec<f64>,
}

impl ArrayWindow {
	pub fn get(&self, z: u64, y: u64, x: u64) -> f64 {
		let (_, ny, nx) = self.shape;
		let idx = (z * ny + y) * nx + x;
		self.values[idx as usize]
	}
}

/// Object-safe backend performing the actual I/O for a rank-3 array, local or remote.
#[async_trait]
pub trait ArrayBackend: Send + Sync {
	/// Shape `(Nz, Ny, Nx)` of the full array.
	fn shape(&self) -> (u64, u64, u64);

	/// Reads the full, non-clamped rectangular window. Callers (the proxy) are responsible
	/// for clamping to `shape()` first.
	async fn read(&self, window: ReadWindow) -> anyhow::Result<ArrayWindow>;

	/// Native chunk sizes along each axis, if the backend exposes chunking.
	fn chunking(&self) -> Option<Chunking> {
		None
	}
}

/// Per-dimension display labels: numeric ticks, ISO-8601 timestamps, or opaque strings.
#[derive(Debug, Clone)]
pub enum DimLabels {
	Numeric(Vec<f64>),
	Iso8601(Vec<String>),
	Opaque(Vec<String>),
}

/// The sum-typed data source taken by [`crate::source::DataSourceProxy`] (§9).
pub enum DataSource {
	/// A bare rank-3 array with no coordinate metadata.
	Unlabeled {
		shape: (u64, u64, u64),
		dtype: DType,
		reader: Box<dyn ArrayBackend>,
	},
	/// A rank-3 array carrying dimension names, coordinate labels, and optional chunking.
	Labeled {
		shape: (u64, u64, u64),
		dtype: DType,
		reader: Box<dyn ArrayBackend>,
		dim_names: (String, String, String),
		coords: (Option<DimLabels>, Option<DimLabels>, Option<DimLabels>),
		chunks: Option<Chunking>,
	},
}

impl DataSource {
	pub fn shape(&self) -> (u64, u64, u64) {
		match self {
			DataSource::Unlabeled { shape, .. } | DataSource::Labeled { shape, .. } => *shape,
		}
	}

	pub fn dtype(&self) -> DType {
		match self {
			DataSource::Unlabeled { dtype, .. } | DataSource::Labeled { dtype, .. } => *dtype,
		}
	}

	pub fn reader(&self) -> &dyn ArrayBackend {
		match self {
			DataSource::Unlabeled { reader, .. } | DataSource::Labeled { reader, .. } => reader.as_ref(),
		}
	}

	/// Native chunking, if any: the backend's own report for unlabeled sources, or the
	/// explicit `chunks` override for labeled ones (falling back to the backend's report).
	pub fn chunking(&self) -> Option<Chunking> {
		match self {
			DataSource::Unlabeled { reader, .. } => reader.chunking(),
			DataSource::Labeled { chunks, reader, .. } => chunks.or_else(|| reader.chunking()),
		}
	}
}
