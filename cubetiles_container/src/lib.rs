//! CubeTiles Container: the domain model of the tile engine — data-source proxying,
//! tile extraction and the wire codec, the on-disk block-file and metadata formats, and
//! the in-process caches sitting in front of them.
//!
//! # Quick start
//! ```rust,no_run
//! use cubetiles_container::types::{DataSource, SliceAxis};
//! use cubetiles_container::source::DataSourceProxy;
//!
//! # async fn example(source: DataSource) -> anyhow::Result<()> {
//! let proxy = DataSourceProxy::new(source);
//! let window = proxy.read(0..1, 0..256, 0..256).await?;
//! # Ok(())
//! # }
//! ```

pub mod block_file;
pub mod cache;
pub mod compressor;
pub mod dims;
pub mod error;
pub mod metadata;
pub mod source;
pub mod tile;
pub mod types;
