//! # CubeTiles
//!
//! CubeTiles serves 2D tiles cut from a 3D scientific data cube, generating them on demand
//! (widget mode) or reading them from pre-built block files (standalone mode).
//!
//! ## Feature Flags
//!
//! - **cli**: pulled in via [`cubetiles_core`] for terminal progress bars used by the `build`
//!   and `serve` CLI subcommands.
//!
//! ## Usage Example
//!
//! ```no_run
//! use cubetiles::config::Config;
//! use cubetiles::server::TileServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_path(std::path::Path::new("cubetiles.yaml"))?;
//!     let mut server = TileServer::from_config(&config).await?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod raw_backend;
pub mod server;
