//! Shared primitives used across the workspace: binary blobs and byte ranges, the
//! `ValueReader`/`ValueWriter` codec traits, the generic cache abstraction, compression
//! helpers, and progress reporting.

pub mod cache;
pub mod compression;
pub mod concurrency;
pub mod config;
pub use config::*;
pub mod io;
pub mod macros;
pub mod progress;
pub mod types;
pub use types::*;
