//! CubeTiles server configuration system.

mod cors;
mod main;
mod server;

pub use cors::CorsConfig;
pub use main::{ActiveSourceConfig, Config};
pub use server::ServerConfig;
