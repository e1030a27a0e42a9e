//! C7: the HTTP tile server (§4.7, §6, §9(c)).

mod cors;
mod handlers;
mod routes;
mod state;
mod tile_server;

pub use state::{ActiveSource, ProgressFrame, TileServerState};
pub use tile_server::TileServer;
