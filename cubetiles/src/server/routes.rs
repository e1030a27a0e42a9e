//! Router composition: wires the handlers into an `axum::Router` without mixing in server
//! lifecycle or CORS logic (those stay in [`super::tile_server`]).

use super::handlers;
use super::state::TileServerState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

pub fn build_router(state: Arc<TileServerState>) -> Router {
	Router::new()
		.route("/status", get(handlers::status))
		.route("/tiles", post(handlers::serve_widget_tiles))
		.route("/tiles/group", post(handlers::allocate_progress_group))
		.route("/progress/{group_id}", get(handlers::progress_websocket))
		.route("/blocks/{dataset_id}/{parameter}/{axis}/{slice_index}", get(handlers::serve_block))
		.with_state(state)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Config;
	use assert_fs::TempDir;
	use axum::body::Body;
	use axum::http::{Request, StatusCode};
	use tower::ServiceExt as _;

	async fn test_state() -> Arc<TileServerState> {
		let tmp = TempDir::new().unwrap();
		let mut config = Config::default();
		config.datasets_root = Some(tmp.path().to_path_buf());
		Arc::new(TileServerState::from_config(&config).await.unwrap())
	}

	#[tokio::test]
	async fn status_route_is_wired() {
		let app = build_router(test_state().await);

		let req = Request::builder().uri("/status").body(Body::empty()).unwrap();
		let res = app.oneshot(req).await.unwrap();
		assert_eq!(res.status(), StatusCode::OK);
	}

	#[tokio::test]
	async fn unknown_route_is_404() {
		let app = build_router(test_state().await);

		let req = Request::builder().uri("/nope").body(Body::empty()).unwrap();
		let res = app.oneshot(req).await.unwrap();
		assert_eq!(res.status(), StatusCode::NOT_FOUND);
	}
}
