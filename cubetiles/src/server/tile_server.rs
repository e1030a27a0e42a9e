//! C7: the HTTP tile server lifecycle (§4.7, §5's protection stack).

use super::cors::build_cors_layer;
use super::routes::build_router;
use super::state::TileServerState;
use crate::config::Config;
use anyhow::{Context, Result, bail};
use axum::http::StatusCode;
use cubetiles_core::concurrency::ConcurrencyLimits;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

/// Owns the `axum` server task. `start`/`stop` are both idempotent: starting twice restarts,
/// stopping twice is a no-op.
pub struct TileServer {
	ip: String,
	port: u16,
	concurrency_limit: usize,
	cors_allowed_origins: Vec<String>,
	cors_max_age_seconds: u64,
	state: Arc<TileServerState>,
	bound_port: Arc<AtomicU16>,
	exit_signal: Option<oneshot::Sender<()>>,
	join: Option<JoinHandle<()>>,
}

impl TileServer {
	pub async fn from_config(config: &Config) -> Result<Self> {
		let state = TileServerState::from_config(config).await?;
		let concurrency_limit = config
			.server
			.concurrency_limit
			.unwrap_or_else(|| ConcurrencyLimits::default().cpu_bound);

		Ok(TileServer {
			ip: config.server.ip.clone().unwrap_or_else(|| "0.0.0.0".to_string()),
			port: config.server.port.unwrap_or(8080),
			concurrency_limit,
			cors_allowed_origins: config.cors.allowed_origins.clone(),
			cors_max_age_seconds: config.cors.max_age_seconds.unwrap_or(86400),
			state: Arc::new(state),
			bound_port: Arc::new(AtomicU16::new(0)),
			exit_signal: None,
			join: None,
		})
	}

	pub fn state(&self) -> &Arc<TileServerState> {
		&self.state
	}

	/// The actually-bound port, valid only once [`TileServer::start`] has returned.
	pub fn get_port(&self) -> u16 {
		self.bound_port.load(Ordering::SeqCst)
	}

	pub async fn start(&mut self) -> Result<()> {
		self.stop().await?;

		let cors_layer = build_cors_layer(&self.cors_allowed_origins, self.cors_max_age_seconds)
			.context("building CORS layer from configured allowed origins")?;

		let router = build_router(self.state.clone()).layer(cors_layer).layer(CatchPanicLayer::new());

		let protected = ServiceBuilder::new()
			.layer(axum::error_handling::HandleErrorLayer::new(overload_response))
			.load_shed()
			.concurrency_limit(self.concurrency_limit)
			.buffer(512)
			.timeout(Duration::from_secs(15))
			.service(router);

		let addr: SocketAddr = format!("{}:{}", self.ip, self.port)
			.parse()
			.with_context(|| format!("parsing bind address '{}:{}'", self.ip, self.port))?;
		let listener = TcpListener::bind(addr).await.with_context(|| format!("binding to {addr}"))?;
		let actual_port = listener.local_addr()?.port();
		self.bound_port.store(actual_port, Ordering::SeqCst);

		let (exit_tx, exit_rx) = oneshot::channel();
		self.exit_signal = Some(exit_tx);

		self.join = Some(tokio::spawn(async move {
			let result = axum::serve(listener, protected.into_make_service())
				.with_graceful_shutdown(async {
					let _ = exit_rx.await;
				})
				.await;
			if let Err(err) = result {
				log::error!("tile server exited with an error: {err}");
			}
		}));

		Ok(())
	}

	pub async fn stop(&mut self) -> Result<()> {
		if let Some(signal) = self.exit_signal.take() {
			let _ = signal.send(());
		}
		if let Some(join) = self.join.take() {
			match tokio::time::timeout(Duration::from_secs(10), join).await {
				Ok(result) => result.context("tile server task panicked")?,
				Err(_) => bail!("tile server did not shut down within 10 seconds"),
			}
		}
		self.bound_port.store(0, Ordering::SeqCst);
		Ok(())
	}
}

async fn overload_response(_err: tower::BoxError) -> (StatusCode, [(&'static str, &'static str); 1], &'static str) {
	(StatusCode::SERVICE_UNAVAILABLE, [("Retry-After", "2")], "server overloaded, retry shortly")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Config;
	use assert_fs::TempDir;

	fn test_config(port: u16) -> Config {
		let mut config = Config::default();
		config.server.ip = Some("127.0.0.1".to_string());
		config.server.port = Some(port);
		config
	}

	#[tokio::test]
	async fn start_then_stop_is_idempotent() {
		let tmp = TempDir::new().unwrap();
		let mut config = test_config(0);
		config.datasets_root = Some(tmp.path().to_path_buf());

		let mut server = TileServer::from_config(&config).await.unwrap();
		server.start().await.unwrap();
		assert_ne!(server.get_port(), 0);

		server.start().await.unwrap();
		server.stop().await.unwrap();
		server.stop().await.unwrap();
	}

	#[tokio::test]
	async fn status_route_responds() {
		let tmp = TempDir::new().unwrap();
		let mut config = test_config(0);
		config.datasets_root = Some(tmp.path().to_path_buf());

		let mut server = TileServer::from_config(&config).await.unwrap();
		server.start().await.unwrap();
		let port = server.get_port();

		let body = reqwest::get(format!("http://127.0.0.1:{port}/status"))
			.await
			.unwrap()
			.text()
			.await
			.unwrap();
		assert_eq!(body, "ready!");

		server.stop().await.unwrap();
	}
}
