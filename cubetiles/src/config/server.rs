//! HTTP server configuration for the CubeTiles server.

use serde::Deserialize;

/// Network and backpressure settings for the `axum` server.
///
/// All fields are optional; defaults are applied when values are not specified.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
	/// IP address to bind to. Defaults to `"0.0.0.0"`.
	#[serde(default)]
	pub ip: Option<String>,

	/// Port to listen on. Defaults to `8080`.
	#[serde(default)]
	pub port: Option<u16>,

	/// Cap on in-flight tile generations, i.e. the `tower::limit::ConcurrencyLimitLayer` size.
	/// Defaults to `ConcurrencyLimits::default().cpu_bound` (§5).
	#[serde(default)]
	pub concurrency_limit: Option<usize>,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			ip: None,
			port: None,
			concurrency_limit: None,
		}
	}
}

impl ServerConfig {
	pub fn override_optional_ip(&mut self, ip: &Option<String>) {
		if ip.is_some() {
			self.ip.clone_from(ip);
		}
	}

	pub fn override_optional_port(&mut self, port: &Option<u16>) {
		if port.is_some() {
			self.port = *port;
		}
	}
}
