//! Cross-Origin Resource Sharing (CORS) configuration for the CubeTiles server.
//!
//! By default, all origins are allowed (`*`). Restrict access by listing
//! origins explicitly, optionally with a leading/trailing `*` wildcard.

use serde::Deserialize;

/// CORS policy configuration.
///
/// - `allowed_origins`: permitted origins or wildcard globs. Defaults to `["*"]`.
/// - `max_age_seconds`: how long browsers may cache preflight responses.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
	#[serde(default = "default_allowed_origins")]
	pub allowed_origins: Vec<String>,

	#[serde(default)]
	pub max_age_seconds: Option<u64>,
}

fn default_allowed_origins() -> Vec<String> {
	vec!["*".to_string()]
}

impl Default for CorsConfig {
	fn default() -> Self {
		Self {
			allowed_origins: default_allowed_origins(),
			max_age_seconds: None,
		}
	}
}
