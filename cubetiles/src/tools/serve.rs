use anyhow::{Context, Result};
use cubetiles::config::Config;
use cubetiles::server::TileServer;
use std::path::PathBuf;
use tokio::time::{Duration, sleep};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// Path to a YAML configuration file.
	#[arg(short = 'c', long, value_name = "FILE", display_order = 0)]
	pub config: Option<PathBuf>,

	/// Root directory holding dataset metadata (C8) and block files (C5).
	/// Overrides `datasets_root` from the config file.
	#[arg(short = 'd', long, display_order = 0)]
	pub datasets_root: Option<PathBuf>,

	/// Serve via socket ip. Default: 0.0.0.0
	#[arg(short = 'i', long, display_order = 1)]
	pub ip: Option<String>,

	/// Serve via port. Default: 8080
	#[arg(short, long, display_order = 1)]
	pub port: Option<u16>,

	/// Shut the server down automatically after x milliseconds. Mostly useful for tests.
	#[arg(long, display_order = 4)]
	pub auto_shutdown: Option<u64>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let mut config = if let Some(config_path) = &arguments.config {
		Config::from_path(config_path).context("run `cubetiles serve --help` for the config file shape")?
	} else {
		Config::default()
	};

	config.server.override_optional_ip(&arguments.ip);
	config.server.override_optional_port(&arguments.port);
	if arguments.datasets_root.is_some() {
		config.datasets_root.clone_from(&arguments.datasets_root);
	}

	let mut server = TileServer::from_config(&config).await?;
	server.start().await?;
	log::info!("listening on {}:{}", config.server.ip.as_deref().unwrap_or("0.0.0.0"), server.get_port());

	if let Some(milliseconds) = arguments.auto_shutdown {
		sleep(Duration::from_millis(milliseconds)).await;
		server.stop().await?;
	} else {
		loop {
			sleep(Duration::from_secs(60)).await;
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::tests::run_command;
	use assert_fs::TempDir;

	#[test]
	fn auto_shutdown() {
		let tmp = TempDir::new().unwrap();
		let datasets_root = tmp.path().to_str().unwrap();
		run_command(vec![
			"cubetiles",
			"serve",
			"-i",
			"127.0.0.1",
			"-p",
			"0",
			"-d",
			datasets_root,
			"--auto-shutdown",
			"200",
		])
		.unwrap();
	}
}
