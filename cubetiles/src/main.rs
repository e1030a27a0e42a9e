// Import necessary modules and dependencies
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};

// Define the command-line interface using the clap crate
#[derive(Parser, Debug)]
#[command(
	author, // Set the author
	version, // Set the version
	about, // Set a short description
	long_about = None, // Disable long description
	propagate_version = true, // Enable version flag for subcommands
	disable_help_subcommand = true, // Disable help subcommand
)]
struct Cli {
	#[command(subcommand)]
	command: Commands, // Set subcommands

	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>, // Set verbosity flag
}

// Define subcommands for the command-line interface
#[derive(Subcommand, Debug)]
enum Commands {
	/// Pre-generate block files for a dataset/parameter/axis
	Build(tools::build::Subcommand),

	#[clap(alias = "server")]
	/// Serve tiles via http
	Serve(tools::serve::Subcommand),
}

// Main function for running the command-line interface
fn main() -> Result<()> {
	let cli = Cli::parse();

	// Initialize logger and set log level based on verbosity flag
	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(cli)
}

// Helper function for running subcommands
fn run(cli: Cli) -> Result<()> {
	match &cli.command {
		Commands::Build(arguments) => tools::build::run(arguments),
		Commands::Serve(arguments) => tools::serve::run(arguments),
	}
}

// Unit tests for the command-line interface
#[cfg(test)]
mod tests {
	use crate::{Cli, run};
	use anyhow::Result;
	use clap::Parser;

	// Function for running command-line arguments in tests
	pub fn run_command(arg_vec: Vec<&str>) -> Result<String> {
		let cli = Cli::try_parse_from(arg_vec)?;
		let msg = format!("{:?}", cli);
		run(cli)?;
		Ok(msg)
	}

	// Test if cubetiles generates help
	#[test]
	fn help() {
		let err = run_command(vec!["cubetiles"]).unwrap_err().to_string();
		assert!(err.contains("\nUsage: cubetiles [OPTIONS] <COMMAND>"));
	}

	// Test for version
	#[test]
	fn version() {
		let err = run_command(vec!["cubetiles", "-V"]).unwrap_err().to_string();
		assert!(err.starts_with("cubetiles "));
	}

	// Test for subcommand 'build'
	#[test]
	fn build_subcommand() {
		let output = run_command(vec!["cubetiles", "build"]).unwrap_err().to_string();
		assert!(output.starts_with("Pre-generate block files for a dataset/parameter/axis"));
	}

	// Test for subcommand 'serve'
	#[test]
	fn serve_subcommand() {
		let output = run_command(vec!["cubetiles", "serve"]).unwrap_err().to_string();
		assert!(output.starts_with("Serve tiles via http"));
	}
}
