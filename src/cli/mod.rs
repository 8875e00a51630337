use crate::verify::Policy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hub-prefetch")]
#[command(version, about = "Pre-download hub models into a local cache and verify they load offline", long_about = None)]
pub struct Cli {
	/// TOML configuration file
	#[arg(long, global = true, env = "HUB_PREFETCH_CONFIG")]
	pub config: Option<PathBuf>,

	/// Model cache directory (default: /opt/huggingface_cache)
	#[arg(long, global = true)]
	pub cache_dir: Option<PathBuf>,

	/// Hub access token for gated repositories
	#[arg(long, global = true, env = "HF_TOKEN", hide_env_values = true)]
	pub token: Option<String>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Download every configured model, then verify the cache
	Download {
		/// Attempts per model before giving up
		#[arg(long)]
		max_attempts: Option<u32>,

		/// Seconds to wait between attempts
		#[arg(long)]
		retry_delay: Option<u64>,

		/// Disable download progress bars
		#[arg(long)]
		no_progress: bool,

		/// Exit after downloading without verifying
		#[arg(long)]
		skip_verify: bool,

		#[command(flatten)]
		verify: VerifyArgs,
	},

	/// Verify the cache loads offline
	Verify {
		#[command(flatten)]
		verify: VerifyArgs,
	},

	/// Report which expected files are cached (exit 0 ready, 1 not loadable, 2 not cached)
	Check {
		/// Cache directory to inspect when --cache-dir is not given
		#[arg(long, env = "HF_HOME")]
		hf_home: Option<PathBuf>,
	},

	/// Print the resolved configuration
	PrintConfig,
}

#[derive(Args)]
pub struct VerifyArgs {
	/// Treat failures as fatal (strict) or as warnings (permissive)
	#[arg(long, value_enum)]
	pub policy: Option<Policy>,

	/// Minimum total cache size in GiB
	#[arg(long)]
	pub min_cache_gib: Option<f64>,
}
