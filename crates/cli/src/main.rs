mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::print_error;

/// nrtm-dist - build, collect and package nrtm binaries
#[derive(Parser)]
#[command(name = "nrtm-dist")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Wrapper of `cargo build`
  Build {
    /// Directory to create the output in (default: workspace root)
    #[arg(long)]
    root: Option<PathBuf>,

    /// `--dist`, `--installer`, `--target <TRIPLE>`; everything else is passed to cargo
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Build, then start a shell with the built binaries first on $PATH
  Shell {
    /// Directory to create the output in (default: workspace root)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Shell to start (default: $SHELL)
    #[arg(long)]
    shell: Option<String>,

    /// Passed to cargo
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
  },

  /// Show the host platform and output layout
  Info,
}

fn main() {
  let cli = Cli::parse();

  // Initialize logging
  let default_filter = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build { root, args } => cmd::cmd_build(root, args),
    Commands::Shell { root, shell, args } => cmd::cmd_shell(root, shell, args),
    Commands::Info => {
      cmd::cmd_info();
      Ok(())
    }
  };

  if let Err(e) = result {
    print_error(&format!("{e:#}"));
    std::process::exit(1);
  }
}
