//! Implementation of the `nrtm-dist shell` command.
//!
//! Builds in normal mode, then starts a shell whose `PATH` finds the fresh
//! binaries before any installed copy.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use nrtm_dist_lib::args::BuildArgs;
use nrtm_dist_lib::config::DistConfig;
use nrtm_dist_lib::dist::run_build;
use nrtm_dist_lib::shell::{installed_binaries, resolve_shell, shell_path, spawn_shell};
use nrtm_dist_lib::toolchain::CargoToolchain;

use super::resolve_root;
use crate::output::{TranscriptReporter, print_info, print_warning};

pub fn cmd_shell(root: Option<PathBuf>, shell: Option<String>, raw_args: Vec<String>) -> Result<()> {
  // A shell always runs the staged layout, never an archive.
  let args = BuildArgs::parse(raw_args);
  if args.dist {
    bail!("--dist and --installer cannot be used with shell");
  }

  let shell = resolve_shell(shell)?;
  let toolchain = CargoToolchain::from_env();
  let config = DistConfig::with_root(resolve_root(root, &toolchain));

  let installed = installed_binaries(&config.product_name);

  let mut reporter = TranscriptReporter::new(&config.root_dir);
  let outcome = run_build(&config, &args, &toolchain, &mut reporter).context("Build failed")?;

  let path_var = std::env::var_os("PATH");
  let paths = shell_path(&outcome.layout.bin_dir, &installed, path_var.as_deref());
  print_info(&format!("Add {} to $PATH", outcome.layout.bin_dir.display()));
  print_info(&format!("Start {shell}..."));

  let status = spawn_shell(&shell, &paths).context("Failed to start shell")?;
  if !status.success() {
    print_warning(&format!("{shell} exited with {status}"));
  }

  Ok(())
}
