//! Implementation of the `nrtm-dist build` command.
//!
//! Wraps `cargo build`: copies the produced executables into
//! `out[-target]/bin`, and with `--dist` packages them into a single archive.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use nrtm_dist_lib::args::BuildArgs;
use nrtm_dist_lib::config::DistConfig;
use nrtm_dist_lib::dist::run_build;
use nrtm_dist_lib::report::relative_display;
use nrtm_dist_lib::toolchain::CargoToolchain;

use super::resolve_root;
use crate::output::{TranscriptReporter, format_duration, print_success};

/// Execute the build command.
///
/// `raw_args` are interpreted by [`BuildArgs::parse`]: `--dist`,
/// `--installer` and `--target` are recognized, the rest goes to cargo.
pub fn cmd_build(root: Option<PathBuf>, raw_args: Vec<String>) -> Result<()> {
  let start = Instant::now();
  let toolchain = CargoToolchain::from_env();
  let args = BuildArgs::parse(raw_args);
  let config = DistConfig::with_root(resolve_root(root, &toolchain));

  let mut reporter = TranscriptReporter::new(&config.root_dir);
  let outcome = run_build(&config, &args, &toolchain, &mut reporter).context("Build failed")?;

  let produced = match (&outcome.installer, &outcome.archive) {
    (Some(installer), _) => relative_display(&config.root_dir, &installer.dest),
    (None, Some(archive)) => relative_display(&config.root_dir, &archive.archive),
    (None, None) => relative_display(&config.root_dir, &outcome.layout.bin_dir),
  };

  print_success(&format!(
    "{} executable(s) -> {} ({})",
    outcome.artifacts.len(),
    produced,
    format_duration(start.elapsed())
  ));

  Ok(())
}
