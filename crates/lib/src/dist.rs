//! The build run: compile, collect, package.
//!
//! Steps run strictly in order and the first error ends the run. A failed
//! build leaves the filesystem untouched; a failed copy stops before any
//! archive is written.

use std::fs;

use tracing::{info, warn};

use crate::args::BuildArgs;
use crate::artifact::{self, copy_file, size_kib};
use crate::config::{ARCHIVE_ENV, DistConfig};
use crate::error::{DistError, Result};
use crate::layout::{OutputLayout, archive_base, installer_path};
use crate::package::{self, ArchiveFormat};
use crate::report::{ArchiveReport, CopiedArtifact, Reporter};
use crate::target::BuildTarget;
use crate::toolchain::{BuildCommand, BuildSubcommand, Toolchain};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
  pub layout: OutputLayout,
  pub artifacts: Vec<CopiedArtifact>,
  /// Set in distribution mode. In installer mode the file is already gone.
  pub archive: Option<ArchiveReport>,
  pub installer: Option<CopiedArtifact>,
}

impl BuildOutcome {
  /// Whether the staging directory is still on disk.
  pub fn kept_output_dir(&self) -> bool {
    self.archive.is_none()
  }
}

/// Run a build as described by `args`.
pub fn run_build(
  config: &DistConfig,
  args: &BuildArgs,
  toolchain: &dyn Toolchain,
  reporter: &mut dyn Reporter,
) -> Result<BuildOutcome> {
  let target = args.target.as_ref();
  if let Some(target) = target {
    register_target(toolchain, target);
  }

  let subcommand = BuildSubcommand::for_target(target);
  if subcommand == BuildSubcommand::Zigbuild {
    toolchain.install_zigbuild()?;
  }

  let package_name = config.package.as_deref().unwrap_or("workspace");
  reporter.stage(&format!("Compile {package_name} package"));
  let command = BuildCommand::new(subcommand, args.cargo_args.clone(), config.package.clone());
  let stdout = toolchain.build(&command)?;
  let executables = artifact::executables(&stdout);
  info!(count = executables.len(), "build finished");

  let layout = OutputLayout::new(config, args.dist, target);
  let artifacts = artifact::collect(
    &executables,
    &layout.bin_dir,
    &config.rename,
    config.preserve_metadata,
    reporter,
  )?;

  let mut outcome = BuildOutcome {
    layout,
    artifacts,
    archive: None,
    installer: None,
  };

  if !args.dist {
    return Ok(outcome);
  }

  // The installer embeds a zip regardless of host.
  let format = if args.installer {
    ArchiveFormat::Zip
  } else {
    ArchiveFormat::for_os(config.host_os)
  };
  let archive = package::package(
    &outcome.layout,
    &archive_base(config, target),
    format,
    config.archive_root,
    reporter,
  )?;

  if args.installer {
    let installer = build_installer(config, args, subcommand, &archive, toolchain, reporter)?;
    outcome.installer = Some(installer);
  }
  outcome.archive = Some(archive);

  Ok(outcome)
}

/// Target registration is best effort: a toolchain without rustup may
/// already have the target, and a missing one fails the build anyway.
fn register_target(toolchain: &dyn Toolchain, target: &BuildTarget) {
  if let Err(e) = toolchain.add_target(target) {
    warn!(target = %target, error = %e, "failed to register build target, continuing");
  }
}

fn build_installer(
  config: &DistConfig,
  args: &BuildArgs,
  subcommand: BuildSubcommand,
  archive: &ArchiveReport,
  toolchain: &dyn Toolchain,
  reporter: &mut dyn Reporter,
) -> Result<CopiedArtifact> {
  reporter.stage(&format!("Compile {} package", config.installer_package));
  let command = BuildCommand::new(
    subcommand,
    args.cargo_args.clone(),
    Some(config.installer_package.clone()),
  )
  .forced()
  .env(ARCHIVE_ENV, archive.archive.clone().into_os_string());

  let stdout = toolchain.build(&command)?;
  let built = artifact::executables(&stdout)
    .into_iter()
    .next()
    .ok_or_else(|| DistError::MissingInstaller {
      package: config.installer_package.clone(),
    })?;

  let dest = installer_path(config, args.target.as_ref(), &built);
  copy_file(&built, &dest, config.preserve_metadata)?;
  let installer = CopiedArtifact {
    source: built,
    size_kib: size_kib(&dest)?,
    dest,
  };
  reporter.installer(&installer);

  fs::remove_file(&archive.archive).map_err(|e| DistError::RemoveFile {
    path: archive.archive.clone(),
    source: e,
  })?;

  Ok(installer)
}
