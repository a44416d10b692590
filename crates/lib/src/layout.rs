//! Where a run puts its files.

use std::path::{Path, PathBuf};

use crate::config::DistConfig;
use crate::target::{BuildTarget, target_suffix};

/// The staging directory of one run: `{root}/{name}[-{target}]/bin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
  pub root_dir: PathBuf,
  pub out_dir: PathBuf,
  pub bin_dir: PathBuf,
}

impl OutputLayout {
  /// Normal builds stage into `out_root`, distribution builds into
  /// `dist_name` so the archive unpacks to a product-named directory.
  pub fn new(config: &DistConfig, dist: bool, target: Option<&BuildTarget>) -> Self {
    let name = if dist { &config.dist_name } else { &config.out_root };
    let out_dir = config.root_dir.join(format!("{name}{}", target_suffix(target)));
    let bin_dir = out_dir.join("bin");
    Self {
      root_dir: config.root_dir.clone(),
      out_dir,
      bin_dir,
    }
  }

  /// Base name of the staging directory, e.g. `nrtm-x86_64-pc-windows-msvc`.
  pub fn out_name(&self) -> String {
    self
      .out_dir
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}

/// Archive path without extension: `{root}/{dist_name}[-{target}]`.
pub fn archive_base(config: &DistConfig, target: Option<&BuildTarget>) -> PathBuf {
  config
    .root_dir
    .join(format!("{}{}", config.dist_name, target_suffix(target)))
}

/// Installer destination: `{root}/{installer_package}[-{target}]{ext}`.
///
/// The extension comes from the built executable so a Windows cross build
/// keeps its `.exe`.
pub fn installer_path(config: &DistConfig, target: Option<&BuildTarget>, built: &Path) -> PathBuf {
  let ext = built
    .extension()
    .map(|e| format!(".{}", e.to_string_lossy()))
    .unwrap_or_default();
  config.root_dir.join(format!(
    "{}{}{ext}",
    config.installer_package,
    target_suffix(target)
  ))
}
