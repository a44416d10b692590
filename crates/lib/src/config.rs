//! Names and switches for a build run.
//!
//! Every fixed name lives here so a run can be pointed
//! at a scratch directory and fake package names.

use std::path::PathBuf;

use crate::artifact::RenameRule;
use crate::package::ArchiveRoot;
use crate::platform::os::Os;

/// Environment variable pointing the installer build at the archive to embed.
pub const ARCHIVE_ENV: &str = "NRTM_DIST_ARCHIVE";

/// Configuration for [`crate::dist::run_build`].
#[derive(Debug, Clone)]
pub struct DistConfig {
  /// Directory the output directory and archive are created in.
  pub root_dir: PathBuf,
  /// Staging directory name for normal builds.
  pub out_root: String,
  /// Staging directory and archive base name for distribution builds.
  pub dist_name: String,
  /// Package passed to cargo with `--package`, if any.
  pub package: Option<String>,
  /// Package built in installer mode.
  pub installer_package: String,
  /// Name of the product binary, used to find installed copies on `PATH`.
  pub product_name: String,
  pub rename: RenameRule,
  pub archive_root: ArchiveRoot,
  /// Keep access and modification times of copied executables.
  pub preserve_metadata: bool,
  /// Host OS; `None` when unknown, which selects the default archive format.
  pub host_os: Option<Os>,
}

impl Default for DistConfig {
  fn default() -> Self {
    Self {
      root_dir: PathBuf::from("."),
      out_root: "out".to_string(),
      dist_name: "nrtm".to_string(),
      package: Some("nrtm".to_string()),
      installer_package: "nrtm-installer".to_string(),
      product_name: "nrtm".to_string(),
      rename: RenameRule::default(),
      archive_root: ArchiveRoot::default(),
      preserve_metadata: true,
      host_os: Os::current(),
    }
  }
}

impl DistConfig {
  /// Default configuration rooted at `root_dir`.
  pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
    Self {
      root_dir: root_dir.into(),
      ..Self::default()
    }
  }
}
