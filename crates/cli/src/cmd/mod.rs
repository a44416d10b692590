mod build;
mod info;
mod shell;

pub use build::cmd_build;
pub use info::cmd_info;
pub use shell::cmd_shell;

use std::path::PathBuf;

use nrtm_dist_lib::toolchain::Toolchain;
use tracing::debug;

use crate::output::print_warning;

/// Output root: `--root` if given, otherwise the cargo workspace root,
/// otherwise the current directory.
pub(crate) fn resolve_root(root: Option<PathBuf>, toolchain: &dyn Toolchain) -> PathBuf {
  if let Some(root) = root {
    return root;
  }

  match toolchain.workspace_root() {
    Ok(root) => {
      debug!(root = %root.display(), "using workspace root");
      root
    }
    Err(e) => {
      print_warning(&format!("{e}, using the current directory"));
      PathBuf::from(".")
    }
  }
}
