//! A development shell running the freshly built binaries.
//!
//! The staging `bin/` directory goes first on `PATH`, and directories that
//! hold an installed copy of the product are dropped so the shell can't pick
//! up the old one by accident.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::{debug, info};

use crate::error::{DistError, Result};

/// The shell to start: `explicit`, otherwise `$SHELL`.
pub fn resolve_shell(explicit: Option<String>) -> Result<String> {
  explicit
    .or_else(|| std::env::var("SHELL").ok())
    .filter(|s| !s.is_empty())
    .ok_or_else(|| DistError::Shell("cannot find shell, pass --shell or set $SHELL".to_string()))
}

/// Every copy of `product` found on `PATH`.
pub fn installed_binaries(product: &str) -> Vec<PathBuf> {
  match which::which_all_global(product) {
    Ok(found) => found.collect(),
    Err(e) => {
      debug!(product, error = %e, "no installed copies found");
      Vec::new()
    }
  }
}

/// New `PATH` entries: `bin_dir` first, then `path_var` minus directories
/// that contain one of `installed`.
pub fn shell_path(bin_dir: &Path, installed: &[PathBuf], path_var: Option<&OsStr>) -> Vec<PathBuf> {
  let installed_dirs: Vec<PathBuf> = installed
    .iter()
    .filter_map(|p| p.parent())
    .map(normalize)
    .collect();

  let mut paths = vec![bin_dir.to_path_buf()];
  if let Some(path_var) = path_var {
    for dir in std::env::split_paths(path_var) {
      if installed_dirs.contains(&normalize(&dir)) {
        info!(dir = %dir.display(), "removing directory with installed copy from PATH");
        continue;
      }
      paths.push(dir);
    }
  }
  paths
}

fn normalize(dir: &Path) -> PathBuf {
  dunce::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
}

/// Start `shell` with `paths` as its `PATH` and wait for it to exit.
pub fn spawn_shell(shell: &str, paths: &[PathBuf]) -> Result<ExitStatus> {
  let path: OsString = std::env::join_paths(paths).map_err(|e| DistError::Shell(e.to_string()))?;

  info!(shell, "starting shell");
  Command::new(shell)
    .env("PATH", path)
    .status()
    .map_err(|e| DistError::Spawn {
      program: shell.to_string(),
      source: e,
    })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  #[test]
  fn bin_dir_goes_first() {
    let temp = TempDir::new().unwrap();
    let bin = temp.path().join("out").join("bin");
    let a = temp.path().join("a");
    let b = temp.path().join("b");
    let path_var = std::env::join_paths([&a, &b]).unwrap();

    let paths = shell_path(&bin, &[], Some(&path_var));

    assert_eq!(paths, vec![bin, a, b]);
  }

  #[test]
  fn directories_with_installed_copies_are_dropped() {
    let temp = TempDir::new().unwrap();
    let bin = temp.path().join("out").join("bin");
    let cargo_bin = temp.path().join("cargo").join("bin");
    let usr_bin = temp.path().join("usr").join("bin");
    std::fs::create_dir_all(&cargo_bin).unwrap();
    std::fs::create_dir_all(&usr_bin).unwrap();
    let installed = cargo_bin.join("nrtm");
    std::fs::write(&installed, b"").unwrap();
    let path_var = std::env::join_paths([&cargo_bin, &usr_bin]).unwrap();

    let paths = shell_path(&bin, &[installed], Some(&path_var));

    assert_eq!(paths, vec![bin, usr_bin]);
  }

  #[test]
  fn missing_path_variable_leaves_only_bin_dir() {
    let bin = PathBuf::from("out").join("bin");
    assert_eq!(shell_path(&bin, &[], None), vec![bin]);
  }

  #[test]
  #[serial]
  fn explicit_shell_wins_over_env() {
    temp_env::with_var("SHELL", Some("/bin/zsh"), || {
      assert_eq!(resolve_shell(Some("fish".to_string())).unwrap(), "fish");
      assert_eq!(resolve_shell(None).unwrap(), "/bin/zsh");
    });
  }

  #[test]
  #[serial]
  fn no_shell_is_an_error() {
    temp_env::with_var_unset("SHELL", || {
      assert!(matches!(resolve_shell(None), Err(DistError::Shell(_))));
    });
  }

  #[test]
  fn installed_binaries_of_unknown_product_is_empty() {
    assert!(installed_binaries("nrtm-dist-surely-not-installed-anywhere").is_empty());
  }

  #[cfg(unix)]
  #[test]
  fn spawned_shell_sees_new_path() {
    use crate::util::testutil::write_script;

    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("path.txt");
    let shell = write_script(
      temp.path(),
      "fake-shell",
      &format!("echo \"$PATH\" > '{}'", marker.display()),
    );
    let bin = temp.path().join("bin");

    let status = spawn_shell(shell.to_str().unwrap(), &[bin.clone()]).unwrap();

    assert!(status.success());
    let seen = std::fs::read_to_string(&marker).unwrap();
    assert_eq!(seen.trim(), bin.to_str().unwrap());
  }
}
