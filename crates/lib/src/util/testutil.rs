//! Test utilities for nrtm-dist-lib.
//!
//! Helpers that stand in for cargo and rustup with small shell scripts, and
//! that fake build outputs on disk.

use std::fs;
use std::path::{Path, PathBuf};

/// Write an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
  fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// Create a fake build output of `size` bytes at `dir/name`.
pub fn fake_executable(dir: &Path, name: &str, size: usize) -> PathBuf {
  fs::create_dir_all(dir).unwrap();
  let path = dir.join(name);
  fs::write(&path, vec![0x7fu8; size]).unwrap();
  path
}

/// A cargo JSON message naming `path` as an executable.
pub fn executable_line(path: &Path) -> String {
  serde_json::json!({
    "reason": "compiler-artifact",
    "executable": path,
  })
  .to_string()
}
