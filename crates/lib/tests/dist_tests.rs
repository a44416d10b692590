//! End-to-end runs of the public API against a scripted `cargo`.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use nrtm_dist_lib::DistError;
use nrtm_dist_lib::args::BuildArgs;
use nrtm_dist_lib::config::DistConfig;
use nrtm_dist_lib::dist::run_build;
use nrtm_dist_lib::platform::os::Os;
use nrtm_dist_lib::report::NullReporter;
use nrtm_dist_lib::toolchain::CargoToolchain;
use tempfile::TempDir;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// A cargo printing one `shim.exe` executable message and exiting with `exit`.
fn setup(exit: i32) -> (TempDir, CargoToolchain, DistConfig) {
  let temp = TempDir::new().unwrap();
  let shim = temp.path().join("target").join("shim.exe");
  std::fs::create_dir_all(shim.parent().unwrap()).unwrap();
  std::fs::write(&shim, vec![1u8; 1536]).unwrap();

  let cargo = script(
    temp.path(),
    "cargo",
    &format!(
      "echo '{{\"reason\":\"compiler-artifact\",\"executable\":\"{}\"}}'\nexit {exit}",
      shim.display()
    ),
  );
  let rustup = script(temp.path(), "rustup", "exit 1");
  let toolchain = CargoToolchain { cargo, rustup };

  let mut config = DistConfig::with_root(temp.path().join("ws"));
  config.host_os = Some(Os::Windows);
  (temp, toolchain, config)
}

fn args(tokens: &[&str]) -> BuildArgs {
  BuildArgs::parse(tokens.iter().map(|t| t.to_string()))
}

#[test]
fn normal_build_keeps_extension_after_rename() {
  let (_temp, toolchain, config) = setup(0);

  let outcome = run_build(&config, &args(&[]), &toolchain, &mut NullReporter).unwrap();

  let dest = config.root_dir.join("out").join("bin").join("nvim.exe");
  assert!(dest.is_file());
  assert_eq!(outcome.artifacts.len(), 1);
  // 1536 bytes is exactly 1.5 KiB, which rounds half to even.
  assert_eq!(outcome.artifacts[0].size_kib, 2);
  assert!(outcome.kept_output_dir());
}

#[test]
fn dist_build_on_windows_host_writes_zip() {
  let (_temp, toolchain, config) = setup(0);

  let outcome = run_build(
    &config,
    &args(&["--dist", "--target=x86_64-pc-windows-msvc"]),
    &toolchain,
    &mut NullReporter,
  )
  .unwrap();

  let archive = config.root_dir.join("nrtm-x86_64-pc-windows-msvc.zip");
  assert_eq!(outcome.archive.unwrap().archive, archive);
  assert!(archive.is_file());
  assert!(!config.root_dir.join("nrtm-x86_64-pc-windows-msvc").exists());
}

#[test]
fn failed_build_reports_exit_code() {
  let (_temp, toolchain, config) = setup(2);

  let err = run_build(&config, &args(&["--dist"]), &toolchain, &mut NullReporter).unwrap_err();

  assert!(matches!(err, DistError::BuildFailed { code: Some(2), .. }));
  assert!(!config.root_dir.exists());
}
