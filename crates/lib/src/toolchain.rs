//! Invocation of cargo and rustup.
//!
//! [`Toolchain`] is the seam between the orchestrator and the external
//! programs, so runs can be tested without compiling anything.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{DistError, Result};
use crate::target::BuildTarget;

/// Helper crate providing `cargo zigbuild` for static-libc targets.
pub const ZIGBUILD_CRATE: &str = "cargo-zigbuild";

/// The cargo subcommand that compiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildSubcommand {
  #[default]
  Build,
  /// `cargo zigbuild`, links through zig for fully static musl binaries.
  Zigbuild,
}

impl BuildSubcommand {
  pub fn for_target(target: Option<&BuildTarget>) -> Self {
    match target {
      Some(t) if t.is_static_libc() => Self::Zigbuild,
      _ => Self::Build,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Build => "build",
      Self::Zigbuild => "zigbuild",
    }
  }
}

/// A full cargo build invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildCommand {
  pub subcommand: BuildSubcommand,
  /// Forwarded user tokens.
  pub args: Vec<String>,
  /// Appended as `--package <name>` unless the args already select one
  /// and `force_package` is off.
  pub package: Option<String>,
  /// Drop any package selection from `args` so `package` is always built.
  pub force_package: bool,
  /// Extra environment for the cargo process.
  pub envs: Vec<(String, OsString)>,
}

impl BuildCommand {
  pub fn new(subcommand: BuildSubcommand, args: Vec<String>, package: Option<String>) -> Self {
    Self {
      subcommand,
      args,
      package,
      force_package: false,
      envs: Vec::new(),
    }
  }

  /// Build `package` even when the forwarded args select another one.
  pub fn forced(mut self) -> Self {
    self.force_package = true;
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
    self.envs.push((key.into(), value.into()));
    self
  }

  /// Arguments after the cargo program:
  /// `{subcommand} --message-format json <args> [--package <name>]`.
  pub fn to_args(&self) -> Vec<String> {
    let mut out = vec![
      self.subcommand.as_str().to_string(),
      "--message-format".to_string(),
      "json".to_string(),
    ];

    let Some(package) = &self.package else {
      out.extend(self.args.iter().cloned());
      return out;
    };

    if self.force_package {
      out.extend(without_package_selection(&self.args));
    } else {
      out.extend(self.args.iter().cloned());
      if self.args.iter().any(|a| is_package_flag(a)) {
        return out;
      }
    }
    out.push("--package".to_string());
    out.push(package.clone());

    out
  }
}

/// `-p`, `--package`, or their attached-value forms `-pNAME`, `--package=NAME`.
fn is_package_flag(arg: &str) -> bool {
  arg == "--package" || arg == "-p" || arg.starts_with("--package=") || (arg.starts_with("-p") && arg.len() > 2)
}

/// `args` minus every package selection and its value.
fn without_package_selection(args: &[String]) -> Vec<String> {
  let mut out = Vec::with_capacity(args.len());
  let mut iter = args.iter();
  while let Some(arg) = iter.next() {
    if arg == "--package" || arg == "-p" {
      iter.next();
      continue;
    }
    if is_package_flag(arg) {
      continue;
    }
    out.push(arg.clone());
  }
  out
}

/// External programs a run depends on.
pub trait Toolchain {
  /// Register a cross-compilation target with the toolchain.
  fn add_target(&self, target: &BuildTarget) -> Result<()>;

  /// Make sure `cargo zigbuild` is available.
  fn install_zigbuild(&self) -> Result<()>;

  /// Run a build and return its stdout. A failed build is an error.
  fn build(&self, command: &BuildCommand) -> Result<String>;

  /// Directory of the workspace root manifest.
  fn workspace_root(&self) -> Result<PathBuf>;
}

/// The real toolchain: `cargo` and `rustup` processes.
#[derive(Debug, Clone)]
pub struct CargoToolchain {
  pub cargo: PathBuf,
  pub rustup: PathBuf,
}

impl Default for CargoToolchain {
  fn default() -> Self {
    Self {
      cargo: PathBuf::from("cargo"),
      rustup: PathBuf::from("rustup"),
    }
  }
}

impl CargoToolchain {
  /// Programs from `CARGO` and `NRTM_DIST_RUSTUP`, falling back to `PATH`.
  pub fn from_env() -> Self {
    let default = Self::default();
    Self {
      cargo: std::env::var_os("CARGO").map(PathBuf::from).unwrap_or(default.cargo),
      rustup: std::env::var_os("NRTM_DIST_RUSTUP")
        .map(PathBuf::from)
        .unwrap_or(default.rustup),
    }
  }
}

#[derive(Deserialize)]
struct LocateProject {
  root: PathBuf,
}

impl Toolchain for CargoToolchain {
  fn add_target(&self, target: &BuildTarget) -> Result<()> {
    info!(target = %target, "registering build target");
    let mut command = Command::new(&self.rustup);
    command.args(["target", "add", target.as_str()]);

    let status = run_status(&mut command, &self.rustup)?;
    if !status.success() {
      return Err(DistError::TargetAdd {
        target: target.to_string(),
        code: status.code(),
      });
    }
    Ok(())
  }

  fn install_zigbuild(&self) -> Result<()> {
    info!(helper = ZIGBUILD_CRATE, "installing static build helper");
    let mut command = Command::new(&self.cargo);
    command.args(["install", "--locked", ZIGBUILD_CRATE]);

    let status = run_status(&mut command, &self.cargo)?;
    if !status.success() {
      return Err(DistError::HelperInstallFailed {
        helper: ZIGBUILD_CRATE.to_string(),
        code: status.code(),
      });
    }
    Ok(())
  }

  fn build(&self, build: &BuildCommand) -> Result<String> {
    let args = build.to_args();
    let mut command = Command::new(&self.cargo);
    command.args(&args);
    for (key, value) in &build.envs {
      command.env(key, value);
    }

    info!(command = %render(&self.cargo, &args), "running build");
    let stdout = run_stdout(&mut command, &self.cargo)?;
    Ok(stdout)
  }

  fn workspace_root(&self) -> Result<PathBuf> {
    let args = ["locate-project", "--workspace", "--message-format", "json"];
    let mut command = Command::new(&self.cargo);
    command.args(args);

    let json = run_stdout(&mut command, &self.cargo)?;
    let located: LocateProject =
      serde_json::from_str(json.trim()).map_err(|e| DistError::WorkspaceRoot(e.to_string()))?;

    let root = located
      .root
      .parent()
      .map(|p| p.to_path_buf())
      .ok_or_else(|| DistError::WorkspaceRoot(format!("{} has no parent", located.root.display())))?;
    debug!(root = %root.display(), "located workspace root");
    Ok(root)
  }
}

fn render(program: &Path, args: &[impl AsRef<str>]) -> String {
  let mut out = program.display().to_string();
  for arg in args {
    out.push(' ');
    out.push_str(arg.as_ref());
  }
  out
}

fn spawn_err(program: &Path) -> impl FnOnce(std::io::Error) -> DistError + '_ {
  move |e| DistError::Spawn {
    program: program.display().to_string(),
    source: e,
  }
}

fn run_status(command: &mut Command, program: &Path) -> Result<std::process::ExitStatus> {
  command
    .stdin(Stdio::inherit())
    .stdout(Stdio::inherit())
    .stderr(Stdio::inherit())
    .status()
    .map_err(spawn_err(program))
}

/// Run to completion with stdout captured; stderr goes to the terminal.
fn run_stdout(command: &mut Command, program: &Path) -> Result<String> {
  let output = command
    .stdin(Stdio::inherit())
    .stderr(Stdio::inherit())
    .output()
    .map_err(spawn_err(program))?;

  if !output.status.success() {
    let args: Vec<String> = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
    return Err(DistError::BuildFailed {
      command: render(program, &args),
      code: output.status.code(),
    });
  }

  String::from_utf8(output.stdout).map_err(|_| DistError::NonUtf8Output {
    program: program.display().to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn build_command_renders_json_format_and_package() {
    let command = BuildCommand::new(
      BuildSubcommand::Build,
      strings(&["--release", "--target", "x86_64-pc-windows-msvc"]),
      Some("nrtm".to_string()),
    );

    assert_eq!(
      command.to_args(),
      strings(&[
        "build",
        "--message-format",
        "json",
        "--release",
        "--target",
        "x86_64-pc-windows-msvc",
        "--package",
        "nrtm",
      ])
    );
  }

  #[test]
  fn user_package_selection_wins() {
    let cases: [&[&str]; 4] = [&["-p", "other"], &["--package", "other"], &["--package=other"], &["-pother"]];
    for args in cases {
      let command = BuildCommand::new(BuildSubcommand::Build, strings(args), Some("nrtm".to_string()));
      assert!(!command.to_args().ends_with(&strings(&["--package", "nrtm"])), "{args:?}");
    }
  }

  #[test]
  fn forced_package_replaces_user_selection() {
    let cases: [&[&str]; 4] = [
      &["-p", "nrtm", "--release"],
      &["--package", "nrtm", "--release"],
      &["--package=nrtm", "--release"],
      &["-pnrtm", "--release"],
    ];
    for args in cases {
      let command = BuildCommand::new(
        BuildSubcommand::Build,
        strings(args),
        Some("nrtm-installer".to_string()),
      )
      .forced();
      assert_eq!(
        command.to_args(),
        strings(&[
          "build",
          "--message-format",
          "json",
          "--release",
          "--package",
          "nrtm-installer"
        ]),
        "{args:?}"
      );
    }
  }

  #[test]
  fn no_package_configured() {
    let command = BuildCommand::new(BuildSubcommand::Zigbuild, vec![], None);
    assert_eq!(command.to_args(), strings(&["zigbuild", "--message-format", "json"]));
  }

  #[test]
  fn musl_targets_use_zigbuild() {
    let musl = BuildTarget::new("x86_64-unknown-linux-musl");
    let gnu = BuildTarget::new("x86_64-unknown-linux-gnu");
    assert_eq!(BuildSubcommand::for_target(Some(&musl)), BuildSubcommand::Zigbuild);
    assert_eq!(BuildSubcommand::for_target(Some(&gnu)), BuildSubcommand::Build);
    assert_eq!(BuildSubcommand::for_target(None), BuildSubcommand::Build);
  }

  #[test]
  #[serial]
  fn from_env_reads_program_overrides() {
    temp_env::with_vars(
      [("CARGO", Some("/opt/cargo")), ("NRTM_DIST_RUSTUP", Some("/opt/rustup"))],
      || {
        let toolchain = CargoToolchain::from_env();
        assert_eq!(toolchain.cargo, PathBuf::from("/opt/cargo"));
        assert_eq!(toolchain.rustup, PathBuf::from("/opt/rustup"));
      },
    );
  }

  #[test]
  #[serial]
  fn from_env_defaults_to_path_lookup() {
    temp_env::with_vars_unset(["CARGO", "NRTM_DIST_RUSTUP"], || {
      let toolchain = CargoToolchain::from_env();
      assert_eq!(toolchain.cargo, PathBuf::from("cargo"));
      assert_eq!(toolchain.rustup, PathBuf::from("rustup"));
    });
  }

  #[test]
  fn missing_program_is_a_spawn_error() {
    let toolchain = CargoToolchain {
      cargo: PathBuf::from("/nonexistent/cargo"),
      rustup: PathBuf::from("/nonexistent/rustup"),
    };

    let result = toolchain.build(&BuildCommand::default());
    assert!(matches!(result, Err(DistError::Spawn { .. })));

    let result = toolchain.add_target(&BuildTarget::new("x"));
    assert!(matches!(result, Err(DistError::Spawn { .. })));
  }

  #[cfg(unix)]
  mod scripts {
    use super::*;
    use crate::util::testutil::write_script;
    use tempfile::TempDir;

    #[test]
    fn build_captures_stdout() {
      let temp = TempDir::new().unwrap();
      let cargo = write_script(
        temp.path(),
        "cargo",
        r#"echo "{\"executable\":\"/t/shim\"}"
echo "$@" >&2"#,
      );
      let toolchain = CargoToolchain {
        cargo,
        rustup: PathBuf::from("rustup"),
      };

      let stdout = toolchain.build(&BuildCommand::default()).unwrap();
      assert_eq!(stdout.trim(), r#"{"executable":"/t/shim"}"#);
    }

    #[test]
    fn build_passes_extra_env() {
      let temp = TempDir::new().unwrap();
      let cargo = write_script(temp.path(), "cargo", r#"echo "$NRTM_DIST_ARCHIVE""#);
      let toolchain = CargoToolchain {
        cargo,
        rustup: PathBuf::from("rustup"),
      };

      let command = BuildCommand::default().env("NRTM_DIST_ARCHIVE", "/work/nrtm.zip");
      assert_eq!(toolchain.build(&command).unwrap().trim(), "/work/nrtm.zip");
    }

    #[test]
    fn failed_build_reports_exit_code() {
      let temp = TempDir::new().unwrap();
      let cargo = write_script(temp.path(), "cargo", "echo '{\"executable\":\"/t/shim\"}'\nexit 1");
      let toolchain = CargoToolchain {
        cargo,
        rustup: PathBuf::from("rustup"),
      };

      let result = toolchain.build(&BuildCommand::default());
      assert!(matches!(result, Err(DistError::BuildFailed { code: Some(1), .. })));
    }

    #[test]
    fn failed_helper_install_is_reported() {
      let temp = TempDir::new().unwrap();
      let cargo = write_script(temp.path(), "cargo", "exit 101");
      let toolchain = CargoToolchain {
        cargo,
        rustup: PathBuf::from("rustup"),
      };

      let result = toolchain.install_zigbuild();
      assert!(matches!(result, Err(DistError::HelperInstallFailed { code: Some(101), .. })));
    }

    #[test]
    fn failed_target_add_names_the_target() {
      let temp = TempDir::new().unwrap();
      let rustup = write_script(temp.path(), "rustup", "exit 1");
      let toolchain = CargoToolchain {
        cargo: PathBuf::from("cargo"),
        rustup,
      };

      let err = toolchain.add_target(&BuildTarget::new("aarch64-apple-darwin")).unwrap_err();
      assert!(matches!(err, DistError::TargetAdd { code: Some(1), .. }));
      assert_eq!(err.to_string(), "failed to add target aarch64-apple-darwin (exit code Some(1))");
    }

    #[test]
    fn workspace_root_is_manifest_parent() {
      let temp = TempDir::new().unwrap();
      let cargo = write_script(temp.path(), "cargo", r#"echo '{"root":"/work/space/Cargo.toml"}'"#);
      let toolchain = CargoToolchain {
        cargo,
        rustup: PathBuf::from("rustup"),
      };

      assert_eq!(toolchain.workspace_root().unwrap(), PathBuf::from("/work/space"));
    }

    #[test]
    fn workspace_root_rejects_garbage() {
      let temp = TempDir::new().unwrap();
      let cargo = write_script(temp.path(), "cargo", "echo nope");
      let toolchain = CargoToolchain {
        cargo,
        rustup: PathBuf::from("rustup"),
      };

      assert!(matches!(toolchain.workspace_root(), Err(DistError::WorkspaceRoot(_))));
    }
  }
}
