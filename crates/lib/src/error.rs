//! Error type shared by every stage of a build.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a build or dist run.
#[derive(Debug, Error)]
pub enum DistError {
  /// An external program could not be started.
  #[error("failed to run {program}: {source}")]
  Spawn { program: String, source: std::io::Error },

  /// The toolchain build exited unsuccessfully.
  #[error("build failed with exit code {code:?}: {command}")]
  BuildFailed { command: String, code: Option<i32> },

  /// `rustup target add` exited unsuccessfully.
  #[error("failed to add target {target} (exit code {code:?})")]
  TargetAdd { target: String, code: Option<i32> },

  /// Installing the static-libc build helper failed.
  #[error("failed to install {helper} (exit code {code:?})")]
  HelperInstallFailed { helper: String, code: Option<i32> },

  /// The toolchain wrote something other than UTF-8 to stdout.
  #[error("{program} produced non UTF-8 output")]
  NonUtf8Output { program: String },

  /// The workspace root could not be located.
  #[error("cannot locate workspace root: {0}")]
  WorkspaceRoot(String),

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
  Copy {
    from: PathBuf,
    to: PathBuf,
    source: std::io::Error,
  },

  #[error("failed to read metadata of {}: {source}", path.display())]
  Metadata { path: PathBuf, source: std::io::Error },

  #[error("failed to write archive {}: {source}", path.display())]
  Archive { path: PathBuf, source: std::io::Error },

  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("failed to remove directory {}: {source}", path.display())]
  RemoveDir { path: PathBuf, source: std::io::Error },

  #[error("failed to remove file {}: {source}", path.display())]
  RemoveFile { path: PathBuf, source: std::io::Error },

  /// The installer package build produced no executable.
  #[error("package {package} produced no executable")]
  MissingInstaller { package: String },

  /// The development shell could not be prepared or started.
  #[error("shell error: {0}")]
  Shell(String),
}

pub type Result<T> = std::result::Result<T, DistError>;
