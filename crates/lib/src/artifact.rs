//! Collection of executables from cargo's JSON build log.
//!
//! Each stdout line of `cargo build --message-format json` is one message.
//! Only `executable` is read; the rest of the message is ignored.

use std::ffi::{OsStr, OsString};
use std::fs::{self, FileTimes};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{DistError, Result};
use crate::report::{CopiedArtifact, Reporter};

/// One line of the build log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
  /// The line names a produced executable.
  Executable(PathBuf),
  /// Blank, malformed, or a message without an executable.
  Ignorable,
}

#[derive(Deserialize)]
struct CargoMessage {
  #[serde(default)]
  executable: Option<String>,
}

/// Classify a single build log line.
pub fn parse_line(line: &str) -> LogLine {
  let line = line.trim();
  if line.is_empty() {
    return LogLine::Ignorable;
  }

  match serde_json::from_str::<CargoMessage>(line) {
    Ok(CargoMessage {
      executable: Some(path),
    }) if !path.is_empty() => LogLine::Executable(PathBuf::from(path)),
    Ok(_) => LogLine::Ignorable,
    Err(e) => {
      debug!(error = %e, "ignoring unparseable build log line");
      LogLine::Ignorable
    }
  }
}

/// All executables named in a build log, in order.
pub fn executables(stdout: &str) -> Vec<PathBuf> {
  stdout
    .lines()
    .filter_map(|line| match parse_line(line) {
      LogLine::Executable(path) => Some(path),
      LogLine::Ignorable => None,
    })
    .collect()
}

/// Renames a generic binary to the product name, keeping its extensions.
///
/// A basename matches when it is `from` followed by zero or more `.segment`
/// parts, where a segment is one or more word characters (alphanumerics or
/// `_`). `shim.debug.pdb` becomes `nvim.debug.pdb`; `shimmer.exe` is left
/// alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRule {
  pub from: String,
  pub to: String,
}

impl Default for RenameRule {
  fn default() -> Self {
    Self::new("shim", "nvim")
  }
}

impl RenameRule {
  pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
    Self {
      from: from.into(),
      to: to.into(),
    }
  }

  pub fn apply(&self, basename: &str) -> String {
    match self.extensions(basename) {
      Some(extensions) => format!("{}{extensions}", self.to),
      None => basename.to_string(),
    }
  }

  /// Like [`RenameRule::apply`], non UTF-8 names never match.
  pub fn apply_os(&self, basename: &OsStr) -> OsString {
    match basename.to_str() {
      Some(name) => OsString::from(self.apply(name)),
      None => basename.to_os_string(),
    }
  }

  /// The extension part of a matching basename, `None` if it does not match.
  fn extensions<'a>(&self, basename: &'a str) -> Option<&'a str> {
    let rest = basename.strip_prefix(self.from.as_str())?;
    if rest.is_empty() {
      return Some(rest);
    }

    let segments = rest.strip_prefix('.')?;
    let valid = segments
      .split('.')
      .all(|s| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_'));

    valid.then_some(rest)
  }
}

/// Size of a file in KiB, `round(bytes / 1024)` with ties to even.
pub fn size_kib(path: &Path) -> Result<u64> {
  let meta = fs::metadata(path).map_err(|e| DistError::Metadata {
    path: path.to_path_buf(),
    source: e,
  })?;
  Ok(bytes_to_kib(meta.len()))
}

pub(crate) fn bytes_to_kib(bytes: u64) -> u64 {
  (bytes as f64 / 1024.0).round_ties_even() as u64
}

/// Create `dir` and its parents; fine if it already exists.
pub fn ensure_dir(dir: &Path) -> Result<()> {
  fs::create_dir_all(dir).map_err(|e| DistError::CreateDir {
    path: dir.to_path_buf(),
    source: e,
  })
}

/// Copy each executable into `bin_dir` under its renamed basename.
///
/// The first failure stops the collection; nothing is rolled back.
pub fn collect(
  executables: &[PathBuf],
  bin_dir: &Path,
  rule: &RenameRule,
  preserve_metadata: bool,
  reporter: &mut dyn Reporter,
) -> Result<Vec<CopiedArtifact>> {
  ensure_dir(bin_dir)?;

  let mut copied = Vec::with_capacity(executables.len());
  for source in executables {
    let Some(basename) = source.file_name() else {
      debug!(path = %source.display(), "executable path has no file name, skipping");
      continue;
    };

    let dest = bin_dir.join(rule.apply_os(basename));
    copy_file(source, &dest, preserve_metadata)?;

    let artifact = CopiedArtifact {
      source: source.clone(),
      size_kib: size_kib(&dest)?,
      dest,
    };
    info!(from = %artifact.source.display(), to = %artifact.dest.display(), "copied executable");
    reporter.copied(&artifact);
    copied.push(artifact);
  }

  Ok(copied)
}

/// Copy `from` to `to`, permissions included, optionally with file times.
pub fn copy_file(from: &Path, to: &Path, preserve_metadata: bool) -> Result<()> {
  let copy_err = |e| DistError::Copy {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    source: e,
  };

  fs::copy(from, to).map_err(copy_err)?;
  if preserve_metadata {
    copy_times(from, to).map_err(copy_err)?;
  }
  Ok(())
}

fn copy_times(from: &Path, to: &Path) -> std::io::Result<()> {
  let meta = fs::metadata(from)?;
  let times = FileTimes::new()
    .set_accessed(meta.accessed()?)
    .set_modified(meta.modified()?);

  // Owners may set times through a read-only handle on Unix; Windows needs
  // write access for SetFileTime.
  #[cfg(windows)]
  let file = fs::OpenOptions::new().write(true).open(to)?;
  #[cfg(not(windows))]
  let file = fs::File::open(to)?;

  file.set_times(times)
}
