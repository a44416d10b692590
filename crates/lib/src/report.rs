//! Progress reporting for a build run.
//!
//! The library never prints. Each step hands its result to a [`Reporter`];
//! the CLI turns those into the transcript on stdout.

use std::path::{Path, PathBuf};

/// One executable copied into the output layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedArtifact {
  pub source: PathBuf,
  pub dest: PathBuf,
  pub size_kib: u64,
}

/// The archive written by the packager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
  /// Staging directory that was archived (and then removed).
  pub source_dir: PathBuf,
  pub archive: PathBuf,
  pub size_kib: u64,
}

/// Receives the steps of a run as they happen.
pub trait Reporter {
  /// A new phase started, e.g. compiling a package.
  fn stage(&mut self, _message: &str) {}

  fn copied(&mut self, artifact: &CopiedArtifact);

  fn archived(&mut self, report: &ArchiveReport);

  /// The installer binary replaced the archive.
  fn installer(&mut self, artifact: &CopiedArtifact);
}

/// Reporter that drops everything.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
  fn copied(&mut self, _artifact: &CopiedArtifact) {}

  fn archived(&mut self, _report: &ArchiveReport) {}

  fn installer(&mut self, _artifact: &CopiedArtifact) {}
}

/// Display `path` as `./relative` when it lives under `root`.
pub fn relative_display(root: &Path, path: &Path) -> String {
  match path.strip_prefix(root) {
    Ok(rel) => format!("./{}", rel.display()),
    Err(_) => path.display().to_string(),
  }
}

/// A transcript line: `{from} --> {to}  # {kib} KB`.
pub fn transcript_line(from: &str, to: &str, size_kib: u64) -> String {
  format!("{from} --> {to}  # {size_kib} KB")
}
