//! CLI output formatting utilities.
//!
//! Transcript lines (what was copied or archived, and how big it is) go to
//! stdout. Progress and diagnostics go to stderr so the transcript stays
//! clean when piped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use owo_colors::{OwoColorize, Stream};

use nrtm_dist_lib::report::{ArchiveReport, CopiedArtifact, Reporter, relative_display, transcript_line};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  eprintln!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stderr, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  eprintln!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stderr, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// Prints the build transcript with paths relative to the output root.
pub struct TranscriptReporter {
  root: PathBuf,
}

impl TranscriptReporter {
  pub fn new(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
    }
  }

  fn line(&self, from: &str, to: &Path, size_kib: u64) -> String {
    transcript_line(from, &relative_display(&self.root, to), size_kib)
  }
}

impl Reporter for TranscriptReporter {
  fn stage(&mut self, message: &str) {
    eprintln!(
      "{} {}...",
      symbols::ARROW.if_supports_color(Stream::Stderr, |s| s.cyan()),
      message
    );
  }

  fn copied(&mut self, artifact: &CopiedArtifact) {
    println!(
      "{}",
      self.line(&artifact.source.display().to_string(), &artifact.dest, artifact.size_kib)
    );
  }

  fn archived(&mut self, report: &ArchiveReport) {
    let from = format!("{}/", relative_display(&self.root, &report.source_dir));
    println!("{}", self.line(&from, &report.archive, report.size_kib));
  }

  fn installer(&mut self, artifact: &CopiedArtifact) {
    println!(
      "{}",
      self.line(&artifact.source.display().to_string(), &artifact.dest, artifact.size_kib)
    );
  }
}
