//! Cross-compilation target triples.

use std::fmt;

/// A cross-compilation triple given with `--target`.
///
/// The value is not validated; an unknown triple fails later in `rustup` or
/// `cargo` with their own diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildTarget(String);

impl BuildTarget {
  pub fn new(triple: impl Into<String>) -> Self {
    Self(triple.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Whether the triple links the C library statically (musl targets).
  ///
  /// These are built through `cargo zigbuild` instead of `cargo build`.
  pub fn is_static_libc(&self) -> bool {
    self.0.contains("-musl")
  }

  /// Suffix appended to output names, e.g. `-x86_64-unknown-linux-musl`.
  pub fn suffix(&self) -> String {
    format!("-{}", self.0)
  }
}

impl fmt::Display for BuildTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Suffix for an optional target; empty when building for the host.
pub fn target_suffix(target: Option<&BuildTarget>) -> String {
  target.map(BuildTarget::suffix).unwrap_or_default()
}
