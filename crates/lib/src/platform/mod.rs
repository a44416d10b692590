//! Host platform detection.
//!
//! The packager only cares about the operating system (it picks the archive
//! format), `info` prints the full `arch-os` pair.

pub mod arch;
pub mod os;

use std::fmt;

use arch::Arch;
use os::Os;

/// Host identifier combining architecture and OS (e.g. "x86_64-windows")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Returns `None` if the OS or architecture is not one we know
  pub fn current() -> Option<Self> {
    Some(Self {
      arch: Arch::current()?,
      os: Os::current()?,
    })
  }

  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}
