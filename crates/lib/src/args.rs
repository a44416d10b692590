//! Scanning of the arguments given to `nrtm-dist build`.
//!
//! Only a handful of flags mean something to the wrapper. Everything else is
//! forwarded to cargo untouched and in order.

use crate::target::BuildTarget;

pub const DIST_FLAG: &str = "--dist";
pub const INSTALLER_FLAG: &str = "--installer";
pub const TARGET_FLAG: &str = "--target";

const RELEASE_FLAGS: [&str; 2] = ["--release", "-r"];

/// The interpreted build invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArgs {
  /// Package the output into an archive and remove the staging directory.
  pub dist: bool,
  /// Replace the archive with an installer binary embedding it.
  pub installer: bool,
  pub target: Option<BuildTarget>,
  /// Tokens forwarded to cargo, `--target` included.
  pub cargo_args: Vec<String>,
}

impl BuildArgs {
  /// Interpret raw tokens.
  ///
  /// `--dist` and `--installer` are removed. `--installer` implies `--dist`.
  /// A distribution build gets `--release` appended unless `--release` or
  /// `-r` is already there. The first `--target <triple>` or
  /// `--target=<triple>` selects the build target and is kept in the
  /// forwarded tokens.
  pub fn parse<I, S>(tokens: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut args = Self::default();

    for token in tokens {
      let token = token.into();
      match token.as_str() {
        DIST_FLAG => args.dist = true,
        INSTALLER_FLAG => {
          args.installer = true;
          args.dist = true;
        }
        _ => args.cargo_args.push(token),
      }
    }

    args.target = find_target(&args.cargo_args);

    if args.dist && !args.cargo_args.iter().any(|a| RELEASE_FLAGS.contains(&a.as_str())) {
      args.cargo_args.push(RELEASE_FLAGS[0].to_string());
    }

    args
  }
}

fn find_target(tokens: &[String]) -> Option<BuildTarget> {
  let index = tokens
    .iter()
    .position(|t| t == TARGET_FLAG || t.starts_with("--target="))?;
  let token = &tokens[index];

  if token == TARGET_FLAG {
    tokens.get(index + 1).map(|v| BuildTarget::new(v.as_str()))
  } else {
    token
      .strip_prefix("--target=")
      .filter(|v| !v.is_empty())
      .map(BuildTarget::new)
  }
}
