//! nrtm-dist-lib: build and distribution wrapper around `cargo build`.
//!
//! A run goes through four stages:
//! - `args`: interpret the wrapper's own flags, forward the rest to cargo
//! - `toolchain`: register the target and run the build with JSON output
//! - `artifact`: copy the produced executables into `{root}[-target]/bin`
//! - `package`: archive the staging directory in distribution mode
//!
//! `dist::run_build` drives them in that order.

pub mod args;
pub mod artifact;
pub mod config;
pub mod dist;
pub mod error;
pub mod layout;
pub mod package;
pub mod platform;
pub mod report;
pub mod shell;
pub mod target;
pub mod toolchain;
pub mod util;

pub use error::{DistError, Result};
