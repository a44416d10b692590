//! Packaging of the staging directory into a single archive.
//!
//! The host OS selects the format through [`FORMATS_BY_OS`]: zip on Windows,
//! gzip-compressed tar everywhere else. Each format is written by an
//! [`Archiver`].

use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::artifact::size_kib;
use crate::error::{DistError, Result};
use crate::layout::OutputLayout;
use crate::platform::os::Os;
use crate::report::{ArchiveReport, Reporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
  Zip,
  TarGz,
}

/// Archive format per host OS. Hosts not listed use [`DEFAULT_FORMAT`].
pub const FORMATS_BY_OS: &[(Os, ArchiveFormat)] = &[(Os::Windows, ArchiveFormat::Zip)];

pub const DEFAULT_FORMAT: ArchiveFormat = ArchiveFormat::TarGz;

impl ArchiveFormat {
  pub fn for_os(os: Option<Os>) -> Self {
    os.and_then(|os| FORMATS_BY_OS.iter().find(|(o, _)| *o == os).map(|(_, f)| *f))
      .unwrap_or(DEFAULT_FORMAT)
  }

  pub fn extension(&self) -> &'static str {
    match self {
      Self::Zip => "zip",
      Self::TarGz => "tar.gz",
    }
  }

  pub fn archiver(&self) -> &'static dyn Archiver {
    match self {
      Self::Zip => &ZipArchiver,
      Self::TarGz => &TarGzArchiver,
    }
  }

  /// `base` with this format's extension appended.
  pub fn archive_path(&self, base: &Path) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(self.extension());
    PathBuf::from(name)
  }
}

/// What the top level of the archive holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchiveRoot {
  /// The staging directory itself: `nrtm/bin/nvim`.
  #[default]
  StagingDir,
  /// The staging directory's contents: `bin/nvim`.
  Contents,
  /// The contents of `bin/`: `nvim`.
  BinContents,
}

/// A file or directory to put into an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
  pub path: PathBuf,
  /// `/`-separated name inside the archive.
  pub name: String,
  pub is_dir: bool,
}

/// Writes one archive format.
pub trait Archiver {
  fn format(&self) -> ArchiveFormat;

  fn write(&self, entries: &[ArchiveEntry], dest: &Path) -> Result<()>;
}

/// Zip container with stored (uncompressed) entries.
pub struct ZipArchiver;

/// Tar stream compressed with gzip.
pub struct TarGzArchiver;

fn archive_err(dest: &Path) -> impl Fn(io::Error) -> DistError + '_ {
  move |e| DistError::Archive {
    path: dest.to_path_buf(),
    source: e,
  }
}

impl Archiver for ZipArchiver {
  fn format(&self) -> ArchiveFormat {
    ArchiveFormat::Zip
  }

  fn write(&self, entries: &[ArchiveEntry], dest: &Path) -> Result<()> {
    let err = archive_err(dest);
    let file = File::create(dest).map_err(&err)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for entry in entries {
      if entry.is_dir {
        zip.add_directory(entry.name.as_str(), options)?;
        continue;
      }

      #[cfg(unix)]
      let options = {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&entry.path).map_err(&err)?.permissions().mode();
        options.unix_permissions(mode)
      };

      zip.start_file(entry.name.as_str(), options)?;
      let mut source = File::open(&entry.path).map_err(&err)?;
      io::copy(&mut source, &mut zip).map_err(&err)?;
    }

    zip.finish()?;
    Ok(())
  }
}

impl Archiver for TarGzArchiver {
  fn format(&self) -> ArchiveFormat {
    ArchiveFormat::TarGz
  }

  fn write(&self, entries: &[ArchiveEntry], dest: &Path) -> Result<()> {
    let err = archive_err(dest);
    let file = File::create(dest).map_err(&err)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut tar = tar::Builder::new(encoder);

    for entry in entries {
      if entry.is_dir {
        tar.append_dir(&entry.name, &entry.path).map_err(&err)?;
      } else {
        tar.append_path_with_name(&entry.path, &entry.name).map_err(&err)?;
      }
    }

    let encoder = tar.into_inner().map_err(&err)?;
    encoder.finish().map_err(&err)?;
    Ok(())
  }
}

/// List what goes into the archive, sorted by name, directories included.
pub fn archive_entries(layout: &OutputLayout, root: ArchiveRoot) -> Result<Vec<ArchiveEntry>> {
  let (walk_root, prefix) = match root {
    ArchiveRoot::StagingDir => (&layout.out_dir, Some(layout.out_name())),
    ArchiveRoot::Contents => (&layout.out_dir, None),
    ArchiveRoot::BinContents => (&layout.bin_dir, None),
  };

  let mut entries = Vec::new();
  for dir_entry in WalkDir::new(walk_root).sort_by_file_name() {
    let dir_entry = dir_entry.map_err(|e| DistError::Archive {
      path: walk_root.clone(),
      source: e.into(),
    })?;

    let rel = dir_entry.path().strip_prefix(walk_root).unwrap_or(dir_entry.path());
    let rel: Vec<String> = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();

    let name = match (&prefix, rel.is_empty()) {
      (Some(prefix), true) => prefix.clone(),
      (Some(prefix), false) => format!("{prefix}/{}", rel.join("/")),
      (None, true) => continue,
      (None, false) => rel.join("/"),
    };

    entries.push(ArchiveEntry {
      path: dir_entry.path().to_path_buf(),
      name,
      is_dir: dir_entry.file_type().is_dir(),
    });
  }

  Ok(entries)
}

/// Write the archive, removing a partially written file on failure.
fn write_or_discard(archiver: &dyn Archiver, entries: &[ArchiveEntry], dest: &Path) -> Result<()> {
  let result = archiver.write(entries, dest);
  if result.is_err() && dest.exists() {
    if let Err(e) = fs::remove_file(dest) {
      warn!(archive = %dest.display(), error = %e, "failed to remove partial archive");
    }
  }
  result
}

/// Archive the staging directory, report it, then remove the staging
/// directory. The archive is the only thing left afterwards.
pub fn package(
  layout: &OutputLayout,
  archive_base: &Path,
  format: ArchiveFormat,
  root: ArchiveRoot,
  reporter: &mut dyn Reporter,
) -> Result<ArchiveReport> {
  let archive = format.archive_path(archive_base);
  let entries = archive_entries(layout, root)?;
  debug!(entries = entries.len(), archive = %archive.display(), "writing archive");

  write_or_discard(format.archiver(), &entries, &archive)?;

  let report = ArchiveReport {
    source_dir: layout.out_dir.clone(),
    size_kib: size_kib(&archive)?,
    archive,
  };
  info!(archive = %report.archive.display(), size_kib = report.size_kib, "archive created");
  reporter.archived(&report);

  fs::remove_dir_all(&layout.out_dir).map_err(|e| DistError::RemoveDir {
    path: layout.out_dir.clone(),
    source: e,
  })?;

  Ok(report)
}
