//! Filesystem access used to resolve and fingerprint assets.
//!
//! The engine never touches `std::fs` directly so it can run against an in-memory tree with
//! fixed timestamps and contents.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Filesystem collaborator queried for each resolved reference.
pub trait AssetFs {
  /// Returns `true` when a regular file exists at `path`.
  fn exists(&self, path: &Path) -> bool;

  /// Last modification time of `path` in milliseconds since the Unix epoch.
  fn mtime_millis(&self, path: &Path) -> io::Result<u64>;

  /// Full contents of the file at `path`.
  fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// [`AssetFs`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl AssetFs for DiskFs {
  fn exists(&self, path: &Path) -> bool {
    path.is_file()
  }

  fn mtime_millis(&self, path: &Path) -> io::Result<u64> {
    let modified = fs::metadata(path)?.modified()?;
    let elapsed = modified
      .duration_since(UNIX_EPOCH)
      .map_err(|err| io::Error::new(ErrorKind::InvalidData, err))?;
    u64::try_from(elapsed.as_millis()).map_err(|err| io::Error::new(ErrorKind::InvalidData, err))
  }

  fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
  }
}

#[derive(Debug, Clone)]
struct MemoryFile {
  contents: Vec<u8>,
  mtime_millis: u64,
}

/// In-memory [`AssetFs`] with fixed timestamps, keyed by exact path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
  files: BTreeMap<PathBuf, MemoryFile>,
}

impl MemoryFs {
  /// Create an empty tree.
  pub fn new() -> Self {
    Self::default()
  }

  /// Add or replace a file.
  pub fn insert(
    &mut self,
    path: impl Into<PathBuf>,
    contents: impl Into<Vec<u8>>,
    mtime_millis: u64,
  ) -> &mut Self {
    self.files.insert(path.into(), MemoryFile {
      contents: contents.into(),
      mtime_millis,
    });
    self
  }

  /// Builder flavour of [`MemoryFs::insert`].
  pub fn with_file(
    mut self,
    path: impl Into<PathBuf>,
    contents: impl Into<Vec<u8>>,
    mtime_millis: u64,
  ) -> Self {
    self.insert(path, contents, mtime_millis);
    self
  }

  fn get(&self, path: &Path) -> io::Result<&MemoryFile> {
    self.files.get(path).ok_or_else(|| {
      io::Error::new(
        ErrorKind::NotFound,
        format!("{} is not in the in-memory tree", path.display()),
      )
    })
  }
}

impl AssetFs for MemoryFs {
  fn exists(&self, path: &Path) -> bool {
    self.files.contains_key(path)
  }

  fn mtime_millis(&self, path: &Path) -> io::Result<u64> {
    self.get(path).map(|file| file.mtime_millis)
  }

  fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
    self.get(path).map(|file| file.contents.clone())
  }
}
