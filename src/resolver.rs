//! Mapping of asset references to files on disk.

use std::path::{Component, Path, PathBuf};

use crate::config::CachebusterConfig;
use crate::fs::AssetFs;
use crate::reference::AssetReference;

/// Outcome of resolving a reference against the configured base directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAsset {
  /// The asset exists at this absolute path.
  Found(PathBuf),
  /// Nothing exists at the candidate path.
  NotFound(PathBuf),
}

/// Resolves references against `cssPath` (relative references) or `imagesPath` (references
/// starting with `/`).
///
/// The branch is picked solely on the leading slash. Configured bases are relative to the
/// project root even when written with a leading `/`. A missing base resolves against the root
/// itself.
#[derive(Debug, Clone)]
pub struct PathResolver {
  root: PathBuf,
  css_base: Option<PathBuf>,
  images_base: Option<PathBuf>,
}

impl PathResolver {
  /// Build a resolver. `source_dir` stands in for `cssPath` when the latter is unset.
  pub fn new(config: &CachebusterConfig, source_dir: Option<&Path>) -> Self {
    let root = match &config.root {
      Some(root) => root.clone(),
      None => std::env::current_dir().unwrap_or_default(),
    };
    let css_base = match (&config.css_path, source_dir) {
      (Some(base), _) => Some(under_root(&root, base)),
      (None, dir) => dir.map(Path::to_path_buf),
    };
    let images_base = config.images_path.as_deref().map(|base| under_root(&root, base));
    Self {
      root,
      css_base,
      images_base,
    }
  }

  /// Absolute, lexically normalised path the reference points at.
  pub fn candidate(&self, reference: &AssetReference) -> PathBuf {
    let decoded = reference.decoded_path();
    let joined = if reference.is_root_relative() {
      self.join_base(self.images_base.as_deref(), decoded.trim_start_matches('/'))
    } else {
      self.join_base(self.css_base.as_deref(), &decoded)
    };

    let absolute = std::path::absolute(&joined).unwrap_or(joined);
    normalize(&absolute)
  }

  /// Resolve the reference and check that the asset exists.
  pub fn resolve<F: AssetFs + ?Sized>(&self, reference: &AssetReference, fs: &F) -> ResolvedAsset {
    let candidate = self.candidate(reference);
    if !reference.path().is_empty() && fs.exists(&candidate) {
      ResolvedAsset::Found(candidate)
    } else {
      ResolvedAsset::NotFound(candidate)
    }
  }

  fn join_base(&self, base: Option<&Path>, relative: &str) -> PathBuf {
    base.unwrap_or(&self.root).join(relative)
  }
}

/// `root` joined with `base` stripped of any root or prefix component.
fn under_root(root: &Path, base: &Path) -> PathBuf {
  let relative: PathBuf = base
    .components()
    .filter(|component| !matches!(component, Component::RootDir | Component::Prefix(_)))
    .collect();
  root.join(relative)
}

/// Fold `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
  let mut result = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if matches!(result.components().next_back(), Some(Component::Normal(_))) {
          result.pop();
        } else if !result.has_root() {
          result.push(component);
        }
      }
      other => result.push(other),
    }
  }
  result
}
