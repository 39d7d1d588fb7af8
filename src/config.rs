//! Cachebuster configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "cachebuster.config.json";

/// Built-in token strategy selected by the `type` option.
///
/// Unknown names fall back to [`BustType::Mtime`]. Custom strategies are installed in code through
/// [`crate::Cachebuster::with_replacement_strategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BustType {
  /// Hex digest of the file contents.
  Checksum,
  /// Hex encoded modification time in milliseconds.
  #[default]
  #[serde(other)]
  Mtime,
}

/// Options recognised by the rewriting engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CachebusterConfig {
  /// Directory that `cssPath` and `imagesPath` are relative to. Defaults to the process working
  /// directory.
  pub root: Option<PathBuf>,
  /// Base directory for references that do not start with `/`, relative to `root` even when
  /// written with a leading `/`.
  ///
  /// When absent the directory of the stylesheet being processed is used, if known.
  pub css_path: Option<PathBuf>,
  /// Base directory for references starting with `/`, relative to `root`.
  pub images_path: Option<PathBuf>,
  /// Token strategy.
  #[serde(rename = "type")]
  pub bust_type: BustType,
  /// Digest name used by [`BustType::Checksum`].
  pub hash_algorithm: String,
  /// Query parameter prefix placed before the token.
  pub param_name: String,
  /// Replacement for the built-in set of eligible properties.
  pub supported_props: Option<Vec<String>>,
  /// Extra properties eligible for rewriting.
  pub additional_props: Vec<String>,
}

impl Default for CachebusterConfig {
  fn default() -> Self {
    Self {
      root: None,
      css_path: None,
      images_path: None,
      bust_type: BustType::Mtime,
      hash_algorithm: "md5".into(),
      param_name: "v".into(),
      supported_props: None,
      additional_props: Vec::new(),
    }
  }
}

impl CachebusterConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// A missing or malformed file yields the defaults.
  pub fn discover(dir: &Path) -> Self {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    match Self::from_path(&candidate) {
      Ok(config) => config,
      Err(err) => {
        if candidate.exists() {
          log::warn!("ignoring {}: {err:#}", candidate.display());
        }
        Self::default()
      }
    }
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path)
      .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
      .with_context(|| format!("failed to parse {}", path.display()))
  }

  /// Set the directory configured bases are relative to.
  pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
    self.root = Some(path.into());
    self
  }

  /// Set the base directory for relative references.
  pub fn css_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.css_path = Some(path.into());
    self
  }

  /// Set the base directory for root-relative references.
  pub fn images_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.images_path = Some(path.into());
    self
  }

  /// Use the checksum strategy with the given digest name.
  pub fn checksum(mut self, hash_algorithm: impl Into<String>) -> Self {
    self.bust_type = BustType::Checksum;
    self.hash_algorithm = hash_algorithm.into();
    self
  }

  /// Append an eligible property.
  pub fn additional_prop(mut self, property: impl Into<String>) -> Self {
    self.additional_props.push(property.into());
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn parses_camel_case_options() {
    let config: CachebusterConfig = serde_json::from_str(
      r#"{
        "cssPath": "public/css",
        "imagesPath": "public",
        "type": "checksum",
        "hashAlgorithm": "sha1",
        "additionalProps": ["mask-image"]
      }"#,
    )
    .unwrap();

    assert_eq!(config.css_path, Some(PathBuf::from("public/css")));
    assert_eq!(config.images_path, Some(PathBuf::from("public")));
    assert_eq!(config.bust_type, BustType::Checksum);
    assert_eq!(config.hash_algorithm, "sha1");
    assert_eq!(config.param_name, "v");
    assert_eq!(config.additional_props, vec!["mask-image".to_string()]);
  }

  #[test]
  fn reads_root_option() {
    let config: CachebusterConfig =
      serde_json::from_str(r#"{ "root": "/srv/site", "cssPath": "/test/" }"#).unwrap();
    assert_eq!(config.root, Some(PathBuf::from("/srv/site")));
    assert_eq!(config.css_path, Some(PathBuf::from("/test/")));
  }

  #[test]
  fn unknown_type_falls_back_to_mtime() {
    let config: CachebusterConfig = serde_json::from_str(r#"{ "type": "sometimes" }"#).unwrap();
    assert_eq!(config.bust_type, BustType::Mtime);
    assert_eq!(config.hash_algorithm, "md5");
  }

  #[test]
  fn discover_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let config = CachebusterConfig::discover(dir.path());
    assert_eq!(config.bust_type, BustType::Mtime);
    assert!(config.css_path.is_none());

    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "{ not json").unwrap();
    let config = CachebusterConfig::discover(dir.path());
    assert_eq!(config.param_name, "v");
  }

  #[test]
  fn discover_reads_config_file() {
    let dir = tempdir().unwrap();
    fs::write(
      dir.path().join(DEFAULT_CONFIG_FILE),
      r#"{ "paramName": "rev", "imagesPath": "static" }"#,
    )
    .unwrap();

    let config = CachebusterConfig::discover(dir.path());
    assert_eq!(config.param_name, "rev");
    assert_eq!(config.images_path, Some(PathBuf::from("static")));
  }
}
