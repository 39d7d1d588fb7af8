//! Token strategies producing the cache-busting part of a rewritten reference.

use std::fmt;
use std::path::Path;

use crate::config::{BustType, CachebusterConfig};
use crate::error::{BoxError, CachebustError, Result};
use crate::fs::AssetFs;
use crate::hash::HashAlgorithm;

/// Caller supplied strategy that rewrites the whole reference.
pub trait ReplacementStrategy: Send + Sync {
  /// Return the new reference for the asset at `asset_path`, originally written as `original`.
  fn compute_replacement(&self, asset_path: &Path, original: &str) -> Result<String, BoxError>;
}

/// Adapter turning a closure into a [`ReplacementStrategy`].
pub struct FnStrategy<F>(pub F);

impl<F> ReplacementStrategy for FnStrategy<F>
where
  F: Fn(&Path, &str) -> Result<String, BoxError> + Send + Sync,
{
  fn compute_replacement(&self, asset_path: &Path, original: &str) -> Result<String, BoxError> {
    (self.0)(asset_path, original)
  }
}

/// What a strategy produced for one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
  /// Value appended to the reference as a query parameter.
  Append(String),
  /// Complete replacement for the reference.
  Replace(String),
}

/// The active strategy: two built-ins and one open variant.
pub enum TokenStrategy {
  /// Hex encoded modification time in milliseconds.
  Mtime,
  /// Hex digest of the file contents.
  Checksum(HashAlgorithm),
  /// Caller supplied replacement.
  Custom(Box<dyn ReplacementStrategy>),
}

impl TokenStrategy {
  /// Select the built-in strategy named by the configuration.
  pub fn from_config(config: &CachebusterConfig) -> Result<Self> {
    match config.bust_type {
      BustType::Checksum => Ok(Self::Checksum(config.hash_algorithm.parse()?)),
      BustType::Mtime => Ok(Self::Mtime),
    }
  }

  /// Compute the token for an asset that is known to exist.
  pub fn compute<F: AssetFs + ?Sized>(
    &self,
    fs: &F,
    asset_path: &Path,
    original: &str,
  ) -> Result<Token> {
    let read_error = |source| CachebustError::AssetRead {
      path: asset_path.to_path_buf(),
      source,
    };

    match self {
      Self::Mtime => {
        let millis = fs.mtime_millis(asset_path).map_err(read_error)?;
        Ok(Token::Append(format!("{millis:x}")))
      }
      Self::Checksum(algorithm) => {
        let bytes = fs.read_bytes(asset_path).map_err(read_error)?;
        Ok(Token::Append(algorithm.hex_digest(&bytes)))
      }
      Self::Custom(strategy) => strategy
        .compute_replacement(asset_path, original)
        .map(Token::Replace)
        .map_err(|source| CachebustError::Strategy {
          reference: original.to_string(),
          source,
        }),
    }
  }
}

impl fmt::Debug for TokenStrategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Mtime => f.write_str("Mtime"),
      Self::Checksum(algorithm) => f.debug_tuple("Checksum").field(algorithm).finish(),
      Self::Custom(_) => f.write_str("Custom(..)"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fs::MemoryFs;
  use std::path::PathBuf;

  fn fs() -> MemoryFs {
    MemoryFs::new().with_file("/site/img/a.png", b"abc".to_vec(), 0x18c_2f3a_9b10)
  }

  #[test]
  fn mtime_is_lowercase_hex_millis() {
    let token = TokenStrategy::Mtime
      .compute(&fs(), Path::new("/site/img/a.png"), "img/a.png")
      .unwrap();
    assert_eq!(token, Token::Append("18c2f3a9b10".into()));
  }

  #[test]
  fn checksum_uses_configured_algorithm() {
    let config = CachebusterConfig::default().checksum("md5");
    let token = TokenStrategy::from_config(&config)
      .unwrap()
      .compute(&fs(), Path::new("/site/img/a.png"), "img/a.png")
      .unwrap();
    assert_eq!(token, Token::Append("900150983cd24fb0d6963f7d28e17f72".into()));

    let config = CachebusterConfig::default().checksum("sha1");
    let token = TokenStrategy::from_config(&config)
      .unwrap()
      .compute(&fs(), Path::new("/site/img/a.png"), "img/a.png")
      .unwrap();
    assert_eq!(
      token,
      Token::Append("a9993e364706816aba3e25717850c26c9cd0d89d".into())
    );
  }

  #[test]
  fn unknown_algorithm_is_rejected_for_checksum_only() {
    let config = CachebusterConfig::default().checksum("crc0");
    assert!(matches!(
      TokenStrategy::from_config(&config),
      Err(CachebustError::UnsupportedHashAlgorithm { .. })
    ));

    let config = CachebusterConfig {
      hash_algorithm: "crc0".into(),
      ..CachebusterConfig::default()
    };
    assert!(matches!(TokenStrategy::from_config(&config), Ok(TokenStrategy::Mtime)));
  }

  #[test]
  fn custom_strategy_replaces_reference() {
    let strategy = TokenStrategy::Custom(Box::new(FnStrategy(
      |path: &Path, original: &str| -> Result<String, BoxError> {
        assert_eq!(path, PathBuf::from("/site/img/a.png"));
        Ok(original.replace(".png", ".abc123.png"))
      },
    )));
    let token = strategy
      .compute(&fs(), Path::new("/site/img/a.png"), "img/a.png")
      .unwrap();
    assert_eq!(token, Token::Replace("img/a.abc123.png".into()));
  }

  #[test]
  fn custom_strategy_failures_propagate() {
    let strategy = TokenStrategy::Custom(Box::new(FnStrategy(
      |_: &Path, _: &str| -> Result<String, BoxError> { Err("manifest missing".into()) },
    )));
    let err = strategy
      .compute(&fs(), Path::new("/site/img/a.png"), "img/a.png")
      .unwrap_err();
    assert!(matches!(err, CachebustError::Strategy { ref reference, .. } if reference == "img/a.png"));
  }

  #[test]
  fn read_failures_are_reported_as_asset_reads() {
    let err = TokenStrategy::Checksum(HashAlgorithm::Md5)
      .compute(&MemoryFs::new(), Path::new("/gone.png"), "/gone.png")
      .unwrap_err();
    assert!(matches!(err, CachebustError::AssetRead { .. }));
  }
}
