//! Error type shared by the rewriting engine.

use std::path::PathBuf;

/// Boxed error returned by caller supplied replacement strategies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures raised while busting the references of a document.
#[derive(Debug, thiserror::Error)]
pub enum CachebustError {
  /// The configured digest name is not known to the hashing collaborator.
  #[error(
    "unsupported hash algorithm `{name}` (expected md5, sha1, sha224, sha256, sha384 or sha512)"
  )]
  UnsupportedHashAlgorithm {
    /// Name as it appeared in the configuration.
    name: String,
  },
  /// A caller supplied replacement strategy failed for a reference.
  #[error("replacement strategy failed for `{reference}`")]
  Strategy {
    /// Reference that was being rewritten.
    reference: String,
    /// Error reported by the strategy.
    #[source]
    source: BoxError,
  },
  /// Reading the metadata or contents of a resolved asset failed.
  ///
  /// The orchestrator downgrades this to an unresolved reference; it only
  /// surfaces when token strategies are driven directly.
  #[error("failed to read asset at {}", path.display())]
  AssetRead {
    /// Asset that could not be read.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },
}

/// Result alias used across the crate.
pub type Result<T, E = CachebustError> = std::result::Result<T, E>;
