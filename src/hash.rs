//! Content digests used by the checksum strategy.

use std::fmt;
use std::str::FromStr;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::error::CachebustError;

/// Digest algorithms accepted for `hashAlgorithm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
  /// 128-bit MD5, the default.
  #[default]
  Md5,
  /// SHA-1.
  Sha1,
  /// SHA-224.
  Sha224,
  /// SHA-256.
  Sha256,
  /// SHA-384.
  Sha384,
  /// SHA-512.
  Sha512,
}

impl HashAlgorithm {
  /// Lowercase hexadecimal digest of `bytes`.
  pub fn hex_digest(&self, bytes: &[u8]) -> String {
    match self {
      Self::Md5 => hex::encode(Md5::digest(bytes)),
      Self::Sha1 => hex::encode(Sha1::digest(bytes)),
      Self::Sha224 => hex::encode(Sha224::digest(bytes)),
      Self::Sha256 => hex::encode(Sha256::digest(bytes)),
      Self::Sha384 => hex::encode(Sha384::digest(bytes)),
      Self::Sha512 => hex::encode(Sha512::digest(bytes)),
    }
  }

  /// Canonical name of the algorithm.
  pub fn name(&self) -> &'static str {
    match self {
      Self::Md5 => "md5",
      Self::Sha1 => "sha1",
      Self::Sha224 => "sha224",
      Self::Sha256 => "sha256",
      Self::Sha384 => "sha384",
      Self::Sha512 => "sha512",
    }
  }
}

impl FromStr for HashAlgorithm {
  type Err = CachebustError;

  fn from_str(input: &str) -> Result<Self, Self::Err> {
    match input.trim().to_ascii_lowercase().as_str() {
      "md5" => Ok(Self::Md5),
      "sha1" | "sha-1" => Ok(Self::Sha1),
      "sha224" | "sha-224" => Ok(Self::Sha224),
      "sha256" | "sha-256" => Ok(Self::Sha256),
      "sha384" | "sha-384" => Ok(Self::Sha384),
      "sha512" | "sha-512" => Ok(Self::Sha512),
      _ => Err(CachebustError::UnsupportedHashAlgorithm {
        name: input.to_string(),
      }),
    }
  }
}

impl fmt::Display for HashAlgorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn digests_known_vectors() {
    assert_eq!(
      HashAlgorithm::Md5.hex_digest(b"abc"),
      "900150983cd24fb0d6963f7d28e17f72"
    );
    assert_eq!(
      HashAlgorithm::Sha1.hex_digest(b"abc"),
      "a9993e364706816aba3e25717850c26c9cd0d89d"
    );
    assert_eq!(
      HashAlgorithm::Sha256.hex_digest(b"abc"),
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
  }

  #[test]
  fn parses_names_case_insensitively() {
    assert_eq!("MD5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
    assert_eq!("sha-1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
    assert_eq!(" sha512 ".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
  }

  #[test]
  fn rejects_unknown_algorithms() {
    let err = "whirlpool".parse::<HashAlgorithm>().unwrap_err();
    assert!(matches!(
      err,
      CachebustError::UnsupportedHashAlgorithm { ref name } if name == "whirlpool"
    ));

    for name in ["ripemd160", "sha3-256", "blake2b512", ""] {
      assert!(name.parse::<HashAlgorithm>().is_err(), "{name} should be rejected");
    }
    assert!(err.to_string().contains("sha512"));
  }
}
