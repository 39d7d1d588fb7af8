#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod cachebuster;
pub mod config;
pub mod error;
pub mod fs;
pub mod hash;
pub mod property;
pub mod reference;
pub mod resolver;
pub mod rewrite;
pub mod strategy;
pub mod stylesheet;

pub use cachebuster::{Cachebuster, RewriteOutcome, RewriteReport};
pub use config::{BustType, CachebusterConfig};
pub use error::{BoxError, CachebustError};
pub use fs::{AssetFs, DiskFs, MemoryFs};
pub use hash::HashAlgorithm;
pub use strategy::{ReplacementStrategy, Token, TokenStrategy};
pub use stylesheet::{CssDocument, CssNode, Stylesheet};
