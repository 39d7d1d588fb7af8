//! Orchestrates reference discovery, resolution, token computation and write-back.

use std::path::{Path, PathBuf};

use crate::config::CachebusterConfig;
use crate::error::{BoxError, CachebustError, Result};
use crate::fs::{AssetFs, DiskFs};
use crate::property::PropertyMatcher;
use crate::reference::{
  AssetReference, ReferenceKind, find_import_references, find_url_references,
};
use crate::resolver::{PathResolver, ResolvedAsset};
use crate::rewrite::rewrite_reference;
use crate::strategy::{FnStrategy, ReplacementStrategy, TokenStrategy};
use crate::stylesheet::{CssDocument, CssNode, Stylesheet};

/// Log target used for every diagnostic emitted by the engine.
pub const LOG_TARGET: &str = "cachebuster";

/// Terminal state reached by a declaration or by a single reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
  /// The reference was replaced.
  Rewritten {
    /// Reference as written in the source.
    original: String,
    /// Reference now present in the document.
    rewritten: String,
    /// File the token was computed from.
    asset: PathBuf,
  },
  /// A declaration holding `url(...)` values whose property is not eligible.
  SkippedIneligible {
    /// Property name of the declaration.
    property: String,
  },
  /// An inline `data:` URI.
  SkippedDataUri {
    /// Reference as written in the source.
    reference: String,
  },
  /// A reference with a URL scheme or host.
  SkippedRemote {
    /// Reference as written in the source.
    reference: String,
  },
  /// No readable file behind the reference.
  SkippedUnresolved {
    /// Reference as written in the source.
    reference: String,
    /// Path that was looked up.
    path: PathBuf,
  },
}

impl RewriteOutcome {
  fn log(&self) {
    match self {
      Self::Rewritten {
        original,
        rewritten,
        ..
      } => log::debug!(target: LOG_TARGET, "{original} -> {rewritten}"),
      Self::SkippedIneligible { property } => {
        log::trace!(target: LOG_TARGET, "skipping property {property}")
      }
      Self::SkippedDataUri { .. } => log::trace!(target: LOG_TARGET, "skipping data URI"),
      Self::SkippedRemote { reference } => {
        log::trace!(target: LOG_TARGET, "skipping remote reference {reference}")
      }
      Self::SkippedUnresolved { reference, .. } => {
        log::warn!(target: LOG_TARGET, "file unreachable or not exists: {reference}")
      }
    }
  }
}

/// Outcomes of one document transform, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
  outcomes: Vec<RewriteOutcome>,
}

impl RewriteReport {
  /// Every recorded outcome.
  pub fn outcomes(&self) -> &[RewriteOutcome] {
    &self.outcomes
  }

  /// Number of references that were rewritten.
  pub fn rewritten_count(&self) -> usize {
    self
      .outcomes
      .iter()
      .filter(|outcome| matches!(outcome, RewriteOutcome::Rewritten { .. }))
      .count()
  }

  /// References that could not be resolved to a readable file.
  pub fn unresolved(&self) -> impl Iterator<Item = &str> {
    self.outcomes.iter().filter_map(|outcome| match outcome {
      RewriteOutcome::SkippedUnresolved { reference, .. } => Some(reference.as_str()),
      _ => None,
    })
  }

  fn record(&mut self, outcome: RewriteOutcome) {
    outcome.log();
    self.outcomes.push(outcome);
  }
}

/// Cache-busting engine. Holds only immutable state and can be reused across documents.
#[derive(Debug)]
pub struct Cachebuster<F = DiskFs> {
  config: CachebusterConfig,
  matcher: PropertyMatcher,
  strategy: TokenStrategy,
  fs: F,
}

impl Cachebuster<DiskFs> {
  /// Engine reading assets from disk.
  pub fn new(config: CachebusterConfig) -> Result<Self> {
    Self::with_fs(config, DiskFs)
  }
}

impl<F: AssetFs> Cachebuster<F> {
  /// Engine reading assets through `fs`.
  ///
  /// Fails when the checksum strategy names an unknown digest.
  pub fn with_fs(config: CachebusterConfig, fs: F) -> Result<Self> {
    Ok(Self {
      matcher: PropertyMatcher::from_config(&config),
      strategy: TokenStrategy::from_config(&config)?,
      config,
      fs,
    })
  }

  /// Replace the configured token strategy with a caller supplied one.
  pub fn with_replacement_strategy(mut self, strategy: impl ReplacementStrategy + 'static) -> Self {
    self.strategy = TokenStrategy::Custom(Box::new(strategy));
    self
  }

  /// Closure flavour of [`Cachebuster::with_replacement_strategy`].
  pub fn with_replacement_fn<G>(self, strategy: G) -> Self
  where
    G: Fn(&Path, &str) -> Result<String, BoxError> + Send + Sync + 'static,
  {
    self.with_replacement_strategy(FnStrategy(strategy))
  }

  /// Configuration the engine was built from.
  pub fn config(&self) -> &CachebusterConfig {
    &self.config
  }

  /// Rewrite every eligible reference of `doc` in place.
  pub fn process<D: CssDocument>(&self, doc: &mut D) -> Result<RewriteReport> {
    self.run(doc, None)
  }

  /// Like [`Cachebuster::process`]; relative references fall back to the directory of
  /// `source_file` when `cssPath` is unset.
  pub fn process_source<D: CssDocument>(
    &self,
    doc: &mut D,
    source_file: &Path,
  ) -> Result<RewriteReport> {
    self.run(doc, source_file.parent())
  }

  /// Rewrite CSS text through [`Stylesheet`].
  pub fn process_css(&self, css: &str) -> Result<(String, RewriteReport)> {
    let mut sheet = Stylesheet::parse(css);
    let report = self.process(&mut sheet)?;
    Ok((sheet.to_css(), report))
  }

  /// Rewrite CSS text read from `source_file`.
  pub fn process_css_source(
    &self,
    css: &str,
    source_file: &Path,
  ) -> Result<(String, RewriteReport)> {
    let mut sheet = Stylesheet::parse(css);
    let report = self.process_source(&mut sheet, source_file)?;
    Ok((sheet.to_css(), report))
  }

  /// Rewrite the `url(...)` references of a single declaration value.
  ///
  /// Returns the new value, or `None` when nothing changed.
  pub fn rewrite_value(
    &self,
    value: &str,
    source_dir: Option<&Path>,
  ) -> Result<(Option<String>, RewriteReport)> {
    let resolver = PathResolver::new(&self.config, source_dir);
    let mut report = RewriteReport::default();
    let mut value = value.to_string();
    let changed = self.rewrite_references(&mut value, false, &resolver, &mut report)?;
    Ok((changed.then_some(value), report))
  }

  fn run<D: CssDocument>(&self, doc: &mut D, source_dir: Option<&Path>) -> Result<RewriteReport> {
    let resolver = PathResolver::new(&self.config, source_dir);
    let mut report = RewriteReport::default();

    doc.walk(|node| -> Result<()> {
      match node {
        CssNode::Declaration { property, value } => {
          if self.matcher.is_eligible(property) {
            self.rewrite_references(value, false, &resolver, &mut report)?;
          } else if !find_url_references(value).is_empty() {
            report.record(RewriteOutcome::SkippedIneligible {
              property: property.to_string(),
            });
          }
        }
        CssNode::AtRule { name, params } if name.eq_ignore_ascii_case("import") => {
          self.rewrite_references(params, true, &resolver, &mut report)?;
        }
        CssNode::AtRule { .. } => {}
      }
      Ok(())
    })?;

    Ok(report)
  }

  /// Substitute each busted reference span of `value`. Returns whether anything changed.
  fn rewrite_references(
    &self,
    value: &mut String,
    import: bool,
    resolver: &PathResolver,
    report: &mut RewriteReport,
  ) -> Result<bool> {
    let spans = if import {
      find_import_references(value)
    } else {
      find_url_references(value)
    };
    if spans.is_empty() {
      return Ok(false);
    }

    let mut output = String::with_capacity(value.len() + spans.len() * 16);
    let mut cursor = 0;
    let mut changed = false;

    for span in &spans {
      output.push_str(&value[cursor..span.range.start]);
      let outcome = self.bust_reference(span.text, resolver)?;
      match &outcome {
        RewriteOutcome::Rewritten { rewritten, .. } => {
          output.push_str(rewritten);
          changed = true;
        }
        _ => output.push_str(span.text),
      }
      cursor = span.range.end;
      report.record(outcome);
    }

    if changed {
      output.push_str(&value[cursor..]);
      *value = output;
    }
    Ok(changed)
  }

  fn bust_reference(&self, raw: &str, resolver: &PathResolver) -> Result<RewriteOutcome> {
    let reference = AssetReference::parse(raw);
    match reference.kind() {
      ReferenceKind::DataUri => {
        return Ok(RewriteOutcome::SkippedDataUri {
          reference: raw.to_string(),
        });
      }
      ReferenceKind::Remote => {
        return Ok(RewriteOutcome::SkippedRemote {
          reference: raw.to_string(),
        });
      }
      ReferenceKind::Local => {}
    }

    let asset = match resolver.resolve(&reference, &self.fs) {
      ResolvedAsset::Found(path) => path,
      ResolvedAsset::NotFound(path) => {
        return Ok(RewriteOutcome::SkippedUnresolved {
          reference: raw.to_string(),
          path,
        });
      }
    };

    let token = match self.strategy.compute(&self.fs, &asset, raw) {
      Ok(token) => token,
      Err(CachebustError::AssetRead { path, source }) => {
        log::debug!(target: LOG_TARGET, "failed to read {}: {source}", path.display());
        return Ok(RewriteOutcome::SkippedUnresolved {
          reference: raw.to_string(),
          path,
        });
      }
      Err(err) => return Err(err),
    };

    Ok(RewriteOutcome::Rewritten {
      original: raw.to_string(),
      rewritten: rewrite_reference(&reference, &token, &self.config.param_name),
      asset,
    })
  }
}
