//! Extraction and classification of asset references found in CSS values.

use std::ops::Range;
use std::sync::OnceLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

fn url_function_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"(?i)\burl\(\s*(?:"([^"]*)"|'([^']*)'|([^\s'"()]+))\s*\)"#)
      .expect("invalid url() regex")
  })
}

fn import_string_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"^\s*(?:"([^"]*)"|'([^']*)')"#).expect("invalid @import string regex")
  })
}

fn reference_ignores() -> &'static [(ReferenceKind, Regex)] {
  static PATTERNS: OnceLock<Vec<(ReferenceKind, Regex)>> = OnceLock::new();
  PATTERNS
    .get_or_init(|| {
      vec![
        (
          ReferenceKind::DataUri,
          Regex::new(r"(?i)^\s*data:").expect("invalid data URI regex"),
        ),
        (
          ReferenceKind::Remote,
          Regex::new(r"(?i)^[a-z][a-z0-9+.\-]*:").expect("invalid scheme regex"),
        ),
        (
          ReferenceKind::Remote,
          Regex::new(r"^//").expect("invalid protocol-relative regex"),
        ),
      ]
    })
    .as_slice()
}

/// Where a reference points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
  /// A file on the local filesystem, candidate for busting.
  Local,
  /// An inline `data:` URI.
  DataUri,
  /// Anything with a URL scheme or a protocol-relative host.
  Remote,
}

/// Classify a reference without parsing it further.
pub fn classify_reference(value: &str) -> ReferenceKind {
  reference_ignores()
    .iter()
    .find(|(_, pattern)| pattern.is_match(value))
    .map(|(kind, _)| *kind)
    .unwrap_or(ReferenceKind::Local)
}

/// A reference split into its path, query and fragment parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
  raw: String,
  path: String,
  query: Option<String>,
  fragment: Option<String>,
}

impl AssetReference {
  /// Split `raw` (unquoted reference text) into its components.
  pub fn parse(raw: &str) -> Self {
    let (rest, fragment) = match raw.split_once('#') {
      Some((rest, fragment)) => (rest, Some(fragment.to_string())),
      None => (raw, None),
    };
    let (path, query) = match rest.split_once('?') {
      Some((path, query)) => (path, Some(query.to_string())),
      None => (rest, None),
    };

    Self {
      raw: raw.to_string(),
      path: path.to_string(),
      query,
      fragment,
    }
  }

  /// Reference exactly as written between the quotes.
  pub fn raw(&self) -> &str {
    &self.raw
  }

  /// Path portion as written, possibly percent-encoded.
  pub fn path(&self) -> &str {
    &self.path
  }

  /// Percent-decoded path used for filesystem lookups.
  pub fn decoded_path(&self) -> String {
    percent_decode_str(&self.path)
      .decode_utf8_lossy()
      .into_owned()
  }

  /// Query string without the leading `?`.
  pub fn query(&self) -> Option<&str> {
    self.query.as_deref()
  }

  /// Fragment without the leading `#`.
  pub fn fragment(&self) -> Option<&str> {
    self.fragment.as_deref()
  }

  /// Classification of the raw reference.
  pub fn kind(&self) -> ReferenceKind {
    classify_reference(&self.raw)
  }

  /// References starting with `/` resolve against the images base.
  pub fn is_root_relative(&self) -> bool {
    self.path.starts_with('/')
  }
}

/// Location of a reference inside a declaration value or at-rule prelude.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSpan<'a> {
  /// Byte range of the unquoted reference inside the scanned text.
  pub range: Range<usize>,
  /// The unquoted reference.
  pub text: &'a str,
}

/// Every `url(...)` reference in `value`, in source order.
pub fn find_url_references(value: &str) -> Vec<ReferenceSpan<'_>> {
  url_function_pattern()
    .captures_iter(value)
    .filter_map(|caps| {
      let inner = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
      Some(ReferenceSpan {
        range: inner.range(),
        text: inner.as_str(),
      })
    })
    .collect()
}

/// References of an `@import` prelude: its `url(...)` targets, or a leading quoted string.
pub fn find_import_references(params: &str) -> Vec<ReferenceSpan<'_>> {
  let urls = find_url_references(params);
  if !urls.is_empty() {
    return urls;
  }

  import_string_pattern()
    .captures(params)
    .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
    .map(|inner| ReferenceSpan {
      range: inner.range(),
      text: inner.as_str(),
    })
    .into_iter()
    .collect()
}
