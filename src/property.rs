//! Declaration properties whose `url(...)` values are busted.

use std::collections::BTreeSet;

use crate::config::CachebusterConfig;

/// Properties eligible for rewriting when no `supportedProps` override is given.
pub const DEFAULT_SUPPORTED_PROPS: &[&str] = &[
  "background",
  "background-image",
  "src",
  "behavior",
  "cursor",
  "list-style",
  "list-style-image",
];

/// Exact, case-sensitive property filter.
#[derive(Debug, Clone)]
pub struct PropertyMatcher {
  props: BTreeSet<String>,
}

impl PropertyMatcher {
  /// Build the matcher from the supported set (or its override) plus `additionalProps`.
  pub fn from_config(config: &CachebusterConfig) -> Self {
    let base: Vec<String> = match &config.supported_props {
      Some(props) => props.clone(),
      None => DEFAULT_SUPPORTED_PROPS.iter().map(|prop| prop.to_string()).collect(),
    };

    Self {
      props: base
        .into_iter()
        .chain(config.additional_props.iter().cloned())
        .collect(),
    }
  }

  /// Determine whether a declaration property is rewritten.
  pub fn is_eligible(&self, property: &str) -> bool {
    self.props.contains(property)
  }
}

impl Default for PropertyMatcher {
  fn default() -> Self {
    Self::from_config(&CachebusterConfig::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_built_in_properties() {
    let matcher = PropertyMatcher::default();
    assert!(matcher.is_eligible("background-image"));
    assert!(matcher.is_eligible("src"));
    assert!(matcher.is_eligible("behavior"));
    assert!(matcher.is_eligible("list-style-image"));
    assert!(!matcher.is_eligible("mask-image"));
  }

  #[test]
  fn matching_is_case_sensitive() {
    let matcher = PropertyMatcher::default();
    assert!(!matcher.is_eligible("Background-Image"));
  }

  #[test]
  fn additional_props_extend_the_set() {
    let config = CachebusterConfig::default().additional_prop("mask-image");
    let matcher = PropertyMatcher::from_config(&config);
    assert!(matcher.is_eligible("mask-image"));
    assert!(matcher.is_eligible("background-image"));
  }

  #[test]
  fn supported_props_replace_the_defaults() {
    let config = CachebusterConfig {
      supported_props: Some(vec!["border-image".into()]),
      additional_props: vec!["mask".into()],
      ..CachebusterConfig::default()
    };
    let matcher = PropertyMatcher::from_config(&config);
    assert!(matcher.is_eligible("border-image"));
    assert!(matcher.is_eligible("mask"));
    assert!(!matcher.is_eligible("background-image"));
  }
}
