//! Reassembly of a reference once its token is known.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::reference::AssetReference;
use crate::strategy::Token;

/// Characters that cannot appear verbatim inside `url(...)`.
///
/// `%` is absent so existing escapes pass through untouched.
const REFERENCE_UNSAFE: &AsciiSet = &CONTROLS
  .add(b' ')
  .add(b'"')
  .add(b'\'')
  .add(b'(')
  .add(b')')
  .add(b'<')
  .add(b'>')
  .add(b'`')
  .add(b'{')
  .add(b'}')
  .add(b'|')
  .add(b'^');

/// Percent-encode the ASCII characters of `value` that are unsafe in a CSS url token.
///
/// Non-ASCII characters are kept as written.
pub fn encode_reference_part(value: &str) -> String {
  let mut encoded = String::with_capacity(value.len());
  let mut rest = value;
  while !rest.is_empty() {
    let (ascii, tail) = rest.split_at(rest.find(|c: char| !c.is_ascii()).unwrap_or(rest.len()));
    encoded.extend(utf8_percent_encode(ascii, REFERENCE_UNSAFE));
    let (wide, tail) = tail.split_at(tail.find(|c: char| c.is_ascii()).unwrap_or(tail.len()));
    encoded.push_str(wide);
    rest = tail;
  }
  encoded
}

/// Build the rewritten reference.
///
/// Appended tokens land in the query as `<param_name><token>`, after any existing parameters and
/// before the fragment. Replacements are returned verbatim.
pub fn rewrite_reference(reference: &AssetReference, token: &Token, param_name: &str) -> String {
  let value = match token {
    Token::Replace(replacement) => return replacement.clone(),
    Token::Append(value) => value,
  };

  let mut rewritten = encode_reference_part(reference.path());
  match reference.query() {
    Some(query) if !query.is_empty() => {
      rewritten.push('?');
      rewritten.push_str(&encode_reference_part(query));
      rewritten.push('&');
    }
    _ => rewritten.push('?'),
  }
  rewritten.push_str(param_name);
  rewritten.push_str(value);

  if let Some(fragment) = reference.fragment() {
    rewritten.push('#');
    rewritten.push_str(&encode_reference_part(fragment));
  }

  rewritten
}
