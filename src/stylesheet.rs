//! Lossless statement-level view of a stylesheet.
//!
//! [`CssDocument`] is the only thing the rewriting engine needs from a CSS AST. [`Stylesheet`] is
//! a small implementation on top of the `cssparser` tokenizer: token positions split the source
//! into declarations, at-rules and untouched raw text, so it serialises back byte-for-byte apart
//! from values that were mutated. It does not validate anything.

use std::fmt;
use std::ops::Range;

use cssparser::{ParseError, Parser, ParserInput, Token};

/// Mutable view of one node handed to a [`CssDocument::walk`] visitor.
#[derive(Debug)]
pub enum CssNode<'a> {
  /// `property: value` inside a block.
  Declaration {
    /// Property name as written.
    property: &'a str,
    /// Value after the colon, without the terminating `;`.
    value: &'a mut String,
  },
  /// `@name params` up to its `;` or block.
  AtRule {
    /// Name without the leading `@`.
    name: &'a str,
    /// Prelude after the name.
    params: &'a mut String,
  },
}

/// Document contract required by [`crate::Cachebuster`].
pub trait CssDocument {
  /// Visit every declaration and at-rule in document order, stopping at the first error.
  fn walk<E, F>(&mut self, visitor: F) -> Result<(), E>
  where
    F: FnMut(CssNode<'_>) -> Result<(), E>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Declaration {
  property: String,
  separator: String,
  value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AtRule {
  name: String,
  separator: String,
  params: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
  Raw(String),
  Declaration(Declaration),
  AtRule(AtRule),
}

/// Stylesheet split into rewritable statements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stylesheet {
  segments: Vec<Segment>,
}

impl Stylesheet {
  /// Split `source` into statements.
  pub fn parse(source: &str) -> Self {
    let mut input = ParserInput::new(source);
    let mut parser = Parser::new(&mut input);
    let mut statements = Vec::new();
    collect_statements(&mut parser, 0, &mut statements);

    let mut segments = Vec::new();
    let mut cursor = 0;
    for statement in statements {
      let body = source[statement.range.clone()].trim_end();
      let Some(segment) = classify_statement(body, statement.opens_block, statement.depth) else {
        continue;
      };
      if cursor < statement.range.start {
        segments.push(Segment::Raw(source[cursor..statement.range.start].to_string()));
      }
      segments.push(segment);
      cursor = statement.range.start + body.len();
    }
    if cursor < source.len() {
      segments.push(Segment::Raw(source[cursor..].to_string()));
    }

    Self { segments }
  }

  /// Serialise the stylesheet back to CSS text.
  pub fn to_css(&self) -> String {
    self.to_string()
  }
}

impl CssDocument for Stylesheet {
  fn walk<E, F>(&mut self, mut visitor: F) -> Result<(), E>
  where
    F: FnMut(CssNode<'_>) -> Result<(), E>,
  {
    for segment in &mut self.segments {
      match segment {
        Segment::Raw(_) => {}
        Segment::Declaration(decl) => visitor(CssNode::Declaration {
          property: &decl.property,
          value: &mut decl.value,
        })?,
        Segment::AtRule(rule) => visitor(CssNode::AtRule {
          name: &rule.name,
          params: &mut rule.params,
        })?,
      }
    }
    Ok(())
  }
}

impl fmt::Display for Stylesheet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for segment in &self.segments {
      match segment {
        Segment::Raw(text) => f.write_str(text)?,
        Segment::Declaration(decl) => {
          write!(f, "{}{}{}", decl.property, decl.separator, decl.value)?
        }
        Segment::AtRule(rule) => write!(f, "@{}{}{}", rule.name, rule.separator, rule.params)?,
      }
    }
    Ok(())
  }
}

fn classify_statement(body: &str, opens_block: bool, depth: usize) -> Option<Segment> {
  if let Some(rest) = body.strip_prefix('@') {
    let name_len = rest
      .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
      .unwrap_or(rest.len());
    if name_len == 0 {
      return None;
    }
    let (name, tail) = rest.split_at(name_len);
    let params = tail.trim_start();
    return Some(Segment::AtRule(AtRule {
      name: name.to_string(),
      separator: tail[..tail.len() - params.len()].to_string(),
      params: params.to_string(),
    }));
  }

  if depth == 0 || opens_block {
    return None;
  }

  let colon = body.find(':')?;
  let property = body[..colon].trim_end();
  if property.is_empty() || property.contains(char::is_whitespace) {
    return None;
  }
  let after_colon = &body[colon + 1..];
  let value = after_colon.trim_start();
  let separator_end = body.len() - value.len();

  Some(Segment::Declaration(Declaration {
    property: property.to_string(),
    separator: body[property.len()..separator_end].to_string(),
    value: value.to_string(),
  }))
}

/// Source span of one statement, without its terminator.
#[derive(Debug)]
struct Statement {
  range: Range<usize>,
  depth: usize,
  opens_block: bool,
}

enum Step {
  Trivia,
  End,
  Block,
  Other,
}

/// Record every statement of the current block, descending into `{}` blocks.
fn collect_statements(parser: &mut Parser<'_, '_>, depth: usize, statements: &mut Vec<Statement>) {
  let mut start = None;
  loop {
    let before = parser.position().byte_index();
    let step = match parser.next_including_whitespace_and_comments() {
      Ok(Token::WhiteSpace(_) | Token::Comment(_)) => Step::Trivia,
      Ok(Token::Semicolon | Token::CloseCurlyBracket) => Step::End,
      Ok(Token::CurlyBracketBlock) => Step::Block,
      Ok(_) => Step::Other,
      Err(_) => break,
    };

    match step {
      Step::Trivia => {}
      Step::Other => {
        start.get_or_insert(before);
      }
      Step::End => {
        if let Some(start) = start.take() {
          statements.push(Statement {
            range: start..before,
            depth,
            opens_block: false,
          });
        }
      }
      Step::Block => {
        if let Some(start) = start.take() {
          statements.push(Statement {
            range: start..before,
            depth,
            opens_block: true,
          });
        }
        // The closure never fails.
        let _ = parser.parse_nested_block(|nested| {
          collect_statements(nested, depth + 1, statements);
          Ok::<(), ParseError<'_, ()>>(())
        });
      }
    }
  }

  if let Some(start) = start {
    statements.push(Statement {
      range: start..parser.position().byte_index(),
      depth,
      opens_block: false,
    });
  }
}
