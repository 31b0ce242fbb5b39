//! Entity lump parsing.
//!
//! ```text
//! {
//! "classname" "worldspawn"
//! "message" "The Longest Yard"
//! }
//! {
//! "origin" "-64 128 24"
//! "classname" "info_player_deathmatch"
//! }
//! ```
//!
//! Parsing is lenient: an unterminated quote or brace ends the lump, and a
//! key without a value is dropped.

use glam::Vec3;

use crate::constants::DEFAULT_PLAYER_START;

/// Ordered key/value pairs of one `{ ... }` block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entity {
  pub pairs: Vec<(String, String)>,
}

impl Entity {
  /// First value stored under `key`.
  pub fn get(&self, key: &str) -> Option<&str> {
    self
      .pairs
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.as_str())
  }

  pub fn class_name(&self) -> Option<&str> {
    self.get("classname")
  }

  /// `origin` as three whitespace-separated floats.
  pub fn origin(&self) -> Option<Vec3> {
    let mut parts = self.get("origin")?.split_whitespace().map(str::parse::<f32>);
    let x = parts.next()?.ok()?;
    let y = parts.next()?.ok()?;
    let z = parts.next()?.ok()?;
    Some(Vec3::new(x, y, z))
  }
}

enum Token<'a> {
  Open,
  Close,
  Text(&'a str),
}

fn tokens(text: &str) -> impl Iterator<Item = Token<'_>> {
  let mut rest = text;
  std::iter::from_fn(move || loop {
    rest = rest.trim_start();
    let mut chars = rest.chars();
    match chars.next()? {
      '{' => {
        rest = chars.as_str();
        return Some(Token::Open);
      }
      '}' => {
        rest = chars.as_str();
        return Some(Token::Close);
      }
      '"' => {
        let body = chars.as_str();
        let end = body.find('"')?;
        rest = &body[end + 1..];
        return Some(Token::Text(&body[..end]));
      }
      _ => {
        // Stray bare word; skip to the next separator.
        let end = rest
          .find(|c: char| c.is_whitespace() || c == '{' || c == '}' || c == '"')
          .unwrap_or(rest.len());
        rest = &rest[end..];
      }
    }
  })
}

/// Parse the entity lump into blocks, in file order.
pub fn parse(text: &str) -> Vec<Entity> {
  let mut entities = Vec::new();
  let mut current: Option<Entity> = None;
  let mut pending_key: Option<&str> = None;

  for token in tokens(text) {
    match token {
      Token::Open => {
        current = Some(Entity::default());
        pending_key = None;
      }
      Token::Close => {
        if let Some(entity) = current.take() {
          entities.push(entity);
        }
        pending_key = None;
      }
      Token::Text(text) => {
        let Some(entity) = current.as_mut() else {
          continue;
        };
        match pending_key.take() {
          Some(key) => entity.pairs.push((key.to_string(), text.to_string())),
          None => pending_key = Some(text),
        }
      }
    }
  }

  entities
}

/// Origin of the first `info_player_deathmatch`, in file units.
///
/// Falls back to `(0, 0, 4)` when there is none or its origin is malformed.
pub fn find_player_start(text: &str) -> Vec3 {
  parse(text)
    .iter()
    .find(|e| e.class_name() == Some("info_player_deathmatch"))
    .and_then(Entity::origin)
    .unwrap_or(Vec3::from_array(DEFAULT_PLAYER_START))
}
