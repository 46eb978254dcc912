//! Key names shared by the display back-ends, the config file and the result table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A key the participant can press.
///
/// Letters are always stored lower-case so that `Y` and `y` are the same response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    Char(char),
    Escape,
    Enter,
    Space,
}

impl Key {
    /// Parse a key name such as `"y"`, `"escape"` or `"space"`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "escape" | "esc" => Some(Key::Escape),
            "enter" | "return" => Some(Key::Enter),
            "space" => Some(Key::Space),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() && !c.is_control() => {
                        Some(Key::Char(c))
                    }
                    _ => None,
                }
            }
        }
    }

    /// Canonical name, as written to config and result files.
    pub fn name(&self) -> String {
        match self {
            Key::Char(c) => c.to_string(),
            Key::Escape => "escape".to_string(),
            Key::Enter => "return".to_string(),
            Key::Space => "space".to_string(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl TryFrom<String> for Key {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Key::parse(&value).ok_or_else(|| format!("unknown key name '{value}'"))
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_keys() {
        assert_eq!(Key::parse("escape"), Some(Key::Escape));
        assert_eq!(Key::parse("ESC"), Some(Key::Escape));
        assert_eq!(Key::parse("return"), Some(Key::Enter));
        assert_eq!(Key::parse(" space "), Some(Key::Space));
    }

    #[test]
    fn test_parse_letters_lowercases() {
        assert_eq!(Key::parse("Y"), Some(Key::Char('y')));
        assert_eq!(Key::parse("n"), Some(Key::Char('n')));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(Key::parse(""), None);
        assert_eq!(Key::parse("yes"), None);
        assert_eq!(Key::parse("\t"), None);
    }

    #[test]
    fn test_name_roundtrip() {
        for key in [Key::Char('t'), Key::Escape, Key::Enter, Key::Space] {
            assert_eq!(Key::parse(&key.name()), Some(key));
        }
    }
}
