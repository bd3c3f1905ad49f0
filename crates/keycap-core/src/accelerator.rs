//! Structured keyboard accelerators and their canonical string form.
//!
//! An [`Accelerator`] is a set of [`Modifiers`] plus exactly one key
//! character.  It is serialized through a single canonical formatter
//! ([`Display`](fmt::Display)) and read back through a single structured
//! parser ([`FromStr`]), so the text a settings file stores is always the text
//! a capture control reports:
//!
//! ```
//! use keycap_core::accelerator::{Accelerator, Modifiers};
//!
//! let acc: Accelerator = "shift+command+k".parse().unwrap();
//! assert_eq!(acc.to_string(), "Command+Shift+K");
//! assert_eq!(acc.modifiers(), Modifiers { command: true, shift: true, ..Modifiers::NONE });
//! ```

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while building or parsing an [`Accelerator`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcceleratorError {
    #[error("accelerator string is empty")]
    Empty,
    #[error("accelerator has modifiers but no key")]
    MissingKey,
    #[error("unknown token '{0}' in accelerator")]
    UnknownToken(String),
    #[error("modifier '{0}' appears more than once")]
    DuplicateModifier(&'static str),
    #[error("accelerator needs at least one modifier")]
    NoModifier,
    #[error("key '{0}' is not a single printable character")]
    InvalidKey(String),
}

/// Modifier flags of a shortcut.  Each flag is independent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Command on macOS, Super / Windows key elsewhere.
    pub command: bool,
    /// Alt / Option.
    pub alt: bool,
    /// Control.
    pub control: bool,
    /// Shift.
    pub shift: bool,
}

/// Canonical modifier order: token, glyph, accessor.
const ORDER: [(&str, &str, fn(&Modifiers) -> bool); 4] = [
    ("Command", "⌘", |m: &Modifiers| m.command),
    ("Alt", "⌥", |m: &Modifiers| m.alt),
    ("Control", "⌃", |m: &Modifiers| m.control),
    ("Shift", "⇧", |m: &Modifiers| m.shift),
];

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Modifiers = Modifiers {
        command: false,
        alt: false,
        control: false,
        shift: false,
    };

    /// Whether at least one modifier is held.
    pub fn any(&self) -> bool {
        self.command || self.alt || self.control || self.shift
    }

    /// Names of the held modifiers in canonical order
    /// (`Command`, `Alt`, `Control`, `Shift`).
    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        ORDER
            .iter()
            .filter(move |(_, _, held)| held(self))
            .map(|(token, _, _)| *token)
    }

    /// Glyphs of the held modifiers in canonical order (`⌘ ⌥ ⌃ ⇧`).
    pub fn glyphs(&self) -> impl Iterator<Item = &'static str> + '_ {
        ORDER
            .iter()
            .filter(move |(_, _, held)| held(self))
            .map(|(_, glyph, _)| *glyph)
    }

    /// Set the flag named by `token`.
    ///
    /// Matching is case-insensitive and accepts the common aliases
    /// (`cmd`, `super`, `meta`, `option`, `ctrl`).
    fn set_token(&mut self, token: &str) -> Result<(), AcceleratorError> {
        let (name, flag) = match token.trim().to_ascii_lowercase().as_str() {
            "command" | "cmd" | "super" | "meta" => ("Command", &mut self.command),
            "alt" | "option" | "opt" => ("Alt", &mut self.alt),
            "control" | "ctrl" => ("Control", &mut self.control),
            "shift" => ("Shift", &mut self.shift),
            _ => return Err(AcceleratorError::UnknownToken(token.to_string())),
        };
        if *flag {
            return Err(AcceleratorError::DuplicateModifier(name));
        }
        *flag = true;
        Ok(())
    }
}

/// Whether `token` names a modifier rather than a key.
fn is_modifier_token(token: &str) -> bool {
    let mut probe = Modifiers::NONE;
    probe.set_token(token).is_ok()
}

/// The displayed form of a key character: letters are upper-cased when the
/// upper-case form is itself a single character.
pub fn display_char(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// A validated shortcut: at least one modifier and exactly one key character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Accelerator {
    modifiers: Modifiers,
    key: char,
}

impl Accelerator {
    /// Build an accelerator, rejecting combinations without a modifier and
    /// keys that are control characters.
    pub fn new(modifiers: Modifiers, key: char) -> Result<Self, AcceleratorError> {
        if key.is_control() {
            return Err(AcceleratorError::InvalidKey(key.escape_default().to_string()));
        }
        if !modifiers.any() {
            return Err(AcceleratorError::NoModifier);
        }
        Ok(Self {
            modifiers,
            key: display_char(key),
        })
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn key(&self) -> char {
        self.key
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in self.modifiers.tokens() {
            write!(f, "{token}+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// Split an accelerator string into its modifier part and its key part.
///
/// The key is whatever follows the last `+`; a trailing `++` means the `+`
/// key itself.
fn split_key(s: &str) -> Result<(&str, &str), AcceleratorError> {
    if let Some(head) = s.strip_suffix("++") {
        return Ok((head, "+"));
    }
    match s.rsplit_once('+') {
        Some((_, "")) => Err(AcceleratorError::MissingKey),
        Some((head, key)) => Ok((head, key)),
        None => Ok(("", s)),
    }
}

impl FromStr for Accelerator {
    type Err = AcceleratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(AcceleratorError::Empty);
        }

        let (head, key) = split_key(s)?;

        let mut modifiers = Modifiers::NONE;
        if !head.is_empty() {
            for token in head.split('+') {
                modifiers.set_token(token)?;
            }
        }

        if is_modifier_token(key) {
            return Err(AcceleratorError::MissingKey);
        }

        // A lone space is a key; anything else is trimmed like the modifiers.
        let key = if key == " " { key } else { key.trim() };
        let mut chars = key.chars();
        let c = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            (None, _) => return Err(AcceleratorError::MissingKey),
            _ => return Err(AcceleratorError::InvalidKey(key.to_string())),
        };

        Accelerator::new(modifiers, c)
    }
}

impl Serialize for Accelerator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Accelerator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd() -> Modifiers {
        Modifiers {
            command: true,
            ..Modifiers::NONE
        }
    }

    #[test]
    fn formats_command_a() {
        let acc = Accelerator::new(cmd(), 'A').unwrap();
        assert_eq!(acc.to_string(), "Command+A");
    }

    #[test]
    fn parses_command_a() {
        let acc: Accelerator = "Command+A".parse().unwrap();
        assert_eq!(acc.modifiers(), cmd());
        assert_eq!(acc.key(), 'A');
    }

    #[test]
    fn modifier_order_is_canonical() {
        let all = Modifiers {
            command: true,
            alt: true,
            control: true,
            shift: true,
        };
        let acc = Accelerator::new(all, 'k').unwrap();
        assert_eq!(acc.to_string(), "Command+Alt+Control+Shift+K");

        let reordered: Accelerator = "Shift+Control+Alt+Command+K".parse().unwrap();
        assert_eq!(reordered.to_string(), "Command+Alt+Control+Shift+K");
    }

    #[test]
    fn aliases_and_case_are_accepted() {
        let acc: Accelerator = "ctrl+OPTION+x".parse().unwrap();
        assert_eq!(acc.to_string(), "Alt+Control+X");
    }

    #[test]
    fn plus_key_round_trips() {
        let acc: Accelerator = "Command++".parse().unwrap();
        assert_eq!(acc.key(), '+');
        assert_eq!(acc.to_string(), "Command++");
    }

    #[test]
    fn space_key_is_kept() {
        let acc: Accelerator = "Control+ ".parse().unwrap();
        assert_eq!(acc.key(), ' ');
    }

    #[test]
    fn rejects_empty() {
        assert_eq!("".parse::<Accelerator>(), Err(AcceleratorError::Empty));
        assert_eq!("   ".parse::<Accelerator>(), Err(AcceleratorError::Empty));
    }

    #[test]
    fn rejects_missing_key() {
        assert_eq!(
            "Command+Shift".parse::<Accelerator>(),
            Err(AcceleratorError::MissingKey)
        );
        assert_eq!(
            "Command+".parse::<Accelerator>(),
            Err(AcceleratorError::MissingKey)
        );
    }

    #[test]
    fn rejects_no_modifier() {
        assert_eq!("A".parse::<Accelerator>(), Err(AcceleratorError::NoModifier));
    }

    #[test]
    fn rejects_unknown_token() {
        assert_eq!(
            "CommandOrControl+A".parse::<Accelerator>(),
            Err(AcceleratorError::UnknownToken("CommandOrControl".into()))
        );
        assert_eq!(
            "Command+Or+A".parse::<Accelerator>(),
            Err(AcceleratorError::UnknownToken("Or".into()))
        );
    }

    #[test]
    fn rejects_duplicate_modifier() {
        assert_eq!(
            "Command+Cmd+A".parse::<Accelerator>(),
            Err(AcceleratorError::DuplicateModifier("Command"))
        );
    }

    #[test]
    fn rejects_multi_char_key() {
        assert_eq!(
            "Command+F5".parse::<Accelerator>(),
            Err(AcceleratorError::InvalidKey("F5".into()))
        );
    }

    #[test]
    fn rejects_control_character_key() {
        assert!(matches!(
            Accelerator::new(cmd(), '\u{7}'),
            Err(AcceleratorError::InvalidKey(_))
        ));
    }

    #[test]
    fn glyphs_follow_canonical_order() {
        let m = Modifiers {
            shift: true,
            command: true,
            ..Modifiers::NONE
        };
        assert_eq!(m.glyphs().collect::<Vec<_>>(), vec!["⌘", "⇧"]);
        assert_eq!(m.tokens().collect::<Vec<_>>(), vec!["Command", "Shift"]);
    }

    #[test]
    fn serde_uses_canonical_string() {
        let acc: Accelerator = "shift+alt+p".parse().unwrap();
        let json = serde_json::to_string(&acc).unwrap();
        assert_eq!(json, "\"Alt+Shift+P\"");
        let back: Accelerator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, acc);
        assert!(serde_json::from_str::<Accelerator>("\"P\"").is_err());
    }
}
