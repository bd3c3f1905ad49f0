//! Shortcut capture state: pressed keys, key classification, and the validity
//! state machine driven by a debounced quiet period.
//!
//! [`Capture`] is independent of any widget.  A key-down records the pressed
//! keys and resets validity to [`Validity::Unknown`]; a key-up (re)starts the
//! quiet period by bumping a generation counter; when the quiet period for
//! the *current* generation elapses, [`Capture::settle`] resolves validity and
//! yields the [`Accelerator`] on a transition into [`Validity::Valid`].
//!
//! ```
//! use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
//! use keycap_core::capture::{Capture, Validity};
//!
//! let mut capture = Capture::new();
//! capture.key_down(&KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL));
//! let generation = capture.key_up();
//! let acc = capture.settle(generation).unwrap();
//! assert_eq!(acc.to_string(), "Control+K");
//! assert_eq!(capture.validity(), Validity::Valid);
//! ```

use crate::accelerator::{display_char, Accelerator, Modifiers};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, ModifierKeyCode};
use tracing::debug;

/// How a key-down event participates in a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Tab / Shift-Tab.  Never captured so focus traversal keeps working.
    Traversal,
    /// A modifier-only key (delete, alt, shift, control, left/right command).
    /// Contributes modifiers but never a character.
    Special,
    /// A character key, carrying its displayed glyph.
    Printable(char),
    /// Any other named key (arrows, function keys, Enter, Esc).  Contributes
    /// modifiers but no character.
    Other,
}

/// Classify a key event.
pub fn classify(key: &KeyEvent) -> KeyClass {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab => KeyClass::Traversal,
        KeyCode::Backspace | KeyCode::Delete => KeyClass::Special,
        KeyCode::Modifier(code) if set_modifier_key(code, &mut Modifiers::default()) => {
            KeyClass::Special
        }
        KeyCode::Char(c) if !c.is_control() => KeyClass::Printable(display_char(c)),
        _ => KeyClass::Other,
    }
}

/// Set the flag a modifier key code stands for.  Returns `false` for
/// modifier codes that are not tracked (hyper, ISO level shifts).
fn set_modifier_key(code: ModifierKeyCode, modifiers: &mut Modifiers) -> bool {
    use ModifierKeyCode::*;
    let flag = match code {
        LeftSuper | RightSuper | LeftMeta | RightMeta => &mut modifiers.command,
        LeftAlt | RightAlt => &mut modifiers.alt,
        LeftControl | RightControl => &mut modifiers.control,
        LeftShift | RightShift => &mut modifiers.shift,
        _ => return false,
    };
    *flag = true;
    true
}

fn modifiers_of(key: &KeyEvent) -> Modifiers {
    let mut modifiers = Modifiers {
        command: key
            .modifiers
            .intersects(KeyModifiers::SUPER | KeyModifiers::META),
        alt: key.modifiers.contains(KeyModifiers::ALT),
        control: key.modifiers.contains(KeyModifiers::CONTROL),
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
    };
    // Some terminals leave the pressed modifier itself out of the flags.
    if let KeyCode::Modifier(code) = key.code {
        set_modifier_key(code, &mut modifiers);
    }
    modifiers
}

/// The keys currently held: modifier flags plus at most one character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PressedKeys {
    pub modifiers: Modifiers,
    /// Displayed glyph of the non-modifier key, if any.
    pub key: Option<char>,
}

/// Validity of the pressed keys as a shortcut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Validity {
    /// Keys changed and the quiet period has not elapsed yet.
    #[default]
    Unknown,
    Valid,
    Invalid,
}

impl PressedKeys {
    /// Nothing pressed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pressed keys described by a key-down event.  Traversal keys yield
    /// `None`.
    pub fn from_key_event(key: &KeyEvent) -> Option<Self> {
        let key_char = match classify(key) {
            KeyClass::Traversal => return None,
            KeyClass::Printable(c) => Some(c),
            KeyClass::Special | KeyClass::Other => None,
        };
        Some(Self {
            modifiers: modifiers_of(key),
            key: key_char,
        })
    }

    /// Seed pressed keys from an externally supplied accelerator string.
    ///
    /// Malformed values degrade to an empty state instead of failing.
    pub fn from_value(value: &str) -> Self {
        if value.trim().is_empty() {
            return Self::empty();
        }
        match value.parse::<Accelerator>() {
            Ok(acc) => Self::from(acc),
            Err(err) => {
                debug!(value, %err, "ignoring malformed accelerator value");
                Self::empty()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.modifiers.any() && self.key.is_none()
    }

    /// `Valid` when at least one modifier and a character are present.
    pub fn validity(&self) -> Validity {
        if self.accelerator().is_some() {
            Validity::Valid
        } else {
            Validity::Invalid
        }
    }

    /// The accelerator these keys form, if they form a valid one.
    pub fn accelerator(&self) -> Option<Accelerator> {
        self.key
            .and_then(|key| Accelerator::new(self.modifiers, key).ok())
    }

    /// Display tokens in canonical order: `⌘ ⌥ ⌃ ⇧` then the character.
    pub fn glyphs(&self) -> Vec<String> {
        let mut glyphs: Vec<String> = self.modifiers.glyphs().map(str::to_string).collect();
        if let Some(key) = self.key {
            glyphs.push(key.to_string());
        }
        glyphs
    }
}

impl From<Accelerator> for PressedKeys {
    fn from(acc: Accelerator) -> Self {
        Self {
            modifiers: acc.modifiers(),
            key: Some(acc.key()),
        }
    }
}

/// The capture state machine.
///
/// `generation` identifies the most recently scheduled quiet-period check;
/// a check for any other generation is stale and ignored.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    keys: PressedKeys,
    validity: Validity,
    generation: u64,
    pending: bool,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously stored keys.  Validity stays unknown until the
    /// next capture settles.
    pub fn with_keys(keys: PressedKeys) -> Self {
        Self {
            keys,
            ..Self::default()
        }
    }

    pub fn keys(&self) -> &PressedKeys {
        &self.keys
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a quiet-period check is outstanding.
    pub fn pending(&self) -> bool {
        self.pending
    }

    /// Record a key-down.  Returns `false` (and changes nothing) for keys
    /// that are never captured.
    ///
    /// The new keys replace the previous ones entirely and any outstanding
    /// check is cancelled.
    pub fn key_down(&mut self, key: &KeyEvent) -> bool {
        let Some(keys) = PressedKeys::from_key_event(key) else {
            return false;
        };
        self.keys = keys;
        self.validity = Validity::Unknown;
        self.cancel();
        true
    }

    /// Record a key-up: (re)start the quiet period.  Returns the generation
    /// the caller should report back to [`settle`](Capture::settle).
    pub fn key_up(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.pending = true;
        self.generation
    }

    /// The quiet period for `generation` elapsed.
    ///
    /// Stale generations are ignored.  Otherwise validity is resolved and the
    /// accelerator is returned only if validity just became `Valid`.
    pub fn settle(&mut self, generation: u64) -> Option<Accelerator> {
        if !self.pending || generation != self.generation {
            return None;
        }
        self.pending = false;
        let previous = self.validity;
        self.validity = self.keys.validity();
        if self.validity == Validity::Valid && previous != Validity::Valid {
            self.keys.accelerator()
        } else {
            None
        }
    }

    /// Cancel any outstanding quiet-period check.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.pending = false;
    }

    /// Reset to nothing pressed.  Never produces an accelerator.
    pub fn clear(&mut self) {
        self.keys = PressedKeys::empty();
        self.validity = Validity::Unknown;
        self.cancel();
    }

    /// Replace the pressed keys with an externally supplied value.
    pub fn reseed(&mut self, value: &str) {
        self.keys = PressedKeys::from_value(value);
        self.validity = Validity::Unknown;
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn settle(capture: &mut Capture) -> Option<Accelerator> {
        let generation = capture.key_up();
        capture.settle(generation)
    }

    #[test]
    fn modifier_codes_have_no_character() {
        for code in [
            KeyCode::Backspace,
            KeyCode::Delete,
            KeyCode::Modifier(ModifierKeyCode::LeftAlt),
            KeyCode::Modifier(ModifierKeyCode::RightShift),
            KeyCode::Modifier(ModifierKeyCode::LeftControl),
            KeyCode::Modifier(ModifierKeyCode::LeftSuper),
            KeyCode::Modifier(ModifierKeyCode::RightSuper),
        ] {
            let keys = PressedKeys::from_key_event(&press(code, KeyModifiers::NONE)).unwrap();
            assert_eq!(keys.key, None, "{code:?}");
        }
    }

    #[test]
    fn pressed_modifier_key_sets_its_flag() {
        let keys = PressedKeys::from_key_event(&press(
            KeyCode::Modifier(ModifierKeyCode::LeftShift),
            KeyModifiers::NONE,
        ))
        .unwrap();
        assert!(keys.modifiers.shift);
        assert_eq!(keys.key, None);
    }

    #[test]
    fn printable_key_is_upper_cased() {
        let keys =
            PressedKeys::from_key_event(&press(KeyCode::Char('a'), KeyModifiers::SUPER)).unwrap();
        assert_eq!(keys.key, Some('A'));
        assert!(keys.modifiers.command);
    }

    #[test]
    fn named_keys_carry_no_character() {
        let keys =
            PressedKeys::from_key_event(&press(KeyCode::F(5), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(keys.key, None);
        assert!(keys.modifiers.control);
    }

    #[test]
    fn new_key_replaces_previous_character() {
        let mut capture = Capture::new();
        capture.key_down(&press(KeyCode::Char('a'), KeyModifiers::ALT));
        capture.key_down(&press(KeyCode::Char('b'), KeyModifiers::ALT));
        assert_eq!(capture.keys().key, Some('B'));
        assert_eq!(capture.keys().glyphs(), vec!["⌥", "B"]);
    }

    #[test]
    fn tab_is_never_captured() {
        let mut capture = Capture::new();
        capture.key_down(&press(KeyCode::Char('x'), KeyModifiers::CONTROL));
        let before = *capture.keys();
        let generation = capture.generation();

        assert!(!capture.key_down(&press(KeyCode::Tab, KeyModifiers::NONE)));
        assert!(!capture.key_down(&press(KeyCode::BackTab, KeyModifiers::SHIFT)));
        assert_eq!(*capture.keys(), before);
        assert_eq!(capture.generation(), generation);
    }

    #[test]
    fn key_down_resets_validity() {
        let mut capture = Capture::new();
        capture.key_down(&press(KeyCode::Char('k'), KeyModifiers::CONTROL));
        settle(&mut capture);
        assert_eq!(capture.validity(), Validity::Valid);

        capture.key_down(&press(KeyCode::Char('j'), KeyModifiers::CONTROL));
        assert_eq!(capture.validity(), Validity::Unknown);
    }

    #[test]
    fn modifier_and_character_is_valid() {
        let mut capture = Capture::new();
        capture.key_down(&press(KeyCode::Char('k'), KeyModifiers::CONTROL));
        let acc = settle(&mut capture).unwrap();
        assert_eq!(acc.to_string(), "Control+K");
        assert_eq!(capture.validity(), Validity::Valid);
    }

    #[test]
    fn character_without_modifier_is_invalid() {
        let mut capture = Capture::new();
        capture.key_down(&press(KeyCode::Char('k'), KeyModifiers::NONE));
        assert!(settle(&mut capture).is_none());
        assert_eq!(capture.validity(), Validity::Invalid);
    }

    #[test]
    fn modifiers_without_character_are_invalid() {
        let mut capture = Capture::new();
        capture.key_down(&press(
            KeyCode::Modifier(ModifierKeyCode::LeftControl),
            KeyModifiers::CONTROL,
        ));
        assert!(settle(&mut capture).is_none());
        assert_eq!(capture.validity(), Validity::Invalid);
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut capture = Capture::new();
        capture.key_down(&press(KeyCode::Char('k'), KeyModifiers::CONTROL));
        let first = capture.key_up();
        let second = capture.key_up();
        assert!(capture.settle(first).is_none());
        assert_eq!(capture.validity(), Validity::Unknown);
        assert!(capture.settle(second).is_some());
    }

    #[test]
    fn emits_once_per_transition() {
        let mut capture = Capture::new();
        capture.key_down(&press(KeyCode::Char('k'), KeyModifiers::CONTROL));
        assert!(settle(&mut capture).is_some());
        // Releasing the modifier afterwards restarts the quiet period but the
        // state is already valid.
        assert!(settle(&mut capture).is_none());
    }

    #[test]
    fn press_order_does_not_change_output() {
        let mut capture = Capture::new();
        capture.key_down(&press(
            KeyCode::Char('S'),
            KeyModifiers::SHIFT | KeyModifiers::SUPER | KeyModifiers::ALT,
        ));
        assert_eq!(settle(&mut capture).unwrap().to_string(), "Command+Alt+Shift+S");
    }

    #[test]
    fn clear_resets_and_cancels() {
        let mut capture = Capture::new();
        capture.key_down(&press(KeyCode::Char('k'), KeyModifiers::CONTROL));
        let generation = capture.key_up();
        capture.clear();
        assert!(capture.keys().is_empty());
        assert!(!capture.pending());
        assert!(capture.settle(generation).is_none());
    }

    #[test]
    fn from_value_round_trips_command_a() {
        let keys = PressedKeys::from_value("Command+A");
        assert_eq!(
            keys,
            PressedKeys {
                modifiers: Modifiers {
                    command: true,
                    alt: false,
                    control: false,
                    shift: false,
                },
                key: Some('A'),
            }
        );
        assert_eq!(keys.accelerator().unwrap().to_string(), "Command+A");
    }

    #[test]
    fn malformed_value_degrades_to_empty() {
        assert!(PressedKeys::from_value("Command+Or+").is_empty());
        assert!(PressedKeys::from_value("Hyper+Q").is_empty());
        assert!(PressedKeys::from_value("").is_empty());
    }

    #[test]
    fn reseed_replaces_keys_without_emitting() {
        let mut capture = Capture::with_keys(PressedKeys::from_value("Alt+X"));
        capture.reseed("Control+Shift+P");
        assert_eq!(capture.keys().glyphs(), vec!["⌃", "⇧", "P"]);
        assert_eq!(capture.validity(), Validity::Unknown);
        assert!(!capture.pending());
    }
}
