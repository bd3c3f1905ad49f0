//! Widgets for **keycap**.
//!
//! Every widget implements [`keycap_core::Component`], so it can be embedded
//! inside any [`keycap_core::Model`] and placed with ordinary [`ratatui`]
//! layouts.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`shortcut_input`] | Keyboard shortcut capture field |
//! | [`focus`] | [`FocusGroup`](focus::FocusGroup) for moving focus across a form |

pub mod focus;
pub mod shortcut_input;

pub use focus::FocusGroup;
pub use shortcut_input::{ShortcutInput, ShortcutInputStyle};
