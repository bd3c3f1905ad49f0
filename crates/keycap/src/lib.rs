//! **keycap** -- a keyboard shortcut capture control for [`ratatui`].
//!
//! This umbrella crate re-exports everything needed to put shortcut fields
//! on a settings screen from a single dependency:
//!
//! ```toml
//! [dependencies]
//! keycap = "0.1"
//! ```
//!
//! * All public items from [`keycap_core`] are available at the crate root
//!   ([`Accelerator`], [`Capture`], [`Model`], [`Component`], [`Command`],
//!   [`Program`], [`run`], [`run_with`], etc.).
//! * The [`widgets`] module re-exports [`keycap_widgets`]
//!   ([`ShortcutInput`](widgets::ShortcutInput) and
//!   [`FocusGroup`](widgets::FocusGroup)).
//! * [`ratatui`], [`crossterm`], and [`tokio`] are re-exported so downstream
//!   crates do not need to depend on them directly.
//!
//! # Quick start
//!
//! ```ignore
//! use keycap::widgets::shortcut_input::{Message, ShortcutInput};
//! use keycap::{Command, Component, Model};
//!
//! struct Settings {
//!     reload: ShortcutInput,
//!     reload_value: String,
//! }
//!
//! impl Model for Settings {
//!     type Message = Message;
//!     type Flags = String;
//!
//!     fn init(value: String) -> (Self, Command<Message>) {
//!         let mut reload = ShortcutInput::new("Reload").with_value(&value);
//!         reload.focus();
//!         (Settings { reload, reload_value: value }, Command::none())
//!     }
//!
//!     fn update(&mut self, msg: Message) -> Command<Message> {
//!         match msg {
//!             Message::Changed(value) => {
//!                 self.reload_value = value;
//!                 Command::none()
//!             }
//!             msg => self.reload.update(msg),
//!         }
//!     }
//!
//!     fn view(&self, frame: &mut ratatui::Frame) {
//!         self.reload.view(frame, frame.area());
//!     }
//!
//!     fn subscriptions(&self) -> Vec<keycap::Subscription<Message>> {
//!         let mut subs = vec![keycap::terminal_events(|event| match event {
//!             keycap::TerminalEvent::Key(key) => Some(Message::KeyPress(key)),
//!             _ => None,
//!         })];
//!         subs.extend(self.reload.subscriptions());
//!         subs
//!     }
//! }
//! ```

pub use keycap_core::*;
pub mod widgets {
    pub use keycap_widgets::*;
}

// Re-export dependencies for use in demos and downstream crates
pub use crossterm;
pub use ratatui;
pub use tokio;
