//! Core types and runtime for **keycap**, a keyboard shortcut capture control
//! for ratatui applications.
//!
//! The crate has two halves:
//!
//! * The shortcut model: [`Accelerator`] (the `"Command+Shift+K"` string
//!   format) and [`Capture`] (the press/release state machine that decides
//!   when a combination counts as entered).
//! * A small [Elm Architecture] runtime that hosts controls built on it:
//!   [`Model`], [`Component`], [`Command`], [`Subscription`], and
//!   [`Program`], plus the headless [`TestProgram`](testing::TestProgram).
//!
//! # Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Accelerator`] | A validated shortcut, parsed from and printed to its canonical string |
//! | [`Capture`] | Tracks the keys held and the validity of the combination |
//! | [`Model`] | Top-level application trait (init / update / view) |
//! | [`Component`] | Reusable sub-model that renders into a [`ratatui::layout::Rect`] |
//! | [`Command`] | Describes a side effect to be executed by the runtime |
//! | [`Subscription`] | Long-lived event source (terminal events, delays) |
//! | [`Program`] | Wires a [`Model`] to a real terminal and drives the event loop |
//!
//! # Quick example
//!
//! ```
//! use keycap_core::Accelerator;
//!
//! let acc: Accelerator = "shift+cmd+k".parse().unwrap();
//! assert_eq!(acc.to_string(), "Command+Shift+K");
//! assert_eq!(acc.modifiers().glyphs().collect::<Vec<_>>(), vec!["⌘", "⇧"]);
//! ```
//!
//! [Elm Architecture]: https://guide.elm-lang.org/architecture/

pub mod accelerator;
pub mod capture;
pub mod command;
pub mod component;
pub mod event;
pub mod model;
pub mod runtime;
pub mod subscription;
pub mod subscriptions;
pub mod testing;

pub use accelerator::{Accelerator, AcceleratorError, Modifiers};
pub use capture::{Capture, PressedKeys, Validity};
pub use command::Command;
pub use component::Component;
pub use event::TerminalEvent;
pub use model::Model;
pub use runtime::{log_to_file, Program, ProgramError, ProgramHandle, ProgramOptions};
pub use subscription::{subscribe, Subscription, SubscriptionId, SubscriptionSource};
pub use subscriptions::{terminal_events, Delay};

/// Run a keycap application with default options.
pub async fn run<M: Model>(flags: M::Flags) -> Result<M, ProgramError> {
    Program::<M>::new(flags)?.run().await
}

/// Run with custom options.
pub async fn run_with<M: Model>(
    flags: M::Flags,
    options: ProgramOptions,
) -> Result<M, ProgramError> {
    Program::<M>::with_options(flags, options)?.run().await
}
