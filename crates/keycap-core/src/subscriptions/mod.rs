//! Built-in subscription sources.
//!
//! - **Terminal events** ([`terminal_events`]) -- keyboard, mouse, resize,
//!   focus, and paste events from the terminal.
//! - **Delay** ([`Delay`]) -- a keyed one-shot timer; re-declaring it under a
//!   new key restarts it.

mod terminal;
mod timer;

pub use terminal::*;
pub use timer::*;
