use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};

/// Terminal events delivered through the
/// [`terminal_events`](crate::subscriptions::terminal_events) subscription.
///
/// Each variant wraps the corresponding [`crossterm::event::Event`] payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// A keyboard event.  Releases only arrive when keyboard enhancement is
    /// enabled (see [`ProgramOptions::keyboard_enhancement`](crate::ProgramOptions)).
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// Terminal resized to (columns, rows).
    Resize(u16, u16),
    /// Terminal window gained focus.
    FocusGained,
    /// Terminal window lost focus.
    FocusLost,
    /// Bracketed paste content.
    Paste(String),
}

impl TerminalEvent {
    /// `(column, row)` of a left-button press, the terminal's "click".
    pub fn click(&self) -> Option<(u16, u16)> {
        match self {
            TerminalEvent::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                ..
            }) => Some((*column, *row)),
            _ => None,
        }
    }
}

impl From<crossterm::event::Event> for TerminalEvent {
    fn from(event: crossterm::event::Event) -> Self {
        use crossterm::event::Event;
        match event {
            Event::Key(k) => TerminalEvent::Key(k),
            Event::Mouse(m) => TerminalEvent::Mouse(m),
            Event::Resize(w, h) => TerminalEvent::Resize(w, h),
            Event::FocusGained => TerminalEvent::FocusGained,
            Event::FocusLost => TerminalEvent::FocusLost,
            Event::Paste(s) => TerminalEvent::Paste(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind) -> TerminalEvent {
        TerminalEvent::Mouse(MouseEvent {
            kind,
            column: 12,
            row: 3,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn left_press_is_a_click() {
        assert_eq!(
            mouse(MouseEventKind::Down(MouseButton::Left)).click(),
            Some((12, 3))
        );
    }

    #[test]
    fn other_mouse_events_are_not_clicks() {
        assert_eq!(mouse(MouseEventKind::Up(MouseButton::Left)).click(), None);
        assert_eq!(mouse(MouseEventKind::Down(MouseButton::Right)).click(), None);
        assert_eq!(mouse(MouseEventKind::Moved).click(), None);
        assert_eq!(TerminalEvent::FocusGained.click(), None);
    }
}
