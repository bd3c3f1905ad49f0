//! Keyboard shortcut capture field.
//!
//! A [`ShortcutInput`] shows a label and a box of key caps.  Once focused
//! (by a click inside the box, or by the parent calling
//! [`focus`](ShortcutInput::focus)) it records the next key combination the
//! user presses.  After the keys have been quiet for the debounce period the
//! combination is checked: a modifier plus a character is valid and is
//! reported to the parent as [`Message::Changed`] with its canonical string,
//! e.g. `"Command+Shift+K"`.  Anything else turns the border red and reports
//! nothing.
//!
//! Tab and Shift-Tab are never captured so keyboard focus traversal keeps
//! working; see [`ShortcutInput::captures`].

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossterm::event::{KeyEvent, KeyEventKind};
use keycap_core::capture::{classify, Capture, KeyClass, PressedKeys, Validity};
use keycap_core::command::Command;
use keycap_core::component::Component;
use keycap_core::subscription::{subscribe, Subscription};
use keycap_core::subscriptions::Delay;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;
use tracing::{debug, trace};
use unicode_width::UnicodeWidthStr;

/// Quiet period used unless [`ShortcutInput::with_debounce`] says otherwise.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(0);

/// Style configuration for the shortcut input.
#[derive(Debug, Clone)]
pub struct ShortcutInputStyle {
    /// Style applied to the label.
    pub label: Style,
    /// Style applied to each key cap.
    pub cap: Style,
    /// Style applied to the "press keys" hint.
    pub hint: Style,
    /// Border while focused and the combination is not yet checked.
    pub focused: Style,
    /// Border while unfocused and the combination is not yet checked.
    pub unfocused: Style,
    /// Border once the combination checked out.
    pub valid: Style,
    /// Border once the combination was rejected.
    pub invalid: Style,
    /// Style applied to the whole control while frozen.
    pub frozen: Style,
}

impl Default for ShortcutInputStyle {
    fn default() -> Self {
        Self {
            label: Style::default(),
            cap: Style::default().add_modifier(Modifier::BOLD),
            hint: Style::default().fg(Color::DarkGray),
            focused: Style::default().fg(Color::Cyan),
            unfocused: Style::default().fg(Color::Gray),
            valid: Style::default().fg(Color::Green),
            invalid: Style::default().fg(Color::Red),
            frozen: Style::default().fg(Color::DarkGray),
        }
    }
}

/// Messages for the shortcut input component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A mouse click at the given terminal cell.  Focuses the control when
    /// it lands inside the key box, blurs it otherwise.
    Click { column: u16, row: u16 },
    /// A keyboard event.  Presses and repeats are key-downs, releases are
    /// key-ups.
    KeyPress(KeyEvent),
    /// The quiet period scheduled under this generation elapsed.
    QuietPeriodElapsed(u64),
    /// Forget the current combination.
    Clear,
    /// Emitted when a new valid combination has been captured.
    Changed(String),
}

/// A keyboard shortcut capture field.
///
/// # Example
///
/// ```ignore
/// let mut input = ShortcutInput::new("Toggle inspector")
///     .with_value("Command+Shift+I")
///     .with_debounce(Duration::from_millis(300));
///
/// // In the parent's update, forward key events while it has focus:
/// // if input.captures(&key) { cmd = input.update(Message::KeyPress(key)) }
///
/// // and persist the value when it reports a change:
/// // Message::Changed(accelerator) => settings.inspector = accelerator,
/// ```
pub struct ShortcutInput {
    label: String,
    capture: Capture,
    focus: bool,
    frozen: bool,
    key_release: bool,
    debounce: Duration,
    style: ShortcutInputStyle,
    instance: u64,
    key_box: Cell<Rect>,
}

impl ShortcutInput {
    /// Create an empty, unfocused input with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            capture: Capture::new(),
            focus: false,
            frozen: false,
            key_release: false,
            debounce: DEFAULT_DEBOUNCE,
            style: ShortcutInputStyle::default(),
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            key_box: Cell::new(Rect::default()),
        }
    }

    /// Seed the displayed keys from a stored accelerator string.  Malformed
    /// values show as empty.
    pub fn with_value(mut self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    /// Set how long keys must stay quiet before the combination is checked.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set custom styles for the input.
    pub fn with_style(mut self, style: ShortcutInputStyle) -> Self {
        self.style = style;
        self
    }

    /// Freeze or unfreeze the control (builder variant).
    pub fn frozen(mut self, frozen: bool) -> Self {
        self.set_frozen(frozen);
        self
    }

    /// Whether key releases are reported to this control.
    ///
    /// Most terminals only report presses, so by default the key-down itself
    /// starts the quiet period.  Turn this on when the program enables
    /// keyboard enhancement and the terminal reports releases.
    pub fn with_key_release(mut self, key_release: bool) -> Self {
        self.set_key_release(key_release);
        self
    }

    /// Switch release reporting after construction, once the program knows
    /// whether the terminal delivers releases.
    pub fn set_key_release(&mut self, key_release: bool) {
        self.key_release = key_release;
    }

    /// Give this input keyboard focus.
    pub fn focus(&mut self) {
        self.focus = true;
    }

    /// Remove keyboard focus.  A pending check is dropped.
    pub fn blur(&mut self) {
        self.focus = false;
        self.capture.cancel();
    }

    /// Freeze or unfreeze the control.  A frozen control ignores all input.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
        if frozen {
            self.capture.cancel();
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Replace the displayed keys with an external value.  Never emits
    /// [`Message::Changed`].
    pub fn set_value(&mut self, value: &str) {
        self.capture.reseed(value);
    }

    /// The label shown before the key box.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The keys currently shown.
    pub fn keys(&self) -> &PressedKeys {
        self.capture.keys()
    }

    pub fn validity(&self) -> Validity {
        self.capture.validity()
    }

    /// The canonical accelerator string of the keys shown, if they form one.
    pub fn value(&self) -> Option<String> {
        self.capture.keys().accelerator().map(|acc| acc.to_string())
    }

    /// Whether this input would consume `key` right now.  Parents use this
    /// to route Tab and friends to focus traversal instead.
    pub fn captures(&self, key: &KeyEvent) -> bool {
        self.focus && !self.frozen && classify(key) != KeyClass::Traversal
    }

    /// Whether `(column, row)` lies inside the key box as last rendered.
    pub fn contains(&self, column: u16, row: u16) -> bool {
        self.key_box.get().contains(Position::new(column, row))
    }

    fn owner(&self) -> String {
        format!("shortcut_input#{}", self.instance)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command<Message> {
        if !self.focus || self.frozen {
            return Command::none();
        }
        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if !self.capture.key_down(&key) {
                    return Command::none();
                }
                trace!(label = %self.label, keys = ?self.capture.keys(), "key down");
                if !self.key_release {
                    self.capture.key_up();
                }
            }
            KeyEventKind::Release => {
                if classify(&key) == KeyClass::Traversal {
                    return Command::none();
                }
                let generation = self.capture.key_up();
                trace!(label = %self.label, generation, "key up");
            }
        }
        Command::none()
    }

    fn border_style(&self) -> Style {
        if self.frozen {
            return self.style.frozen;
        }
        match self.capture.validity() {
            Validity::Valid => self.style.valid,
            Validity::Invalid => self.style.invalid,
            Validity::Unknown if self.focus => self.style.focused,
            Validity::Unknown => self.style.unfocused,
        }
    }

    fn caps_line(&self) -> Line<'static> {
        let keys = self.capture.keys();
        if keys.is_empty() {
            return if self.focus && !self.frozen {
                Line::from(Span::styled("press keys", self.style.hint))
            } else {
                Line::default()
            };
        }
        let cap = if self.frozen {
            self.style.frozen
        } else {
            self.style.cap
        };
        let mut spans = Vec::new();
        for (i, glyph) in keys.glyphs().into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(format!("[{glyph}]"), cap));
        }
        Line::from(spans)
    }
}

impl Component for ShortcutInput {
    type Message = Message;

    fn update(&mut self, msg: Message) -> Command<Message> {
        match msg {
            Message::Click { column, row } => {
                if self.frozen {
                    return Command::none();
                }
                if self.contains(column, row) {
                    self.focus();
                } else {
                    self.blur();
                }
                Command::none()
            }
            Message::KeyPress(key) => self.handle_key(key),
            Message::QuietPeriodElapsed(generation) => match self.capture.settle(generation) {
                Some(acc) => {
                    debug!(label = %self.label, accelerator = %acc, "shortcut captured");
                    Command::message(Message::Changed(acc.to_string()))
                }
                None => Command::none(),
            },
            Message::Clear => {
                if !self.frozen {
                    self.capture.clear();
                }
                Command::none()
            }
            Message::Changed(_) => Command::none(),
        }
    }

    fn view(&self, frame: &mut Frame, area: Rect) {
        let label_width = self.label.width() as u16;
        let [label_area, box_area] = Layout::horizontal([
            Constraint::Length(label_width.saturating_add(1)),
            Constraint::Min(0),
        ])
        .areas(area);
        let box_area = Rect {
            height: box_area.height.min(3),
            ..box_area
        };
        self.key_box.set(box_area);

        let label_style = if self.frozen {
            self.style.frozen
        } else {
            self.style.label
        };
        // Line the label up with the caps inside the border.
        let label_row = Rect {
            y: label_area.y + label_area.height.min(3) / 2,
            height: label_area.height.min(1),
            ..label_area
        };
        frame.render_widget(
            Paragraph::new(Span::styled(self.label.clone(), label_style)),
            label_row,
        );

        let block = Block::bordered().border_style(self.border_style());
        frame.render_widget(Paragraph::new(self.caps_line()).block(block), box_area);
    }

    fn subscriptions(&self) -> Vec<Subscription<Message>> {
        if !self.capture.pending() {
            return vec![];
        }
        let generation = self.capture.generation();
        vec![
            subscribe(Delay::new(self.debounce, self.owner(), generation))
                .map(move |_| Message::QuietPeriodElapsed(generation)),
        ]
    }

    fn focused(&self) -> bool {
        self.focus
    }
}
