//! # Settings Panel Demo
//!
//! A debugger's "Keyboard shortcuts" settings page built from several
//! `ShortcutInput` fields:
//! - Tab / Shift-Tab and mouse clicks move focus between the fields
//! - Backspace clears the focused field, Esc quits
//! - Every captured shortcut is written back to a JSON settings file
//!
//! Run with: `cargo run --example settings_panel [SETTINGS_JSON]`
//!
//! The settings file defaults to `<config dir>/keycap/settings.json`.  Set
//! `KEYCAP_LOG=keycap.log` to write logs to a file, and `KEYCAP_LOG_LEVEL`
//! (e.g. `debug`) to change the filter.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use keycap::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use keycap::ratatui::layout::{Alignment, Constraint, Layout};
use keycap::ratatui::style::{Color, Modifier, Style};
use keycap::ratatui::text::{Line, Span};
use keycap::ratatui::widgets::{Block, Borders, Paragraph};
use keycap::ratatui::Frame;
use keycap::widgets::focus::FocusGroup;
use keycap::widgets::shortcut_input::{self, ShortcutInput};
use keycap::{
    terminal_events, Command, Component, Model, Program, ProgramOptions, Subscription,
    TerminalEvent,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Actions that can be bound: settings key, label, default shortcut, and
/// whether users may rebind it.
const ACTIONS: [(&str, &str, &str, bool); 5] = [
    ("toggle_devtools", "Toggle devtools", "Command+Alt+I", true),
    ("reload", "Reload", "Command+R", true),
    ("step_over", "Step over", "Shift+F", true),
    ("pause", "Pause / resume", "Control+Shift+P", true),
    ("quit", "Quit", "Command+Q", false),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct Settings {
    shortcuts: BTreeMap<String, String>,
}

impl Settings {
    fn shortcut(&self, action: &str, default: &str) -> String {
        self.shortcuts
            .get(action)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}

fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    if !path.exists() {
        info!(path = %path.display(), "no settings file yet, using defaults");
        return Ok(Settings::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

async fn save_settings(path: PathBuf, settings: Settings) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&settings).map_err(|e| e.to_string())?;
    if let Some(dir) = path.parent() {
        keycap::tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| e.to_string())?;
    }
    keycap::tokio::fs::write(&path, json)
        .await
        .map_err(|e| format!("writing {}: {e}", path.display()))
}

struct SettingsPanel {
    path: PathBuf,
    settings: Settings,
    fields: Vec<ShortcutInput>,
    focus: FocusGroup,
    status: Option<Result<String, String>>,
}

#[derive(Debug)]
enum Msg {
    Field(usize, shortcut_input::Message),
    Key(KeyEvent),
    Click(u16, u16),
    /// The terminal reports key releases, so releases end the key press.
    KeyReleaseReported,
    Saved(Result<(), String>),
}

impl SettingsPanel {
    fn sync_focus(&mut self) {
        for (i, field) in self.fields.iter_mut().enumerate() {
            if self.focus.is_focused(i) {
                field.focus();
            } else {
                field.blur();
            }
        }
    }

    fn focused_field(&mut self) -> Option<(usize, &mut ShortcutInput)> {
        let i = self.focus.focused();
        self.fields
            .get_mut(i)
            .filter(|field| field.focused())
            .map(|field| (i, field))
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command<Msg> {
        let pressed = key.kind != KeyEventKind::Release;
        match key.code {
            KeyCode::Esc if pressed => return Command::quit(),
            KeyCode::Tab | KeyCode::BackTab if pressed => {
                if key.code == KeyCode::Tab {
                    self.focus.focus_next();
                } else {
                    self.focus.focus_prev();
                }
                self.sync_focus();
                return Command::none();
            }
            KeyCode::Backspace | KeyCode::Delete => {
                if !pressed {
                    return Command::none();
                }
                return match self.focused_field() {
                    Some((i, field)) => field
                        .update(shortcut_input::Message::Clear)
                        .map(move |m| Msg::Field(i, m)),
                    None => Command::none(),
                };
            }
            KeyCode::Esc => return Command::none(),
            _ => {}
        }
        match self.focused_field() {
            Some((i, field)) if field.captures(&key) => field
                .update(shortcut_input::Message::KeyPress(key))
                .map(move |m| Msg::Field(i, m)),
            _ => Command::none(),
        }
    }

    fn handle_click(&mut self, column: u16, row: u16) -> Command<Msg> {
        let click = shortcut_input::Message::Click { column, row };
        let mut cmds = Vec::new();
        for (i, field) in self.fields.iter_mut().enumerate() {
            cmds.push(field.update(click.clone()).map(move |m| Msg::Field(i, m)));
            if field.focused() {
                self.focus.focus(i);
            }
        }
        Command::batch(cmds)
    }
}

impl Model for SettingsPanel {
    type Message = Msg;
    type Flags = (PathBuf, Settings);

    fn init((path, settings): Self::Flags) -> (Self, Command<Msg>) {
        let fields: Vec<ShortcutInput> = ACTIONS
            .iter()
            .map(|&(action, label, default, editable)| {
                ShortcutInput::new(label)
                    .with_value(&settings.shortcut(action, default))
                    .frozen(!editable)
            })
            .collect();

        let mut focus = FocusGroup::new(fields.len());
        for (i, field) in fields.iter().enumerate() {
            focus.set_skipped(i, field.is_frozen());
        }

        let mut panel = SettingsPanel {
            path,
            settings,
            fields,
            focus,
            status: None,
        };
        panel.sync_focus();
        (panel, Command::none())
    }

    fn update(&mut self, msg: Msg) -> Command<Msg> {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::Click(column, row) => self.handle_click(column, row),
            Msg::KeyReleaseReported => {
                for field in &mut self.fields {
                    field.set_key_release(true);
                }
                Command::none()
            }
            Msg::Field(i, shortcut_input::Message::Changed(value)) => {
                let (action, ..) = ACTIONS[i];
                info!(action, shortcut = %value, "shortcut changed");
                self.settings.shortcuts.insert(action.to_string(), value);
                Command::perform(
                    save_settings(self.path.clone(), self.settings.clone()),
                    Msg::Saved,
                )
            }
            Msg::Field(i, m) => match self.fields.get_mut(i) {
                Some(field) => field.update(m).map(move |m| Msg::Field(i, m)),
                None => Command::none(),
            },
            Msg::Saved(result) => {
                self.status = Some(match result {
                    Ok(()) => Ok(format!("Saved to {}", self.path.display())),
                    Err(err) => {
                        warn!(%err, "could not save settings");
                        Err(err)
                    }
                });
                Command::none()
            }
        }
    }

    fn view(&self, frame: &mut Frame) {
        let area = frame.area();

        let [title_area, form_area, status_area, help_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3 * self.fields.len() as u16),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .areas(area);

        let title = Paragraph::new("Keyboard Shortcuts")
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, title_area);

        let rows = Layout::vertical(vec![Constraint::Length(3); self.fields.len()])
            .split(form_area.inner(keycap::ratatui::layout::Margin::new(2, 0)));
        for (field, row) in self.fields.iter().zip(rows.iter()) {
            field.view(frame, *row);
        }

        if let Some(ref status) = self.status {
            let (text, color) = match status {
                Ok(text) => (text.as_str(), Color::Green),
                Err(text) => (text.as_str(), Color::Red),
            };
            let status = Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(color));
            frame.render_widget(status, status_area);
        }

        let help = Paragraph::new(Line::from(vec![
            Span::styled("Tab", Style::default().fg(Color::Cyan)),
            Span::raw(" next  "),
            Span::styled("Shift+Tab", Style::default().fg(Color::Cyan)),
            Span::raw(" prev  "),
            Span::styled("Backspace", Style::default().fg(Color::Cyan)),
            Span::raw(" clear  "),
            Span::styled("Esc", Style::default().fg(Color::Cyan)),
            Span::raw(" quit"),
        ]))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(help, help_area);
    }

    fn subscriptions(&self) -> Vec<Subscription<Msg>> {
        // The event mapping stays fixed for the life of the program, so it
        // only translates; routing by focus happens in update.
        let mut subs = vec![terminal_events(|event| {
            if let Some((column, row)) = event.click() {
                return Some(Msg::Click(column, row));
            }
            match event {
                TerminalEvent::Key(key) => Some(Msg::Key(key)),
                _ => None,
            }
        })];
        for (i, field) in self.fields.iter().enumerate() {
            subs.extend(
                field
                    .subscriptions()
                    .into_iter()
                    .map(move |sub| sub.map(move |m| Msg::Field(i, m))),
            );
        }
        subs
    }
}

fn init_logging() -> anyhow::Result<()> {
    let Some(path) = std::env::var_os("KEYCAP_LOG") else {
        return Ok(());
    };
    let file = keycap::log_to_file(&path)
        .with_context(|| format!("opening log file {}", Path::new(&path).display()))?;
    let filter = EnvFilter::try_from_env("KEYCAP_LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn settings_path() -> anyhow::Result<PathBuf> {
    if let Some(arg) = std::env::args_os().nth(1) {
        return Ok(PathBuf::from(arg));
    }
    let dir = dirs::config_dir().context("no config directory on this platform")?;
    Ok(dir.join("keycap").join("settings.json"))
}

#[keycap::tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let path = settings_path()?;
    let settings = load_settings(&path)?;
    info!(path = %path.display(), "starting settings panel");

    let options = ProgramOptions {
        mouse_capture: true,
        keyboard_enhancement: true,
        title: Some("keycap settings".into()),
        ..ProgramOptions::default()
    };
    let program = Program::<SettingsPanel>::with_options((path, settings), options)?;
    if program.reports_key_release() {
        program.handle().send(Msg::KeyReleaseReported);
    }
    let panel = program.run().await?;
    info!(shortcuts = ?panel.settings.shortcuts, "exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keycap::crossterm::event::KeyModifiers;
    use keycap::testing::TestProgram;

    fn panel() -> TestProgram<SettingsPanel> {
        TestProgram::new((PathBuf::from("settings.json"), Settings::default()))
    }

    #[test]
    fn click_moves_focus_to_the_clicked_field() {
        let mut prog = panel();
        prog.render(60, 24);
        // Second field: label "Reload" at x=2, key box from x=9, rows 6..9.
        prog.send(Msg::Click(30, 7));
        prog.drain_messages();

        let model = prog.model();
        assert_eq!(model.focus.focused(), 1);
        assert!(model.fields[1].focused());
        assert!(!model.fields[0].focused());
    }

    #[test]
    fn reported_releases_end_the_key_press() {
        let mut prog = panel();
        prog.send(Msg::KeyReleaseReported);
        let ctrl_k = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL);

        prog.send(Msg::Key(ctrl_k));
        // Only the terminal event subscription is declared.
        assert_eq!(prog.subscription_ids().len(), 1);

        prog.send(Msg::Key(KeyEvent::new_with_kind(
            KeyCode::Char('k'),
            KeyModifiers::CONTROL,
            KeyEventKind::Release,
        )));
        assert_eq!(prog.subscription_ids().len(), 2);
    }

    #[test]
    fn without_reported_releases_the_key_down_schedules_the_check() {
        let mut prog = panel();
        prog.send(Msg::Key(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL)));
        assert_eq!(prog.subscription_ids().len(), 2);
    }
}
