use crate::command::{Command, CommandInner};
use crate::model::Model;
use crate::subscription::SubscriptionManager;
use crossterm::{
    cursor,
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

/// Errors that can occur while initializing or running a [`Program`].
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// An I/O error from terminal setup, rendering, or teardown.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration options for a [`Program`].
///
/// Override only what you need with struct update syntax:
///
/// ```rust,ignore
/// let opts = ProgramOptions {
///     mouse_capture: true,
///     keyboard_enhancement: true,
///     title: Some("Shortcuts".into()),
///     ..ProgramOptions::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ProgramOptions {
    /// Target frames per second (default: 60, clamped to 1..=120).
    pub fps: u32,
    /// Start in the alternate screen (default: true).
    pub alt_screen: bool,
    /// Report mouse clicks, needed for click-to-focus (default: false).
    pub mouse_capture: bool,
    /// Switch on the kitty keyboard protocol (default: false): key releases
    /// are reported, and modifier keys pressed on their own arrive as
    /// `KeyCode::Modifier`.  Ignored by terminals that do not support it; see
    /// [`Program::reports_key_release`].
    pub keyboard_enhancement: bool,
    /// Set the terminal title.
    pub title: Option<String>,
    /// Restore the terminal before the panic message is printed (default: true).
    pub catch_panics: bool,
    /// Quit on Ctrl-C delivered as a signal (default: true).
    pub handle_signals: bool,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            fps: 60,
            alt_screen: true,
            mouse_capture: false,
            keyboard_enhancement: false,
            title: None,
            catch_panics: true,
            handle_signals: true,
        }
    }
}

/// Terminal modes actually switched on, so teardown undoes exactly those.
#[derive(Debug, Clone, Copy)]
struct Modes {
    alt_screen: bool,
    mouse_capture: bool,
    keyboard_enhancement: bool,
}

/// A cloneable handle for feeding messages into a [`Program`] from outside
/// its update loop: before [`run`](Program::run), or from another task while
/// it runs.
#[derive(Clone)]
pub struct ProgramHandle<Msg: Send + 'static> {
    msg_tx: mpsc::UnboundedSender<Msg>,
}

impl<Msg: Send + 'static> ProgramHandle<Msg> {
    /// Queue a message for the next turn of the loop.  Does nothing once the
    /// program has exited.
    pub fn send(&self, msg: Msg) {
        let _ = self.msg_tx.send(msg);
    }
}

/// Flags pushed when keyboard enhancement is on.  Modifier-only key presses
/// are only reported with `REPORT_ALL_KEYS_AS_ESCAPE_CODES`.
fn enhancement_flags() -> KeyboardEnhancementFlags {
    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
}

/// The program runtime: terminal setup, the event loop, and the [`Model`]
/// lifecycle.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::main]
/// async fn main() -> Result<(), ProgramError> {
///     let panel = Program::<SettingsPanel>::new(settings)?.run().await?;
///     Ok(())
/// }
/// ```
pub struct Program<M: Model> {
    model: M,
    terminal: Terminal<CrosstermBackend<Stdout>>,
    msg_tx: mpsc::UnboundedSender<M::Message>,
    msg_rx: mpsc::UnboundedReceiver<M::Message>,
    subscriptions: SubscriptionManager<M::Message>,
    options: ProgramOptions,
    modes: Modes,
    needs_redraw: bool,
    should_quit: bool,
}

impl<M: Model> Program<M> {
    /// Create a new program with default options.
    pub fn new(flags: M::Flags) -> Result<Self, ProgramError> {
        Self::with_options(flags, ProgramOptions::default())
    }

    /// Create a new program with custom options.
    pub fn with_options(flags: M::Flags, options: ProgramOptions) -> Result<Self, ProgramError> {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (model, init_cmd) = M::init(flags);

        let (terminal, modes) = init_terminal(&options)?;
        debug!(?modes, "terminal initialized");

        let mut program = Self {
            model,
            terminal,
            subscriptions: SubscriptionManager::new(msg_tx.clone()),
            msg_tx,
            msg_rx,
            options,
            modes,
            needs_redraw: true,
            should_quit: false,
        };

        program.execute(init_cmd);
        let subs = program.model.subscriptions();
        program.subscriptions.reconcile(subs);

        Ok(program)
    }

    /// Get a handle for sending messages to the program.
    pub fn handle(&self) -> ProgramHandle<M::Message> {
        ProgramHandle {
            msg_tx: self.msg_tx.clone(),
        }
    }

    /// Whether the terminal accepted keyboard enhancement, so key releases
    /// and lone modifier presses will be delivered.
    pub fn reports_key_release(&self) -> bool {
        self.modes.keyboard_enhancement
    }

    /// Run until the model quits.  Returns the final model.
    pub async fn run(mut self) -> Result<M, ProgramError> {
        let result = self.event_loop().await;

        debug!("shutting down");
        self.subscriptions.shutdown();
        restore_terminal(self.modes)?;

        result.map(|()| self.model)
    }

    async fn event_loop(&mut self) -> Result<(), ProgramError> {
        self.render()?;

        let fps = self.options.fps.clamp(1, 120);
        let mut frame = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(fps)));
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let handle_signals = self.options.handle_signals;

        loop {
            tokio::select! {
                biased;

                _ = tokio::signal::ctrl_c(), if handle_signals => {
                    debug!("received ctrl+c signal");
                    return Ok(());
                }

                Some(msg) = self.msg_rx.recv() => {
                    self.process(msg);
                    // Drain whatever is already queued before redrawing.
                    while let Ok(msg) = self.msg_rx.try_recv() {
                        self.process(msg);
                    }
                    if self.should_quit {
                        return Ok(());
                    }
                }

                _ = frame.tick() => {
                    if self.needs_redraw {
                        self.render()?;
                        self.needs_redraw = false;
                    }
                }
            }
        }
    }

    fn process(&mut self, msg: M::Message) {
        trace!("update");
        let cmd = self.model.update(msg);
        self.execute(cmd);

        let subs = self.model.subscriptions();
        self.subscriptions.reconcile(subs);

        self.needs_redraw = true;
    }

    fn execute(&mut self, cmd: Command<M::Message>) {
        match cmd.inner {
            CommandInner::None => {}
            CommandInner::Message(msg) => {
                let _ = self.msg_tx.send(msg);
            }
            CommandInner::Quit => {
                self.should_quit = true;
            }
            CommandInner::Future(fut) => {
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(fut.await);
                });
            }
            CommandInner::Batch(cmds) => {
                for cmd in cmds {
                    self.execute(cmd);
                }
            }
        }
    }

    fn render(&mut self) -> Result<(), ProgramError> {
        self.terminal.draw(|frame| self.model.view(frame))?;
        Ok(())
    }
}

fn init_terminal(
    options: &ProgramOptions,
) -> Result<(Terminal<CrosstermBackend<Stdout>>, Modes), ProgramError> {
    let modes = Modes {
        alt_screen: options.alt_screen,
        mouse_capture: options.mouse_capture,
        keyboard_enhancement: options.keyboard_enhancement
            && supports_keyboard_enhancement().unwrap_or(false),
    };
    if options.keyboard_enhancement && !modes.keyboard_enhancement {
        warn!("terminal does not report key releases; falling back to key presses");
    }

    if options.catch_panics {
        use std::sync::Once;
        static HOOK_INSTALLED: Once = Once::new();
        HOOK_INSTALLED.call_once(|| {
            let original_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let _ = restore_terminal(modes);
                original_hook(info);
            }));
        });
    }

    enable_raw_mode()?;
    let mut out = stdout();
    if modes.alt_screen {
        execute!(out, EnterAlternateScreen)?;
    }
    if modes.mouse_capture {
        execute!(out, EnableMouseCapture)?;
    }
    if modes.keyboard_enhancement {
        execute!(out, PushKeyboardEnhancementFlags(enhancement_flags()))?;
    }
    if let Some(ref title) = options.title {
        execute!(out, SetTitle(title))?;
    }
    execute!(out, cursor::Hide)?;

    let terminal = Terminal::new(CrosstermBackend::new(out))?;
    Ok((terminal, modes))
}

/// Best-effort teardown: every step runs even if an earlier one failed.
fn restore_terminal(modes: Modes) -> Result<(), io::Error> {
    let raw = disable_raw_mode();
    let mut out = stdout();
    if modes.keyboard_enhancement {
        execute!(out, PopKeyboardEnhancementFlags).ok();
    }
    if modes.mouse_capture {
        execute!(out, DisableMouseCapture).ok();
    }
    execute!(out, cursor::Show).ok();
    if modes.alt_screen {
        execute!(out, LeaveAlternateScreen).ok();
    }
    raw
}

/// Open (append mode) a log file for a TUI application, whose terminal is
/// not available for log output.  Pair it with a `tracing` subscriber:
///
/// ```rust,ignore
/// use keycap_core::runtime::log_to_file;
/// use std::sync::Mutex;
///
/// let file = log_to_file("keycap.log").unwrap();
/// tracing_subscriber::fmt().with_writer(Mutex::new(file)).init();
/// ```
pub fn log_to_file(path: impl AsRef<std::path::Path>) -> Result<std::fs::File, io::Error> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enhancement_reports_releases_and_lone_modifiers() {
        let flags = enhancement_flags();
        assert!(flags.contains(KeyboardEnhancementFlags::REPORT_EVENT_TYPES));
        assert!(flags.contains(KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES));
        assert!(!flags.contains(KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS));
    }

    #[test]
    fn handle_queues_messages_in_order() {
        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
        let handle = ProgramHandle { msg_tx };
        handle.clone().send("Command+R");
        handle.send("Alt+Q");
        assert_eq!(msg_rx.try_recv(), Ok("Command+R"));
        assert_eq!(msg_rx.try_recv(), Ok("Alt+Q"));
    }

    #[test]
    fn handle_send_after_exit_is_silent() {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel::<u8>();
        let handle = ProgramHandle { msg_tx };
        drop(msg_rx);
        handle.send(1);
    }
}
