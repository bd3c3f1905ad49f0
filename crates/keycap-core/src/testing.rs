use crate::command::{Command, CommandInner};
use crate::model::Model;
use crate::subscription::{SubscriptionId, SubscriptionManager};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::time::Duration;
use tokio::sync::mpsc;

/// A headless harness that drives a [`Model`] without a terminal.
///
/// Immediate messages ([`Command::message`]) are queued and flushed with
/// [`drain_messages`](TestProgram::drain_messages); async commands are
/// dropped.  By default timers never fire on their own: a test delivers the
/// message a timer would have produced with [`send`](TestProgram::send), and
/// can check which timers are declared with
/// [`subscription_ids`](TestProgram::subscription_ids).
///
/// Inside a `#[tokio::test(start_paused = true)]`,
/// [`start_subscriptions`](TestProgram::start_subscriptions) runs the declared
/// subscriptions for real and [`advance`](TestProgram::advance) moves the
/// paused clock and delivers whatever they produced.
///
/// # Example
///
/// ```rust,ignore
/// use keycap_core::testing::TestProgram;
///
/// let mut prog = TestProgram::<SettingsForm>::new(());
/// prog.send(Msg::Key(ctrl('k')));
/// prog.send(Msg::Shortcut(Message::QuietPeriodElapsed(generation)));
/// prog.drain_messages();
/// assert_eq!(prog.model().saved, vec!["Control+K"]);
/// ```
pub struct TestProgram<M: Model> {
    model: M,
    pending_messages: Vec<M::Message>,
    quit: bool,
    live: Option<Live<M::Message>>,
}

struct Live<Msg: Send + 'static> {
    manager: SubscriptionManager<Msg>,
    rx: mpsc::UnboundedReceiver<Msg>,
}

impl<M: Model> TestProgram<M> {
    /// Create a test program by calling [`Model::init`] with `flags`.
    pub fn new(flags: M::Flags) -> Self {
        let (model, init_cmd) = M::init(flags);
        let mut program = Self {
            model,
            pending_messages: Vec::new(),
            quit: false,
            live: None,
        };
        program.collect(init_cmd);
        program
    }

    /// Send a message, triggering a single update.
    pub fn send(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.collect(cmd);
        if let Some(live) = &mut self.live {
            live.manager.reconcile(self.model.subscriptions());
        }
    }

    /// Start the model's subscriptions and keep them reconciled after every
    /// update.  Must be called from within a tokio runtime.
    pub fn start_subscriptions(&mut self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut manager = SubscriptionManager::new(tx);
        manager.reconcile(self.model.subscriptions());
        self.live = Some(Live { manager, rx });
    }

    /// Let `duration` pass, then deliver the messages running subscriptions
    /// produced and drain the follow-ups.
    pub async fn advance(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
        // Timers due at this instant wake together; let their tasks forward.
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        let mut received = Vec::new();
        if let Some(live) = &mut self.live {
            while let Ok(msg) = live.rx.try_recv() {
                received.push(msg);
            }
        }
        for msg in received {
            self.send(msg);
        }
        self.drain_messages();
    }

    /// Process queued messages until no new ones are produced.
    pub fn drain_messages(&mut self) {
        while !self.pending_messages.is_empty() {
            let messages: Vec<_> = self.pending_messages.drain(..).collect();
            for msg in messages {
                self.send(msg);
            }
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Whether any command so far asked the program to quit.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Ids of the subscriptions the model declares right now.
    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.model
            .subscriptions()
            .iter()
            .map(|sub| sub.id().clone())
            .collect()
    }

    /// Render the model to a [`Buffer`] of the given size.
    pub fn render(&self, width: u16, height: u16) -> Buffer {
        let backend = ratatui::backend::TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| self.model.view(frame)).unwrap();
        terminal.backend().buffer().clone()
    }

    /// Render the model and return its rows joined by newlines.
    pub fn render_string(&self, width: u16, height: u16) -> String {
        let buf = self.render(width, height);
        let area = Rect::new(0, 0, width, height);
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn collect(&mut self, cmd: Command<M::Message>) {
        match cmd.inner {
            CommandInner::None | CommandInner::Future(_) => {}
            CommandInner::Message(msg) => self.pending_messages.push(msg),
            CommandInner::Quit => self.quit = true,
            CommandInner::Batch(cmds) => {
                for cmd in cmds {
                    self.collect(cmd);
                }
            }
        }
    }
}

impl<M: Model> Drop for TestProgram<M> {
    fn drop(&mut self) {
        if let Some(live) = &mut self.live {
            live.manager.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Capture;
    use crate::subscription::{subscribe, Subscription};
    use crate::subscriptions::Delay;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::widgets::Paragraph;
    use std::time::Duration;

    // A bare host: captures keys, settles on request, records what it saved.
    struct Recorder {
        capture: Capture,
        saved: Vec<String>,
    }

    #[derive(Debug)]
    enum Msg {
        Key(KeyEvent),
        Settle(u64),
        Save(String),
        Quit,
    }

    impl Model for Recorder {
        type Message = Msg;
        type Flags = &'static str;

        fn init(value: &'static str) -> (Self, Command<Msg>) {
            let capture = Capture::with_keys(crate::capture::PressedKeys::from_value(value));
            (
                Recorder {
                    capture,
                    saved: Vec::new(),
                },
                Command::none(),
            )
        }

        fn update(&mut self, msg: Msg) -> Command<Msg> {
            match msg {
                Msg::Key(key) => {
                    if self.capture.key_down(&key) {
                        self.capture.key_up();
                    }
                    Command::none()
                }
                Msg::Settle(generation) => match self.capture.settle(generation) {
                    Some(acc) => Command::message(Msg::Save(acc.to_string())),
                    None => Command::none(),
                },
                Msg::Save(s) => {
                    self.saved.push(s);
                    Command::none()
                }
                Msg::Quit => Command::quit(),
            }
        }

        fn view(&self, frame: &mut ratatui::Frame) {
            let text = self.capture.keys().glyphs().join(" ");
            frame.render_widget(Paragraph::new(text), frame.area());
        }

        fn subscriptions(&self) -> Vec<Subscription<Msg>> {
            if !self.capture.pending() {
                return vec![];
            }
            let generation = self.capture.generation();
            vec![
                subscribe(Delay::new(Duration::from_millis(500), "recorder", generation))
                    .map(move |_| Msg::Settle(generation)),
            ]
        }
    }

    #[test]
    fn init_seeds_from_flags() {
        let prog = TestProgram::<Recorder>::new("Alt+Q");
        assert_eq!(prog.render_string(10, 1).trim_end(), "⌥ Q");
    }

    #[test]
    fn settle_message_chains_into_save() {
        let mut prog = TestProgram::<Recorder>::new("");
        prog.send(Msg::Key(KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL)));
        let generation = prog.model().capture.generation();
        prog.send(Msg::Settle(generation));
        assert!(prog.model().saved.is_empty());
        prog.drain_messages();
        assert_eq!(prog.model().saved, vec!["Control+P"]);
    }

    #[test]
    fn declared_timer_follows_generation() {
        let mut prog = TestProgram::<Recorder>::new("");
        assert!(prog.subscription_ids().is_empty());

        prog.send(Msg::Key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::ALT)));
        let first = prog.subscription_ids();
        assert_eq!(first.len(), 1);

        prog.send(Msg::Key(KeyEvent::new(KeyCode::Char('b'), KeyModifiers::ALT)));
        let second = prog.subscription_ids();
        assert_eq!(second.len(), 1);
        assert_ne!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn live_delay_settles_after_its_duration() {
        let mut prog = TestProgram::<Recorder>::new("");
        prog.start_subscriptions();
        prog.send(Msg::Key(KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL)));

        prog.advance(Duration::from_millis(499)).await;
        assert!(prog.model().saved.is_empty());

        prog.advance(Duration::from_millis(1)).await;
        assert_eq!(prog.model().saved, vec!["Control+P"]);
        assert!(prog.subscription_ids().is_empty());
    }

    #[test]
    fn quit_is_recorded() {
        let mut prog = TestProgram::<Recorder>::new("");
        assert!(!prog.quit_requested());
        prog.send(Msg::Quit);
        assert!(prog.quit_requested());
    }
}
