use crate::command::Command;
use crate::subscription::Subscription;
use ratatui::{layout::Rect, Frame};

/// A reusable sub-model that renders into a given [`Rect`].
///
/// A parent embeds a component by wrapping the component's message type in
/// one of its own variants and lifting returned commands with
/// [`Command::map`]:
///
/// ```rust,ignore
/// use keycap_core::{Component, Command};
///
/// #[derive(Debug)]
/// enum Msg { Shortcut(shortcut_input::Message) }
///
/// fn update(&mut self, msg: Msg) -> Command<Msg> {
///     match msg {
///         // The child's `Changed(accelerator)` comes back up as
///         // `Msg::Shortcut(Changed(..))` on the next turn of the loop.
///         Msg::Shortcut(m) => self.shortcut.update(m).map(Msg::Shortcut),
///     }
/// }
/// ```
pub trait Component: Send + 'static {
    /// The component's internal message type.
    type Message: Send + 'static;

    /// Process a message, mutate state, and return a [`Command`].
    fn update(&mut self, msg: Self::Message) -> Command<Self::Message>;

    /// Render into `area`.  Implementations must stay inside it.
    fn view(&self, frame: &mut Frame, area: Rect);

    /// Subscriptions this component needs right now.  The parent collects
    /// them (mapping messages) into its own
    /// [`Model::subscriptions`](crate::Model::subscriptions).
    fn subscriptions(&self) -> Vec<Subscription<Self::Message>> {
        vec![]
    }

    /// Whether this component currently has focus.
    fn focused(&self) -> bool {
        false
    }
}
