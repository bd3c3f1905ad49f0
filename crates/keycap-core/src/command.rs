use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// A side effect returned from [`Model::update`](crate::Model::update),
/// [`Model::init`](crate::Model::init) or
/// [`Component::update`](crate::Component::update).
///
/// Commands are how a component talks upward (an immediate message such as a
/// shortcut control's `Changed` notification), how a host runs async work
/// (saving settings), and how a program quits.
///
/// # Examples
///
/// ```rust,ignore
/// // Nothing to do:
/// let cmd = Command::none();
///
/// // Tell the parent about a new shortcut:
/// let cmd = Command::message(Message::Changed("Command+K".into()));
///
/// // Persist settings off the update loop:
/// let cmd = Command::perform(save(path, settings), Msg::Saved);
/// ```
pub struct Command<Msg: Send + 'static> {
    pub(crate) inner: CommandInner<Msg>,
}

pub(crate) enum CommandInner<Msg: Send + 'static> {
    None,
    Message(Msg),
    Quit,
    Future(BoxFuture<'static, Msg>),
    Batch(Vec<Command<Msg>>),
}

impl<Msg: Send + 'static> Command<Msg> {
    /// No-op command.
    pub fn none() -> Self {
        Command {
            inner: CommandInner::None,
        }
    }

    /// Deliver a message on the next turn of the update loop.
    pub fn message(msg: Msg) -> Self {
        Command {
            inner: CommandInner::Message(msg),
        }
    }

    /// Quit the program.
    pub fn quit() -> Self {
        Command {
            inner: CommandInner::Quit,
        }
    }

    /// Run an async future, map the result to a message.
    pub fn perform<F, T>(future: F, map: impl FnOnce(T) -> Msg + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Command {
            inner: CommandInner::Future(Box::pin(async move { map(future.await) })),
        }
    }

    /// Run several commands.  Empty batches collapse to [`none`](Command::none)
    /// and single-command batches to that command.
    pub fn batch(cmds: impl IntoIterator<Item = Command<Msg>>) -> Self {
        let mut cmds: Vec<_> = cmds.into_iter().filter(|cmd| !cmd.is_none()).collect();
        match cmds.len() {
            0 => Command::none(),
            1 => cmds.pop().unwrap_or_else(Command::none),
            _ => Command {
                inner: CommandInner::Batch(cmds),
            },
        }
    }

    /// Transform the message type (for component composition).
    pub fn map<NewMsg: Send + 'static>(
        self,
        f: impl Fn(Msg) -> NewMsg + Send + Sync + 'static,
    ) -> Command<NewMsg> {
        self.map_with(Arc::new(f))
    }

    fn map_with<NewMsg: Send + 'static>(
        self,
        f: Arc<dyn Fn(Msg) -> NewMsg + Send + Sync>,
    ) -> Command<NewMsg> {
        let inner = match self.inner {
            CommandInner::None => CommandInner::None,
            CommandInner::Message(msg) => CommandInner::Message(f(msg)),
            CommandInner::Quit => CommandInner::Quit,
            CommandInner::Future(fut) => {
                CommandInner::Future(Box::pin(async move { f(fut.await) }))
            }
            CommandInner::Batch(cmds) => CommandInner::Batch(
                cmds.into_iter()
                    .map(|cmd| cmd.map_with(f.clone()))
                    .collect(),
            ),
        };
        Command { inner }
    }

    // --- Inspection methods (useful for testing) ---

    /// Returns `true` if this is a no-op command.
    pub fn is_none(&self) -> bool {
        matches!(self.inner, CommandInner::None)
    }

    /// Returns `true` if this command quits the program.
    pub fn is_quit(&self) -> bool {
        matches!(self.inner, CommandInner::Quit)
    }

    /// If this command is an immediate message, return it.
    pub fn into_message(self) -> Option<Msg> {
        match self.inner {
            CommandInner::Message(msg) => Some(msg),
            _ => None,
        }
    }

    /// If this command is a batch, return the inner commands.
    pub fn into_batch(self) -> Option<Vec<Command<Msg>>> {
        match self.inner {
            CommandInner::Batch(cmds) => Some(cmds),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_none() {
        let cmd: Command<()> = Command::none();
        assert!(cmd.is_none());
    }

    #[test]
    fn message_round_trips() {
        let cmd = Command::message("Command+A".to_string());
        assert_eq!(cmd.into_message().as_deref(), Some("Command+A"));
    }

    #[test]
    fn batch_collapses() {
        let empty: Command<i32> = Command::batch(vec![]);
        assert!(empty.is_none());

        let only_nones: Command<i32> = Command::batch(vec![Command::none(), Command::none()]);
        assert!(only_nones.is_none());

        let single = Command::batch(vec![Command::none(), Command::message(1)]);
        assert_eq!(single.into_message(), Some(1));

        let many = Command::batch(vec![Command::message(1), Command::message(2)]);
        assert_eq!(many.into_batch().map(|cmds| cmds.len()), Some(2));
    }

    #[test]
    fn map_lifts_messages() {
        #[derive(Debug, PartialEq)]
        enum Parent {
            Field(String),
        }
        let cmd = Command::message("Alt+X".to_string()).map(Parent::Field);
        assert_eq!(cmd.into_message(), Some(Parent::Field("Alt+X".into())));
    }

    #[test]
    fn map_preserves_quit_and_batches() {
        let quit: Command<String> = Command::<i32>::quit().map(|n| n.to_string());
        assert!(quit.is_quit());

        let batch = Command::batch(vec![Command::message(1), Command::message(2)])
            .map(|n: i32| n * 10);
        let values: Vec<_> = batch
            .into_batch()
            .unwrap()
            .into_iter()
            .filter_map(Command::into_message)
            .collect();
        assert_eq!(values, vec![10, 20]);
    }

    #[tokio::test]
    async fn perform_maps_future_output() {
        let cmd = Command::perform(async { 21 }, |n: i32| n * 2);
        match cmd.inner {
            CommandInner::Future(fut) => assert_eq!(fut.await, 42),
            _ => panic!("expected a future"),
        }
    }
}
