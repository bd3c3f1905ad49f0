use crate::event::TerminalEvent;
use crate::subscription::{Subscription, SubscriptionId};
use crossterm::event::EventStream;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Marker type giving the terminal event subscription its identity.
pub struct TerminalEvents;

/// Subscribe to terminal events, mapping each one through `map`.
///
/// Return `Some(msg)` to forward an event to the model or `None` to drop it.
/// There is only ever one terminal event subscription and it is never
/// restarted, so the mapping declared first stays in effect.  Keep it free of
/// model state and route by focus in `update` instead.
///
/// # Example
///
/// ```rust,ignore
/// fn subscriptions(&self) -> Vec<Subscription<Msg>> {
///     vec![terminal_events(|event| match event {
///         TerminalEvent::Key(key) => Some(Msg::Key(key)),
///         _ => None,
///     })]
/// }
/// ```
pub fn terminal_events<Msg: Send + 'static>(
    map: impl Fn(TerminalEvent) -> Option<Msg> + Send + Sync + 'static,
) -> Subscription<Msg> {
    let map = Arc::new(map);
    Subscription {
        id: SubscriptionId::of::<TerminalEvents>(),
        spawn: Box::new(move |tx: mpsc::UnboundedSender<Msg>| -> AbortHandle {
            // The EventStream is created inside the task: creating it on every
            // subscriptions() call would poke crossterm's global reader while
            // the live stream is polling it.
            let handle = tokio::spawn(async move {
                let mut events = EventStream::new();
                while let Some(event) = events.next().await {
                    let Ok(event) = event else { continue };
                    if let Some(msg) = map(TerminalEvent::from(event)) {
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                }
            });
            handle.abort_handle()
        }),
    }
}
