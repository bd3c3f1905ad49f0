use crate::subscription::{SubscriptionId, SubscriptionSource};
use futures::stream::BoxStream;
use std::time::{Duration, Instant};

/// A one-shot delay that fires once after `duration`, then completes.
///
/// The identity is `(owner, key)`, not the duration: an owner that wants to
/// restart its timer declares a `Delay` with a new key, and the runtime aborts
/// the old one while starting the new one.  Declaring nothing cancels it.
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use keycap_core::subscriptions::Delay;
/// use keycap_core::subscription::subscribe;
///
/// let generation = self.generation;
/// let sub = subscribe(Delay::new(Duration::from_millis(500), "shortcut", generation))
///     .map(move |_| Msg::QuietPeriodElapsed(generation));
/// ```
pub struct Delay {
    /// How long to wait before firing.
    pub duration: Duration,
    /// Name of the owner, so that several owners can use the same keys.
    pub owner: String,
    /// Restart key.
    pub key: u64,
}

impl Delay {
    /// Create a new one-shot delay.
    pub fn new(duration: Duration, owner: impl Into<String>, key: u64) -> Self {
        Self {
            duration,
            owner: owner.into(),
            key,
        }
    }
}

impl SubscriptionSource for Delay {
    type Output = Instant;

    fn id(&self) -> SubscriptionId {
        SubscriptionId::keyed::<Self>(&self.owner, self.key)
    }

    fn stream(self) -> BoxStream<'static, Instant> {
        Box::pin(futures::stream::once(async move {
            tokio::time::sleep(self.duration).await;
            Instant::now()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_duration() {
        let start = tokio::time::Instant::now();
        let mut stream = Delay::new(Duration::from_millis(500), "test", 0).stream();
        assert!(stream.next().await.is_some());
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn owners_do_not_collide() {
        let a = Delay::new(Duration::from_millis(500), "editor.save", 1).id();
        let b = Delay::new(Duration::from_millis(500), String::from("editor.open"), 1).id();
        assert_ne!(a, b);
    }

    #[test]
    fn id_ignores_duration() {
        let a = Delay::new(Duration::from_millis(100), "test", 4).id();
        let b = Delay::new(Duration::from_millis(900), "test", 4).id();
        assert_eq!(a, b);
    }
}
