use tokio::sync::broadcast;
use tracing::debug;

/// Payload-free invalidation pulse telling read-views to re-query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSignal {
    ProductsChanged,
    RentalsChanged,
}

/// Process-wide publish/subscribe fan-out for refresh pulses.
///
/// Created once at startup and cloned into every writer; every live
/// subscriber sees every publish, publishing with no subscribers is a no-op,
/// and subscribing after a publish does not replay it.
#[derive(Debug, Clone)]
pub struct RefreshNotifier {
    tx: broadcast::Sender<RefreshSignal>,
}

impl RefreshNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshSignal> {
        self.tx.subscribe()
    }

    pub fn publish(&self, signal: RefreshSignal) {
        // send only errors when there are no receivers, which is fine
        let delivered = self.tx.send(signal).unwrap_or(0);
        debug!(?signal, delivered, "published refresh signal");
    }
}

impl Default for RefreshNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[tokio::test]
    async fn every_subscriber_sees_every_publish() {
        let notifier = RefreshNotifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        notifier.publish(RefreshSignal::ProductsChanged);
        notifier.publish(RefreshSignal::RentalsChanged);

        for rx in [&mut a, &mut b] {
            assert_eq!(rx.try_recv().unwrap(), RefreshSignal::ProductsChanged);
            assert_eq!(rx.try_recv().unwrap(), RefreshSignal::RentalsChanged);
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let notifier = RefreshNotifier::new();
        notifier.publish(RefreshSignal::ProductsChanged);
    }

    #[tokio::test]
    async fn late_subscriber_gets_no_replay() {
        let notifier = RefreshNotifier::new();
        // keep one receiver alive so the publish is actually delivered somewhere
        let _early = notifier.subscribe();
        notifier.publish(RefreshSignal::ProductsChanged);

        let mut late = notifier.subscribe();
        assert_eq!(late.try_recv().unwrap_err(), TryRecvError::Empty);
    }
}
