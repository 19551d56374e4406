//! Notification sinks.
//!
//! `TracingNotifier` writes every status message to the log. `ChannelNotifier`
//! hands messages to a display over an unbounded channel, so the core never
//! waits on a slow or missing subscriber. `FanoutNotifier` combines sinks.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::infrastructure::ports::{DisplayState, NotificationPort};

/// Writes status messages to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationPort for TracingNotifier {
    fn notify(&self, state: DisplayState, message: &str) {
        match state {
            DisplayState::Error => tracing::warn!(state = %state, "{}", message),
            _ => tracing::info!(state = %state, "{}", message),
        }
    }
}

/// A message as delivered to a display subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub state: DisplayState,
    pub message: String,
}

/// Forwards notifications to a channel receiver.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationPort for ChannelNotifier {
    fn notify(&self, state: DisplayState, message: &str) {
        let notification = Notification {
            state,
            message: message.to_string(),
        };
        if self.tx.send(notification).is_err() {
            // Display went away; notifications are fire-and-forget
            tracing::trace!("Notification dropped, no subscriber");
        }
    }
}

/// Sends each notification to every inner sink, in order.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn NotificationPort>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn NotificationPort>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl NotificationPort for FanoutNotifier {
    fn notify(&self, state: DisplayState, message: &str) {
        for sink in &self.sinks {
            sink.notify(state, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_notifier_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.notify(DisplayState::Normal, "first");
        notifier.notify(DisplayState::Error, "second");

        assert_eq!(rx.recv().await.unwrap().message, "first");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.state, DisplayState::Error);
        assert_eq!(second.message, "second");
    }

    #[test]
    fn channel_notifier_survives_dropped_receiver() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.notify(DisplayState::Normal, "nobody listening");
    }

    #[tokio::test]
    async fn fanout_reaches_every_sink() {
        let (a, mut rx_a) = ChannelNotifier::new();
        let (b, mut rx_b) = ChannelNotifier::new();
        let fanout = FanoutNotifier::new()
            .with(Arc::new(a))
            .with(Arc::new(b))
            .with(Arc::new(TracingNotifier));

        fanout.notify(DisplayState::Disabled, "busy");

        assert_eq!(rx_a.recv().await.unwrap().state, DisplayState::Disabled);
        assert_eq!(rx_b.recv().await.unwrap().message, "busy");
    }
}
