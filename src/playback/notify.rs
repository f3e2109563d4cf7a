//! Notifications from the controller to whatever renders highlights.

use std::sync::mpsc::Sender;

use serde::Serialize;

use super::Phase;

/// Something the highlight renderer or UI should react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// Highlight one word of the sentence being spoken.
    #[serde(rename_all = "camelCase")]
    Highlight {
        sentence_index: usize,
        sentence_text: String,
        word_index: usize,
        word: String,
    },
    ClearHighlight,
    StateChanged { phase: Phase },
    /// A start was requested with nothing to read.
    NoContent,
    EngineError { message: String },
    /// The session ended, by request, by error or by running out of text.
    Stopped,
}

/// Receives controller notifications.
pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

impl NotificationSink for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

impl NotificationSink for Sender<Notification> {
    fn notify(&mut self, notification: Notification) {
        if self.send(notification).is_err() {
            tracing::trace!("notification receiver is gone");
        }
    }
}

impl<S: NotificationSink + ?Sized> NotificationSink for &mut S {
    fn notify(&mut self, notification: Notification) {
        (**self).notify(notification);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn test_channel_sink() {
        let (mut tx, rx) = mpsc::channel();
        tx.notify(Notification::Stopped);
        assert_eq!(rx.recv().unwrap(), Notification::Stopped);

        drop(rx);
        tx.notify(Notification::NoContent);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Notification::Highlight {
            sentence_index: 2,
            sentence_text: "Hello world.".into(),
            word_index: 1,
            word: "world.".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "highlight");
        assert_eq!(json["sentenceIndex"], 2);
        assert_eq!(json["word"], "world.");

        let json = serde_json::to_value(Notification::StateChanged {
            phase: Phase::Paused,
        })
        .unwrap();
        assert_eq!(json["type"], "stateChanged");
        assert_eq!(json["phase"], "paused");
    }
}
