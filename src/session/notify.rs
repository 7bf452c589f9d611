//! User-facing notifications
//!
//! Every user-visible outcome is sent as a `Notification` on an unbounded
//! channel. Sending never blocks and a dropped receiver is ignored.

use tokio::sync::mpsc;

use crate::i18n::{Key, Locale};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Receiver for notifications (held by the front end)
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Localized notification sender
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
    locale: Locale,
}

impl Notifier {
    /// Create a notifier and the receiving end of its channel
    pub fn channel(locale: Locale) -> (Self, NotificationReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, locale }, rx)
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Translate a key in the notifier's language
    pub fn text(&self, key: Key) -> &'static str {
        self.locale.get(key)
    }

    pub fn notify(&self, kind: NotificationKind, title: Key, message: impl Into<String>) {
        let _ = self.tx.send(Notification {
            kind,
            title: self.text(title).to_string(),
            message: message.into(),
        });
    }

    pub fn info(&self, title: Key, message: impl Into<String>) {
        self.notify(NotificationKind::Info, title, message);
    }

    pub fn success(&self, title: Key, message: impl Into<String>) {
        self.notify(NotificationKind::Success, title, message);
    }

    pub fn error(&self, title: Key, message: impl Into<String>) {
        self.notify(NotificationKind::Error, title, message);
    }

    /// Generic error notification with a translated message
    pub fn failure(&self, message: Key) {
        self.error(Key::Error, self.text(message));
    }
}
