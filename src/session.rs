//! Session/player coordination
//!
//! - `PlayerSession`: the shared "what is playing" container
//! - `PlayerState`: cloned snapshots of session state
//! - `Notifier`: localized user-facing notifications
//! - `PollerHandle`: cancellable engine poller

mod notify;
mod player;
mod poller;
mod state;

pub use notify::{Notification, NotificationKind, NotificationReceiver, Notifier};
pub use player::{LibraryError, LibraryOutcome, PlayerSession};
pub use poller::PollerHandle;
pub use state::PlayerState;
