//! Outbound notifications.
//!
//! - `notifier`: the `Notifier` trait and the new-connection message.
//! - `smtp_notifier`: e-mail delivery through an SMTP relay.

pub mod notifier;
pub mod smtp_notifier;

pub use notifier::{NewConnectionAlert, Notifier};
pub use smtp_notifier::SmtpNotifier;
