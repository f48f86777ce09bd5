//! Notification sinks

mod log;
mod telegram;

pub use log::LogNotifier;
pub use telegram::{TelegramConfig, TelegramNotifier};
