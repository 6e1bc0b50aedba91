//! Messenger abstraction. Telegram implements it in the adapter crate.

pub mod port;
pub mod types;
