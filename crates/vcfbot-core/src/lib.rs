//! Core pipeline + conversation logic for the VCF converter bot.
//!
//! The contact pipeline (`extract`, `naming`, `chunk`, `vcard`, `batch`) is pure
//! and synchronous. Telegram lives behind the messaging port implemented in the
//! adapter crate.

pub mod batch;
pub mod chunk;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod naming;
pub mod session;
pub mod vcard;

pub use errors::{Error, Result};
