//! Daybook: a single-user journal with a 30-day trash, stored as whole JSON
//! documents in a key/value store, with optional language-model analysis.

pub mod ai;
pub mod clock;
pub mod config;
pub mod error;
pub mod geo;
pub mod journal;
pub mod store;

pub use error::{JournalError, Result};
