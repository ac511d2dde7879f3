//! Event storage.
//!
//! This module provides the bounded, in-memory history that retains the most
//! recent accepted events.

pub mod history;

pub use history::{BoundedHistory, HistoryQuery};
