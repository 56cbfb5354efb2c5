//! Synchronization utilities.

pub mod queue;
