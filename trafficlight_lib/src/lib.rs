//! A traffic light simulation built around a blocking handoff queue.
//!
//! A [`PhaseController`](controller::PhaseController) flips a light between red and green on a background thread
//! and hands every flip to waiting threads through a [`BlockingQueue`](utils::queue::BlockingQueue).

#![deny(missing_docs)]

pub mod config;
pub mod controller;
pub mod error;
pub mod phase;
pub mod utils;
