//! Light phases.
//!
//! This module provides the [`Phase`] of a traffic light, the [`Cycle`] trait that describes how a phase advances,
//! and [`PhaseCell`], which shares the current phase between threads without locking.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// re-export so that users can derive `Cycle` without depending on the macro crate
pub use trafficlight_derive::Cycle;

use serde::{Deserialize, Serialize};

/// A set of states visited in a fixed rotation. It can be derived using `#[derive(Cycle)]` on a fieldless enum.
///
/// The derived implementation lists the variants in declaration order and advances each variant to the one declared
/// after it, wrapping from the last back to the first.
pub trait Cycle: Copy + 'static {
    /// Every state, in rotation order. The first entry is the initial state.
    const VARIANTS: &'static [Self];

    /// Position of `self` in [`VARIANTS`](Self::VARIANTS).
    fn index(self) -> usize;

    /// The state that follows `self`.
    fn next(self) -> Self;

    /// The state a fresh rotation starts from.
    fn initial() -> Self {
        Self::VARIANTS[0]
    }
}

/// The state of a traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Cycle)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Traffic must stop.
    Red,
    /// Traffic may proceed.
    Green,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Red => f.write_str("red"),
            Phase::Green => f.write_str("green"),
        }
    }
}

/// A record of one flip, delivered to every [`Subscription`](crate::controller::Subscription).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChange<P> {
    /// The phase the light switched to.
    pub phase: P,
    /// How long the previous phase was held.
    pub dwell: Duration,
}

/// Holds the current state of a [`Cycle`] so that any thread can read it without blocking.
pub struct PhaseCell<P: Cycle> {
    index: AtomicUsize,
    phantom: PhantomData<fn() -> P>,
}

impl<P: Cycle> PhaseCell<P> {
    /// Creates a cell holding `phase`.
    pub fn new(phase: P) -> Self {
        PhaseCell {
            index: AtomicUsize::new(phase.index()),
            phantom: PhantomData,
        }
    }

    /// Returns the stored phase.
    pub fn load(&self) -> P {
        P::VARIANTS[self.index.load(Ordering::Acquire)]
    }

    /// Replaces the stored phase.
    pub fn store(&self, phase: P) {
        self.index.store(phase.index(), Ordering::Release);
    }
}

impl<P: Cycle> Default for PhaseCell<P> {
    fn default() -> Self {
        Self::new(P::initial())
    }
}

impl<P: Cycle + fmt::Debug> fmt::Debug for PhaseCell<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PhaseCell").field(&self.load()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_phase_rotation() {
        assert_eq!(Phase::VARIANTS, &[Phase::Red, Phase::Green]);
        assert_eq!(Phase::initial(), Phase::Red);
        assert_eq!(Phase::Red.next(), Phase::Green);
        assert_eq!(Phase::Green.next(), Phase::Red);
        assert_eq!(Phase::Red.index(), 0);
        assert_eq!(Phase::Green.index(), 1);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Red.to_string(), "red");
        assert_eq!(Phase::Green.to_string(), "green");
    }

    #[test]
    fn test_phase_cell_store_load() {
        let cell = PhaseCell::<Phase>::default();
        assert_eq!(cell.load(), Phase::Red);
        cell.store(Phase::Green);
        assert_eq!(cell.load(), Phase::Green);
        assert_eq!(format!("{:?}", cell), "PhaseCell(Green)");
    }

    #[test]
    fn test_phase_cell_concurrent_reads_see_valid_phases() {
        let cell = Arc::new(PhaseCell::new(Phase::Red));
        let writer = {
            let cell = cell.clone();
            thread::spawn(move || {
                let mut phase = Phase::Red;
                for _ in 0..10_000 {
                    phase = phase.next();
                    cell.store(phase);
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cell = cell.clone();
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        assert!(matches!(cell.load(), Phase::Red | Phase::Green));
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        // an even number of flips from red lands back on red
        assert_eq!(cell.load(), Phase::Red);
    }
}
