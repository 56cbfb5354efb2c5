//! The phase controller.
//!
//! A [`PhaseController`] owns the current phase of a light and, once started, advances it on a background thread
//! after a randomized dwell time. Every flip is pushed into a [`BlockingQueue`] that callers drain through
//! [`PhaseController::wait_for_phase`], and is also fanned out to every live [`Subscription`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError, Weak};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::config::ControllerConfig;
use crate::error::PhaseError;
use crate::phase::{Cycle, Phase, PhaseCell, PhaseChange};
use crate::utils::queue::BlockingQueue;

type SubscriberList<P> = Mutex<Vec<Weak<BlockingQueue<PhaseChange<P>>>>>;

/// Drives a light through the states of `P`.
///
/// The controller is shared through an `Arc`: [`start`](Self::start) hands a clone to the cycling thread.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use trafficlight_lib::controller::PhaseController;
/// use trafficlight_lib::phase::Phase;
///
/// let light = Arc::new(PhaseController::<Phase>::new());
/// let handle = light.start().unwrap();
/// light.wait_for_phase(Phase::Green);
/// assert_eq!(light.current_phase(), Phase::Green);
/// handle.join().unwrap();
/// ```
pub struct PhaseController<P: Cycle = Phase> {
    current: PhaseCell<P>,
    queue: BlockingQueue<P>,
    subscribers: SubscriberList<P>,
    running: AtomicBool,
    config: ControllerConfig,
}

impl<P> PhaseController<P>
where
    P: Cycle + PartialEq + fmt::Debug + Send,
{
    /// Creates a controller with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    /// Creates a controller resting in the first state of `P`.
    pub fn with_config(config: ControllerConfig) -> Self {
        PhaseController {
            current: PhaseCell::new(P::initial()),
            queue: BlockingQueue::new(),
            subscribers: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            config,
        }
    }

    /// Returns the configuration the controller was built with.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Returns the most recently flipped phase without blocking.
    pub fn current_phase(&self) -> P {
        self.current.load()
    }

    /// Returns `true` while a cycling thread is alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Launches the cycling task on its own thread and returns immediately.
    ///
    /// Only one cycling task may run at a time; a second call fails with [`PhaseError::AlreadyStarted`] until the
    /// first task has exited. The task stops when the returned [`CycleHandle`] is stopped, joined or dropped.
    pub fn start(self: &Arc<Self>) -> Result<CycleHandle, PhaseError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("start called on a controller that is already cycling");
            return Err(PhaseError::AlreadyStarted);
        }

        let stop = Arc::new(StopSignal::default());
        let spawned = {
            let controller = Arc::clone(self);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name(self.config.thread_name().to_string())
                .spawn(move || {
                    let _running = RunningGuard(&controller.running);
                    controller.cycle(&stop);
                })
        };
        match spawned {
            Ok(thread) => {
                info!(
                    thread = self.config.thread_name(),
                    phase = ?self.current_phase(),
                    "cycling task started"
                );
                Ok(CycleHandle {
                    stop,
                    thread: Some(thread),
                })
            }
            Err(err) => {
                self.running.store(false, Ordering::Release);
                Err(PhaseError::Spawn(err))
            }
        }
    }

    /// Blocks until a flip to `target` is received from the handoff queue.
    ///
    /// Flips to other phases are consumed and discarded. The queue carries transitions, not snapshots: calling this
    /// while the light already shows `target` waits for the *next* transition to `target` unless one is still queued.
    /// Concurrent waiters compete for queued flips, so each flip releases at most one of them; use
    /// [`subscribe`](Self::subscribe) when every waiter must see every flip.
    pub fn wait_for_phase(&self, target: P) {
        loop {
            let phase = self.queue.receive();
            if phase == target {
                trace!(?phase, "observed awaited phase");
                return;
            }
            trace!(?phase, ?target, "discarding phase change");
        }
    }

    /// Like [`wait_for_phase`](Self::wait_for_phase), but gives up once `timeout` has elapsed.
    pub fn wait_for_phase_timeout(&self, target: P, timeout: Duration) -> Result<(), PhaseError> {
        let start = Instant::now();
        loop {
            let remaining = timeout.saturating_sub(start.elapsed());
            match self.queue.receive_timeout(remaining) {
                Some(phase) if phase == target => return Ok(()),
                Some(phase) => trace!(?phase, ?target, "discarding phase change"),
                None => return Err(PhaseError::Timeout(timeout)),
            }
        }
    }

    /// Registers a waiter that receives every subsequent flip.
    ///
    /// Unlike the shared handoff queue, each subscription has its own queue, so no flip is lost to another waiter.
    pub fn subscribe(&self) -> Subscription<P> {
        let queue = Arc::new(BlockingQueue::new());
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::downgrade(&queue));
        Subscription { queue }
    }

    fn cycle(&self, stop: &StopSignal) {
        let mut rng = self.config.rng();
        let mut last_flip = Instant::now();
        loop {
            let dwell = self.config.sample_dwell(&mut rng);
            if stop.wait_for(dwell.saturating_sub(last_flip.elapsed())) {
                break;
            }
            let now = Instant::now();
            let held = now.duration_since(last_flip);
            let phase = self.current.load().next();
            self.current.store(phase);
            last_flip = now;
            self.queue.send(phase);
            self.broadcast(PhaseChange { phase, dwell: held });
            debug!(?phase, ?held, "phase flipped");
        }
        info!(phase = ?self.current_phase(), "cycling task stopped");
    }

    fn broadcast(&self, change: PhaseChange<P>) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|subscriber| match subscriber.upgrade() {
            Some(queue) => {
                queue.send(change);
                true
            }
            None => false,
        });
    }
}

impl<P> Default for PhaseController<P>
where
    P: Cycle + PartialEq + fmt::Debug + Send,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A per-waiter stream of flips, created by [`PhaseController::subscribe`].
pub struct Subscription<P> {
    queue: Arc<BlockingQueue<PhaseChange<P>>>,
}

impl<P: Cycle + PartialEq> Subscription<P> {
    /// Blocks until the next flip.
    pub fn next_change(&self) -> PhaseChange<P> {
        self.queue.receive()
    }

    /// Blocks until the next flip, or returns `None` after `timeout`.
    pub fn next_change_timeout(&self, timeout: Duration) -> Option<PhaseChange<P>> {
        self.queue.receive_timeout(timeout)
    }

    /// Blocks until a flip to `target` arrives and returns it.
    pub fn wait_for(&self, target: P) -> PhaseChange<P> {
        loop {
            let change = self.queue.receive();
            if change.phase == target {
                return change;
            }
        }
    }
}

/// Controls a running cycling task.
///
/// Dropping the handle stops the task and waits for its thread to exit.
#[must_use = "dropping the handle stops the cycling task"]
pub struct CycleHandle {
    stop: Arc<StopSignal>,
    thread: Option<thread::JoinHandle<()>>,
}

impl CycleHandle {
    /// Asks the cycling task to stop without waiting for it.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Returns `true` once the cycling thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .map_or(true, thread::JoinHandle::is_finished)
    }

    /// Stops the cycling task and waits for its thread to exit.
    pub fn join(mut self) -> Result<(), PhaseError> {
        self.stop.stop();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| PhaseError::TaskPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for CycleHandle {
    fn drop(&mut self) {
        self.stop.stop();
        if let Some(Err(_)) = self.thread.take().map(thread::JoinHandle::join) {
            warn!("cycling task panicked before the handle was dropped");
        }
    }
}

/// Clears the running flag when the cycling thread exits, even by panic.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn stop(&self) {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.wake.notify_all();
    }

    /// Sleeps for `timeout` or until stopped. Returns `true` if stopped.
    fn wait_for(&self, timeout: Duration) -> bool {
        let stopped = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        let (stopped, _) = self
            .wake
            .wait_timeout_while(stopped, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *stopped
    }
}
