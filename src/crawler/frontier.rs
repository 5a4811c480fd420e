//! Deduplicating, bounded crawl frontier
//!
//! The frontier is the only state shared between workers. It owns:
//! - the bounded FIFO queue of admitted targets
//! - the visited set of every URL ever admitted
//! - the count of targets admitted but not yet completed
//!
//! Workers only see `admit`, `take` and `complete`. When the last in-flight
//! target completes, the frontier closes itself and every waiting `take`
//! returns `None`.
//!
//! Backpressure never stalls the whole pool: a registered worker that would
//! be the last one left waiting for queue space is let past capacity, since
//! no other worker remains to drain the queue.

use crate::crawler::CrawlTarget;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Notify;

/// Returned by [`Frontier::admit`] once the frontier no longer accepts work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("frontier is closed")]
pub struct FrontierClosed;

struct FrontierState {
    queue: VecDeque<CrawlTarget>,
    visited: HashSet<String>,

    /// Admitted (or held open) but not yet completed
    in_flight: usize,

    closed: bool,

    /// Registered workers still running
    workers: usize,

    /// Registered workers waiting for queue space
    parked: usize,
}

enum Admission {
    Done(Result<bool, FrontierClosed>),
    Wait,
}

/// Bounded work queue that admits each URL at most once
///
/// # Example
///
/// ```
/// use weir::crawler::{CrawlTarget, Frontier};
/// use url::Url;
///
/// # async fn example() {
/// let frontier = Frontier::new(16);
/// let seed = CrawlTarget::seed(Url::parse("https://a.example/").unwrap(), "https://a.example");
///
/// assert_eq!(frontier.admit(seed.clone()).await, Ok(true));
/// assert_eq!(frontier.admit(seed).await, Ok(false));
///
/// let _target = frontier.take().await.unwrap();
/// frontier.complete();
/// assert!(frontier.is_closed());
/// # }
/// ```
pub struct Frontier {
    state: Mutex<FrontierState>,
    item_ready: Notify,
    space_ready: Notify,
    capacity: usize,
}

/// A running worker's registration with the frontier
///
/// Admissions made through it count towards the stall check described in
/// the module docs. Dropping it unregisters the worker.
pub struct WorkerSlot<'a> {
    frontier: &'a Frontier,
}

impl WorkerSlot<'_> {
    /// Same as [`Frontier::admit`], except it never waits when every other
    /// registered worker is already waiting
    pub async fn admit(&self, target: CrawlTarget) -> Result<bool, FrontierClosed> {
        self.frontier.admit_inner(target, true).await
    }
}

impl Drop for WorkerSlot<'_> {
    fn drop(&mut self) {
        let mut state = self.frontier.lock_state();
        state.workers = state.workers.saturating_sub(1);
        drop(state);
        // A parked worker may now be the last one standing
        self.frontier.space_ready.notify_waiters();
    }
}

/// Undoes a park when a waiting admission resumes or is dropped
struct Parked<'a>(&'a Frontier);

impl Drop for Parked<'_> {
    fn drop(&mut self) {
        let mut state = self.0.lock_state();
        state.parked = state.parked.saturating_sub(1);
    }
}

impl Frontier {
    /// Creates an open, empty frontier holding at most `capacity` queued targets
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(FrontierState {
                queue: VecDeque::new(),
                visited: HashSet::new(),
                in_flight: 0,
                closed: false,
                workers: 0,
                parked: 0,
            }),
            item_ready: Notify::new(),
            space_ready: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    /// Registers a worker for the lifetime of the returned slot
    pub fn register_worker(&self) -> WorkerSlot<'_> {
        self.lock_state().workers += 1;
        WorkerSlot { frontier: self }
    }

    /// Admits a target if its URL has never been admitted before
    ///
    /// Waits while the queue is full. The visited check, the visited insert
    /// and the enqueue happen under one lock, so concurrent admissions of the
    /// same URL yield exactly one `true`. Dropping the returned future before
    /// it resolves admits nothing.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The target was enqueued
    /// * `Ok(false)` - The URL was already admitted; nothing changed
    /// * `Err(FrontierClosed)` - The frontier is closed; stop producing
    pub async fn admit(&self, target: CrawlTarget) -> Result<bool, FrontierClosed> {
        self.admit_inner(target, false).await
    }

    async fn admit_inner(
        &self,
        target: CrawlTarget,
        from_worker: bool,
    ) -> Result<bool, FrontierClosed> {
        let mut target = Some(target);

        loop {
            let notified = self.space_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let parked = {
                let mut state = self.lock_state();
                match self.try_enqueue(&mut state, &mut target, from_worker) {
                    Admission::Done(result) => return result,
                    Admission::Wait => {
                        if from_worker {
                            state.parked += 1;
                            Some(Parked(self))
                        } else {
                            None
                        }
                    }
                }
            };

            notified.await;
            drop(parked);
        }
    }

    fn try_enqueue(
        &self,
        state: &mut FrontierState,
        target: &mut Option<CrawlTarget>,
        from_worker: bool,
    ) -> Admission {
        if state.closed {
            return Admission::Done(Err(FrontierClosed));
        }

        let Some(url) = target.as_ref().map(|t| t.url.as_str()) else {
            return Admission::Done(Ok(false));
        };
        if state.visited.contains(url) {
            return Admission::Done(Ok(false));
        }

        let stalled = from_worker && state.parked + 1 >= state.workers;
        if state.queue.len() >= self.capacity && !stalled {
            return Admission::Wait;
        }

        let Some(target) = target.take() else {
            return Admission::Done(Ok(false));
        };
        if stalled && state.queue.len() >= self.capacity {
            tracing::debug!(
                "Every worker is waiting on a full frontier; admitting {} past capacity",
                target.url
            );
        }

        state.visited.insert(target.url.as_str().to_owned());
        state.in_flight += 1;
        state.queue.push_back(target);
        self.item_ready.notify_one();

        Admission::Done(Ok(true))
    }

    /// Takes the next target, waiting until one is available
    ///
    /// Returns `None` once the frontier is closed and drained. Cancel-safe:
    /// if the future is dropped no target is lost.
    pub async fn take(&self) -> Option<CrawlTarget> {
        loop {
            let notified = self.item_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock_state();
                if let Some(target) = state.queue.pop_front() {
                    drop(state);
                    self.space_ready.notify_waiters();
                    return Some(target);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks one taken target (or one [`hold_open`](Self::hold_open)) as finished
    ///
    /// Must be called exactly once per target returned by [`take`](Self::take),
    /// after any links discovered on it have been admitted. Closes the
    /// frontier when nothing is left in flight.
    pub fn complete(&self) {
        let mut state = self.lock_state();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.in_flight == 0 && !state.closed {
            tracing::debug!(
                "Frontier exhausted after {} admitted URLs",
                state.visited.len()
            );
            drop(state);
            self.close();
        }
    }

    /// Keeps the frontier open for a producer that is not a worker
    ///
    /// Used while seeding so workers finishing early seeds cannot close the
    /// frontier before the remaining seeds are admitted. Pair with one
    /// [`complete`](Self::complete) call.
    pub fn hold_open(&self) {
        self.lock_state().in_flight += 1;
    }

    /// Stops admission
    ///
    /// Already-queued targets can still be taken; once they are drained,
    /// `take` returns `None`. Idempotent.
    pub fn close(&self) {
        self.lock_state().closed = true;
        self.item_ready.notify_waiters();
        self.space_ready.notify_waiters();
    }

    /// Returns whether admission has stopped
    pub fn is_closed(&self) -> bool {
        self.lock_state().closed
    }

    /// Number of targets admitted (or held open) but not yet completed
    pub fn in_flight(&self) -> usize {
        self.lock_state().in_flight
    }

    /// Number of distinct URLs ever admitted
    pub fn visited_count(&self) -> usize {
        self.lock_state().visited.len()
    }

    /// Number of targets waiting to be taken
    ///
    /// Can exceed [`capacity`](Self::capacity) after a stalled worker was let
    /// through.
    pub fn queued(&self) -> usize {
        self.lock_state().queue.len()
    }

    /// Maximum number of queued targets before admission waits
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock_state(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
