//! Logical clock and cancellable timers.
//!
//! Every delay in the experience (lock reset, unlock advance, reveal ticks,
//! audio start, proposal phases, celebration units) goes through a
//! [`Scheduler`]. Time only moves when the driver says so, which keeps the
//! stage machine deterministic under test: a fake clock is just a scheduler
//! advanced by hand.
//!
//! Timers are popped one at a time with [`Scheduler::pop_due`] so the caller
//! can apply the effects of one firing (including cancelling other timers)
//! before the next one is considered.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

/// Smallest period accepted for repeating timers.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a scheduled timer. Cancelling a handle that already fired is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cadence {
    Once,
    Every(Duration),
}

#[derive(Debug)]
struct Timer<T> {
    key: (Duration, u64),
    cadence: Cadence,
    task: T,
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub handle: TimerHandle,
    /// Logical instant the timer was due at.
    pub at: Duration,
    pub task: T,
    /// True for repeating timers (still armed after this firing).
    pub repeating: bool,
}

/// Deterministic scheduler over a logical clock starting at zero.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    // (deadline, insertion sequence) -> timer id; ties fire in insertion order
    queue: BTreeMap<(Duration, u64), u64>,
    timers: HashMap<u64, Timer<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            timers: HashMap::new(),
        }
    }

    /// Current logical time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Run `task` once, `delay` from now.
    pub fn schedule_once(&mut self, delay: Duration, task: T) -> TimerHandle {
        self.insert(self.now + delay, Cadence::Once, task)
    }

    /// Run `task` every `period`, first firing one period from now.
    pub fn schedule_every(&mut self, period: Duration, task: T) -> TimerHandle {
        let period = period.max(MIN_PERIOD);
        self.insert(self.now + period, Cadence::Every(period), task)
    }

    /// Cancel a pending timer. Returns false if it was not pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.timers.remove(&handle.0) {
            Some(timer) => {
                self.queue.remove(&timer.key);
                debug!(timer = handle.0, "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every pending timer.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        self.queue.clear();
        self.timers.clear();
        count
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle.0)
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Deadline of the earliest armed timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Move the clock forward to `until` without firing anything.
    ///
    /// Call after draining [`Scheduler::pop_due`]; the clock never moves backwards.
    pub fn settle(&mut self, until: Duration) {
        if until > self.now {
            self.now = until;
        }
    }

    fn insert(&mut self, deadline: Duration, cadence: Cadence, task: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        let key = self.next_key(deadline);
        self.queue.insert(key, id);
        self.timers.insert(id, Timer { key, cadence, task });
        debug!(timer = id, deadline_ms = deadline.as_millis() as u64, "timer armed");
        TimerHandle(id)
    }

    fn next_key(&mut self, deadline: Duration) -> (Duration, u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        (deadline, seq)
    }
}

impl<T: Clone> Scheduler<T> {
    /// Pop the earliest timer due at or before `until`, moving the clock to its deadline.
    ///
    /// Repeating timers are re-armed one period after the deadline they fired at,
    /// so a late driver still sees every tick in order.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<T>> {
        let (&key, &id) = self.queue.iter().next()?;
        if key.0 > until {
            return None;
        }
        self.queue.remove(&key);
        if key.0 > self.now {
            self.now = key.0;
        }

        let cadence = self.timers.get(&id)?.cadence;
        match cadence {
            Cadence::Once => {
                let timer = self.timers.remove(&id)?;
                Some(Fired {
                    handle: TimerHandle(id),
                    at: key.0,
                    task: timer.task,
                    repeating: false,
                })
            }
            Cadence::Every(period) => {
                let next = self.next_key(key.0 + period);
                let timer = self.timers.get_mut(&id)?;
                timer.key = next;
                let task = timer.task.clone();
                self.queue.insert(next, id);
                Some(Fired {
                    handle: TimerHandle(id),
                    at: key.0,
                    task,
                    repeating: true,
                })
            }
        }
    }

    /// Fire everything due up to `until` (no re-entrancy) and settle the clock there.
    pub fn advance_to(&mut self, until: Duration) -> Vec<Fired<T>> {
        let mut fired = Vec::new();
        while let Some(f) = self.pop_due(until) {
            fired.push(f);
        }
        self.settle(until);
        fired
    }
}
