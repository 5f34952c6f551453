//! Multi-channel select: poll and blocking arbitration over heterogeneous
//! channels.
//!
//! A select case names a channel and whether the caller wants to send or
//! receive on it; cases over different `Channel<T>` instantiations are
//! erased behind [`ErasedChannel`]/[`ErasedGuard`] so they can live in one
//! slice. The erasure is confined to "which channel, locked how" — the
//! recv/send distinction itself stays a plain two-variant enum, not virtual
//! dispatch.
//!
//! Select never performs the I/O itself: a returned index only promises the
//! case *was* ready at the instant of the check. Concurrent consumers can
//! race the same readiness away, so callers must treat the follow-up
//! `send`/`recv` as authoritative.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::channel::{Channel, State};

pub(crate) trait ErasedChannel {
    fn addr(&self) -> usize;
    fn lock_guard(&self) -> Box<dyn ErasedGuard + '_>;
}

pub(crate) trait ErasedGuard {
    fn recv_ready(&self) -> bool;
    fn send_ready(&self) -> bool;
    fn is_closed(&self) -> bool;
    fn register(&mut self, waiter: &Arc<SelectWaiter>);
    fn unregister(&mut self, waiter: &Arc<SelectWaiter>);
}

struct ChannelGuard<'a, T> {
    capacity: usize,
    guard: MutexGuard<'a, State<T>>,
}

impl<'a, T> ErasedGuard for ChannelGuard<'a, T> {
    fn recv_ready(&self) -> bool {
        if self.capacity > 0 {
            !self.guard.buffer.is_empty() || self.guard.closed
        } else {
            (self.guard.pending_ready && !self.guard.pending_taken) || self.guard.closed
        }
    }

    fn send_ready(&self) -> bool {
        if self.guard.closed {
            return false;
        }
        if self.capacity > 0 {
            self.guard.buffer.len() < self.capacity
        } else {
            self.guard.waiting_receivers > 0 && !self.guard.pending_ready
        }
    }

    fn is_closed(&self) -> bool {
        self.guard.closed
    }

    fn register(&mut self, waiter: &Arc<SelectWaiter>) {
        self.guard.select_waiters.push(Arc::downgrade(waiter));
    }

    fn unregister(&mut self, waiter: &Arc<SelectWaiter>) {
        let target = Arc::as_ptr(waiter);
        self.guard.select_waiters.retain(|w| w.as_ptr() != target);
    }
}

impl<T> ErasedChannel for Channel<T> {
    fn addr(&self) -> usize {
        Arc::as_ptr(&self.core) as *const () as usize
    }

    fn lock_guard(&self) -> Box<dyn ErasedGuard + '_> {
        let guard = self.core.state.lock().unwrap();
        Box::new(ChannelGuard {
            capacity: self.core.capacity,
            guard,
        })
    }
}

/// One arm of a [`select_poll`]/[`select_wait`] call.
///
/// Built with [`recv_case`] or [`send_case`]; the value a send-case would
/// transmit is not carried here — select only reports readiness, the caller
/// performs the actual `send`/`recv` on the winning case.
pub enum SelectCase<'a> {
    Recv(&'a dyn ErasedChannel),
    Send(&'a dyn ErasedChannel),
}

impl<'a> SelectCase<'a> {
    fn channel(&self) -> &'a dyn ErasedChannel {
        match *self {
            SelectCase::Recv(c) | SelectCase::Send(c) => c,
        }
    }

    fn is_ready(&self, guard: &dyn ErasedGuard) -> bool {
        match self {
            SelectCase::Recv(_) => guard.recv_ready(),
            SelectCase::Send(_) => guard.send_ready(),
        }
    }
}

/// Builds a receive case for `channel`.
pub fn recv_case<T>(channel: &Channel<T>) -> SelectCase<'_> {
    SelectCase::Recv(channel)
}

/// Builds a send case for `channel`.
pub fn send_case<T>(channel: &Channel<T>) -> SelectCase<'_> {
    SelectCase::Send(channel)
}

/// Per-call parking record for a blocked [`select_wait`].
///
/// Channels hold only a [`std::sync::Weak`] reference to a waiter; the
/// waiter is owned by the thread blocked in `select_wait` and is cleared
/// from every channel's list before that thread returns.
pub(crate) struct SelectWaiter {
    signaled: Mutex<bool>,
    condvar: Condvar,
}

impl SelectWaiter {
    fn new() -> Self {
        SelectWaiter {
            signaled: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Called by a channel, under its own mutex, to wake this waiter.
    pub(crate) fn signal(&self) {
        let mut signaled = self.signaled.lock().unwrap();
        *signaled = true;
        self.condvar.notify_all();
    }

    /// Parks until signaled or `deadline` passes. Returns `false` on timeout.
    ///
    /// Consumes the signal on the way out: `signal()` fires on every
    /// send/recv/close on any participant channel, most of which are
    /// spurious from this waiter's point of view, so a stale `true` left
    /// over from a prior notification must not short-circuit a later wait.
    fn wait_until(&self, deadline: Option<Instant>) -> bool {
        let mut signaled = self.signaled.lock().unwrap();
        loop {
            if *signaled {
                *signaled = false;
                return true;
            }
            match deadline {
                None => signaled = self.condvar.wait(signaled).unwrap(),
                Some(deadline) => {
                    let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                        return false;
                    };
                    let (next, result) = self.condvar.wait_timeout(signaled, remaining).unwrap();
                    signaled = next;
                    if result.timed_out() && !*signaled {
                        return false;
                    }
                }
            }
        }
    }
}

/// Locks every distinct channel among `cases`, in ascending address order,
/// deduplicating cases that name the same channel twice.
fn lock_all<'a>(cases: &[SelectCase<'a>]) -> Vec<(usize, Box<dyn ErasedGuard + 'a>)> {
    let mut unique: Vec<&'a dyn ErasedChannel> = Vec::new();
    for case in cases {
        let ch = case.channel();
        if !unique.iter().any(|existing| existing.addr() == ch.addr()) {
            unique.push(ch);
        }
    }
    unique.sort_by_key(|c| c.addr());
    unique
        .into_iter()
        .map(|c| (c.addr(), c.lock_guard()))
        .collect()
}

fn readiness_pass(
    cases: &[SelectCase<'_>],
    guards: &[(usize, Box<dyn ErasedGuard + '_>)],
) -> Option<usize> {
    for (index, case) in cases.iter().enumerate() {
        let addr = case.channel().addr();
        let guard = &guards.iter().find(|(a, _)| *a == addr).unwrap().1;
        if case.is_ready(guard.as_ref()) {
            return Some(index);
        }
    }
    None
}

/// Reports whether any case is immediately ready, without blocking.
///
/// Locks are held only for the duration of the check; this never performs
/// the underlying send/recv.
pub fn select_poll(cases: &[SelectCase<'_>]) -> Option<usize> {
    let guards = lock_all(cases);
    readiness_pass(cases, &guards)
}

/// Blocks until some case becomes ready, every case's channel is exhausted,
/// or `timeout` elapses (`None` waits forever).
///
/// "Exhausted" means every recv-case's channel is closed and drained and
/// every send-case's channel is closed — at that point no case can ever
/// become ready again, so `select_wait` returns `None` immediately rather
/// than waiting out the deadline.
pub fn select_wait(cases: &[SelectCase<'_>], timeout: Option<Duration>) -> Option<usize> {
    let deadline = timeout.map(|t| Instant::now() + t);
    let waiter = Arc::new(SelectWaiter::new());
    let mut registered = false;

    loop {
        let mut guards = lock_all(cases);
        debug_assert!(
            guards.windows(2).all(|w| w[0].0 < w[1].0),
            "select must lock participant channels in strictly ascending address order"
        );

        if registered {
            for (_, guard) in guards.iter_mut() {
                guard.unregister(&waiter);
            }
            registered = false;
        }

        if let Some(index) = readiness_pass(cases, &guards) {
            return Some(index);
        }

        let exhausted = cases.iter().all(|case| {
            let addr = case.channel().addr();
            guards.iter().find(|(a, _)| *a == addr).unwrap().1.is_closed()
        });
        if exhausted {
            return None;
        }

        for (_, guard) in guards.iter_mut() {
            guard.register(&waiter);
        }
        registered = true;
        drop(guards);

        if !waiter.wait_until(deadline) {
            let mut guards = lock_all(cases);
            for (_, guard) in guards.iter_mut() {
                guard.unregister(&waiter);
            }
            return None;
        }
    }
}
