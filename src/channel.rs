//! The channel runtime: a mutex + condvar rendezvous/ring-buffer primitive.
//!
//! A [`Channel<T>`] is a reference-counted, shareable handle. Any number of
//! handles may exist; they share one [`ChannelCore`] and the last handle
//! dropped destroys it. `capacity == 0` means unbuffered (rendezvous); every
//! other capacity is a bounded ring buffer backed by a `VecDeque`.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::{RecvTimeoutError, SendError, SendTimeoutError, TryRecvError, TrySendError};
use crate::select::SelectWaiter;

/// Guarded state shared by every handle to a channel.
///
/// For buffered channels (`capacity > 0`) only `buffer` is used. For
/// unbuffered channels (`capacity == 0`) only the `pending_*` fields are used;
/// at most one of `pending_ready && !pending_taken` is true at a time.
pub(crate) struct State<T> {
    pub(crate) buffer: VecDeque<T>,
    pub(crate) pending_value: Option<T>,
    pub(crate) pending_ready: bool,
    pub(crate) pending_taken: bool,
    pub(crate) waiting_receivers: usize,
    pub(crate) closed: bool,
    pub(crate) select_waiters: Vec<std::sync::Weak<SelectWaiter>>,
}

impl<T> State<T> {
    fn new(capacity: usize) -> Self {
        State {
            buffer: VecDeque::with_capacity(capacity),
            pending_value: None,
            pending_ready: false,
            pending_taken: false,
            waiting_receivers: 0,
            closed: false,
            select_waiters: Vec::new(),
        }
    }
}

/// Wakes and prunes every live select-waiter registered on this channel.
///
/// Must be called while `state`'s mutex is held, per the registration
/// contract in [`crate::select`].
pub(crate) fn notify_select_waiters<T>(state: &mut State<T>) {
    state.select_waiters.retain(|weak| match weak.upgrade() {
        Some(waiter) => {
            waiter.signal();
            true
        }
        None => false,
    });
}

pub(crate) struct ChannelCore<T> {
    pub(crate) capacity: usize,
    pub(crate) state: Mutex<State<T>>,
    pub(crate) not_empty: Condvar,
    pub(crate) not_full: Condvar,
}

/// A typed, shareable communication channel.
///
/// Cloning a `Channel` produces another handle to the same underlying state —
/// it does not create a new channel. Values sent through the channel are
/// moved: the channel owns them while buffered, and receiving transfers
/// ownership to the caller.
///
/// # Examples
///
/// ```rust
/// use conduit::Channel;
///
/// let ch = Channel::with_capacity(4);
/// ch.send(1).unwrap();
/// ch.send(2).unwrap();
/// assert_eq!(ch.recv(), Some(1));
/// assert_eq!(ch.recv(), Some(2));
/// ```
pub struct Channel<T> {
    pub(crate) core: Arc<ChannelCore<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Channel {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T> Channel<T> {
    /// Creates a rendezvous (zero-capacity) channel.
    ///
    /// Send blocks until a receiver is ready to take the value, and vice
    /// versa.
    pub fn new() -> Self {
        Self::make(0)
    }

    /// Creates a buffered channel holding up to `capacity` values.
    ///
    /// `capacity == 0` behaves exactly like [`Channel::new`].
    pub fn with_capacity(capacity: usize) -> Self {
        Self::make(capacity)
    }

    fn make(capacity: usize) -> Self {
        tracing::trace!(capacity, "channel created");
        Channel {
            core: Arc::new(ChannelCore {
                capacity,
                state: Mutex::new(State::new(capacity)),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
            }),
        }
    }

    /// Sends a value, blocking until space is available or the channel closes.
    ///
    /// Returns the value back to the caller (wrapped in [`SendError`]) if the
    /// channel is closed, so a failed send never silently drops its payload.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        let mut state = self.core.state.lock().unwrap();
        if state.closed {
            return Err(SendError(value));
        }
        if self.core.capacity > 0 {
            while state.buffer.len() == self.core.capacity && !state.closed {
                state = self.core.not_full.wait(state).unwrap();
            }
            if state.closed {
                return Err(SendError(value));
            }
            state.buffer.push_back(value);
            self.core.not_empty.notify_one();
            notify_select_waiters(&mut state);
            Ok(())
        } else {
            while state.pending_ready && !state.closed {
                state = self.core.not_full.wait(state).unwrap();
            }
            if state.closed {
                return Err(SendError(value));
            }
            state.pending_value = Some(value);
            state.pending_ready = true;
            state.pending_taken = false;
            self.core.not_empty.notify_one();
            notify_select_waiters(&mut state);
            while !state.pending_taken && !state.closed {
                state = self.core.not_full.wait(state).unwrap();
            }
            let taken = state.pending_taken;
            let leftover = state.pending_value.take();
            state.pending_ready = false;
            state.pending_taken = false;
            if taken {
                Ok(())
            } else {
                Err(SendError(leftover.expect("offered value still present when not taken")))
            }
        }
    }

    /// Receives the next value, blocking until one is available.
    ///
    /// Returns `None` once the channel is closed and fully drained.
    pub fn recv(&self) -> Option<T> {
        let mut state = self.core.state.lock().unwrap();
        if self.core.capacity > 0 {
            while state.buffer.is_empty() && !state.closed {
                state = self.core.not_empty.wait(state).unwrap();
            }
            let value = state.buffer.pop_front();
            if value.is_some() {
                self.core.not_full.notify_one();
                notify_select_waiters(&mut state);
            }
            value
        } else {
            state.waiting_receivers += 1;
            notify_select_waiters(&mut state);
            while !state.pending_ready && !state.closed {
                state = self.core.not_empty.wait(state).unwrap();
            }
            state.waiting_receivers -= 1;
            if state.pending_ready && !state.pending_taken {
                let value = state.pending_value.take();
                state.pending_taken = true;
                state.pending_ready = false;
                self.core.not_full.notify_one();
                notify_select_waiters(&mut state);
                value
            } else {
                None
            }
        }
    }

    /// Attempts to send without blocking.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        let mut state = self.core.state.lock().unwrap();
        if state.closed {
            return Err(TrySendError::Closed(value));
        }
        if self.core.capacity > 0 {
            if state.buffer.len() < self.core.capacity {
                state.buffer.push_back(value);
                self.core.not_empty.notify_one();
                notify_select_waiters(&mut state);
                Ok(())
            } else {
                Err(TrySendError::Full(value))
            }
        } else if state.waiting_receivers > 0 && !state.pending_ready {
            state.pending_value = Some(value);
            state.pending_ready = true;
            state.pending_taken = false;
            self.core.not_empty.notify_one();
            notify_select_waiters(&mut state);
            Ok(())
        } else {
            Err(TrySendError::Full(value))
        }
    }

    /// Attempts to receive without blocking.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut state = self.core.state.lock().unwrap();
        if self.core.capacity > 0 {
            if let Some(value) = state.buffer.pop_front() {
                self.core.not_full.notify_one();
                notify_select_waiters(&mut state);
                return Ok(value);
            }
        } else if state.pending_ready && !state.pending_taken {
            let value = state
                .pending_value
                .take()
                .expect("pending_ready implies pending_value is set");
            state.pending_taken = true;
            state.pending_ready = false;
            self.core.not_full.notify_one();
            notify_select_waiters(&mut state);
            return Ok(value);
        }
        if state.closed {
            Err(TryRecvError::Closed)
        } else {
            Err(TryRecvError::Empty)
        }
    }

    /// Sends a value, blocking until space is available, the channel closes,
    /// or `timeout` elapses.
    ///
    /// On timeout the value is returned to the caller rather than dropped.
    pub fn send_timeout(&self, value: T, timeout: Duration) -> Result<(), SendTimeoutError<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.core.state.lock().unwrap();
        if state.closed {
            return Err(SendTimeoutError::Closed(value));
        }
        if self.core.capacity > 0 {
            while state.buffer.len() == self.core.capacity && !state.closed {
                let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                    return Err(SendTimeoutError::Timeout(value));
                };
                let (next, result) = self.core.not_full.wait_timeout(state, remaining).unwrap();
                state = next;
                if result.timed_out() && state.buffer.len() == self.core.capacity && !state.closed
                {
                    return Err(SendTimeoutError::Timeout(value));
                }
            }
            if state.closed {
                return Err(SendTimeoutError::Closed(value));
            }
            state.buffer.push_back(value);
            self.core.not_empty.notify_one();
            notify_select_waiters(&mut state);
            Ok(())
        } else {
            while state.pending_ready && !state.closed {
                let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                    return Err(SendTimeoutError::Timeout(value));
                };
                let (next, _) = self.core.not_full.wait_timeout(state, remaining).unwrap();
                state = next;
            }
            if state.closed {
                return Err(SendTimeoutError::Closed(value));
            }
            state.pending_value = Some(value);
            state.pending_ready = true;
            state.pending_taken = false;
            self.core.not_empty.notify_one();
            notify_select_waiters(&mut state);
            while !state.pending_taken && !state.closed {
                let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                    let leftover = state.pending_value.take();
                    state.pending_ready = false;
                    state.pending_taken = false;
                    return Err(SendTimeoutError::Timeout(
                        leftover.expect("offer withdrawn before being taken"),
                    ));
                };
                let (next, _) = self.core.not_full.wait_timeout(state, remaining).unwrap();
                state = next;
            }
            let taken = state.pending_taken;
            let leftover = state.pending_value.take();
            state.pending_ready = false;
            state.pending_taken = false;
            if taken {
                Ok(())
            } else {
                Err(SendTimeoutError::Closed(
                    leftover.expect("offered value still present when not taken"),
                ))
            }
        }
    }

    /// Receives a value, blocking until one is available, the channel closes,
    /// or `timeout` elapses.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.core.state.lock().unwrap();
        if self.core.capacity > 0 {
            loop {
                if let Some(value) = state.buffer.pop_front() {
                    self.core.not_full.notify_one();
                    notify_select_waiters(&mut state);
                    return Ok(value);
                }
                if state.closed {
                    return Err(RecvTimeoutError::Closed);
                }
                let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                    return Err(RecvTimeoutError::Timeout);
                };
                let (next, _) = self.core.not_empty.wait_timeout(state, remaining).unwrap();
                state = next;
            }
        } else {
            state.waiting_receivers += 1;
            notify_select_waiters(&mut state);
            let result = loop {
                if state.pending_ready && !state.pending_taken {
                    let value = state
                        .pending_value
                        .take()
                        .expect("pending_ready implies pending_value is set");
                    state.pending_taken = true;
                    state.pending_ready = false;
                    self.core.not_full.notify_one();
                    break Ok(value);
                }
                if state.closed {
                    break Err(RecvTimeoutError::Closed);
                }
                let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                    break Err(RecvTimeoutError::Timeout);
                };
                let (next, _) = self.core.not_empty.wait_timeout(state, remaining).unwrap();
                state = next;
            };
            state.waiting_receivers -= 1;
            notify_select_waiters(&mut state);
            result
        }
    }

    /// Closes the channel. Idempotent: later calls are no-ops.
    ///
    /// Wakes every thread parked in `send`/`recv`/`send_timeout`/
    /// `recv_timeout`/`select_wait` on this channel.
    pub fn close(&self) {
        let mut state = self.core.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.closed = true;
        self.core.not_empty.notify_all();
        self.core.not_full.notify_all();
        notify_select_waiters(&mut state);
        tracing::debug!("channel closed");
    }

    /// Returns `true` if the channel has been closed.
    pub fn is_closed(&self) -> bool {
        self.core.state.lock().unwrap().closed
    }

    /// Returns the number of values currently buffered (0 or 1 for an
    /// unbuffered channel, depending on whether a send is pending handoff).
    pub fn len(&self) -> usize {
        let state = self.core.state.lock().unwrap();
        if self.core.capacity > 0 {
            state.buffer.len()
        } else if state.pending_ready && !state.pending_taken {
            1
        } else {
            0
        }
    }

    /// Returns `true` if [`Channel::len`] is 0.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the channel's capacity (0 for rendezvous channels).
    pub fn capacity(&self) -> usize {
        self.core.capacity
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}
