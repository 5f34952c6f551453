//! Error vocabulary for channel operations.
//!
//! The set of failure modes is closed and small: a channel operation either
//! succeeds, finds the channel closed, finds it full or empty, or times out.
//! There are no recoverable I/O errors in the core.

use std::fmt;
use thiserror::Error;

/// Error returned when sending to a closed channel.
///
/// Carries the value that could not be sent back to the caller, so ownership
/// is never silently dropped on a failed blocking send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendError<T>(pub T);

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel is closed")
    }
}

impl<T: fmt::Debug> std::error::Error for SendError<T> {}

/// Error returned by [`Channel::try_send`](crate::Channel::try_send).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrySendError<T> {
    /// The channel has no space available and no one is waiting to receive.
    Full(T),
    /// The channel is closed.
    Closed(T),
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => write!(f, "channel is full"),
            TrySendError::Closed(_) => write!(f, "channel is closed"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for TrySendError<T> {}

impl<T> TrySendError<T> {
    /// Extracts the value that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(v) | TrySendError::Closed(v) => v,
        }
    }

    /// Returns `true` if the channel was full rather than closed.
    pub fn is_full(&self) -> bool {
        matches!(self, TrySendError::Full(_))
    }

    /// Returns `true` if the channel was closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, TrySendError::Closed(_))
    }
}

/// Error returned by [`Channel::try_recv`](crate::Channel::try_recv).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    /// No value is available right now, but the channel is still open.
    #[error("channel is empty")]
    Empty,
    /// The channel is closed and has no buffered values left.
    #[error("channel is closed")]
    Closed,
}

impl TryRecvError {
    /// Returns `true` if this error is due to the channel being empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, TryRecvError::Empty)
    }

    /// Returns `true` if this error is due to the channel being closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, TryRecvError::Closed)
    }
}

/// Error returned by [`Channel::send_timeout`](crate::Channel::send_timeout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendTimeoutError<T> {
    /// The deadline elapsed before space became available.
    Timeout(T),
    /// The channel is closed.
    Closed(T),
}

impl<T> fmt::Display for SendTimeoutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendTimeoutError::Timeout(_) => write!(f, "send operation timed out"),
            SendTimeoutError::Closed(_) => write!(f, "channel is closed"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for SendTimeoutError<T> {}

impl<T> SendTimeoutError<T> {
    /// Extracts the value that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            SendTimeoutError::Timeout(v) | SendTimeoutError::Closed(v) => v,
        }
    }

    /// Returns `true` if this error is due to the deadline elapsing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SendTimeoutError::Timeout(_))
    }

    /// Returns `true` if this error is due to the channel being closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, SendTimeoutError::Closed(_))
    }
}

/// Error returned by [`Channel::recv_timeout`](crate::Channel::recv_timeout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecvTimeoutError {
    /// The deadline elapsed before a value became available.
    #[error("receive operation timed out")]
    Timeout,
    /// The channel is closed and has no buffered values left.
    #[error("channel is closed")]
    Closed,
}

impl RecvTimeoutError {
    /// Returns `true` if this error is due to the deadline elapsing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RecvTimeoutError::Timeout)
    }

    /// Returns `true` if this error is due to the channel being closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, RecvTimeoutError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_send_error_accessors() {
        let err: TrySendError<i32> = TrySendError::Full(7);
        assert!(err.is_full());
        assert!(!err.is_closed());
        assert_eq!(err.into_inner(), 7);

        let err: TrySendError<i32> = TrySendError::Closed(9);
        assert!(!err.is_full());
        assert!(err.is_closed());
        assert_eq!(err.into_inner(), 9);
    }

    #[test]
    fn try_recv_error_accessors() {
        assert!(TryRecvError::Empty.is_empty());
        assert!(!TryRecvError::Empty.is_closed());
        assert!(TryRecvError::Closed.is_closed());
        assert!(!TryRecvError::Closed.is_empty());
    }

    #[test]
    fn send_timeout_error_accessors() {
        let err: SendTimeoutError<i32> = SendTimeoutError::Timeout(1);
        assert!(err.is_timeout());
        assert!(!err.is_closed());

        let err: SendTimeoutError<i32> = SendTimeoutError::Closed(2);
        assert!(err.is_closed());
    }

    #[test]
    fn recv_timeout_error_accessors() {
        assert!(RecvTimeoutError::Timeout.is_timeout());
        assert!(!RecvTimeoutError::Timeout.is_closed());
        assert!(RecvTimeoutError::Closed.is_closed());
    }

    #[test]
    fn send_error_display() {
        assert_eq!(SendError(5).to_string(), "channel is closed");
    }
}
