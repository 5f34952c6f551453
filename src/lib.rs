//! Typed, first-class communication channels with blocking, non-blocking,
//! timed, and select operations.
//!
//! The channel runtime (`channel`, `select`, `error`) is the core: it
//! enforces at-most-one delivery, FIFO ordering within a channel, safe
//! wakeup of every parked party on close, accurate non-blocking readiness,
//! and deadlock-free arbitration across channels in `select`. `helpers` and
//! `hub` are thin collaborators built entirely over that public vocabulary.
//!
//! ```rust
//! use conduit::{select_poll, recv_case, Channel};
//!
//! let a = Channel::with_capacity(1);
//! let b = Channel::with_capacity(1);
//! b.send("ready").unwrap();
//!
//! let cases = [recv_case(&a), recv_case(&b)];
//! assert_eq!(select_poll(&cases), Some(1));
//! ```

pub mod channel;
pub mod error;
pub mod helpers;
pub mod hub;
pub mod select;

pub use channel::Channel;
pub use error::{RecvTimeoutError, SendError, SendTimeoutError, TryRecvError, TrySendError};
pub use helpers::{drain, empty, filter, for_each, from_iter, map, merge, pipe, singleton};
pub use hub::broadcast;
pub use select::{recv_case, select_poll, select_wait, send_case, SelectCase};
