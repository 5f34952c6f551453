//! Broadcast/fan-out: one input channel replicated to many output channels.

use std::thread;

use crate::channel::Channel;

/// Spawns a worker that clones every value received on `input` out to
/// `outputs` new channels, each buffered to `capacity`. Every output channel
/// closes once `input` closes and drains.
pub fn broadcast<T>(input: Channel<T>, outputs: usize, capacity: usize) -> Vec<Channel<T>>
where
    T: Clone + Send + 'static,
{
    let legs: Vec<Channel<T>> = (0..outputs)
        .map(|_| Channel::with_capacity(capacity))
        .collect();
    let worker_legs = legs.clone();
    thread::spawn(move || {
        while let Some(value) = input.recv() {
            for leg in &worker_legs {
                let _ = leg.send(value.clone());
            }
        }
        for leg in &worker_legs {
            leg.close();
        }
    });
    legs
}
