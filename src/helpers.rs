//! Thin combinators built over the public channel/select vocabulary.
//!
//! None of this touches the channel's internal state directly; every
//! function here is a few dozen lines of composition and could live outside
//! the crate.

use std::thread;

use crate::channel::Channel;
use crate::select::{recv_case, select_wait, SelectCase};

/// Builds a closed, pre-populated channel from an iterator.
///
/// The channel is sized to hold every item, so no send ever blocks.
pub fn from_iter<T>(items: impl IntoIterator<Item = T>) -> Channel<T> {
    let items: Vec<T> = items.into_iter().collect();
    let channel = Channel::with_capacity(items.len().max(1));
    for item in items {
        channel
            .try_send(item)
            .ok()
            .expect("channel sized to item count never reports full");
    }
    channel.close();
    channel
}

/// A closed channel holding exactly one value.
pub fn singleton<T>(value: T) -> Channel<T> {
    from_iter(std::iter::once(value))
}

/// A closed channel holding no values.
pub fn empty<T>() -> Channel<T> {
    let channel = Channel::with_capacity(1);
    channel.close();
    channel
}

/// Calls `f` with every value received until the channel closes and drains.
pub fn for_each<T>(channel: &Channel<T>, mut f: impl FnMut(T)) {
    while let Some(value) = channel.recv() {
        f(value);
    }
}

/// Collects every remaining value until the channel closes and drains.
pub fn drain<T>(channel: &Channel<T>) -> Vec<T> {
    let mut values = Vec::new();
    while let Some(value) = channel.recv() {
        values.push(value);
    }
    values
}

/// Spawns a worker that applies `f` to each value of `input`, forwarding the
/// result to a new channel of capacity `capacity`. The output closes when
/// `input` closes.
pub fn map<T, U, F>(input: &Channel<T>, capacity: usize, mut f: F) -> Channel<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T) -> U + Send + 'static,
{
    let output = Channel::with_capacity(capacity);
    let input = input.clone();
    let worker_output = output.clone();
    thread::spawn(move || {
        while let Some(value) = input.recv() {
            if worker_output.send(f(value)).is_err() {
                break;
            }
        }
        worker_output.close();
    });
    output
}

/// Spawns a worker that forwards values of `input` satisfying `predicate` to
/// a new channel of capacity `capacity`. The output closes when `input`
/// closes.
pub fn filter<T, F>(input: &Channel<T>, capacity: usize, mut predicate: F) -> Channel<T>
where
    T: Send + 'static,
    F: FnMut(&T) -> bool + Send + 'static,
{
    let output = Channel::with_capacity(capacity);
    let input = input.clone();
    let worker_output = output.clone();
    thread::spawn(move || {
        while let Some(value) = input.recv() {
            if predicate(&value) && worker_output.send(value).is_err() {
                break;
            }
        }
        worker_output.close();
    });
    output
}

/// Spawns a worker that fans every `inputs` channel into one output channel,
/// using select so no input is starved. The output closes once every input
/// has closed and drained.
pub fn merge<T>(inputs: Vec<Channel<T>>, capacity: usize) -> Channel<T>
where
    T: Send + 'static,
{
    let output = Channel::with_capacity(capacity);
    let worker_output = output.clone();
    thread::spawn(move || {
        let mut remaining = inputs;
        while !remaining.is_empty() {
            let cases: Vec<SelectCase<'_>> = remaining.iter().map(recv_case).collect();
            match select_wait(&cases, None) {
                Some(index) => match remaining[index].recv() {
                    Some(value) => {
                        if worker_output.send(value).is_err() {
                            return;
                        }
                    }
                    None => {
                        remaining.remove(index);
                    }
                },
                None => break,
            }
        }
        worker_output.close();
    });
    output
}

/// Applies `stage` to `input`, for chaining combinators without naming an
/// intermediate variable.
pub fn pipe<T, U>(input: Channel<T>, stage: impl FnOnce(Channel<T>) -> Channel<U>) -> Channel<U> {
    stage(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn from_iter_then_drain() {
        let ch = from_iter([1, 2, 3]);
        assert_eq!(drain(&ch), vec![1, 2, 3]);
    }

    #[test]
    fn singleton_and_empty() {
        let ch = singleton(42);
        assert_eq!(drain(&ch), vec![42]);
        let ch: Channel<i32> = empty();
        assert_eq!(drain(&ch), Vec::<i32>::new());
    }

    #[test]
    fn for_each_visits_every_value() {
        let ch = from_iter([1, 2, 3]);
        let mut sum = 0;
        for_each(&ch, |v| sum += v);
        assert_eq!(sum, 6);
    }

    #[test]
    fn map_transforms_values() {
        let input = Channel::with_capacity(4);
        let output = map(&input, 4, |v: i32| v * 2);
        input.send(1).unwrap();
        input.send(2).unwrap();
        input.close();
        assert_eq!(drain(&output), vec![2, 4]);
    }

    #[test]
    fn filter_drops_values() {
        let input = Channel::with_capacity(4);
        let output = filter(&input, 4, |v: &i32| v % 2 == 0);
        for v in 0..5 {
            input.send(v).unwrap();
        }
        input.close();
        assert_eq!(drain(&output), vec![0, 2, 4]);
    }

    #[test]
    fn merge_collects_every_input() {
        let a = from_iter([1, 2]);
        let b = from_iter([3, 4]);
        let merged = merge(vec![a, b], 4);
        let mut values = drain(&merged);
        values.sort_unstable();
        assert_eq!(values, vec![1, 2, 3, 4]);
    }

    #[test]
    fn pipe_chains_stages() {
        let input = Channel::with_capacity(4);
        let output = pipe(input.clone(), |c| map(&c, 4, |v: i32| v + 1));
        input.send(1).unwrap();
        input.close();
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(output.recv(), Some(2));
    }
}
