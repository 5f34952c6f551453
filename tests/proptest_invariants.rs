//! Property tests for the channel's conservation and FIFO invariants under
//! arbitrary interleavings of bounded sender/receiver counts.

use std::thread;

use conduit::Channel;
use proptest::prelude::*;

proptest! {
    /// FIFO: a single sender and single receiver on a bounded channel see the
    /// same order they were sent in, regardless of the channel's capacity.
    #[test]
    fn fifo_single_producer_single_consumer(
        values in prop::collection::vec(any::<i32>(), 0..200),
        capacity in 1usize..8,
    ) {
        let ch = Channel::with_capacity(capacity);
        let sender = ch.clone();
        let expected = values.clone();
        let producer = thread::spawn(move || {
            for v in values {
                sender.send(v).unwrap();
            }
            sender.close();
        });

        let mut received = Vec::new();
        while let Some(v) = ch.recv() {
            received.push(v);
        }
        producer.join().unwrap();
        prop_assert_eq!(received, expected);
    }

    /// Conservation: every value sent by any of several producers is received
    /// exactly once, with none lost or duplicated.
    #[test]
    fn conservation_multiple_producers_one_consumer(
        batch_sizes in prop::collection::vec(0usize..30, 1..6),
        capacity in 1usize..8,
    ) {
        let ch = Channel::with_capacity(capacity);
        let mut expected: Vec<(usize, usize)> = Vec::new();
        for (producer_id, count) in batch_sizes.iter().enumerate() {
            for item in 0..*count {
                expected.push((producer_id, item));
            }
        }
        let total = expected.len();

        let producers: Vec<_> = batch_sizes
            .iter()
            .enumerate()
            .map(|(producer_id, &count)| {
                let ch = ch.clone();
                thread::spawn(move || {
                    for item in 0..count {
                        ch.send((producer_id, item)).unwrap();
                    }
                })
            })
            .collect();

        let mut received = Vec::with_capacity(total);
        while received.len() < total {
            if let Some(v) = ch.recv() {
                received.push(v);
            }
        }
        for p in producers {
            p.join().unwrap();
        }

        let mut expected_sorted = expected;
        let mut received_sorted = received;
        expected_sorted.sort_unstable();
        received_sorted.sort_unstable();
        prop_assert_eq!(received_sorted, expected_sorted);
    }

    /// Non-blocking round trip: whatever `try_send` accepts, `try_recv`
    /// returns intact, in order, for a buffered channel sized to the batch.
    #[test]
    fn try_send_try_recv_round_trip(values in prop::collection::vec(any::<i32>(), 0..64)) {
        let ch = Channel::with_capacity(values.len().max(1));
        for &v in &values {
            prop_assert_eq!(ch.try_send(v), Ok(()));
        }
        let mut received = Vec::new();
        while let Ok(v) = ch.try_recv() {
            received.push(v);
        }
        prop_assert_eq!(received, values);
    }
}
