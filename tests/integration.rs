//! Cross-thread scenarios that exercise the channel runtime the way a single
//! unit test module cannot: genuine concurrent producers/consumers, select
//! across threads, and close racing with a blocked party.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use conduit::{recv_case, select_wait, Channel};

#[test]
fn unbuffered_rendezvous_completes_on_both_sides() {
    let ch = Channel::new();
    let sender = ch.clone();
    let handle = thread::spawn(move || sender.send(42));
    assert_eq!(ch.recv(), Some(42));
    assert_eq!(handle.join().unwrap(), Ok(()));
}

#[test]
fn close_wakes_blocked_receiver_within_bounded_time() {
    let ch = Channel::<i32>::new();
    let receiver = ch.clone();
    let start = Instant::now();
    let handle = thread::spawn(move || receiver.recv());
    thread::sleep(Duration::from_millis(30));
    ch.close();
    assert_eq!(handle.join().unwrap(), None);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn select_wait_times_out_after_deadline() {
    let ch = Channel::<i32>::new();
    let cases = [recv_case(&ch)];
    let start = Instant::now();
    assert_eq!(select_wait(&cases, Some(Duration::from_millis(30))), None);
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn select_wait_wakes_on_close_from_another_thread() {
    let ch = Channel::<i32>::new();
    let closer = ch.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        closer.close();
    });
    let cases = [recv_case(&ch)];
    assert_eq!(select_wait(&cases, None), Some(0));
    assert_eq!(ch.recv(), None);
    handle.join().unwrap();
}

#[test]
fn three_producers_into_buffered_channel_conserve_all_values() {
    let ch = Channel::with_capacity(8);
    let producers: Vec<_> = (0..3)
        .map(|p| {
            let ch = ch.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    ch.send(p * 100 + i).unwrap();
                }
            })
        })
        .collect();

    let total = Arc::new(AtomicUsize::new(0));
    let consumer_total = Arc::clone(&total);
    let consumer_ch = ch.clone();
    let consumer = thread::spawn(move || {
        let mut received = Vec::with_capacity(300);
        while received.len() < 300 {
            if let Some(v) = consumer_ch.recv() {
                received.push(v);
                consumer_total.fetch_add(1, Ordering::SeqCst);
            }
        }
        received
    });

    for p in producers {
        p.join().unwrap();
    }
    let mut received = consumer.join().unwrap();
    assert_eq!(total.load(Ordering::SeqCst), 300);
    received.sort_unstable();
    assert_eq!(received, (0..300).collect::<Vec<_>>());
}

#[test]
fn send_timeout_returns_value_to_caller_on_expiry() {
    use conduit::SendTimeoutError;

    let ch = Channel::with_capacity(1);
    ch.send("first").unwrap();
    match ch.send_timeout("second", Duration::from_millis(30)) {
        Err(SendTimeoutError::Timeout(value)) => assert_eq!(value, "second"),
        other => panic!("expected a timeout carrying the value, got {other:?}"),
    }
}

#[test]
fn multiple_handles_share_one_channel() {
    let ch = Channel::with_capacity(4);
    let a = ch.clone();
    let b = ch.clone();
    a.send(1).unwrap();
    assert_eq!(b.recv(), Some(1));
    b.close();
    assert!(a.is_closed());
}
