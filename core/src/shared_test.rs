//! Tests for SharedSequence

use super::*;
use crate::error::ErrorKind;
use crate::test_utils::init_test_logging;
use once_cell::sync::Lazy;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

static FACTORIALS: Lazy<SharedSequence<u64>> =
    Lazy::new(|| SharedSequence::new([1u64], |i, seq| Ok(seq.get(i - 1)? * i as u64)));

fn fibonacci_rule() -> impl Fn(usize, &dyn Lookup<u64>) -> Result<u64, RuleError> + Send + Sync {
    |i, seq| Ok(seq.get(i - 1)? + seq.get(i - 2)?)
}

/// Spins until `done` holds, yielding between checks.
fn wait_until(mut done: impl FnMut() -> bool) {
    while !done() {
        thread::yield_now();
    }
}

#[test]
fn test_single_reader() {
    let fib = SharedSequence::new([0u64, 1], fibonacci_rule());

    assert_eq!(fib.get(10).unwrap(), 55);
    assert_eq!(fib.get(7).unwrap(), 13);
    assert_eq!(fib.computed_count(), 11);
    assert_eq!(fib.get(-1).unwrap_err().kind(), ErrorKind::Domain);
    assert!(!fib.has_bound());
}

#[test]
fn test_self_reference_is_a_cycle() {
    let seq = SharedSequence::<u64>::new(Vec::new(), |i, seq| Ok(seq.get(i)?));

    match seq.get(0) {
        Err(Error::Cycle { index, chain }) => {
            assert_eq!(index, 0);
            assert_eq!(chain, vec![0, 0]);
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
    assert_eq!(seq.status(0), CellStatus::Empty);
}

#[test]
fn test_concurrent_readers_compute_each_index_once() {
    init_test_logging();
    let calls: Arc<Vec<AtomicUsize>> = Arc::new((0..=60).map(|_| AtomicUsize::new(0)).collect());
    let counter = Arc::clone(&calls);
    let fib = Arc::new(SharedSequence::new([0u64, 1], move |i, seq| {
        counter[i].fetch_add(1, Ordering::SeqCst);
        Ok(seq.get(i - 1)? + seq.get(i - 2)?)
    }));

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|n| {
            let fib = Arc::clone(&fib);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // Start from different places so chains overlap.
                fib.get(30 + n).unwrap();
                fib.get(60).unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1_548_008_755_920);
    }
    for (index, count) in calls.iter().enumerate().skip(2) {
        assert_eq!(count.load(Ordering::SeqCst), 1, "index {index}");
    }
    assert_eq!(fib.computed_count(), 61);
}

#[test]
fn test_waiting_reader_gets_value_not_cycle() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let seq = Arc::new(SharedSequence::<u64>::new(Vec::new(), move |i, _| {
        if i == 10 {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
        }
        Ok(2 * i as u64)
    }));

    let first = {
        let seq = Arc::clone(&seq);
        thread::spawn(move || seq.get(10))
    };
    wait_until(|| calls.load(Ordering::SeqCst) > 0);

    assert_eq!(seq.get(10).unwrap(), 20);
    assert_eq!(first.join().unwrap().unwrap(), 20);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_owner_hands_cell_to_waiter() {
    let started = Arc::new(AtomicUsize::new(0));
    let fail_once = Arc::new(AtomicBool::new(true));
    let (counter, flag) = (Arc::clone(&started), Arc::clone(&fail_once));
    let seq = Arc::new(SharedSequence::new([0u64, 1], move |i, seq| {
        if i == 5 {
            counter.fetch_add(1, Ordering::SeqCst);
            if flag.swap(false, Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(30));
                return Err("transient failure".into());
            }
        }
        Ok(seq.get(i - 1)? + seq.get(i - 2)?)
    }));

    let first = {
        let seq = Arc::clone(&seq);
        thread::spawn(move || seq.get(5))
    };
    wait_until(|| started.load(Ordering::SeqCst) > 0);

    assert_eq!(seq.get(5).unwrap(), 5);
    let err = first.join().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Generator);
    assert_eq!(err.index(), Some(5));
    assert_eq!(started.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cross_thread_cycle_fails_instead_of_deadlocking() {
    let seq = Arc::new(SharedSequence::<u64>::new(Vec::new(), |i, seq| {
        thread::sleep(Duration::from_millis(30));
        match i {
            1 => Ok(seq.get(2)? + 1),
            2 => Ok(seq.get(1)? + 1),
            _ => Ok(0),
        }
    }));

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [1usize, 2]
        .into_iter()
        .map(|start| {
            let seq = Arc::clone(&seq);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                seq.get(start)
            })
        })
        .collect();

    for handle in handles {
        match handle.join().unwrap() {
            Err(Error::Cycle { chain, .. }) => {
                assert_eq!(chain.first(), chain.last());
                assert_eq!(chain.len(), 3);
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }
    assert_eq!(seq.status(1), CellStatus::Empty);
    assert_eq!(seq.status(2), CellStatus::Empty);
    assert_eq!(seq.get(3).unwrap(), 0);
}

#[test]
fn test_static_sequence() {
    let handles: Vec<_> = (0..4)
        .map(|_| thread::spawn(|| FACTORIALS.get(20).unwrap()))
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2_432_902_008_176_640_000);
    }
    assert_eq!(FACTORIALS.get(5).unwrap(), 120);
}

#[test]
fn test_bounded_shared_sequence() {
    let fib = SharedSequence::bounded([0u64, 1], 10, fibonacci_rule()).unwrap();

    assert_eq!(fib.extent(), Extent::Bounded { max_index: 10 });
    assert_eq!(fib.bound(), Some(10));
    assert!(matches!(
        fib.get(11),
        Err(Error::Domain {
            index: 11,
            bound: Some(10)
        })
    ));
    assert!(SharedSequence::bounded([0u64, 1, 1], 0, fibonacci_rule()).is_err());
}

#[test]
fn test_other_sequence_errors_are_generator_errors() {
    let fib = Arc::new(SharedSequence::bounded([0u64, 1], 10, fibonacci_rule()).unwrap());
    let lookup = Arc::clone(&fib);
    let doubled = SharedSequence::new(Vec::<u64>::new(), move |i, _| Ok(lookup.get(i)? * 2));

    assert_eq!(doubled.get(10).unwrap(), 110);

    match doubled.get(11) {
        Err(Error::Generator { index, source }) => {
            assert_eq!(index, 11);
            assert_eq!(
                source.to_string(),
                "index 11 is outside the sequence domain (maximum index is 10)"
            );
        }
        other => panic!("expected generator error, got {other:?}"),
    }
    assert_eq!(doubled.status(11), CellStatus::Empty);
}

#[test]
fn test_depth_limit_and_force_through() {
    let options = SequenceOptions::new().with_max_depth(1);
    let fib = SharedSequence::with_options(options, [0u64, 1], fibonacci_rule()).unwrap();

    assert!(matches!(
        fib.get(4),
        Err(Error::DepthExceeded {
            index: 3,
            max_depth: 1
        })
    ));
    assert_eq!(fib.status(4), CellStatus::Empty);

    fib.force_through(40).unwrap();
    assert_eq!(fib.get(40).unwrap(), 102_334_155);
    assert_eq!(fib.snapshot().len(), 41);
}

#[test]
fn test_debug_output() {
    let fib = SharedSequence::new([0u64, 1], fibonacci_rule());
    fib.get(3).unwrap();
    let debug = format!("{fib:?}");
    assert!(debug.starts_with("SharedSequence"), "{debug}");
    assert!(debug.contains("computed: 4"), "{debug}");
}
