//! Behavioral properties of lazy sequences, checked through the facade crate.

use lazyseq::{
    CellStatus, Error, ErrorKind, LazySequence, Lookup, RuleError, SequenceOptions, SharedSequence,
};
use once_cell::sync::Lazy;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

type Calls = Rc<RefCell<BTreeMap<usize, usize>>>;

/// Fibonacci that records how often the rule ran for each index.
fn counted_fibonacci() -> (LazySequence<u64>, Calls) {
    let calls: Calls = Rc::default();
    let counter = Rc::clone(&calls);
    let seq = LazySequence::new([0u64, 1], move |i, seq| {
        *counter.borrow_mut().entry(i).or_default() += 1;
        Ok(seq.get(i - 1)? + seq.get(i - 2)?)
    });
    (seq, calls)
}

#[test]
fn memoization() {
    let (fib, calls) = counted_fibonacci();

    assert_eq!(fib.get(20).unwrap(), 6765);
    assert_eq!(fib.get(20).unwrap(), 6765);
    assert!(calls.borrow().values().all(|&n| n == 1));
    assert_eq!(calls.borrow().len(), 19);
}

#[test]
fn seeds_are_never_generated() {
    let (fib, calls) = counted_fibonacci();

    assert_eq!(fib.get(0).unwrap(), 0);
    assert_eq!(fib.get(1).unwrap(), 1);
    fib.get(10).unwrap();
    assert!(!calls.borrow().contains_key(&0));
    assert!(!calls.borrow().contains_key(&1));
    assert_eq!(fib.seed_count(), 2);
}

#[test]
fn fibonacci_reads_cached_prefix() {
    let (fib, calls) = counted_fibonacci();

    assert_eq!(fib.get(10).unwrap(), 55);
    let before = calls.borrow().clone();
    assert_eq!(fib.get(7).unwrap(), 13);
    assert_eq!(*calls.borrow(), before);
}

#[test]
fn access_order_does_not_matter() {
    let (ascending, _) = counted_fibonacci();
    let (descending, _) = counted_fibonacci();

    let up = (ascending.get(7).unwrap(), ascending.get(10).unwrap());
    let ten = descending.get(10).unwrap();
    let down = (descending.get(7).unwrap(), ten);

    assert_eq!(up, (13, 55));
    assert_eq!(up, down);
    assert_eq!(ascending.snapshot(), descending.snapshot());
}

#[test]
fn self_reference_is_a_cycle() {
    let seq = LazySequence::<u64>::new(Vec::new(), |i, seq| Ok(seq.get(i)?));

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
fn out_of_domain_reads_fail() {
    let (fib, _) = counted_fibonacci();
    assert_eq!(fib.get(-1).unwrap_err().kind(), ErrorKind::Domain);
    assert_eq!(fib.computed_count(), 2);

    let bounded = LazySequence::bounded([0u64, 1], 30, |i, seq| {
        Ok(seq.get(i - 1)? + seq.get(i - 2)?)
    })
    .unwrap();
    assert_eq!(bounded.get(30).unwrap(), 832_040);
    assert!(matches!(
        bounded.get(31),
        Err(Error::Domain {
            index: 31,
            bound: Some(30)
        })
    ));
}

#[test]
fn failed_rule_can_be_retried() {
    let failed = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&failed);
    let fib = LazySequence::new([0u64, 1], move |i, seq| {
        let value = seq.get(i - 1)? + seq.get(i - 2)?;
        if i == 5 && !flag.replace(true) {
            return Err("flaky".into());
        }
        Ok(value)
    });

    assert_eq!(fib.get(5).unwrap_err().kind(), ErrorKind::Generator);
    assert_eq!(fib.status(5), CellStatus::Empty);
    // Cells computed before the failure stay cached.
    assert!(fib.is_computed(4));

    assert_eq!(fib.get(5).unwrap(), 5);
    assert_eq!(fib.get(6).unwrap(), 8);
}

fn even_numbers(index: usize, seq: &dyn Lookup<u64>) -> Result<u64, RuleError> {
    Ok(seq.get(index - 1)? + 2)
}

#[test]
fn depth_limit_and_force_through() {
    let options = SequenceOptions::new().with_max_depth(8);
    let seq = LazySequence::with_options(options, [0u64], even_numbers).unwrap();

    assert_eq!(seq.get(100).unwrap_err().kind(), ErrorKind::DepthExceeded);
    assert_eq!(seq.computed_count(), 1);

    seq.force_through(100).unwrap();
    assert_eq!(seq.get(100).unwrap(), 200);
}

static CALLS: AtomicUsize = AtomicUsize::new(0);

static SHARED_FIBONACCI: Lazy<SharedSequence<u64>> = Lazy::new(|| {
    SharedSequence::new([0u64, 1], |i, seq| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(seq.get(i - 1)? + seq.get(i - 2)?)
    })
});

#[test]
fn shared_sequence_computes_once_across_threads() {
    let handles: Vec<_> = (0..6)
        .map(|_| thread::spawn(|| SHARED_FIBONACCI.get(80).unwrap()))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 23_416_728_348_467_685);
    }
    assert_eq!(CALLS.load(Ordering::SeqCst), 79);
}

#[test]
fn shared_cross_thread_cycle_errors() {
    let seq = Arc::new(SharedSequence::<u64>::new(Vec::new(), |i, seq| {
        thread::sleep(std::time::Duration::from_millis(20));
        Ok(seq.get(1 - i)?)
    }));

    let handles: Vec<_> = [0usize, 1]
        .into_iter()
        .map(|start| {
            let seq = Arc::clone(&seq);
            thread::spawn(move || seq.get(start))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap_err().kind(), ErrorKind::Cycle);
    }
}
