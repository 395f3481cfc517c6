//! Integration tests for the task bridge
//!
//! These tests verify:
//! - Items and errors reach the consumer one poll at a time, in order
//! - A superseded run never leaks items or errors into the next one
//! - Runs requested while one is active are ignored
//! - Consumer calls never block on a busy producer
//! - Producer panics are contained and leave the task reusable

use cloudpane::task::{AsyncAction, AsyncCollector, AsyncStream, RunState};
use proptest::prelude::*;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met within 5s");
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Poll until the run is over and the queue is empty.
fn drain<T: Clone + Send + 'static>(collector: &mut AsyncCollector<T, String>) -> Vec<T> {
    wait_until(|| {
        collector.get_items();
        !collector.is_working() && collector.pending() == 0
    });
    collector.items().to_vec()
}

/// A gate a producer can block on until the test opens it.
fn gate() -> (mpsc::Sender<()>, Arc<Mutex<mpsc::Receiver<()>>>) {
    let (tx, rx) = mpsc::channel();
    (tx, Arc::new(Mutex::new(rx)))
}

fn wait_at(gate: &Arc<Mutex<mpsc::Receiver<()>>>) {
    let _ = gate.lock().unwrap().recv_timeout(Duration::from_secs(5));
}

#[test]
fn test_success_scenario() {
    let mut collector = AsyncCollector::<&str, String>::new("success");
    collector
        .run(|sink| {
            sink.add("A");
            sink.add("B");
            sink.add("C");
        })
        .expect("run should start");

    wait_until(|| !collector.is_working());

    assert_eq!(collector.get_items(), ["A"].as_slice());
    assert_eq!(collector.get_items(), ["A", "B"].as_slice());
    assert_eq!(collector.get_items(), ["A", "B", "C"].as_slice());
    assert_eq!(collector.get_items(), ["A", "B", "C"].as_slice());

    assert!(!collector.has_error());
    assert!(!collector.is_working());
}

#[test]
fn test_mid_stream_failure_scenario() {
    let mut collector = AsyncCollector::<&str, String>::new("failure");
    collector.run(|sink| {
        sink.add("A");
        sink.add("B");
        sink.fail("E1".to_string());
        sink.fail("E2".to_string());
    });

    assert_eq!(drain(&mut collector), vec!["A", "B"]);
    assert!(collector.has_error());
    assert_eq!(collector.error(), Some("E1".to_string()));

    // the error stays until acknowledged, items survive the acknowledgement
    assert!(collector.clear());
    assert!(!collector.has_error());
    assert_eq!(collector.items(), ["A", "B"].as_slice());
}

#[test]
fn test_superseded_run_never_leaks() {
    let mut collector = AsyncCollector::<&str, String>::new("supersede");
    let (open, gate) = gate();
    let (done_tx, done_rx) = mpsc::channel();

    let first = collector
        .run(move |sink| {
            wait_at(&gate);
            sink.add("stale");
            sink.fail("stale error".to_string());
            let _ = done_tx.send(sink.is_cancelled());
        })
        .unwrap();

    let second = collector
        .restart(|sink| {
            sink.add("fresh");
        })
        .unwrap();
    assert!(second > first);

    // let the abandoned producer finish its work after the new run started
    open.send(()).unwrap();
    let saw_cancel = done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(saw_cancel);

    assert_eq!(drain(&mut collector), vec!["fresh"]);
    assert!(!collector.has_error());
    assert_eq!(collector.error(), None);
    assert_eq!(collector.generation(), second);
}

#[test]
fn test_reuse_after_clear() {
    let producer = |sink: &cloudpane::Sink<u32, String>| {
        sink.add(1);
        sink.add(2);
    };

    let mut collector = AsyncCollector::<u32, String>::new("reuse");
    collector.run(producer);
    assert_eq!(drain(&mut collector), vec![1, 2]);

    collector.clear();
    collector.run(producer).unwrap();
    assert!(collector.items().is_empty());
    assert!(!collector.has_error());

    assert_eq!(drain(&mut collector), vec![1, 2]);
}

#[test]
fn test_rerun_over_undrained_items() {
    let mut collector = AsyncCollector::<u32, String>::new("rerun-backlog");
    collector.run(|sink| {
        sink.add(1);
        sink.add(2);
        sink.add(3);
        sink.fail("page 2 failed".to_string());
    });
    wait_until(|| !collector.is_working());
    collector.get_items();
    assert_eq!(collector.items(), [1]);
    assert_eq!(collector.pending(), 2);

    collector.run(|sink| sink.add(9)).unwrap();
    assert!(collector.items().is_empty());
    assert!(!collector.has_error());
    assert!(collector.pending() <= 1);

    assert_eq!(drain(&mut collector), vec![9]);
    assert_eq!(collector.pending(), 0);
}

#[test]
fn test_run_while_active_is_ignored() {
    let mut collector = AsyncCollector::<&str, String>::new("ignored");
    let (open, gate) = gate();

    let first = collector
        .run(move |sink| {
            wait_at(&gate);
            sink.add("first");
        })
        .unwrap();

    assert!(collector.is_working());
    assert_eq!(collector.run(|sink| sink.add("second")), None);
    assert_eq!(collector.generation(), first);

    open.send(()).unwrap();
    assert_eq!(drain(&mut collector), vec!["first"]);
}

#[test]
fn test_consumer_never_blocks() {
    let mut collector = AsyncCollector::<u32, String>::new("blocking");
    let mut stream = AsyncStream::<u32, String>::new("blocking");
    let (open_collector, collector_gate) = gate();
    let (open_stream, stream_gate) = gate();

    collector.run(move |_| wait_at(&collector_gate));
    stream.run(move |_| wait_at(&stream_gate));

    let started = Instant::now();
    for _ in 0..1000 {
        assert!(collector.get_items().is_empty());
        assert!(collector.is_working());
        assert!(!collector.has_error());
        assert_eq!(stream.pull_item(), None);
        assert!(stream.is_working());
    }
    assert!(started.elapsed() < Duration::from_secs(1));

    open_collector.send(()).unwrap();
    open_stream.send(()).unwrap();
    wait_until(|| !collector.is_working() && !stream.is_working());
}

#[test]
fn test_fifo_one_item_per_poll() {
    let mut collector = AsyncCollector::<u32, String>::new("fifo");
    collector.run(|sink| {
        for i in 0..100 {
            sink.add(i);
        }
    });
    wait_until(|| !collector.is_working());

    let mut previous = 0;
    while collector.pending() > 0 {
        let len = collector.get_items().len();
        assert_eq!(len, previous + 1);
        previous = len;
    }
    assert_eq!(collector.items(), (0..100).collect::<Vec<_>>().as_slice());
}

#[test]
fn test_stream_restart_drops_stale_items() {
    let mut stream = AsyncStream::<&str, String>::new("stream");
    let (open, gate) = gate();
    let (done_tx, done_rx) = mpsc::channel();

    stream.run(move |sink| {
        sink.add("old-1");
        wait_at(&gate);
        sink.add("old-2");
        let _ = done_tx.send(());
    });
    wait_until(|| stream.pending() > 0);

    stream.restart(|sink| sink.add("new")).unwrap();
    open.send(()).unwrap();
    done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    wait_until(|| !stream.is_working());

    let mut pulled = Vec::new();
    while stream.pending() > 0 {
        if let Some(item) = stream.pull_item() {
            pulled.push(item);
        }
    }
    assert_eq!(pulled, vec!["new"]);
}

#[test]
fn test_producer_panic_is_contained() {
    let mut collector = AsyncCollector::<u32, String>::new("panic");
    collector.run(|sink| {
        sink.add(1);
        panic!("producer exploded");
    });

    assert_eq!(drain(&mut collector), vec![1]);
    assert!(!collector.has_error());

    collector.run(|sink| sink.add(2)).expect("task is reusable");
    assert_eq!(drain(&mut collector), vec![2]);
}

#[test]
fn test_drop_cancels_without_joining() {
    let (open, gate) = gate();
    let (seen_tx, seen_rx) = mpsc::channel();

    let mut collector = AsyncCollector::<u32, String>::new("dropped");
    collector.run(move |sink| {
        wait_at(&gate);
        let _ = seen_tx.send(sink.is_cancelled());
    });

    let started = Instant::now();
    drop(collector);
    assert!(started.elapsed() < Duration::from_secs(1));

    open.send(()).unwrap();
    assert!(seen_rx.recv_timeout(Duration::from_secs(5)).unwrap());
}

#[test]
fn test_action_lifecycle() {
    let mut action = AsyncAction::<u32>::new("action");
    assert_eq!(action.state(), RunState::Idle);

    action.run(|| 42).unwrap();
    wait_until(|| action.is_complete());

    // a pending result is never replaced
    assert_eq!(action.run(|| 7), None);
    assert_eq!(action.result(), Some(42));

    assert_eq!(action.take_result(), Some(42));
    assert_eq!(action.state(), RunState::Idle);
    assert_eq!(action.take_result(), None);

    action.run(|| 7).unwrap();
    wait_until(|| action.is_complete());
    assert!(action.clear());
    assert_eq!(action.result(), None);
}

#[test]
fn test_action_panic_returns_to_idle() {
    let mut action = AsyncAction::<u32>::new("panicking-action");
    action.run(|| panic!("no result"));

    wait_until(|| !action.is_working());
    assert_eq!(action.state(), RunState::Idle);
    assert_eq!(action.result(), None);

    action.run(|| 1).expect("action is reusable");
}

#[derive(Debug, Clone)]
enum Op {
    Run,
    Restart,
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Run), Just(Op::Restart), Just(Op::Clear)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_generation_strictly_increases(ops in prop::collection::vec(op(), 1..12)) {
        let mut stream = AsyncStream::<u32, String>::new("generations");
        let mut last = stream.generation();

        for op in ops {
            let started = match op {
                Op::Run => stream.run(|sink| sink.add(1)),
                Op::Restart => stream.restart(|sink| sink.add(1)),
                Op::Clear => {
                    stream.clear();
                    None
                }
            };

            if let Some(generation) = started {
                prop_assert!(generation > last);
                prop_assert_eq!(stream.generation(), generation);
                last = generation;
            } else {
                prop_assert_eq!(stream.generation(), last);
            }
        }
    }

    #[test]
    fn test_collector_preserves_order(items in prop::collection::vec(any::<u16>(), 0..200)) {
        let mut collector = AsyncCollector::<u16, String>::new("order");
        let expected = items.clone();
        collector.run(move |sink| {
            for item in items {
                sink.add(item);
            }
        });

        prop_assert_eq!(drain(&mut collector), expected);
    }
}
