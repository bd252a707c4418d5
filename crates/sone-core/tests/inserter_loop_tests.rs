mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{
    final_uri_for, modified_handle, next_completion, ChannelListener, FakeFreenet, ListenerEvent,
    WAIT,
};
use crossbeam::channel::{bounded, RecvTimeoutError};
use sone_core::{
    InsertOutcome, InserterConfig, InserterState, Post, SoneError, SoneHandle, SoneInserter,
};

fn config(interval: Duration) -> InserterConfig {
    InserterConfig {
        interval,
        ..InserterConfig::default()
    }
}

// ===== TICK BEHAVIOUR =====

#[test]
fn test_unmodified_sone_is_never_inserted() {
    let handle = modified_handle("quiet", "quiet", 0);
    let (freenet, calls) = FakeFreenet::succeeding();
    let inserter = SoneInserter::new(handle, freenet, config(Duration::from_millis(10)));

    let running = inserter.start().unwrap();
    assert_eq!(
        calls.recv_timeout(Duration::from_millis(200)),
        Err(RecvTimeoutError::Timeout)
    );
    running.stop().unwrap();
}

#[test]
fn test_modified_sone_is_inserted_once_then_idles() {
    let handle = modified_handle("once", "bob", 3);
    let (freenet, calls) = FakeFreenet::succeeding();
    let (listener, events) = ChannelListener::new();
    let mut inserter =
        SoneInserter::new(handle.clone(), freenet, config(Duration::from_millis(10)));
    inserter.add_listener(listener);

    let running = inserter.start().unwrap();
    assert!(matches!(next_completion(&events), ListenerEvent::Inserted(..)));
    assert_eq!(handle.modification_counter().unwrap(), 0);

    let call = calls.recv_timeout(WAIT).unwrap();
    assert_eq!(call.insert_uri.to_string(), "USK@once-private,key,AQECAAE/Sone-bob/0");
    assert_eq!(call.default_document, "index.html");

    // Several more ticks pass without a change to publish.
    assert_eq!(
        calls.recv_timeout(Duration::from_millis(200)),
        Err(RecvTimeoutError::Timeout)
    );
    running.stop().unwrap();
}

#[test]
fn test_edit_after_insert_is_published_on_a_later_tick() {
    let handle = modified_handle("later", "carol", 1);
    let (freenet, calls) = FakeFreenet::succeeding();
    let (listener, events) = ChannelListener::new();
    let mut inserter =
        SoneInserter::new(handle.clone(), freenet, config(Duration::from_millis(20)));
    inserter.add_listener(listener);

    let running = inserter.start().unwrap();
    next_completion(&events);
    calls.recv_timeout(WAIT).unwrap();

    handle
        .modify(|s| s.add_post(Post::new("later", "fresh news")))
        .unwrap();

    assert!(matches!(next_completion(&events), ListenerEvent::Inserted(..)));
    let call = calls.recv_timeout(WAIT).unwrap();
    assert_eq!(call.published.posts.len(), 1);
    assert_eq!(call.published.posts[0].text, "fresh news");
    running.stop().unwrap();
}

// ===== LOCKING =====

#[test]
fn test_lock_is_free_while_inserting() {
    let handle = modified_handle("unlocked", "dave", 1);
    let lock_was_free = Arc::new(AtomicBool::new(false));

    let (freenet, _calls) = {
        let handle = handle.clone();
        let lock_was_free = lock_was_free.clone();
        FakeFreenet::new(move |call| {
            lock_was_free.store(handle.try_lock().is_some(), Ordering::SeqCst);
            Ok(final_uri_for(call, 1))
        })
    };
    let mut inserter = SoneInserter::new(handle, freenet, InserterConfig::default());

    assert!(matches!(inserter.run_once(), InsertOutcome::Inserted { .. }));
    assert!(lock_was_free.load(Ordering::SeqCst));
}

#[test]
fn test_edit_during_insert_keeps_counter_and_is_republished() {
    let handle = modified_handle("racy", "erin", 3);
    let edited = Arc::new(AtomicBool::new(false));

    let (freenet, calls) = {
        let handle = handle.clone();
        let edited = edited.clone();
        FakeFreenet::new(move |call| {
            if !edited.swap(true, Ordering::SeqCst) {
                handle
                    .modify(|s| {
                        s.add_post(Post::new("racy", "typed while inserting"));
                        s.mark_modified();
                    })
                    .unwrap();
            }
            Ok(final_uri_for(call, 1))
        })
    };
    let mut inserter = SoneInserter::new(handle.clone(), freenet, InserterConfig::default());

    let first = inserter.run_once();
    assert!(matches!(
        first,
        InsertOutcome::Inserted {
            counter_reset: false,
            ..
        }
    ));
    assert_eq!(handle.modification_counter().unwrap(), 5);
    assert!(calls.recv().unwrap().published.posts.is_empty());

    let second = inserter.run_once();
    assert!(matches!(
        second,
        InsertOutcome::Inserted {
            counter_reset: true,
            ..
        }
    ));
    assert_eq!(handle.modification_counter().unwrap(), 0);
    assert_eq!(calls.recv().unwrap().published.posts.len(), 1);
}

#[test]
fn test_snapshot_is_consistent_with_counter() {
    let handle = SoneHandle::new(common::test_sone("consistent", "frank"));
    handle
        .modify(|s| {
            s.add_post(Post::with_time("consistent", 1, "one"));
            s.add_post(Post::with_time("consistent", 2, "two"));
        })
        .unwrap();
    let (freenet, calls) = FakeFreenet::succeeding();
    let mut inserter = SoneInserter::new(handle, freenet, InserterConfig::default());

    inserter.run_once();
    let call = calls.recv().unwrap();
    let texts: Vec<_> = call.published.posts.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two"]);
}

// ===== FAILURES =====

#[test]
fn test_failed_insert_keeps_counter_and_retries_at_fixed_interval() {
    let interval = Duration::from_millis(60);
    let handle = modified_handle("flaky", "gina", 2);
    let (freenet, calls) = FakeFreenet::failing();
    let (listener, events) = ChannelListener::new();
    let mut inserter = SoneInserter::new(handle.clone(), freenet, config(interval));
    inserter.add_listener(listener);

    let running = inserter.start().unwrap();
    let attempts: Vec<Instant> = (0..3)
        .map(|_| calls.recv_timeout(WAIT).unwrap().at)
        .collect();
    running.stop().unwrap();

    for pair in attempts.windows(2) {
        assert!(pair[1] - pair[0] >= interval);
    }
    assert_eq!(handle.modification_counter().unwrap(), 2);
    assert!(matches!(
        next_completion(&events),
        ListenerEvent::Aborted(_, SoneError::InsertionFailed { .. })
    ));
}

#[test]
fn test_failure_then_success_publishes_and_resets() {
    let handle = modified_handle("recovering", "hank", 1);
    let attempts = Arc::new(AtomicUsize::new(0));
    let (freenet, _calls) = {
        let attempts = attempts.clone();
        FakeFreenet::new(move |call| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(SoneError::InsertionFailed {
                    reason: "route not found".to_string(),
                });
            }
            Ok(final_uri_for(call, 2))
        })
    };
    let mut inserter = SoneInserter::new(handle.clone(), freenet, InserterConfig::default());

    assert!(matches!(inserter.run_once(), InsertOutcome::Failed { .. }));
    assert_eq!(inserter.consecutive_failures(), 1);
    assert_eq!(handle.modification_counter().unwrap(), 1);

    assert!(matches!(inserter.run_once(), InsertOutcome::Inserted { .. }));
    assert_eq!(inserter.consecutive_failures(), 0);
    assert_eq!(handle.modification_counter().unwrap(), 0);
}

// ===== STOPPING =====

#[test]
fn test_stop_wakes_a_sleeping_worker() {
    let handle = modified_handle("sleepy", "iris", 1);
    let (freenet, calls) = FakeFreenet::succeeding();
    let (listener, events) = ChannelListener::new();
    let mut inserter = SoneInserter::new(handle, freenet, config(Duration::from_secs(3600)));
    inserter.add_listener(listener);

    let running = inserter.start().unwrap();
    next_completion(&events);
    calls.recv_timeout(WAIT).unwrap();

    let stopping = Instant::now();
    running.stop().unwrap();
    assert!(stopping.elapsed() < WAIT);
    assert!(calls.try_recv().is_err());
}

#[test]
fn test_stop_during_insert_lets_the_insert_finish() {
    let handle = modified_handle("busy", "jack", 1);
    let (release_tx, release_rx) = bounded::<()>(0);
    let (freenet, calls) = FakeFreenet::new(move |call| {
        release_rx.recv_timeout(WAIT).unwrap();
        Ok(final_uri_for(call, 1))
    });
    let (listener, events) = ChannelListener::new();
    let mut inserter = SoneInserter::new(handle.clone(), freenet, config(Duration::from_millis(10)));
    inserter.add_listener(listener);

    let running = inserter.start().unwrap();
    assert_eq!(
        events.recv_timeout(WAIT).unwrap(),
        ListenerEvent::Inserting("busy".to_string())
    );
    assert_eq!(running.state(), InserterState::Inserting);

    running.request_stop();
    assert_eq!(running.state(), InserterState::Stopping);
    release_tx.send(()).unwrap();
    running.stop().unwrap();

    assert!(matches!(next_completion(&events), ListenerEvent::Inserted(..)));
    assert_eq!(handle.modification_counter().unwrap(), 0);
    assert!(calls.try_recv().is_ok());
    assert!(calls.try_recv().is_err());
}

#[test]
fn test_dropping_the_handle_stops_the_worker() {
    let handle = modified_handle("dropped", "kate", 0);
    let (freenet, calls) = FakeFreenet::succeeding();
    let inserter = SoneInserter::new(handle, freenet, config(Duration::from_millis(10)));

    let running = inserter.start().unwrap();
    assert!(!running.is_finished());
    drop(running);

    // The worker owns the only reference to the fake; once it exits the
    // call channel disconnects.
    assert_eq!(calls.recv_timeout(WAIT), Err(RecvTimeoutError::Disconnected));
}

#[test]
fn test_worker_thread_is_named_after_the_sone() {
    let handle = modified_handle("named", "lena", 1);
    let (thread_name_tx, thread_name_rx) = bounded(1);
    let (freenet, _calls) = FakeFreenet::new(move |call| {
        let name = std::thread::current().name().map(str::to_string);
        let _ = thread_name_tx.try_send(name);
        Ok(final_uri_for(call, 1))
    });
    let inserter = SoneInserter::new(handle, freenet, config(Duration::from_millis(10)));

    let running = inserter.start().unwrap();
    let name = thread_name_rx.recv_timeout(WAIT).unwrap();
    running.stop().unwrap();
    assert_eq!(name.as_deref(), Some("sone-inserter-lena"));
}
