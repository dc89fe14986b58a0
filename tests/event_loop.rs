use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use streamloop::{Error, EventLoop, IdleStrategy, LoopBuilder, wait_until};

#[test]
fn test_run_one_runs_single_callback() {
    let event_loop = EventLoop::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    for value in [1, 2] {
        let log = log.clone();
        event_loop.call_soon(move || log.borrow_mut().push(value));
    }

    assert!(event_loop.run_one());
    assert_eq!(*log.borrow(), vec![1]);

    assert!(event_loop.run_one());
    assert_eq!(*log.borrow(), vec![1, 2]);

    assert!(!event_loop.run_one());
}

#[test]
fn test_callbacks_queued_during_turn_wait_for_next_turn() {
    let event_loop = EventLoop::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    {
        let seen = seen.clone();
        let handle = event_loop.clone();
        event_loop.call_soon(move || {
            seen.borrow_mut().push(("first", handle.turns()));

            let inner = handle.clone();
            let seen = seen.clone();
            handle.call_soon(move || {
                seen.borrow_mut().push(("nested", inner.turns()));
                inner.stop();
            });
        });
    }
    {
        let seen = seen.clone();
        let handle = event_loop.clone();
        event_loop.call_soon(move || seen.borrow_mut().push(("second", handle.turns())));
    }

    event_loop.run_forever().unwrap();

    assert_eq!(*seen.borrow(), vec![("first", 1), ("second", 1), ("nested", 2)]);
}

#[test]
fn test_stop_leaves_remaining_callbacks_queued() {
    let event_loop = EventLoop::new();
    let ran = Rc::new(Cell::new(false));

    let handle = event_loop.clone();
    event_loop.call_soon(move || handle.stop());

    let flag = ran.clone();
    event_loop.call_soon(move || flag.set(true));

    event_loop.run_forever().unwrap();
    assert!(!ran.get());
    assert!(!event_loop.is_running());

    assert!(event_loop.run_one());
    assert!(ran.get());
}

#[test]
fn test_run_forever_is_not_reentrant() {
    let event_loop = EventLoop::new();
    let nested = Rc::new(RefCell::new(None));

    let handle = event_loop.clone();
    let slot = nested.clone();
    event_loop.call_soon(move || {
        assert!(handle.is_running());
        *slot.borrow_mut() = Some(handle.run_forever());
        handle.stop();
    });

    event_loop.run_forever().unwrap();

    assert!(matches!(nested.borrow_mut().take(), Some(Err(Error::InvalidState(_)))));
    assert!(!event_loop.is_running());
}

#[test]
fn test_run_until_complete_inside_task_fails() {
    let event_loop = EventLoop::new();
    let handle = event_loop.clone();

    let outcome = event_loop.run_until_complete(async move {
        let nested = handle.run_until_complete(async { Ok(1) });
        Ok(nested.is_err())
    });

    assert!(outcome.unwrap());
}

#[test]
fn test_builder_configures_loop() {
    let event_loop = LoopBuilder::new()
        .idle(IdleStrategy::Sleep(Duration::from_millis(1)))
        .queue_capacity(4)
        .build();

    assert_eq!(event_loop.run_until_complete(async { Ok(10) }).unwrap(), 10);
}

#[test]
fn test_multiple_loops_are_independent() {
    let first = EventLoop::builder().idle(IdleStrategy::Yield).build();
    let second = EventLoop::new();

    let result1 = first.run_until_complete(async { Ok(10) }).unwrap();
    let result2 = second.run_until_complete(async { Ok(20) }).unwrap();

    assert_eq!(result1, 10);
    assert_eq!(result2, 20);
    assert!(second.turns() > 0);
}

#[test]
fn test_poll_hook_runs_on_every_poll() {
    let polls = Rc::new(Cell::new(0));

    let counter = polls.clone();
    let event_loop = EventLoop::builder()
        .poll_hook(move || counter.set(counter.get() + 1))
        .build();

    assert!(!event_loop.run_one());
    assert!(!event_loop.run_one());
    assert_eq!(polls.get(), 2);
}

#[test]
fn test_poll_hook_can_resolve_futures() {
    let event_loop = EventLoop::new();
    let future = event_loop.create_future::<u32>();

    let target = future.clone();
    let mut polls = 0;
    event_loop.set_poll_hook(move || {
        polls += 1;
        if polls == 3 && !target.done() {
            target.set_result(polls).unwrap();
        }
    });

    assert_eq!(event_loop.run_until_resolved(&future).unwrap(), 3);
}

#[test]
fn test_completer_resolves_from_another_thread() {
    let event_loop = EventLoop::new();
    let (completer, future) = event_loop.completer::<String>();

    let worker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(5));
        completer.complete(Ok("from thread".to_string()));
    });

    let value = event_loop.run_until_resolved(&future).unwrap();
    worker.join().unwrap();

    assert_eq!(value, "from thread");
}

#[test]
fn test_dropped_completer_cancels_future() {
    let event_loop = EventLoop::new();
    let (completer, future) = event_loop.completer::<u32>();

    drop(completer);

    assert!(event_loop.run_until_resolved(&future).unwrap_err().is_cancelled());
}

#[test]
fn test_interrupt_handle_queues_callbacks() {
    let event_loop = EventLoop::new();
    let handle = event_loop.interrupt_handle();
    let value = Arc::new(AtomicU32::new(0));

    let written = value.clone();
    let worker = thread::spawn(move || {
        handle.call_soon(move || written.store(7, Ordering::SeqCst));
    });
    worker.join().unwrap();

    // Nothing runs before the loop polls.
    assert_eq!(value.load(Ordering::SeqCst), 0);

    let observed = value.clone();
    let ready = wait_until(&event_loop, move || observed.load(Ordering::SeqCst) == 7);
    event_loop.run_until_resolved(&ready).unwrap();

    assert_eq!(value.load(Ordering::SeqCst), 7);
}

#[test]
fn test_run_until_resolved_on_done_future() {
    let event_loop = EventLoop::new();
    let future = event_loop.create_future::<u8>();
    future.set_result(9).unwrap();

    assert_eq!(event_loop.run_until_resolved(&future).unwrap(), 9);
}
