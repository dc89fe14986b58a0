use std::cell::RefCell;
use std::rc::Rc;

use streamloop::{Error, EventLoop};

#[test]
fn test_future_starts_pending() {
    let event_loop = EventLoop::new();
    let future = event_loop.create_future::<u32>();

    assert!(!future.done());
    assert!(future.exception().is_none());
    assert!(matches!(future.result(), Err(Error::InvalidState(_))));
}

#[test]
fn test_double_resolution_fails() {
    let event_loop = EventLoop::new();
    let future = event_loop.create_future::<u32>();

    future.set_result(1).unwrap();

    assert!(matches!(future.set_result(2), Err(Error::InvalidState(_))));
    assert!(matches!(future.set_exception(Error::Cancelled), Err(Error::InvalidState(_))));
    assert_eq!(future.result().unwrap(), 1);
}

#[test]
fn test_callbacks_run_once_in_order_on_later_turn() {
    let event_loop = EventLoop::new();
    let future = event_loop.create_future::<u32>();
    let seen = Rc::new(RefCell::new(Vec::new()));

    for i in 0..3 {
        let seen = seen.clone();
        future.add_done_callback(move |f| seen.borrow_mut().push(i * 10 + f.result().unwrap()));
    }

    future.set_result(1).unwrap();
    // Never inline.
    assert!(seen.borrow().is_empty());

    while event_loop.run_one() {}

    assert_eq!(*seen.borrow(), vec![1, 11, 21]);
}

#[test]
fn test_callback_added_after_resolution_runs_next_turn() {
    let event_loop = EventLoop::new();
    let future = event_loop.create_future::<&'static str>();
    future.set_result("ready").unwrap();

    let seen = Rc::new(RefCell::new(None));
    let slot = seen.clone();
    future.add_done_callback(move |f| *slot.borrow_mut() = Some(f.result().unwrap()));

    assert!(seen.borrow().is_none());
    assert!(event_loop.run_one());
    assert_eq!(*seen.borrow(), Some("ready"));
}

#[test]
fn test_failure_is_reraised_every_time() {
    let event_loop = EventLoop::new();
    let future = event_loop.create_future::<u32>();

    future.set_exception(Error::msg("sensor offline")).unwrap();

    assert_eq!(future.result().unwrap_err().to_string(), "sensor offline");
    assert_eq!(future.take_result().unwrap_err().to_string(), "sensor offline");
    assert_eq!(future.take_result().unwrap_err().to_string(), "sensor offline");
    assert!(future.exception().is_some());
}

#[test]
fn test_take_result_moves_value_out() {
    let event_loop = EventLoop::new();
    let future = event_loop.create_future::<Vec<u8>>();

    future.set_result(vec![1, 2, 3]).unwrap();

    assert_eq!(future.take_result().unwrap(), vec![1, 2, 3]);
    assert!(future.done());
    assert!(matches!(future.take_result(), Err(Error::InvalidState(_))));
    assert!(matches!(future.result(), Err(Error::InvalidState(_))));
}

#[test]
fn test_set_outcome_picks_value_or_failure() {
    let event_loop = EventLoop::new();
    let ok = event_loop.create_future::<u8>();
    let failed = event_loop.create_future::<u8>();

    ok.set_outcome(Ok(7)).unwrap();
    failed.set_outcome(Err(Error::TimedOut)).unwrap();

    assert_eq!(ok.result().unwrap(), 7);
    assert!(matches!(failed.exception(), Some(Error::TimedOut)));
}

#[test]
fn test_clones_share_state() {
    let event_loop = EventLoop::new();
    let future = event_loop.create_future::<u32>();
    let other = future.clone();

    other.set_result(3).unwrap();

    assert!(future.done());
    assert_eq!(future.result().unwrap(), 3);
}

#[test]
fn test_awaiting_a_future_from_a_task() {
    let event_loop = EventLoop::new();
    let future = event_loop.create_future::<&'static str>();

    let setter = future.clone();
    event_loop.call_soon(move || setter.set_result("done").unwrap());

    let value = event_loop.run_until_complete(async move { future.await }).unwrap();
    assert_eq!(value, "done");
}
