//! Debounce and throttle wrappers over the page [`Scheduler`], and the timer
//! handle table schedulers keep.
//!
//! Both wrappers are single-threaded and cheap to clone; clones share the
//! same pending timer / window state.

#[cfg(test)]
#[path = "timing_test.rs"]
mod timing_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::env::{Scheduler, TimerId};

struct DebounceInner<T> {
    func: Box<dyn Fn(T)>,
    wait_ms: u32,
    immediate: bool,
    pending: RefCell<Option<TimerId>>,
    scheduler: Rc<dyn Scheduler>,
}

/// Coalesces a burst of calls into one.
///
/// Trailing mode (`immediate == false`) invokes `func` once, `wait_ms` after
/// the last call, with that call's argument. Immediate mode invokes `func`
/// synchronously on the first call of a burst and suppresses the rest until
/// the burst has been quiet for `wait_ms`.
pub struct Debounce<T> {
    inner: Rc<DebounceInner<T>>,
}

impl<T> Clone for Debounce<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: 'static> Debounce<T> {
    pub fn new(scheduler: Rc<dyn Scheduler>, wait_ms: u32, immediate: bool, func: impl Fn(T) + 'static) -> Self {
        Self {
            inner: Rc::new(DebounceInner {
                func: Box::new(func),
                wait_ms,
                immediate,
                pending: RefCell::new(None),
                scheduler,
            }),
        }
    }

    pub fn call(&self, arg: T) {
        let inner = &self.inner;
        let call_now = inner.immediate && inner.pending.borrow().is_none();
        if let Some(id) = inner.pending.borrow_mut().take() {
            inner.scheduler.clear_timeout(id);
        }

        let (deferred, now) = if inner.immediate { (None, Some(arg)) } else { (Some(arg), None) };
        let weak: Weak<DebounceInner<T>> = Rc::downgrade(inner);
        let id = inner.scheduler.set_timeout(
            inner.wait_ms,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                inner.pending.borrow_mut().take();
                if let Some(arg) = deferred {
                    (inner.func)(arg);
                }
            }),
        );
        *inner.pending.borrow_mut() = Some(id);

        if call_now {
            if let Some(arg) = now {
                (inner.func)(arg);
            }
        }
    }

    /// Whether a deferred invocation (or immediate-mode quiet period) is armed.
    pub fn is_pending(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }
}

struct ThrottleInner<T> {
    func: Box<dyn Fn(T)>,
    limit_ms: u32,
    in_window: Cell<bool>,
    scheduler: Rc<dyn Scheduler>,
}

/// Invokes `func` at most once per `limit_ms` window: the first call of a
/// window fires immediately and later calls in the window are dropped.
pub struct Throttle<T> {
    inner: Rc<ThrottleInner<T>>,
}

impl<T> Clone for Throttle<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: 'static> Throttle<T> {
    pub fn new(scheduler: Rc<dyn Scheduler>, limit_ms: u32, func: impl Fn(T) + 'static) -> Self {
        Self {
            inner: Rc::new(ThrottleInner {
                func: Box::new(func),
                limit_ms,
                in_window: Cell::new(false),
                scheduler,
            }),
        }
    }

    /// Returns `true` when this call reached `func`.
    pub fn call(&self, arg: T) -> bool {
        let inner = &self.inner;
        if inner.in_window.get() {
            return false;
        }
        (inner.func)(arg);
        inner.in_window.set(true);
        let weak = Rc::downgrade(inner);
        inner.scheduler.set_timeout(
            inner.limit_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.in_window.set(false);
                }
            }),
        );
        true
    }
}

/// Live timer handles keyed by id.
///
/// A handle whose timer has fired cannot be dropped yet, because its callback
/// is still on the stack. It is parked instead and released when the next
/// timer fires, so at most one finished handle is retained at a time.
pub struct TimerSlots<H> {
    next_id: Cell<u32>,
    live: RefCell<HashMap<u32, H>>,
    parked: RefCell<Option<H>>,
}

impl<H> Default for TimerSlots<H> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            live: RefCell::new(HashMap::new()),
            parked: RefCell::new(None),
        }
    }
}

impl<H> TimerSlots<H> {
    pub fn next_id(&self) -> TimerId {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        TimerId(id)
    }

    pub fn insert(&self, id: TimerId, handle: H) {
        self.live.borrow_mut().insert(id.0, handle);
    }

    /// Take a pending handle out; dropping it is up to the caller.
    pub fn cancel(&self, id: TimerId) -> Option<H> {
        self.live.borrow_mut().remove(&id.0)
    }

    /// Record that timer `id` is running its callback.
    pub fn fired(&self, id: TimerId) {
        let running = self.live.borrow_mut().remove(&id.0);
        let finished = self.parked.replace(running);
        drop(finished);
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn parked_count(&self) -> usize {
        usize::from(self.parked.borrow().is_some())
    }
}
