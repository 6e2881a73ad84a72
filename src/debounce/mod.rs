use crate::timers::{TimerHost, TimerId};
use leptos::logging::warn;
use std::cell::Cell;
use std::rc::{Rc, Weak};

/// Wait used when the caller passes a non-positive window.
pub const DEFAULT_WAIT_MS: i32 = 200;

/// Rate-limits calls to a callback.
///
/// Trailing mode (the default) fires once after `wait_ms` of quiet, with the
/// arguments of the last call. Leading mode fires the first call of a quiet
/// period synchronously and drops the rest of the burst.
///
/// Calls are superseded, never queued.
pub struct Debouncer<A> {
    inner: Rc<DebounceInner<A>>,
}

struct DebounceInner<A> {
    callback: Box<dyn Fn(A)>,
    wait_ms: i32,
    immediate: bool,
    timers: Rc<dyn TimerHost>,
    pending: Cell<Option<TimerId>>,
}

impl<A> Clone for Debouncer<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: 'static> Debouncer<A> {
    pub fn new(timers: Rc<dyn TimerHost>, wait_ms: i32, callback: impl Fn(A) + 'static) -> Self {
        Self::build(timers, wait_ms, false, callback)
    }

    pub fn leading(
        timers: Rc<dyn TimerHost>,
        wait_ms: i32,
        callback: impl Fn(A) + 'static,
    ) -> Self {
        Self::build(timers, wait_ms, true, callback)
    }

    fn build(
        timers: Rc<dyn TimerHost>,
        wait_ms: i32,
        immediate: bool,
        callback: impl Fn(A) + 'static,
    ) -> Self {
        let wait_ms = if wait_ms > 0 { wait_ms } else { DEFAULT_WAIT_MS };
        Self {
            inner: Rc::new(DebounceInner {
                callback: Box::new(callback),
                wait_ms,
                immediate,
                timers,
                pending: Cell::new(None),
            }),
        }
    }

    pub fn call(&self, args: A) {
        let inner = &self.inner;
        let call_now = inner.immediate && inner.pending.get().is_none();

        if let Some(tid) = inner.pending.take() {
            inner.timers.clear_timeout(tid);
        }

        let mut deferred = Some(args);
        let now_args = if inner.immediate {
            deferred.take()
        } else {
            None
        };

        let weak: Weak<DebounceInner<A>> = Rc::downgrade(inner);
        let later = Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.pending.set(None);
            if let Some(args) = deferred {
                (inner.callback)(args);
            }
        });

        match inner.timers.set_timeout(inner.wait_ms, later) {
            Ok(tid) => inner.pending.set(Some(tid)),
            Err(e) => warn!("debounce timer not scheduled: {e}"),
        }

        if call_now {
            if let Some(args) = now_args {
                (inner.callback)(args);
            }
        }
    }

    /// Drop a pending trailing call, if any.
    pub fn cancel(&self) {
        if let Some(tid) = self.inner.pending.take() {
            self.inner.timers.clear_timeout(tid);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    pub fn wait_ms(&self) -> i32 {
        self.inner.wait_ms
    }
}
