//! In-memory stand-ins for the browser collaborators.

use crate::editor::EditorSurface;
use crate::error::{SyncError, SyncResult};
use crate::indicators::{Indicator, IndicatorHost};
use crate::location::LocationHost;
use crate::timers::{TimerHost, TimerId};
use crate::transport::{Socket, SocketEvents, SocketFactory};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

/// Virtual clock. Callbacks run only from [`ManualTimers::advance`].
#[derive(Default)]
pub(crate) struct ManualTimers {
    now: Cell<i64>,
    next_id: Cell<TimerId>,
    queue: RefCell<Vec<(i64, TimerId, Box<dyn FnOnce()>)>>,
}

impl ManualTimers {
    pub fn advance(&self, ms: i64) {
        let target = self.now.get() + ms;
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                let idx = queue
                    .iter()
                    .enumerate()
                    .filter(|(_, (due, _, _))| *due <= target)
                    .min_by_key(|(_, (due, id, _))| (*due, *id))
                    .map(|(idx, _)| idx);
                idx.map(|idx| queue.remove(idx))
            };
            let Some((due, _, cb)) = next else {
                break;
            };
            self.now.set(due);
            cb();
        }
        self.now.set(target);
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl TimerHost for ManualTimers {
    fn set_timeout(&self, delay_ms: i32, cb: Box<dyn FnOnce()>) -> SyncResult<TimerId> {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let due = self.now.get() + i64::from(delay_ms.max(0));
        self.queue.borrow_mut().push((due, id, cb));
        Ok(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        self.queue.borrow_mut().retain(|(_, tid, _)| *tid != id);
    }
}

/// One socket handed out by [`FakeSockets`]; tests fire its events.
pub(crate) struct FakeConn {
    pub url: String,
    events: SocketEvents,
    open: Cell<bool>,
    closed: Cell<bool>,
    closed_by_client: Cell<bool>,
    sent: RefCell<Vec<String>>,
}

impl FakeConn {
    pub fn fire_open(&self) {
        self.open.set(true);
        (self.events.on_open)();
    }

    pub fn fire_message(&self, text: &str) {
        (self.events.on_message)(text.to_string());
    }

    pub fn fire_close(&self) {
        self.open.set(false);
        self.closed.set(true);
        (self.events.on_close)();
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }

    pub fn closed_by_client(&self) -> bool {
        self.closed_by_client.get()
    }
}

struct FakeSocket(Rc<FakeConn>);

impl Socket for FakeSocket {
    fn is_open(&self) -> bool {
        self.0.open.get()
    }

    fn is_closed(&self) -> bool {
        self.0.closed.get()
    }

    fn send_text(&self, text: &str) -> SyncResult<()> {
        if !self.0.open.get() {
            return Err(SyncError::transport_closed("fake send"));
        }
        self.0.sent.borrow_mut().push(text.to_string());
        Ok(())
    }

    fn close(&self) {
        self.0.open.set(false);
        self.0.closed.set(true);
        self.0.closed_by_client.set(true);
    }
}

#[derive(Default)]
pub(crate) struct FakeSockets {
    opened: RefCell<Vec<Rc<FakeConn>>>,
    fail: bool,
}

impl FakeSockets {
    /// Every `open` fails synchronously.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn count(&self) -> usize {
        self.opened.borrow().len()
    }

    pub fn conn(&self, idx: usize) -> Rc<FakeConn> {
        self.opened.borrow()[idx].clone()
    }

    pub fn latest(&self) -> Rc<FakeConn> {
        let opened = self.opened.borrow();
        opened[opened.len() - 1].clone()
    }
}

impl SocketFactory for FakeSockets {
    fn open(&self, url: &str, events: SocketEvents) -> SyncResult<Box<dyn Socket>> {
        if self.fail {
            return Err(SyncError::dom("fake socket refused"));
        }
        let conn = Rc::new(FakeConn {
            url: url.to_string(),
            events,
            open: Cell::new(false),
            closed: Cell::new(false),
            closed_by_client: Cell::new(false),
            sent: RefCell::new(Vec::new()),
        });
        self.opened.borrow_mut().push(conn.clone());
        Ok(Box::new(FakeSocket(conn)))
    }
}

#[derive(Default)]
pub(crate) struct MemoryLocation {
    path: RefCell<String>,
    title: RefCell<String>,
    replaced: RefCell<Vec<String>>,
    pushed: RefCell<Vec<String>>,
}

impl MemoryLocation {
    pub fn at(path: &str) -> Self {
        Self {
            path: RefCell::new(path.to_string()),
            ..Default::default()
        }
    }

    pub fn title(&self) -> String {
        self.title.borrow().clone()
    }

    pub fn replaced(&self) -> Vec<String> {
        self.replaced.borrow().clone()
    }

    pub fn pushed(&self) -> Vec<String> {
        self.pushed.borrow().clone()
    }
}

impl LocationHost for MemoryLocation {
    fn pathname(&self) -> String {
        self.path.borrow().clone()
    }

    fn replace_state(&self, url: &str, _title: &str) -> SyncResult<()> {
        *self.path.borrow_mut() = url.to_string();
        self.replaced.borrow_mut().push(url.to_string());
        Ok(())
    }

    fn push_state(&self, url: &str, _title: &str) -> SyncResult<()> {
        *self.path.borrow_mut() = url.to_string();
        self.pushed.borrow_mut().push(url.to_string());
        Ok(())
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = title.to_string();
    }
}

/// Badge visibility keyed by element id, as on the page: indicators that
/// share an element share its visibility.
#[derive(Default)]
pub(crate) struct MemoryIndicators {
    visible: RefCell<HashSet<&'static str>>,
}

impl MemoryIndicators {
    pub fn is_visible(&self, indicator: Indicator) -> bool {
        self.visible.borrow().contains(indicator.element_id())
    }
}

impl IndicatorHost for MemoryIndicators {
    fn show(&self, indicator: Indicator) {
        self.visible.borrow_mut().insert(indicator.element_id());
    }

    fn hide(&self, indicator: Indicator) {
        self.visible.borrow_mut().remove(indicator.element_id());
    }
}

#[derive(Default)]
pub(crate) struct MemoryEditor {
    text: RefCell<String>,
    revealed: Cell<bool>,
}

impl MemoryEditor {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: RefCell::new(text.to_string()),
            revealed: Cell::new(false),
        }
    }

    pub fn revealed(&self) -> bool {
        self.revealed.get()
    }
}

impl EditorSurface for MemoryEditor {
    fn text(&self) -> String {
        self.text.borrow().clone()
    }

    fn set_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
    }

    fn reveal(&self) {
        self.revealed.set(true);
    }
}
