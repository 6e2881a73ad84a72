//! The single live socket to the server, with unconditional reconnect.

use crate::error::{SyncError, SyncResult};
use leptos::logging::{error, log, warn};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// What the transport reports to the layer above it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    /// `was_open` is false when the attempt never got past connecting.
    Closed { was_open: bool },
}

/// Callbacks a socket implementation must invoke.
pub struct SocketEvents {
    pub on_open: Box<dyn Fn()>,
    pub on_message: Box<dyn Fn(String)>,
    pub on_close: Box<dyn Fn()>,
}

pub trait Socket {
    fn is_open(&self) -> bool;
    /// Fully closed. A socket still connecting is neither open nor closed.
    fn is_closed(&self) -> bool;
    fn send_text(&self, text: &str) -> SyncResult<()>;
    fn close(&self);
}

pub trait SocketFactory {
    fn open(&self, url: &str, events: SocketEvents) -> SyncResult<Box<dyn Socket>>;
}

/// Owns the connection handle. Callers only see `send` and events; the
/// handle itself is replaced wholesale on every reconnect.
#[derive(Clone)]
pub struct TransportManager {
    inner: Rc<TransportInner>,
}

struct TransportInner {
    factory: Rc<dyn SocketFactory>,
    url: String,
    state: Cell<ConnectionState>,
    was_open: Cell<bool>,

    /// Bumped per connection; events tagged with an older value are ignored.
    generation: Cell<u64>,
    attempts: Cell<u64>,

    live: RefCell<Option<Box<dyn Socket>>>,

    /// The socket replaced last. Its close handler may still be on the stack
    /// when the replacement is made, so it is released one swap later.
    retired: RefCell<Option<Box<dyn Socket>>>,

    listener: RefCell<Option<Rc<dyn Fn(TransportEvent)>>>,
}

impl TransportManager {
    pub fn new(factory: Rc<dyn SocketFactory>, url: String) -> Self {
        Self {
            inner: Rc::new(TransportInner {
                factory,
                url,
                state: Cell::new(ConnectionState::Closed),
                was_open: Cell::new(false),
                generation: Cell::new(0),
                attempts: Cell::new(0),
                live: RefCell::new(None),
                retired: RefCell::new(None),
                listener: RefCell::new(None),
            }),
        }
    }

    pub fn on_event(&self, listener: impl Fn(TransportEvent) + 'static) {
        *self.inner.listener.borrow_mut() = Some(Rc::new(listener));
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    /// Connection attempts made so far, the first connect included.
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.get()
    }

    pub fn connect(&self) {
        connect(&self.inner);
    }

    /// Fire-and-forget. A frame that cannot be handed to an open socket is
    /// lost; the error only reports that.
    pub fn send(&self, payload: &str) -> SyncResult<()> {
        if self.inner.state.get() != ConnectionState::Open {
            return Err(SyncError::transport_closed("send"));
        }

        let live = self.inner.live.borrow();
        let socket = live
            .as_ref()
            .filter(|s| s.is_open())
            .ok_or_else(|| SyncError::transport_closed("send"))?;
        socket.send_text(payload)
    }
}

fn connect(inner: &Rc<TransportInner>) {
    let generation = inner.generation.get() + 1;
    inner.generation.set(generation);
    inner.attempts.set(inner.attempts.get() + 1);
    inner.state.set(ConnectionState::Connecting);
    inner.was_open.set(false);

    log!(
        "[transport] connecting to {} (attempt {})",
        inner.url,
        inner.attempts.get()
    );

    match inner.factory.open(&inner.url, socket_events(inner, generation)) {
        Ok(socket) => {
            let previous = inner.live.borrow_mut().replace(socket);
            // Also covers a socket still connecting, which would otherwise
            // finish its handshake and linger.
            if let Some(previous) = previous.as_ref().filter(|s| !s.is_closed()) {
                previous.close();
            }
            *inner.retired.borrow_mut() = previous;
        }
        Err(e) => {
            // A synchronous failure (bad URL) would fail again immediately.
            error!("[transport] cannot open socket: {e}");
            inner.state.set(ConnectionState::Closed);
        }
    }
}

fn socket_events(inner: &Rc<TransportInner>, generation: u64) -> SocketEvents {
    let on_open = {
        let weak = Rc::downgrade(inner);
        Box::new(move || {
            if let Some(inner) = current(&weak, generation) {
                handle_open(&inner);
            }
        })
    };
    let on_message = {
        let weak = Rc::downgrade(inner);
        Box::new(move |data: String| {
            if let Some(inner) = current(&weak, generation) {
                emit(&inner, TransportEvent::Message(data));
            }
        })
    };
    let on_close = {
        let weak = Rc::downgrade(inner);
        Box::new(move || {
            if let Some(inner) = current(&weak, generation) {
                handle_close(&inner);
            }
        })
    };

    SocketEvents {
        on_open,
        on_message,
        on_close,
    }
}

fn current(weak: &Weak<TransportInner>, generation: u64) -> Option<Rc<TransportInner>> {
    weak.upgrade()
        .filter(|inner| inner.generation.get() == generation)
}

fn handle_open(inner: &Rc<TransportInner>) {
    inner.state.set(ConnectionState::Open);
    inner.was_open.set(true);
    log!("[transport] connected");
    emit(inner, TransportEvent::Opened);
}

fn handle_close(inner: &Rc<TransportInner>) {
    let was_open = inner.was_open.replace(false);
    inner.state.set(ConnectionState::Closed);
    if was_open {
        error!("[transport] disconnected");
    }

    emit(inner, TransportEvent::Closed { was_open });
    connect(inner);
}

fn emit(inner: &Rc<TransportInner>, event: TransportEvent) {
    let listener = inner.listener.borrow().clone();
    if let Some(listener) = listener {
        listener(event);
    }
}

/// `ws://` for `http://`, `wss://` for `https://`, then the fixed path.
pub fn endpoint_url(origin: &str, path: &str) -> String {
    let origin = origin.trim_end_matches('/');
    let base = if let Some(rest) = origin.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = origin.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        origin.to_string()
    };
    format!("{base}{path}")
}

/// `web_sys::WebSocket` carrying text frames.
pub struct BrowserSocketFactory;

pub struct BrowserSocket {
    ws: web_sys::WebSocket,
    _on_open: Closure<dyn FnMut(web_sys::Event)>,
    _on_message: Closure<dyn FnMut(web_sys::MessageEvent)>,
    _on_close: Closure<dyn FnMut(web_sys::CloseEvent)>,
}

impl SocketFactory for BrowserSocketFactory {
    fn open(&self, url: &str, events: SocketEvents) -> SyncResult<Box<dyn Socket>> {
        let ws = web_sys::WebSocket::new(url).map_err(|e| SyncError::dom_js("WebSocket", &e))?;

        let SocketEvents {
            on_open,
            on_message,
            on_close,
        } = events;

        let on_open = Closure::wrap(Box::new(move |_ev: web_sys::Event| {
            on_open();
        }) as Box<dyn FnMut(_)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let on_message = Closure::wrap(Box::new(move |ev: web_sys::MessageEvent| {
            match ev.data().as_string() {
                Some(text) => on_message(text),
                None => warn!("[transport] ignoring non-text frame"),
            }
        }) as Box<dyn FnMut(_)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let on_close = Closure::wrap(Box::new(move |_ev: web_sys::CloseEvent| {
            on_close();
        }) as Box<dyn FnMut(_)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        Ok(Box::new(BrowserSocket {
            ws,
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
        }))
    }
}

impl Socket for BrowserSocket {
    fn is_open(&self) -> bool {
        self.ws.ready_state() == web_sys::WebSocket::OPEN
    }

    fn is_closed(&self) -> bool {
        self.ws.ready_state() == web_sys::WebSocket::CLOSED
    }

    fn send_text(&self, text: &str) -> SyncResult<()> {
        self.ws
            .send_with_str(text)
            .map_err(|e| SyncError::dom_js("WebSocket.send", &e))
    }

    fn close(&self) {
        let _ = self.ws.close();
    }
}

impl Drop for BrowserSocket {
    fn drop(&mut self) {
        // The JS object can outlive us; never let it call a freed closure.
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onclose(None);
    }
}
