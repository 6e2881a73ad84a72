mod page;

pub use page::{start, EditPage};

use crate::config::{HostConfig, SyncConfig};
use crate::coordinator::{CoordinatorOptions, Effect, SyncCoordinator, SyncState};
use crate::debounce::Debouncer;
use crate::editor::{clear_intro_placeholder, EditorSurface};
use crate::indicators::{Indicator, IndicatorBoard, IndicatorHost};
use crate::location::{LocationHost, LocationReconciler};
use crate::timers::TimerHost;
use crate::transport::{endpoint_url, ConnectionState, SocketFactory, TransportManager};
use leptos::logging::{error, warn};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Browser (or test) collaborators an [`EditSession`] drives.
pub struct SessionParts {
    pub timers: Rc<dyn TimerHost>,
    pub sockets: Rc<dyn SocketFactory>,
    pub location: Rc<dyn LocationHost>,
    pub indicators: Rc<dyn IndicatorHost>,
    pub editor: Rc<dyn EditorSurface>,
}

/// Wires input -> debouncer -> coordinator -> transport, and transport
/// events -> coordinator -> indicators / location.
///
/// Lives for the page; everything runs on the one browser thread.
#[derive(Clone)]
pub struct EditSession {
    inner: Rc<SessionInner>,
}

struct SessionInner {
    config: SyncConfig,
    host: HostConfig,
    coordinator: RefCell<SyncCoordinator>,
    transport: TransportManager,
    reconciler: LocationReconciler,
    indicators: IndicatorBoard,
    editor: Rc<dyn EditorSurface>,
    debouncer: Debouncer<()>,
    editing: Cell<bool>,
}

impl EditSession {
    pub fn new(config: SyncConfig, host: HostConfig, origin: &str, parts: SessionParts) -> Self {
        let SessionParts {
            timers,
            sockets,
            location,
            indicators,
            editor,
        } = parts;

        let coordinator = SyncCoordinator::new(
            host.identity(),
            CoordinatorOptions {
                saved_indicator: config.saved_indicator,
                indicator_ms: config.indicator_ms,
                connected_flash_ms: config.connected_flash_ms,
            },
        );
        let transport = TransportManager::new(sockets, endpoint_url(origin, &config.endpoint_path));
        let reconciler =
            LocationReconciler::new(location, config.history_mode, config.title_with_domain);
        let indicators = IndicatorBoard::new(indicators, timers.clone());

        let inner = Rc::new_cyclic(|weak: &Weak<SessionInner>| {
            let on_quiet = weak.clone();
            let debouncer = Debouncer::new(timers, config.debounce_ms, move |()| {
                if let Some(inner) = on_quiet.upgrade() {
                    commit(&inner);
                }
            });

            SessionInner {
                config,
                host,
                coordinator: RefCell::new(coordinator),
                transport,
                reconciler,
                indicators,
                editor,
                debouncer,
                editing: Cell::new(false),
            }
        });

        let weak = Rc::downgrade(&inner);
        inner.transport.on_event(move |event| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let effects = inner.coordinator.borrow_mut().on_transport_event(&event);
            apply(&inner, effects);
        });

        Self { inner }
    }

    /// Start editing: connect, show the editor, flash the snackbar.
    /// Later calls are no-ops.
    pub fn enter_edit_mode(&self) {
        let inner = &self.inner;
        if inner.editing.replace(true) {
            return;
        }
        inner.transport.connect();
        inner.editor.reveal();
        inner
            .indicators
            .flash(Indicator::Snackbar, inner.config.snackbar_ms);
    }

    pub fn is_editing(&self) -> bool {
        self.inner.editing.get()
    }

    /// Every input event. The save goes out once typing pauses.
    pub fn on_input(&self) {
        self.inner.debouncer.call(());
    }

    /// Save immediately, skipping the debounce window. For callers that
    /// change the buffer themselves (e.g. inserting an uploaded file link).
    pub fn commit_now(&self) {
        self.inner.debouncer.cancel();
        commit(&self.inner);
    }

    pub fn on_focus_in(&self) -> bool {
        clear_intro_placeholder(self.inner.editor.as_ref(), &self.inner.host.intro_text)
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn sync_state(&self) -> SyncState {
        self.inner.coordinator.borrow().state()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.transport.state()
    }

    pub fn last_acknowledged(&self) -> Option<String> {
        self.inner
            .coordinator
            .borrow()
            .last_acknowledged()
            .map(str::to_string)
    }
}

fn commit(inner: &Rc<SessionInner>) {
    let text = inner.editor.text();
    let commit = inner.coordinator.borrow_mut().on_edit(&text);

    match commit.payload.to_json() {
        Ok(frame) => {
            if let Err(e) = inner.transport.send(&frame) {
                warn!("[sync] save dropped: {e}");
            }
        }
        Err(e) => error!("[sync] cannot encode save: {e}"),
    }
    apply(inner, commit.effects);
}

fn apply(inner: &Rc<SessionInner>, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Show(indicator) => inner.indicators.show(indicator),
            Effect::Hide(indicator) => inner.indicators.hide(indicator),
            Effect::Flash {
                indicator,
                duration_ms,
            } => inner.indicators.flash(indicator, duration_ms),
            Effect::Reconcile { name, domain } => {
                inner.reconciler.reconcile(&name, &domain);
            }
        }
    }
}
