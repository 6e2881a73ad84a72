use super::{EditSession, SessionParts};
use crate::config::{HostConfig, SyncConfig};
use crate::editor::BrowserEditor;
use crate::error::{SyncError, SyncResult};
use crate::indicators::BrowserIndicators;
use crate::location::BrowserLocation;
use crate::timers::BrowserTimers;
use crate::transport::BrowserSocketFactory;
use crate::util::query_param;
use leptos::ev;
use leptos::logging::{log, warn};
use leptos::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

thread_local! {
    /// Keeps the started page, and with it the window click listener handle,
    /// alive after `start` returns.
    static ACTIVE_PAGE: RefCell<Option<EditPage>> = const { RefCell::new(None) };
}

/// The edit session bound to the host page's DOM.
#[derive(Clone)]
pub struct EditPage {
    session: EditSession,
    editor: Rc<BrowserEditor>,

    /// Window listener; kept so it lives as long as the page.
    _click_handle: Rc<RefCell<Option<WindowListenerHandle>>>,
}

impl EditPage {
    pub fn session(&self) -> &EditSession {
        &self.session
    }
}

/// Attach to the current page. Called once from the wasm entry point.
pub fn start() -> SyncResult<EditPage> {
    let window = web_sys::window().ok_or_else(|| SyncError::dom("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| SyncError::dom("no document"))?;

    let host = HostConfig::from_window()?;
    let config = SyncConfig::from_env();
    let origin = window
        .location()
        .origin()
        .map_err(|e| SyncError::dom_js("location.origin", &e))?;

    let editor = Rc::new(BrowserEditor::find(
        &document,
        &config.editor_id,
        &config.preview_id,
    )?);
    let edit_only = host.is_edit_only();

    let session = EditSession::new(
        config,
        host,
        &origin,
        SessionParts {
            timers: Rc::new(BrowserTimers),
            sockets: Rc::new(BrowserSocketFactory),
            location: Rc::new(BrowserLocation::new(window.clone())),
            indicators: Rc::new(BrowserIndicators::new(document.clone())),
            editor: editor.clone(),
        },
    );

    let page = EditPage {
        session,
        editor,
        _click_handle: Rc::new(RefCell::new(None)),
    };
    page.attach_listeners(&document)?;

    // Focus on the next tick, after the host page finished its own setup.
    let focus_target = page.editor.clone();
    if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        Closure::once_into_js(move || focus_target.focus())
            .as_ref()
            .unchecked_ref(),
        0,
    ) {
        warn!("[page] initial focus not scheduled: {e:?}");
    }

    let href = window.location().href().unwrap_or_default();
    if query_param(&href, "edit").is_some() {
        page.session.enter_edit_mode();
        let path = window.location().pathname().unwrap_or_default();
        let pushed = window
            .history()
            .and_then(|history| history.push_state_with_url(&JsValue::NULL, &path, Some(&path)));
        if let Err(e) = pushed {
            warn!("[page] cannot push {path}: {e:?}");
        }
    }
    if edit_only {
        page.session.enter_edit_mode();
    }

    log!("[page] edit sync attached");
    ACTIVE_PAGE.with(|slot| *slot.borrow_mut() = Some(page.clone()));
    Ok(page)
}

impl EditPage {
    fn attach_listeners(&self, document: &web_sys::Document) -> SyncResult<()> {
        let textarea = self.editor.element();

        let session = self.session.clone();
        let on_input = Closure::wrap(Box::new(move |_ev: web_sys::Event| {
            session.on_input();
        }) as Box<dyn FnMut(_)>);
        textarea
            .add_event_listener_with_callback("input", on_input.as_ref().unchecked_ref())
            .map_err(|e| SyncError::dom_js("input listener", &e))?;
        on_input.forget();

        let session = self.session.clone();
        let on_focus_in = Closure::wrap(Box::new(move |_ev: web_sys::FocusEvent| {
            session.on_focus_in();
        }) as Box<dyn FnMut(_)>);
        textarea
            .add_event_listener_with_callback("focusin", on_focus_in.as_ref().unchecked_ref())
            .map_err(|e| SyncError::dom_js("focusin listener", &e))?;
        on_focus_in.forget();

        if self.session.config().insert_tabs {
            let editor = self.editor.clone();
            let session = self.session.clone();
            let on_keydown = Closure::wrap(Box::new(move |ev: web_sys::KeyboardEvent| {
                if ev.key() != "Tab" {
                    return;
                }
                ev.prevent_default();
                editor.insert_tab_at_selection();
                // Programmatic edits fire no input event.
                session.on_input();
            }) as Box<dyn FnMut(_)>);
            textarea
                .add_event_listener_with_callback("keydown", on_keydown.as_ref().unchecked_ref())
                .map_err(|e| SyncError::dom_js("keydown listener", &e))?;
            on_keydown.forget();
        }

        if let Some(link) = document.get_element_by_id(&self.session.config().edit_link_id) {
            let session = self.session.clone();
            let on_click = Closure::wrap(Box::new(move |ev: web_sys::MouseEvent| {
                ev.prevent_default();
                session.enter_edit_mode();
            }) as Box<dyn FnMut(_)>);
            link.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
                .map_err(|e| SyncError::dom_js("edit link listener", &e))?;
            on_click.forget();
        }

        // Clicks on the bare page keep focus in the editor while editing.
        let editor = self.editor.clone();
        let session = self.session.clone();
        let click = window_event_listener(ev::click, move |ev: web_sys::MouseEvent| {
            if !session.is_editing() || !editor.is_visible() {
                return;
            }
            let on_root = ev
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
                .map(|el| el.tag_name().eq_ignore_ascii_case("html"))
                .unwrap_or(false);
            if on_root {
                editor.focus();
            }
        });
        *self._click_handle.borrow_mut() = Some(click);

        Ok(())
    }
}
