use crate::error::{SyncError, SyncResult};
use wasm_bindgen::JsCast;

pub type TimerId = i32;

/// Deferred callbacks on the page's event loop.
///
/// Everything in this crate runs on the single browser thread, so callbacks
/// are neither `Send` nor `Sync`.
pub trait TimerHost {
    fn set_timeout(&self, delay_ms: i32, cb: Box<dyn FnOnce()>) -> SyncResult<TimerId>;
    fn clear_timeout(&self, id: TimerId);
}

/// `window.setTimeout` / `window.clearTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTimers;

impl TimerHost for BrowserTimers {
    fn set_timeout(&self, delay_ms: i32, cb: Box<dyn FnOnce()>) -> SyncResult<TimerId> {
        let win = web_sys::window().ok_or_else(|| SyncError::dom("no window"))?;
        let js_cb = wasm_bindgen::closure::Closure::once_into_js(move || cb());

        win.set_timeout_with_callback_and_timeout_and_arguments_0(
            js_cb.as_ref().unchecked_ref(),
            delay_ms,
        )
        .map_err(|e| SyncError::dom_js("setTimeout", &e))
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(win) = web_sys::window() {
            win.clear_timeout_with_handle(id);
        }
    }
}
