use crate::timers::{TimerHost, TimerId};
use leptos::logging::warn;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;

/// Status badges the page shows next to the editor.
///
/// The string form is the element id on the host page. Rejections and
/// disconnects share the page's single "not saved" badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr, strum::EnumIter)]
pub enum Indicator {
    #[strum(serialize = "saved")]
    Saved,
    #[strum(serialize = "notsaved")]
    NotSaved,
    #[strum(serialize = "notsaved")]
    Disconnected,
    #[strum(serialize = "connectedicon")]
    Connected,
    #[strum(serialize = "snackbar")]
    Snackbar,
}

impl Indicator {
    pub fn element_id(self) -> &'static str {
        self.into()
    }
}

pub trait IndicatorHost {
    fn show(&self, indicator: Indicator);
    fn hide(&self, indicator: Indicator);
}

/// Shows and hides indicators, including timed flashes.
///
/// Each badge element has at most one pending hide. Indicators sharing an
/// element share that slot, so any show or flash cancels the hide.
#[derive(Clone)]
pub struct IndicatorBoard {
    host: Rc<dyn IndicatorHost>,
    timers: Rc<dyn TimerHost>,
    pending_hides: Rc<RefCell<HashMap<&'static str, TimerId>>>,
}

impl IndicatorBoard {
    pub fn new(host: Rc<dyn IndicatorHost>, timers: Rc<dyn TimerHost>) -> Self {
        Self {
            host,
            timers,
            pending_hides: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn show(&self, indicator: Indicator) {
        self.cancel_hide(indicator);
        self.host.show(indicator);
    }

    pub fn hide(&self, indicator: Indicator) {
        self.cancel_hide(indicator);
        self.host.hide(indicator);
    }

    pub fn flash(&self, indicator: Indicator, duration_ms: i32) {
        self.show(indicator);

        let host = self.host.clone();
        let pending = self.pending_hides.clone();
        let cb = Box::new(move || {
            pending.borrow_mut().remove(indicator.element_id());
            host.hide(indicator);
        });

        match self.timers.set_timeout(duration_ms, cb) {
            Ok(tid) => {
                self.pending_hides
                    .borrow_mut()
                    .insert(indicator.element_id(), tid);
            }
            Err(e) => warn!("[indicators] cannot schedule hide of {indicator:?}: {e}"),
        }
    }

    fn cancel_hide(&self, indicator: Indicator) {
        let tid = self
            .pending_hides
            .borrow_mut()
            .remove(indicator.element_id());
        if let Some(tid) = tid {
            self.timers.clear_timeout(tid);
        }
    }
}

/// Toggles the host page's badge elements. Badges are shown with an inline
/// `display`; the snackbar uses its `show` class. Missing elements are
/// skipped, the host page may not render every badge.
pub struct BrowserIndicators {
    document: web_sys::Document,
}

impl BrowserIndicators {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    fn element(&self, indicator: Indicator) -> Option<web_sys::HtmlElement> {
        self.document
            .get_element_by_id(indicator.element_id())
            .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
    }

    fn set_visible(&self, indicator: Indicator, visible: bool) {
        let Some(el) = self.element(indicator) else {
            return;
        };

        if indicator == Indicator::Snackbar {
            let classes = el.class_list();
            let _ = if visible {
                classes.add_1("show")
            } else {
                classes.remove_1("show")
            };
        } else {
            let display = if visible { "inline-block" } else { "none" };
            let _ = el.style().set_property("display", display);
        }
    }
}

impl IndicatorHost for BrowserIndicators {
    fn show(&self, indicator: Indicator) {
        self.set_visible(indicator, true);
    }

    fn hide(&self, indicator: Indicator) {
        self.set_visible(indicator, false);
    }
}
