use crate::error::{SyncError, SyncResult};
use leptos::logging::warn;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use wasm_bindgen::JsValue;

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, strum::EnumString, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HistoryMode {
    /// Rewrite the current entry so autosave renames don't pile up in
    /// back-navigation.
    #[default]
    Replace,
    Push,
}

/// The address bar and tab title.
pub trait LocationHost {
    fn pathname(&self) -> String;
    fn replace_state(&self, url: &str, title: &str) -> SyncResult<()>;
    fn push_state(&self, url: &str, title: &str) -> SyncResult<()>;
    fn set_title(&self, title: &str);
}

/// Applies an acknowledged name to the visible location, never navigating.
pub struct LocationReconciler {
    host: Rc<dyn LocationHost>,
    mode: HistoryMode,
    title_with_domain: bool,
}

impl LocationReconciler {
    pub fn new(host: Rc<dyn LocationHost>, mode: HistoryMode, title_with_domain: bool) -> Self {
        Self {
            host,
            mode,
            title_with_domain,
        }
    }

    /// Returns whether the visible location changed.
    ///
    /// The name replaces the last path segment, the same URL the browser
    /// resolves for a relative `replaceState` target: `/old` -> `/new`,
    /// `/public/old` -> `/public/new`.
    pub fn reconcile(&self, new_name: &str, domain: &str) -> bool {
        if new_name.is_empty() {
            return false;
        }

        let current = self.host.pathname();
        let target = sibling_path(&current, new_name);
        if target == current {
            return false;
        }

        let title = self.title_for(new_name, domain);
        let pushed = match self.mode {
            HistoryMode::Replace => self.host.replace_state(&target, new_name),
            HistoryMode::Push => self.host.push_state(&target, new_name),
        };
        if let Err(e) = pushed {
            warn!("[location] cannot update history to {target}: {e}");
            return false;
        }

        self.host.set_title(&title);
        true
    }

    pub fn title_for(&self, name: &str, domain: &str) -> String {
        if self.title_with_domain && !domain.is_empty() {
            format!("{name} | {domain}")
        } else {
            name.to_string()
        }
    }
}

fn sibling_path(current: &str, name: &str) -> String {
    match current.rfind('/') {
        Some(idx) => format!("{}{}", &current[..=idx], name),
        None => format!("/{name}"),
    }
}

/// `window.location` + `window.history` + `document.title`.
pub struct BrowserLocation {
    window: web_sys::Window,
}

impl BrowserLocation {
    pub fn new(window: web_sys::Window) -> Self {
        Self { window }
    }

    fn history(&self) -> SyncResult<web_sys::History> {
        self.window
            .history()
            .map_err(|e| SyncError::dom_js("history", &e))
    }
}

impl LocationHost for BrowserLocation {
    fn pathname(&self) -> String {
        self.window.location().pathname().unwrap_or_default()
    }

    fn replace_state(&self, url: &str, title: &str) -> SyncResult<()> {
        self.history()?
            .replace_state_with_url(&JsValue::NULL, title, Some(url))
            .map_err(|e| SyncError::dom_js("history.replaceState", &e))
    }

    fn push_state(&self, url: &str, title: &str) -> SyncResult<()> {
        self.history()?
            .push_state_with_url(&JsValue::NULL, title, Some(url))
            .map_err(|e| SyncError::dom_js("history.pushState", &e))
    }

    fn set_title(&self, title: &str) {
        if let Some(doc) = self.window.document() {
            doc.set_title(title);
        }
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_browser_location_replace_keeps_page() {
        let win = web_sys::window().expect("window");
        let loc = BrowserLocation::new(win.clone());
        let before = loc.pathname();

        let r = LocationReconciler::new(Rc::new(loc), HistoryMode::Replace, true);
        assert!(r.reconcile("sync-test-note", "public"));

        let after = win.location().pathname().expect("pathname");
        assert!(after.ends_with("/sync-test-note"));
        assert_eq!(win.document().expect("document").title(), "sync-test-note | public");

        let _ = win
            .history()
            .expect("history")
            .replace_state_with_url(&JsValue::NULL, "", Some(&before));
    }
}
