use crate::error::{SyncError, SyncResult};
use crate::location::HistoryMode;
use crate::models::DocumentIdentity;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

/// Globals the host page may inject its configuration under.
const HOST_GLOBALS: [&str; 2] = ["rwtxt", "cowyo2"];

/// Configuration rendered into the page by the server. Read-only here.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct HostConfig {
    pub file_id: String,
    pub domain: String,
    #[serde(default)]
    pub domain_key: String,
    #[serde(default)]
    pub intro_text: String,
    #[serde(default)]
    pub editonly: String,
}

impl HostConfig {
    pub fn from_window() -> SyncResult<Self> {
        let window = web_sys::window().ok_or_else(|| SyncError::config("no window"))?;

        for name in HOST_GLOBALS {
            let Some(obj) = window.get(name) else {
                continue;
            };
            if obj.is_undefined() || !obj.is_object() {
                continue;
            }
            let obj: JsValue = obj.into();
            return Ok(Self {
                file_id: js_string(&obj, "file_id"),
                domain: js_string(&obj, "domain"),
                domain_key: js_string(&obj, "domain_key"),
                intro_text: js_string(&obj, "intro_text"),
                editonly: js_string(&obj, "editonly"),
            });
        }

        Err(SyncError::config("host page did not inject window.rwtxt"))
    }

    pub fn identity(&self) -> DocumentIdentity {
        DocumentIdentity {
            id: self.file_id.clone(),
            domain: self.domain.clone(),
            domain_key: if self.domain_key.is_empty() {
                None
            } else {
                Some(self.domain_key.clone())
            },
        }
    }

    pub fn is_edit_only(&self) -> bool {
        self.editonly == "yes"
    }
}

fn js_string(obj: &JsValue, key: &str) -> String {
    js_sys::Reflect::get(obj, &key.into())
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_default()
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SavedIndicator {
    /// Confirm only what the server acknowledged.
    #[default]
    OnAck,
    /// Flash as soon as the frame is sent.
    OnSend,
}

/// Client tunables.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    pub debounce_ms: i32,
    pub indicator_ms: i32,
    pub connected_flash_ms: i32,
    pub snackbar_ms: i32,
    pub endpoint_path: String,
    pub history_mode: HistoryMode,
    pub saved_indicator: SavedIndicator,
    pub title_with_domain: bool,
    pub insert_tabs: bool,

    pub editor_id: String,
    pub preview_id: String,
    pub edit_link_id: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            indicator_ms: 1000,
            connected_flash_ms: 1000,
            snackbar_ms: 3000,
            endpoint_path: "/ws".to_string(),
            history_mode: HistoryMode::Replace,
            saved_indicator: SavedIndicator::OnAck,
            title_with_domain: true,
            insert_tabs: true,
            editor_id: "editable".to_string(),
            preview_id: "rendered".to_string(),
            edit_link_id: "editlink".to_string(),
        }
    }
}

impl SyncConfig {
    /// Defaults, overridden by `window.ENV.DEBOUNCE_MS` / `HISTORY_MODE`.
    pub fn from_env() -> Self {
        let mut debounce = None;
        let mut history = None;

        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    let env: JsValue = env.into();
                    debounce = js_sys::Reflect::get(&env, &"DEBOUNCE_MS".into())
                        .ok()
                        .and_then(|v| v.as_f64().map(|n| n.to_string()).or(v.as_string()));
                    history = js_sys::Reflect::get(&env, &"HISTORY_MODE".into())
                        .ok()
                        .and_then(|v| v.as_string());
                }
            }
        }

        Self::default().with_overrides(debounce.as_deref(), history.as_deref())
    }

    /// Unparseable values keep the current setting.
    pub fn with_overrides(mut self, debounce_ms: Option<&str>, history_mode: Option<&str>) -> Self {
        if let Some(ms) = debounce_ms.and_then(|s| s.trim().parse::<f64>().ok()) {
            if ms.is_finite() && ms > 0.0 {
                self.debounce_ms = ms.round() as i32;
            }
        }
        if let Some(mode) = history_mode.and_then(|s| s.trim().parse::<HistoryMode>().ok()) {
            self.history_mode = mode;
        }
        self
    }
}
