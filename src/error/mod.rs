use wasm_bindgen::JsValue;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncErrorKind {
    /// Connection dropped or could not be opened.
    TransportClosed,
    /// Server answered `not saving` (read-only domain, bad key).
    SaveRejected,
    /// Inbound frame that is not a valid acknowledgement.
    MalformedMessage,
    /// A DOM element is missing or a browser API call threw.
    Dom,
    /// Host page did not inject the expected configuration.
    Config,
}

#[derive(Clone, Debug)]
pub struct SyncError {
    pub kind: SyncErrorKind,
    pub message: String,
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SyncError {}

impl SyncError {
    pub(crate) fn transport_closed(ctx: &str) -> Self {
        Self {
            kind: SyncErrorKind::TransportClosed,
            message: format!("{ctx}: connection is not open"),
        }
    }

    pub(crate) fn save_rejected() -> Self {
        Self {
            kind: SyncErrorKind::SaveRejected,
            message: "server is not saving this document".to_string(),
        }
    }

    pub(crate) fn malformed(e: impl std::fmt::Display) -> Self {
        Self {
            kind: SyncErrorKind::MalformedMessage,
            message: e.to_string(),
        }
    }

    pub(crate) fn dom(ctx: &str) -> Self {
        Self {
            kind: SyncErrorKind::Dom,
            message: ctx.to_string(),
        }
    }

    pub(crate) fn dom_js(ctx: &str, e: &JsValue) -> Self {
        Self {
            kind: SyncErrorKind::Dom,
            message: format!("{ctx}: {e:?}"),
        }
    }

    pub(crate) fn config(ctx: &str) -> Self {
        Self {
            kind: SyncErrorKind::Config,
            message: ctx.to_string(),
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
