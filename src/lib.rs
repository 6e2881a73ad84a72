//! Client-side edit sync for rwtxt pages.
//!
//! Debounced autosave over a single reconnecting WebSocket, with the
//! server-acknowledged slug reflected in the address bar and tab title.

pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod indicators;
pub mod location;
pub mod models;
pub mod session;
pub mod slug;
pub mod timers;
pub mod transport;
mod util;

#[cfg(test)]
mod testing;

pub use config::{HostConfig, SavedIndicator, SyncConfig};
pub use coordinator::{AckOutcome, Effect, SyncCoordinator, SyncState};
pub use error::{SyncError, SyncErrorKind, SyncResult};
pub use models::{DocumentIdentity, EditPayload, SaveAck};
pub use session::{EditPage, EditSession};
pub use slug::slugify;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    if let Err(e) = session::start() {
        leptos::logging::error!("[page] edit sync not started: {e}");
    }
}
