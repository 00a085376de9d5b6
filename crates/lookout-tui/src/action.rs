//! All possible UI actions. Actions are the sole mechanism for state mutation.

use lookout_core::{Identity, PanelState, PersonRecord, QueryError};

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ───────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Search (main screen) ────────────────────────────────────────
    /// Search input text replaced.
    QueryChanged(String),
    /// Search form submitted.
    Submit,
    /// A spawned search finished.
    SearchSettled {
        seq: u64,
        result: Result<Vec<PersonRecord>, QueryError>,
    },
    /// Snapshot of the panel after a change, for the main screen to draw.
    PanelChanged(Box<PanelState>),

    // ── Login / configure ───────────────────────────────────────────
    /// Credential check and save finished.
    LoginVerified(Result<Identity, String>),
    /// Setup saved (or failed to save).
    SetupSaved(Result<Identity, String>),
    /// Open the configure screen from main.
    OpenSettings,
    /// Leave configure without changes (only when setup was done before).
    CloseSettings,
}
