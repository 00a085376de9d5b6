// lookout-core: panel state machine and search pipeline between lookout-api
// and the hosts (CLI/TUI).

pub mod config;
pub mod convert;
pub mod error;
pub mod launch;
pub mod model;
pub mod panel;
pub mod query;
pub mod render;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConnectionOptions, TlsVerification};
pub use error::QueryError;
pub use launch::LaunchParams;
pub use panel::{Panel, PanelEvent, PanelState, Screen, SearchRequest};
pub use query::{HttpQueryClient, QueryClient};
pub use render::{FLAG_PREVIEW_LIMIT, RenderMode, flag_preview, hidden_flag_count, render_mode};
pub use session::SessionProvider;

pub use model::{FlagEvaluation, Identity, PersonId, PersonRecord};
