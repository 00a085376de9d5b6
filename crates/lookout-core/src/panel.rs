// ── Panel state machine ──
//
// Owns the screen, the query text, the current result set, and the
// loading flag. Sans-IO: transitions that need a lookup hand back a
// `SearchRequest`; the host runs it against a `QueryClient` and reports
// the outcome through `Panel::settle`.

use strum::Display;
use tracing::{debug, info, warn};

use crate::error::QueryError;
use crate::launch::LaunchParams;
use crate::model::{Identity, PersonRecord};
use crate::query::QueryClient;
use crate::render::{RenderMode, render_mode};
use crate::session::SessionProvider;

/// Top-level view of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Screen {
    Login,
    Configure,
    Main,
}

impl Screen {
    /// Screen selection at initialization.
    pub fn initial(identity: Option<&Identity>) -> Self {
        match identity {
            Some(id) if id.person_props => Screen::Main,
            Some(_) => Screen::Configure,
            None => Screen::Login,
        }
    }
}

/// Something that happened outside the state machine.
#[derive(Debug, Clone)]
pub enum PanelEvent {
    /// The login collaborator verified a credential.
    AuthSucceeded(Identity),
    /// The configure collaborator finished setup.
    SetupCompleted(Identity),
    /// The operator asked for settings from the main screen.
    SettingsRequested,
    /// The session provider's identity was replaced (or dropped).
    IdentityChanged(Option<Identity>),
    /// The search input changed.
    QueryChanged(String),
    /// The search form was submitted.
    Submit,
}

impl PanelEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::AuthSucceeded(_) => "AuthSucceeded",
            Self::SetupCompleted(_) => "SetupCompleted",
            Self::SettingsRequested => "SettingsRequested",
            Self::IdentityChanged(_) => "IdentityChanged",
            Self::QueryChanged(_) => "QueryChanged",
            Self::Submit => "Submit",
        }
    }
}

/// A search the host must execute, tagged with its issue order.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub seq: u64,
    pub identity: Identity,
    pub query: String,
}

/// Observable panel state.
#[derive(Debug, Clone)]
pub struct PanelState {
    pub screen: Screen,
    pub query: String,
    /// Stale while `loading` is true.
    pub persons: Vec<PersonRecord>,
    pub loading: bool,
    /// Most recent search failure, cleared by the next success.
    pub last_error: Option<QueryError>,
}

impl PanelState {
    pub fn render_mode(&self) -> RenderMode {
        render_mode(self.loading, &self.persons)
    }
}

/// The panel's screen and search state machine.
#[derive(Debug)]
pub struct Panel {
    state: PanelState,
    identity: Option<Identity>,
    launch: LaunchParams,
    activated: bool,
    bootstrap_pending: bool,
    last_issued: u64,
    in_flight: Option<u64>,
}

impl Panel {
    /// Build with an explicit identity snapshot and launch parameters.
    ///
    /// The screen is chosen here; nothing is issued until [`activate`](Self::activate).
    pub fn new(identity: Option<Identity>, launch: LaunchParams) -> Self {
        let screen = Screen::initial(identity.as_ref());
        debug!(%screen, has_identity = identity.is_some(), "panel initialized");
        Self {
            state: PanelState {
                screen,
                query: String::new(),
                persons: Vec::new(),
                loading: false,
                last_error: None,
            },
            identity,
            launch,
            activated: false,
            bootstrap_pending: true,
            last_issued: 0,
            in_flight: None,
        }
    }

    /// Build from whatever the session provider currently holds.
    pub fn from_session(session: &impl SessionProvider, launch: LaunchParams) -> Self {
        Self::new(session.current_identity(), launch)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn screen(&self) -> Screen {
        self.state.screen
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn render_mode(&self) -> RenderMode {
        self.state.render_mode()
    }

    /// Sequence number of the newest issued search (0 before any).
    pub fn last_issued(&self) -> u64 {
        self.last_issued
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// First activation. Runs the deep-link bootstrap if the panel opened
    /// on the main screen. Later calls do nothing.
    pub fn activate(&mut self) -> Option<SearchRequest> {
        if self.activated {
            return None;
        }
        self.activated = true;
        if self.state.screen == Screen::Main {
            self.enter_main()
        } else {
            None
        }
    }

    /// Apply an external event. Returns a search for the host to run, if any.
    pub fn dispatch(&mut self, event: PanelEvent) -> Option<SearchRequest> {
        let screen = self.state.screen;
        match (screen, event) {
            (Screen::Login, PanelEvent::AuthSucceeded(identity)) => {
                self.identity = Some(identity);
                self.goto(Screen::Configure);
                None
            }
            (Screen::Configure, PanelEvent::SetupCompleted(identity)) => {
                self.identity = Some(identity);
                self.goto(Screen::Main);
                self.activated = true;
                self.enter_main()
            }
            (Screen::Main, PanelEvent::SettingsRequested) => {
                self.goto(Screen::Configure);
                None
            }
            (_, PanelEvent::IdentityChanged(identity)) => {
                debug!(present = identity.is_some(), "identity replaced");
                self.identity = identity;
                None
            }
            (Screen::Main, PanelEvent::QueryChanged(query)) => {
                self.state.query = query;
                None
            }
            (Screen::Main, PanelEvent::Submit) => self.issue(),
            (screen, event) => {
                debug!(%screen, event = event.name(), "event ignored on this screen");
                None
            }
        }
    }

    /// Report the outcome of a previously issued search.
    ///
    /// Only the newest issued search is applied; anything older is
    /// discarded. Returns whether the result was applied. A failure is
    /// normalized to an empty result set.
    pub fn settle(&mut self, seq: u64, result: Result<Vec<PersonRecord>, QueryError>) -> bool {
        if self.in_flight != Some(seq) {
            debug!(seq, latest = self.last_issued, "discarding stale search result");
            return false;
        }
        self.in_flight = None;

        match result {
            Ok(persons) => {
                debug!(seq, count = persons.len(), "search applied");
                self.state.persons = persons;
                self.state.last_error = None;
            }
            Err(e) => {
                warn!(seq, error = %e, "search failed; showing no results");
                self.state.persons = Vec::new();
                self.state.last_error = Some(e);
            }
        }
        self.state.loading = false;
        true
    }

    /// Run one request to completion and settle it.
    pub async fn search_with<C: QueryClient + Sync>(
        &mut self,
        client: &C,
        request: SearchRequest,
    ) -> bool {
        let result = client.search(&request.identity, &request.query).await;
        self.settle(request.seq, result)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn goto(&mut self, next: Screen) {
        info!(from = %self.state.screen, to = %next, "screen transition");
        self.state.screen = next;
    }

    /// Main became active: consume the bootstrap, firing it if possible.
    fn enter_main(&mut self) -> Option<SearchRequest> {
        if !self.bootstrap_pending {
            return None;
        }
        self.bootstrap_pending = false;

        let email = self.launch.email.clone()?;
        if self.identity.is_none() {
            debug!("deep link present but no identity; skipping bootstrap");
            return None;
        }
        info!(email = %email, "bootstrapping search from launch parameters");
        self.state.query = email;
        self.issue()
    }

    fn issue(&mut self) -> Option<SearchRequest> {
        let Some(identity) = self.identity.clone() else {
            debug!("submit without identity ignored");
            return None;
        };
        self.last_issued += 1;
        let seq = self.last_issued;
        self.in_flight = Some(seq);
        self.state.loading = true;
        debug!(seq, query = %self.state.query, "search issued");
        Some(SearchRequest {
            seq,
            identity,
            query: self.state.query.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::PersonId;
    use secrecy::SecretString;
    use url::Url;

    fn identity(person_props: bool) -> Identity {
        Identity::new(
            Url::parse("https://app.example.com").unwrap(),
            SecretString::from("phx_k".to_string()),
        )
        .with_person_props(person_props)
    }

    #[test]
    fn initial_screen_partition() {
        assert_eq!(Screen::initial(None), Screen::Login);
        assert_eq!(Screen::initial(Some(&identity(false))), Screen::Configure);
        assert_eq!(Screen::initial(Some(&identity(true))), Screen::Main);
    }

    #[test]
    fn activate_runs_once() {
        let mut panel = Panel::new(Some(identity(true)), LaunchParams::from_email("a@b.c"));
        let first = panel.activate().unwrap();
        assert_eq!(first.seq, 1);
        assert!(panel.activate().is_none());
        assert_eq!(panel.last_issued(), 1);
    }

    #[test]
    fn events_off_screen_are_ignored() {
        let mut panel = Panel::new(None, LaunchParams::none());
        assert!(panel.dispatch(PanelEvent::Submit).is_none());
        assert!(panel.dispatch(PanelEvent::SettingsRequested).is_none());
        assert!(panel.dispatch(PanelEvent::SetupCompleted(identity(true))).is_none());
        assert_eq!(panel.screen(), Screen::Login);
        assert!(!panel.state().loading);
    }

    #[test]
    fn settle_of_unknown_seq_is_discarded() {
        let mut panel = Panel::new(Some(identity(true)), LaunchParams::none());
        panel.activate();
        let applied = panel.settle(42, Ok(vec![PersonRecord::new(PersonId::Int(1), "x")]));
        assert!(!applied);
        assert!(panel.state().persons.is_empty());
    }
}
