//! Application core: event loop, screen routing, action dispatch.
//!
//! The `Panel` owns navigation and search state. The app feeds it events,
//! runs the searches it hands back on spawned tasks, and pushes a state
//! snapshot to the search screen after every change.

use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use lookout_config::ProfileSession;
use lookout_core::{
    HttpQueryClient, Identity, LaunchParams, Panel, PanelEvent, QueryClient, Screen, SearchRequest,
};

use crate::action::Action;
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screens::configure::ConfigureScreen;
use crate::screens::login::LoginScreen;
use crate::screens::search::SearchScreen;
use crate::theme;
use crate::tui::Tui;

/// Top-level application state and event loop.
pub struct App<C> {
    panel: Panel,
    session: ProfileSession,
    /// Runs the panel's searches.
    client: C,
    login: LoginScreen,
    configure: ConfigureScreen,
    search: SearchScreen,
    /// Profile label for the status bar.
    profile: String,
    running: bool,
    /// Action sender; components and spawned tasks dispatch through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver; the main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl<C> App<C>
where
    C: QueryClient + Clone + Send + Sync + 'static,
{
    pub fn new(
        session: ProfileSession,
        client: C,
        identity: Option<Identity>,
        launch: LaunchParams,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let panel = Panel::new(identity, launch);
        let login = LoginScreen::new(
            session.clone(),
            HttpQueryClient::new(session.connection_options()),
        );
        let can_cancel = panel.identity().is_some_and(|id| id.person_props);
        let mut configure = ConfigureScreen::new(session.clone());
        configure.reset(can_cancel, panel.identity().cloned());
        let search = SearchScreen::new(panel.state().clone(), session.display_properties());
        let profile = session.profile_name();

        Self {
            panel,
            session,
            client,
            login,
            configure,
            search,
            profile,
            running: true,
            action_tx,
            action_rx,
        }
    }

    fn init_screens(&mut self) -> Result<()> {
        self.login.init(self.action_tx.clone())?;
        self.configure.init(self.action_tx.clone())?;
        self.search.init(self.action_tx.clone())?;
        Ok(())
    }

    /// Activate the panel; a deep link on Main fires its search now.
    fn start(&mut self) -> Result<()> {
        if let Some(request) = self.panel.activate() {
            self.spawn_search(request);
        }
        self.publish()
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;
        self.start()?;

        let mut events = EventReader::new(
            Duration::from_millis(100), // throbber tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!(screen = %self.panel.screen(), "event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Paste(text) => {
                    if let Some(action) = self.active_mut().handle_paste(&text)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                let render = matches!(action, Action::Render);
                self.process_action(action)?;
                if render {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        info!("event loop ended");
        Ok(())
    }

    fn active(&self) -> &dyn Component {
        match self.panel.screen() {
            Screen::Login => &self.login,
            Screen::Configure => &self.configure,
            Screen::Main => &self.search,
        }
    }

    fn active_mut(&mut self) -> &mut dyn Component {
        match self.panel.screen() {
            Screen::Login => &mut self.login,
            Screen::Configure => &mut self.configure,
            Screen::Main => &mut self.search,
        }
    }

    /// Ctrl+C quits everywhere; every other key belongs to the active screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }
        self.active_mut().handle_key_event(key)
    }

    fn spawn_search(&self, request: SearchRequest) {
        debug!(seq = request.seq, query = %request.query, "spawning search");
        let client = self.client.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = client.search(&request.identity, &request.query).await;
            let _ = tx.send(Action::SearchSettled {
                seq: request.seq,
                result,
            });
        });
    }

    /// Queue a snapshot of the panel for the search screen.
    fn publish(&self) -> Result<()> {
        self.action_tx
            .send(Action::PanelChanged(Box::new(self.panel.state().clone())))?;
        Ok(())
    }

    fn dispatch(&mut self, event: PanelEvent) -> Result<()> {
        if let Some(request) = self.panel.dispatch(event) {
            self.spawn_search(request);
        }
        self.publish()
    }

    fn process_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Render | Action::Resize(..) => {}

            Action::QueryChanged(query) => self.dispatch(PanelEvent::QueryChanged(query))?,
            Action::Submit => self.dispatch(PanelEvent::Submit)?,

            Action::SearchSettled { seq, result } => {
                if self.panel.settle(seq, result) {
                    self.publish()?;
                }
            }

            Action::LoginVerified(result) => {
                if self.panel.screen() != Screen::Login || !self.login.is_verifying() {
                    debug!("login check finished after cancel; ignored");
                    return Ok(());
                }
                self.login.update(&Action::LoginVerified(result.clone()))?;
                if let Ok(identity) = result {
                    self.configure.reset(false, Some(identity.clone()));
                    self.dispatch(PanelEvent::AuthSucceeded(identity))?;
                }
            }

            Action::SetupSaved(Ok(identity)) => {
                self.search
                    .set_display_properties(self.session.display_properties());
                self.dispatch(PanelEvent::SetupCompleted(identity))?;
            }

            Action::OpenSettings => {
                let can_cancel = self.panel.identity().is_some_and(|id| id.person_props);
                self.configure.reset(can_cancel, self.panel.identity().cloned());
                self.dispatch(PanelEvent::SettingsRequested)?;
            }

            Action::CloseSettings => {
                let current = self
                    .panel
                    .identity()
                    .filter(|id| id.person_props)
                    .cloned();
                if let Some(identity) = current {
                    self.dispatch(PanelEvent::SetupCompleted(identity))?;
                }
            }

            Action::PanelChanged(_) => {
                self.search.update(&action)?;
            }

            other @ (Action::Tick | Action::SetupSaved(Err(_))) => {
                if let Some(follow_up) = self.active_mut().update(&other)? {
                    self.action_tx.send(follow_up)?;
                }
            }
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(frame.area());
        self.active().render(frame, layout[0]);
        self.render_status_bar(frame, layout[1]);
    }

    /// Profile and host on the left, the last search failure, then key hints.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let host = self
            .panel
            .identity()
            .and_then(|id| id.url.host_str().map(str::to_owned))
            .unwrap_or_else(|| "not connected".into());

        let mut spans = vec![
            Span::styled(" lookout ", theme::title_style()),
            Span::styled(format!("{} \u{00B7} {host} ", self.profile), theme::status_bar()),
        ];
        if self.panel.screen() == Screen::Main {
            if let Some(ref err) = self.panel.state().last_error {
                spans.push(Span::styled(format!(" {err} "), theme::error()));
            }
        }
        spans.push(Span::styled(
            format!(" \u{2502} {}  Ctrl+C quit", self.active().hints()),
            theme::key_hint(),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
