//! Login screen: instance URL and personal API key.
//!
//! Enter verifies the key against the instance, saves the profile, and
//! emits `LoginVerified`. The app turns success into `AuthSucceeded`.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::Paragraph;
use secrecy::SecretString;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};
use url::Url;

use lookout_config::{ConfigError, ProfileSession};
use lookout_core::{HttpQueryClient, Identity};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::form;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginState {
    Editing,
    Verifying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginField {
    Url,
    ApiKey,
    Keyring,
}

impl LoginField {
    const ALL: [LoginField; 3] = [Self::Url, Self::ApiKey, Self::Keyring];
}

pub struct LoginScreen {
    action_tx: Option<UnboundedSender<Action>>,
    session: ProfileSession,
    client: HttpQueryClient,
    state: LoginState,
    active_field: LoginField,
    url_input: String,
    api_key_input: String,
    use_keyring: bool,
    error: Option<String>,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl LoginScreen {
    pub fn new(session: ProfileSession, client: HttpQueryClient) -> Self {
        Self {
            action_tx: None,
            session,
            client,
            state: LoginState::Editing,
            active_field: LoginField::Url,
            url_input: "https://".into(),
            api_key_input: String::new(),
            use_keyring: true,
            error: None,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    pub fn is_verifying(&self) -> bool {
        self.state == LoginState::Verifying
    }

    fn focus_step(&mut self, forward: bool) {
        let n = LoginField::ALL.len();
        let pos = LoginField::ALL
            .iter()
            .position(|&f| f == self.active_field)
            .unwrap_or(0);
        let next = (if forward { pos + 1 } else { pos + n - 1 }) % n;
        self.active_field = LoginField::ALL[next];
    }

    fn active_input_mut(&mut self) -> Option<&mut String> {
        match self.active_field {
            LoginField::Url => Some(&mut self.url_input),
            LoginField::ApiKey => Some(&mut self.api_key_input),
            LoginField::Keyring => None,
        }
    }

    fn validate(&self) -> std::result::Result<(Url, SecretString), String> {
        let url = lookout_config::parse_instance_url(&self.url_input).map_err(|e| e.to_string())?;
        let key = self.api_key_input.trim();
        if key.is_empty() {
            return Err("API key cannot be empty".into());
        }
        Ok((url, SecretString::from(key.to_owned())))
    }

    fn submit(&mut self) {
        let (url, api_key) = match self.validate() {
            Ok(v) => v,
            Err(msg) => {
                self.error = Some(msg);
                return;
            }
        };
        let Some(tx) = self.action_tx.clone() else {
            return;
        };

        self.state = LoginState::Verifying;
        self.error = None;

        let client = self.client.clone();
        let session = self.session.clone();
        let use_keyring = self.use_keyring;

        tokio::spawn(async move {
            let candidate = Identity::new(url.clone(), api_key.clone());
            let result = match client.verify(&candidate).await {
                Ok(user) => {
                    info!(%user, "login verified");
                    save_login(&session, &url, &api_key, use_keyring)
                }
                Err(e) => Err(e.to_string()),
            };
            let _ = tx.send(Action::LoginVerified(result));
        });
    }

    fn render_editing(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(Rect::new(area.x + 1, area.y, area.width.saturating_sub(2), area.height));

        form::input_field(
            frame,
            chunks[0],
            "  Instance URL",
            &self.url_input,
            self.active_field == LoginField::Url,
            false,
        );
        form::input_field(
            frame,
            chunks[1],
            "  Personal API key",
            &self.api_key_input,
            self.active_field == LoginField::ApiKey,
            true,
        );
        form::toggle(
            frame,
            chunks[2],
            "Store key in system keyring",
            self.use_keyring,
            self.active_field == LoginField::Keyring,
        );
    }

    fn render_verifying(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

        let throbber = throbber_widgets_tui::Throbber::default()
            .label("  Verifying API key...")
            .style(theme::input_text())
            .throbber_style(theme::border_focused());
        frame.render_stateful_widget(throbber, layout[1], &mut self.throbber_state.clone());

        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("  Contacting {}", self.url_input.trim()),
                theme::key_hint(),
            )),
            layout[2],
        );
    }
}

/// Save the verified login, falling back to the config file when the
/// keyring is unavailable.
fn save_login(
    session: &ProfileSession,
    url: &Url,
    api_key: &SecretString,
    use_keyring: bool,
) -> std::result::Result<Identity, String> {
    match session.save_login(url, api_key, use_keyring) {
        Err(ConfigError::Keyring(e)) => {
            warn!(error = %e, "keyring unavailable; storing key in config file");
            session
                .save_login(url, api_key, false)
                .map_err(|e| format!("Verified, but failed to save: {e}"))
        }
        other => other.map_err(|e| format!("Verified, but failed to save: {e}")),
    }
}

impl Component for LoginScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.state == LoginState::Verifying {
            if key.code == KeyCode::Esc {
                // The check runs to completion; the app drops its outcome.
                self.state = LoginState::Editing;
            }
            return Ok(None);
        }

        self.error = None;
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus_step(true),
            KeyCode::BackTab | KeyCode::Up => self.focus_step(false),
            KeyCode::Enter => self.submit(),
            KeyCode::Esc => return Ok(Some(Action::Quit)),
            KeyCode::Char(' ') if self.active_field == LoginField::Keyring => {
                self.use_keyring = !self.use_keyring;
            }
            KeyCode::Backspace => {
                if let Some(input) = self.active_input_mut() {
                    input.pop();
                }
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(input) = self.active_input_mut() {
                    input.clear();
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(input) = self.active_input_mut() {
                    input.push(c);
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn handle_paste(&mut self, text: &str) -> Result<Option<Action>> {
        if self.state == LoginState::Editing {
            if let Some(input) = self.active_input_mut() {
                input.push_str(text.trim());
            }
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::LoginVerified(result) if self.state == LoginState::Verifying => {
                self.state = LoginState::Editing;
                if let Err(msg) = result {
                    self.error = Some(msg.clone());
                }
            }
            Action::Tick if self.state == LoginState::Verifying => {
                self.throbber_state.calc_next();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(
            ratatui::widgets::Block::default().style(Style::default().bg(theme::BG_PANEL)),
            area,
        );
        let inner = form::centered_panel(frame, area, "Connect to your project", 64, 16);

        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

        match self.state {
            LoginState::Editing => self.render_editing(frame, layout[1]),
            LoginState::Verifying => self.render_verifying(frame, layout[1]),
        }

        if let Some(ref err) = self.error {
            form::message_line(frame, layout[2], err, theme::error());
        }
    }

    fn hints(&self) -> &'static str {
        match (self.state, self.active_field) {
            (LoginState::Verifying, _) => "Esc cancel",
            (_, LoginField::Keyring) => "Space toggle  Tab next  Enter verify & save  Esc quit",
            _ => "Tab next  Shift+Tab prev  Enter verify & save  Esc quit",
        }
    }
}
