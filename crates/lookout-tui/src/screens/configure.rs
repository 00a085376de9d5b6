//! Configure screen: choose which person properties the panel pins.
//!
//! Saving marks setup complete for the profile. Esc leaves without
//! saving, but only once setup has been completed at least once.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};

use lookout_config::ProfileSession;
use lookout_core::Identity;

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::form;

const DEFAULT_PROPERTIES: &str = "email, name";

pub struct ConfigureScreen {
    session: ProfileSession,
    /// Identity the panel is using; setup is saved against it.
    identity: Option<Identity>,
    input: String,
    /// Setup was completed before, so Esc may return to search.
    can_cancel: bool,
    error: Option<String>,
}

impl ConfigureScreen {
    pub fn new(session: ProfileSession) -> Self {
        let mut screen = Self {
            session,
            identity: None,
            input: String::new(),
            can_cancel: false,
            error: None,
        };
        screen.reset(false, None);
        screen
    }

    /// Refill the input from the saved profile before showing the screen.
    pub fn reset(&mut self, can_cancel: bool, identity: Option<Identity>) {
        let saved = self.session.display_properties();
        self.input = if saved.is_empty() {
            DEFAULT_PROPERTIES.into()
        } else {
            saved.join(", ")
        };
        self.can_cancel = can_cancel;
        self.identity = identity;
        self.error = None;
    }

    fn save(&mut self) -> Option<Action> {
        let keys = lookout_config::parse_display_properties(&self.input);
        if keys.is_empty() {
            self.error = Some("Pick at least one property".into());
            return None;
        }
        let Some(ref current) = self.identity else {
            self.error = Some("Sign in before choosing properties".into());
            return None;
        };
        let result = self
            .session
            .complete_setup(current, keys)
            .map_err(|e| format!("Failed to save: {e}"));
        Some(Action::SetupSaved(result))
    }
}

impl Component for ConfigureScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        self.error = None;
        let action = match key.code {
            KeyCode::Enter => self.save(),
            KeyCode::Esc if self.can_cancel => Some(Action::CloseSettings),
            KeyCode::Esc => Some(Action::Quit),
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                None
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
                None
            }
            _ => None,
        };
        Ok(action)
    }

    fn handle_paste(&mut self, text: &str) -> Result<Option<Action>> {
        self.input.push_str(text.trim());
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::SetupSaved(Err(msg)) = action {
            self.error = Some(msg.clone());
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Block::default().style(Style::default().bg(theme::BG_PANEL)), area);
        let inner = form::centered_panel(frame, area, "Display properties", 64, 13);

        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(Rect::new(inner.x + 1, inner.y, inner.width.saturating_sub(2), inner.height));

        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(
                    "Properties shown first for each person, comma separated.",
                    theme::row(),
                )),
                Line::from(Span::styled(
                    "Remaining properties follow in the order the server sends them.",
                    theme::key_hint(),
                )),
            ])
            .wrap(Wrap { trim: true }),
            layout[1],
        );

        form::input_field(frame, layout[2], "  Property keys", &self.input, true, false);

        if let Some(ref err) = self.error {
            form::message_line(frame, layout[4], err, theme::error());
        }
    }

    fn hints(&self) -> &'static str {
        if self.can_cancel {
            "Enter save  Esc back"
        } else {
            "Enter save  Esc quit"
        }
    }
}
