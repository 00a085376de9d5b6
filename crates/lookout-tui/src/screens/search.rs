//! Main screen: search input and results.
//!
//! Draws the latest `PanelState` snapshot. Results take one of four
//! shapes (skeleton, no results, one person in detail, or a list) chosen
//! by the panel's render mode. From the list, Enter drills into a person.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use lookout_core::{PanelState, PersonRecord, RenderMode, Screen};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::{person_detail, person_list};

/// Placeholder bars drawn under the throbber while loading.
const SKELETON_ROWS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Results,
}

pub struct SearchScreen {
    snapshot: PanelState,
    display_properties: Vec<String>,
    focus: Focus,
    selected: usize,
    /// Row opened from the list view.
    opened: Option<usize>,
    scroll: u16,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl SearchScreen {
    pub fn new(snapshot: PanelState, display_properties: Vec<String>) -> Self {
        Self {
            snapshot,
            display_properties,
            focus: Focus::Input,
            selected: 0,
            opened: None,
            scroll: 0,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    pub fn set_display_properties(&mut self, keys: Vec<String>) {
        self.display_properties = keys;
    }

    fn mode(&self) -> RenderMode {
        self.snapshot.render_mode()
    }

    fn persons(&self) -> &[PersonRecord] {
        &self.snapshot.persons
    }

    /// Person shown in the detail view, if any.
    fn detail_person(&self) -> Option<&PersonRecord> {
        match self.mode() {
            RenderMode::Single => self.persons().first(),
            RenderMode::List => self.opened.and_then(|i| self.persons().get(i)),
            RenderMode::Skeleton | RenderMode::Empty => None,
        }
    }

    fn apply_snapshot(&mut self, state: PanelState) {
        // A new search invalidates row positions.
        if state.loading && !self.snapshot.loading {
            self.selected = 0;
            self.opened = None;
            self.scroll = 0;
        }
        self.snapshot = state;
        if self.snapshot.persons.is_empty() {
            self.focus = Focus::Input;
        }
    }

    fn query_edit(&self, edit: impl FnOnce(&mut String)) -> Action {
        let mut query = self.snapshot.query.clone();
        edit(&mut query);
        Action::QueryChanged(query)
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Option<Action> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Tab | KeyCode::Down if !self.persons().is_empty() => {
                self.focus = Focus::Results;
                None
            }
            KeyCode::Esc if self.snapshot.query.is_empty() => Some(Action::Quit),
            KeyCode::Esc => Some(self.query_edit(String::clear)),
            KeyCode::Backspace => Some(self.query_edit(|q| {
                q.pop();
            })),
            KeyCode::Char('u') if ctrl => Some(self.query_edit(String::clear)),
            KeyCode::Char(c) if !ctrl => Some(self.query_edit(|q| q.push(c))),
            _ => None,
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) -> Option<Action> {
        let count = self.persons().len();
        let in_detail = self.detail_person().is_some();
        match key.code {
            KeyCode::Char('q') => return Some(Action::Quit),
            KeyCode::Char(',') => return Some(Action::OpenSettings),
            KeyCode::Char('/' | 'i') | KeyCode::Tab => self.focus = Focus::Input,
            KeyCode::Char('j') | KeyCode::Down if in_detail => {
                self.scroll = self.scroll.saturating_add(1);
            }
            KeyCode::Char('k') | KeyCode::Up if in_detail => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            KeyCode::Char('j') | KeyCode::Down if count > 0 => {
                self.selected = (self.selected + 1).min(count - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Char('g') | KeyCode::Home => self.selected = 0,
            KeyCode::Char('G') | KeyCode::End => self.selected = count.saturating_sub(1),
            KeyCode::Enter if self.mode() == RenderMode::List && self.opened.is_none() => {
                self.opened = Some(self.selected);
                self.scroll = 0;
            }
            KeyCode::Esc | KeyCode::Backspace if self.opened.is_some() => {
                self.opened = None;
            }
            KeyCode::Esc | KeyCode::Backspace => self.focus = Focus::Input,
            _ => {}
        }
        None
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let active = self.focus == Focus::Input;
        let block = Block::default()
            .title(Line::from(Span::styled(" Search persons ", theme::title_style())))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if active {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let line = if self.snapshot.query.is_empty() && !active {
            Line::from(Span::styled("email, name, or distinct id", theme::key_hint()))
        } else if active {
            Line::from(Span::styled(format!("{}\u{2588}", self.snapshot.query), theme::input_text()))
        } else {
            Line::from(Span::styled(self.snapshot.query.clone(), theme::input_text()))
        };
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_skeleton(&self, frame: &mut Frame, area: Rect) {
        let mut constraints = vec![Constraint::Length(2)];
        constraints.extend((0..SKELETON_ROWS).map(|_| Constraint::Length(2)));
        constraints.push(Constraint::Min(0));
        let rows = Layout::vertical(constraints).split(area);

        let throbber = throbber_widgets_tui::Throbber::default()
            .label(" Searching\u{2026}")
            .style(theme::input_text())
            .throbber_style(theme::border_focused());
        frame.render_stateful_widget(throbber, rows[0], &mut self.throbber_state.clone());

        for (i, row) in rows.iter().skip(1).take(SKELETON_ROWS).enumerate() {
            let width = usize::from(row.width).saturating_sub(4 + i * 6).max(8);
            frame.render_widget(
                Paragraph::new(Span::styled(" ".repeat(width), theme::skeleton())),
                Rect::new(row.x + 1, row.y, row.width.saturating_sub(1), 1),
            );
        }
    }

    fn render_results(&self, frame: &mut Frame, area: Rect) {
        match self.mode() {
            RenderMode::Skeleton => self.render_skeleton(frame, area),
            RenderMode::Empty => {
                frame.render_widget(
                    Paragraph::new(vec![
                        Line::default(),
                        Line::from(Span::styled("No results", theme::row())),
                    ])
                    .alignment(Alignment::Center),
                    area,
                );
            }
            RenderMode::Single | RenderMode::List => match self.detail_person() {
                Some(person) => {
                    person_detail::render(frame, area, person, &self.display_properties, self.scroll);
                }
                None => person_list::render(
                    frame,
                    area,
                    self.persons(),
                    self.selected,
                    &self.display_properties,
                ),
            },
        }
    }
}

impl Component for SearchScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match self.focus {
            Focus::Input => self.handle_input_key(key),
            Focus::Results => self.handle_results_key(key),
        };
        Ok(action)
    }

    fn handle_paste(&mut self, text: &str) -> Result<Option<Action>> {
        if self.focus != Focus::Input {
            return Ok(None);
        }
        let pasted = text.trim().to_owned();
        Ok(Some(self.query_edit(|q| q.push_str(&pasted))))
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::PanelChanged(state) if state.screen == Screen::Main => {
                self.apply_snapshot(state.as_ref().clone());
            }
            Action::Tick if self.snapshot.loading => self.throbber_state.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([Constraint::Length(3), Constraint::Min(1)]).split(area);
        self.render_input(frame, layout[0]);
        self.render_results(frame, layout[1]);
    }

    fn hints(&self) -> &'static str {
        match (self.focus, self.mode()) {
            (Focus::Input, _) => "Enter search  Tab results  Esc clear/quit",
            (Focus::Results, RenderMode::List) if self.opened.is_some() => {
                "j/k scroll  Esc back  , settings  q quit"
            }
            (Focus::Results, RenderMode::List) => "j/k select  Enter open  / search  , settings  q quit",
            (Focus::Results, _) => "j/k scroll  / search  , settings  q quit",
        }
    }
}
