//! Condensed one-row-per-person table. No flag detail.

use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Cell, Row, Table, TableState};

use lookout_core::PersonRecord;
use lookout_core::model::person::property_text;

use crate::theme;

/// Extra columns beyond name and distinct id.
const MAX_PROPERTY_COLUMNS: usize = 3;

/// Property columns to show: the chosen display keys that aren't already
/// covered by the name column.
pub fn property_columns(display_properties: &[String]) -> Vec<&str> {
    display_properties
        .iter()
        .map(String::as_str)
        .filter(|k| *k != "email" && *k != "name")
        .take(MAX_PROPERTY_COLUMNS)
        .collect()
}

/// Cell texts for one person.
pub fn row_cells(person: &PersonRecord, columns: &[&str]) -> Vec<String> {
    let mut cells = vec![person.display_name(), person.distinct_id.clone()];
    cells.extend(columns.iter().map(|k| {
        person
            .properties
            .get(*k)
            .map(property_text)
            .unwrap_or_default()
    }));
    cells
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    persons: &[PersonRecord],
    selected: usize,
    display_properties: &[String],
) {
    let columns = property_columns(display_properties);

    let mut header = vec![Cell::from("Person"), Cell::from("Distinct ID")];
    header.extend(columns.iter().map(|c| Cell::from((*c).to_owned())));

    let rows = persons
        .iter()
        .map(|p| Row::new(row_cells(p, &columns)).style(theme::row()));

    let mut widths = vec![Constraint::Fill(2), Constraint::Fill(2)];
    widths.extend(columns.iter().map(|_| Constraint::Fill(1)));

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(theme::title_style()))
        .row_highlight_style(theme::row_selected())
        .highlight_symbol("\u{25B8} ")
        .block(
            Block::default()
                .title(Line::from(format!(" {} persons ", persons.len())))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border_default()),
        );

    let mut state = TableState::default().with_selected(Some(selected));
    frame.render_stateful_widget(table, area, &mut state);
}
