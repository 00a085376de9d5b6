//! Form pieces shared by the login and configure screens.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::theme;

/// Draw a centered, bordered panel and return its inner area.
pub fn centered_panel(frame: &mut Frame, area: Rect, title: &str, width: u16, height: u16) -> Rect {
    let panel_w = width.min(area.width.saturating_sub(2));
    let panel_h = height.min(area.height);
    let x = area.x + area.width.saturating_sub(panel_w) / 2;
    let y = area.y + area.height.saturating_sub(panel_h) / 2;
    let panel = Rect::new(x, y, panel_w, panel_h);

    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BG_PANEL)),
        panel,
    );

    let block = Block::default()
        .title(Line::from(vec![
            Span::raw(" "),
            Span::styled(title.to_owned(), theme::title_style()),
            Span::raw(" "),
        ]))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused());

    let inner = block.inner(panel);
    frame.render_widget(block, panel);
    inner
}

/// Label line plus a bordered single-line input (4 rows total).
pub fn input_field(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool, masked: bool) {
    if area.height < 3 {
        return;
    }

    frame.render_widget(
        Paragraph::new(Span::styled(label.to_owned(), theme::label(active))),
        Rect::new(area.x, area.y, area.width, 1),
    );

    let display = if masked && !value.is_empty() {
        "\u{25CF}".repeat(value.chars().count())
    } else {
        value.to_owned()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if active {
            theme::border_focused()
        } else {
            theme::border_default()
        });

    let block_area = Rect::new(area.x, area.y + 1, area.width, 3.min(area.height - 1));
    let inner = block.inner(block_area);
    frame.render_widget(block, block_area);

    let text = if active {
        format!("{display}\u{2588}")
    } else {
        display
    };
    frame.render_widget(Paragraph::new(Span::styled(text, theme::input_text())), inner);
}

/// `[✓] label` checkbox line.
pub fn toggle(frame: &mut Frame, area: Rect, label: &str, value: bool, active: bool) {
    if area.height < 1 {
        return;
    }
    let marker = if value { "[\u{2713}]" } else { "[ ]" };
    let marker_style = if active {
        theme::border_focused()
    } else if value {
        theme::flag_on()
    } else {
        theme::border_default()
    };

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!("  {marker} "), marker_style),
            Span::styled(label.to_owned(), theme::label(active)),
        ])),
        area,
    );
}

/// Centered single-line message (errors, hints).
pub fn message_line(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    frame.render_widget(
        Paragraph::new(Span::styled(text.to_owned(), style)).alignment(Alignment::Center),
        area,
    );
}
