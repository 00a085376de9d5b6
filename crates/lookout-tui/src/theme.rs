//! Palette and semantic styles for the panel.

use ratatui::style::{Color, Modifier, Style};

// ── Palette ───────────────────────────────────────────────────────────

pub const ACCENT: Color = Color::Rgb(247, 165, 1); // #f7a501
pub const LINK_BLUE: Color = Color::Rgb(29, 74, 255); // #1d4aff
pub const SKY: Color = Color::Rgb(120, 190, 255); // #78beff
pub const MINT: Color = Color::Rgb(119, 221, 154); // #77dd9a
pub const DANGER: Color = Color::Rgb(245, 78, 0); // #f54e00

pub const TEXT: Color = Color::Rgb(220, 222, 230); // #dcdee6
pub const MUTED: Color = Color::Rgb(130, 136, 158); // #82889e
pub const LIGHT_GRAY: Color = Color::Rgb(60, 63, 76); // #3c3f4c
pub const BG_SELECTED: Color = Color::Rgb(44, 47, 60); // #2c2f3c
pub const BG_PANEL: Color = Color::Rgb(26, 28, 36); // #1a1c24

// ── Semantic Styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

/// Section header inside the detail view ("Properties", "Feature flags").
pub fn section_header() -> Style {
    Style::default()
        .fg(TEXT)
        .bg(LIGHT_GRAY)
        .add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(ACCENT)
}

pub fn border_default() -> Style {
    Style::default().fg(MUTED)
}

pub fn input_text() -> Style {
    Style::default().fg(SKY)
}

pub fn label(active: bool) -> Style {
    if active {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(TEXT)
    }
}

pub fn row() -> Style {
    Style::default().fg(TEXT)
}

pub fn row_selected() -> Style {
    Style::default()
        .fg(ACCENT)
        .bg(BG_SELECTED)
        .add_modifier(Modifier::BOLD)
}

pub fn key_name() -> Style {
    Style::default().fg(MUTED)
}

/// Flag keys render like links, as in the web panel.
pub fn flag_key() -> Style {
    Style::default().fg(SKY).add_modifier(Modifier::UNDERLINED)
}

pub fn flag_on() -> Style {
    Style::default().fg(MINT)
}

pub fn flag_off() -> Style {
    Style::default().fg(MUTED)
}

/// Placeholder bars in skeleton mode.
pub fn skeleton() -> Style {
    Style::default().fg(LIGHT_GRAY)
}

pub fn error() -> Style {
    Style::default().fg(DANGER)
}

pub fn key_hint() -> Style {
    Style::default().fg(MUTED)
}

pub fn status_bar() -> Style {
    Style::default().fg(TEXT).bg(BG_SELECTED)
}
