//! Single-person detail view: identity header, properties, and the first
//! few feature flags.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use serde_json::Value;

use lookout_core::model::person::property_text;
use lookout_core::{FlagEvaluation, PersonRecord, flag_preview, hidden_flag_count};

use crate::theme;

/// Flag value as shown next to its key.
fn flag_value_span(flag: &FlagEvaluation) -> Span<'static> {
    match &flag.value {
        Value::Bool(true) => Span::styled("on", theme::flag_on()),
        Value::Bool(false) => Span::styled("off", theme::flag_off()),
        other => Span::styled(property_text(other), theme::flag_on()),
    }
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(format!(" {title} "), theme::section_header()))
}

/// All lines of the detail view, properties in `display_properties`
/// order first and the rest in server order.
pub fn detail_lines(person: &PersonRecord, display_properties: &[String]) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            person.display_name(),
            theme::title_style().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("distinct id  ", theme::key_name()),
            Span::styled(person.distinct_id.clone(), theme::row()),
        ]),
        Line::from(vec![
            Span::styled("id           ", theme::key_name()),
            Span::styled(person.id.to_string(), theme::row()),
        ]),
    ];
    if let Some(created) = person.created_at {
        lines.push(Line::from(vec![
            Span::styled("created      ", theme::key_name()),
            Span::styled(created.format("%Y-%m-%d %H:%M UTC").to_string(), theme::row()),
        ]));
    }

    lines.push(Line::default());
    lines.push(section("Properties"));
    if person.properties.is_empty() {
        lines.push(Line::from(Span::styled("No properties", theme::key_hint())));
    }
    let pinned = display_properties
        .iter()
        .filter_map(|k| person.properties.get_key_value(k));
    let rest = person
        .properties
        .iter()
        .filter(|(k, _)| !display_properties.contains(k));
    for (key, value) in pinned.chain(rest) {
        lines.push(Line::from(vec![
            Span::styled(format!("{key}: "), theme::key_name()),
            Span::styled(property_text(value), theme::row()),
        ]));
    }

    lines.push(Line::default());
    lines.push(section("Feature flags"));
    if person.feature_flags.is_some() {
        for (key, flag) in flag_preview(person) {
            let mut spans = vec![
                Span::styled(key.to_owned(), theme::flag_key()),
                Span::raw("  "),
                flag_value_span(flag),
            ];
            if !flag.reason.is_empty() {
                spans.push(Span::styled(format!("  ({})", flag.reason), theme::key_hint()));
            }
            lines.push(Line::from(spans));
        }
        let hidden = hidden_flag_count(person);
        if hidden > 0 {
            lines.push(Line::from(Span::styled(
                format!("+{hidden} more"),
                theme::key_hint(),
            )));
        }
    }

    lines
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    person: &PersonRecord,
    display_properties: &[String],
    scroll: u16,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default());
    let paragraph = Paragraph::new(detail_lines(person, display_properties))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookout_core::PersonId;
    use serde_json::json;

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn pinned_properties_come_first() {
        let mut p = PersonRecord::new(PersonId::Int(1), "d1");
        p.properties.insert("city".into(), json!("Oslo"));
        p.properties.insert("plan".into(), json!("scale"));
        p.properties.insert("email".into(), json!("x@example.com"));

        let lines = text(&detail_lines(&p, &["plan".into()]));
        let plan = lines.iter().position(|l| l == "plan: scale");
        let city = lines.iter().position(|l| l == "city: Oslo");
        assert!(plan < city, "{lines:#?}");
        assert_eq!(lines[0], "x@example.com");
    }

    #[test]
    fn flags_are_capped_with_overflow_note() {
        let mut p = PersonRecord::new(PersonId::Int(1), "d1");
        p.feature_flags = Some(
            (0..7)
                .map(|i| {
                    (
                        format!("flag-{i}"),
                        FlagEvaluation {
                            value: json!(true),
                            reason: String::new(),
                            condition_index: None,
                        },
                    )
                })
                .collect(),
        );

        let lines = text(&detail_lines(&p, &[]));
        let flag_lines = lines.iter().filter(|l| l.starts_with("flag-")).count();
        assert_eq!(flag_lines, 5);
        assert!(lines.iter().any(|l| l == "+2 more"));
        assert!(!lines.iter().any(|l| l.starts_with("flag-5")));
    }
}
