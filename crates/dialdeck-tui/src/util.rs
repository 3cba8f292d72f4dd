use dialdeck_core::domain::{CallStatus, OutcomeLabel};
use ratatui::style::{Color, Modifier, Style};

/// `#rrggbb` to a terminal color; anything else falls back to `Reset`.
pub fn parse_hex_color(raw: &str) -> Color {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Color::Reset;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Reset,
    }
}

pub fn outcome_style(label: &OutcomeLabel) -> Style {
    Style::default()
        .fg(parse_hex_color(&label.text_color))
        .bg(parse_hex_color(&label.bg_color))
}

pub fn status_style(status: CallStatus) -> Style {
    match status {
        CallStatus::Idle => Style::default().fg(Color::DarkGray),
        CallStatus::Connecting | CallStatus::Ringing => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        CallStatus::Connected => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        CallStatus::Disconnected => Style::default().fg(Color::Blue),
        CallStatus::Failed => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

pub fn step_badge(step: &str) -> (&'static str, Style) {
    match step {
        "recorded" => ("done", Style::default().fg(Color::Green)),
        "queued" => ("kept", Style::default().fg(Color::Magenta)),
        "skipped" => ("skip", Style::default().fg(Color::DarkGray)),
        "failed" => (
            "unsaved",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        _ => ("", Style::default()),
    }
}
