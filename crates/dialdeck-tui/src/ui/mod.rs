use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use dialdeck_core::domain::{CallDirection, CallStatus};
use dialdeck_core::time::format_timestamp_datetime;

use crate::app::{App, Mode, RecordForm};
use crate::util::{outcome_style, status_style, step_badge};

pub fn draw(frame: &mut Frame<'_>, app: &App) {
    let size = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(4),
        ])
        .split(size);

    render_header(frame, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);
    render_queue(frame, body[0], app);
    if app.show_history {
        render_history(frame, body[1], app);
    } else {
        render_call(frame, body[1], app);
    }

    render_footer(frame, chunks[2], app);

    match &app.mode {
        Mode::Record(form) => render_record_form(frame, size, app, form),
        Mode::Digits(digits) => render_digits(frame, size, digits),
        Mode::Dialer => {}
    }

    if app.show_help {
        render_help(frame, size);
    }
}

fn render_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let telephony = if app.call.ready {
        Span::styled("ready", Style::default().fg(Color::Green))
    } else if let Some(reason) = &app.call.readiness_error {
        Span::styled(
            format!("offline ({reason}), press i"),
            Style::default().fg(Color::Red),
        )
    } else {
        Span::styled("not registered", Style::default().fg(Color::Yellow))
    };
    let line = Line::from(vec![
        Span::raw(format!(
            "done {}/{}  unsent {}  telephony: ",
            app.settled_count(),
            app.queue.items.len(),
            app.pending_count
        )),
        telephony,
    ]);
    let block = Block::default().borders(Borders::ALL).title("dialdeck");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_queue(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Calling list");
    if app.queue.items.is_empty() || app.queue.complete {
        let paragraph = Paragraph::new(app.empty_hint())
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .queue
        .items
        .iter()
        .map(|item| {
            let (badge, badge_style) = step_badge(&item.step);
            let mut spans = vec![Span::styled(
                item.display_name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            if let Some(company) = &item.company {
                spans.push(Span::raw(format!(" ({company})")));
            }
            if !badge.is_empty() {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(format!("[{badge}]"), badge_style));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(app.queue.cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_call(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let call = &app.call;
    let mut lines = Vec::new();

    if let Some(item) = app.current_item() {
        lines.push(field_line("Contact", &item.display_name));
        lines.push(field_line(
            "Phone",
            item.dial_number
                .as_deref()
                .or(item.phone.as_deref())
                .unwrap_or("(none)"),
        ));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(vec![
        Span::styled("Status: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(call.status.as_str(), status_style(call.status)),
    ]));
    if call.status != CallStatus::Idle {
        let direction = match call.direction {
            CallDirection::Outbound => "to",
            CallDirection::Inbound => "from",
        };
        lines.push(field_line(
            "Call",
            &format!("{direction} {}", call.number.as_deref().unwrap_or("-")),
        ));
    }
    lines.push(field_line("Talk time", &call.elapsed));
    if call.muted {
        lines.push(Line::from(Span::styled(
            "MUTED",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    let block = Block::default().borders(Borders::ALL).title("Call");
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_history(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title("Recent calls");
    if app.history.is_empty() {
        let paragraph = Paragraph::new("No calls yet.")
            .block(block)
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .history
        .iter()
        .map(|entry| {
            let outcome = entry
                .outcome
                .as_deref()
                .or(entry.failure.as_deref())
                .unwrap_or("-");
            ListItem::new(Line::from(vec![
                Span::styled(
                    format_timestamp_datetime(entry.ended_at),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(format!(
                    "  {} {}  {}  {}s  {}",
                    entry.direction,
                    entry.number,
                    entry.final_status,
                    entry.duration_secs,
                    outcome
                )),
            ]))
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let hint = match app.mode {
        Mode::Dialer => match app.call.status {
            CallStatus::Connecting | CallStatus::Ringing => {
                "r ringing  y answered  e no answer  h hang up  a accept  x reject  ? help"
            }
            CallStatus::Connected => "m mute  d digits  h hang up  e they hung up  ? help",
            CallStatus::Failed => "R reset  i re-register  o outcome  ? help",
            _ => "enter call  o outcome  n next  s skip  p keep unsent  f flush  l history  q quit  ? help",
        },
        Mode::Record(_) => "j/k or 1-9 pick  tab notes  enter save  esc cancel",
        Mode::Digits(_) => "0-9 * # type  enter send  esc cancel",
    };

    let mut lines = vec![Line::from(Span::styled(
        hint,
        Style::default().fg(Color::DarkGray),
    ))];
    if let Some(status) = &app.status {
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Green),
        )));
    }
    if let Some(err) = &app.error {
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_record_form(frame: &mut Frame<'_>, area: Rect, app: &App, form: &RecordForm) {
    let modal = centered_rect(60, 70, area);
    frame.render_widget(Clear, modal);

    let title = match app.current_item() {
        Some(item) => format!("Outcome for {}", item.display_name),
        None => "Outcome".to_string(),
    };
    let mut lines = Vec::new();
    for (index, label) in app.outcomes.iter().enumerate() {
        let marker = if index == form.selected { "> " } else { "  " };
        lines.push(Line::from(vec![
            Span::raw(format!("{marker}{} ", index + 1)),
            Span::styled(format!(" {} ", label.label), outcome_style(label)),
        ]));
    }
    lines.push(Line::from(""));

    let notes_style = if form.editing_notes {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let notes = if form.notes.is_empty() {
        "(none)".to_string()
    } else {
        form.notes.clone()
    };
    lines.push(Line::from(vec![
        Span::styled("Notes: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(notes, notes_style),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, modal);
}

fn render_digits(frame: &mut Frame<'_>, area: Rect, digits: &str) {
    let modal = centered_rect(40, 20, area);
    frame.render_widget(Clear, modal);
    let paragraph = Paragraph::new(digits.to_string())
        .block(Block::default().borders(Borders::ALL).title("Send digits"))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, modal);
}

fn render_help(frame: &mut Frame<'_>, area: Rect) {
    let modal = centered_rect(70, 80, area);
    frame.render_widget(Clear, modal);

    let text = vec![
        Line::from("Global: q quit, Ctrl+C quit, ? help"),
        Line::from("Call: enter dial current contact, h hang up, a accept, x reject, m mute, d send digits"),
        Line::from("Handset: r ringing, y answered, e other side hung up, I incoming call, E line error"),
        Line::from("Recovery: R reset a failed call, i register telephony again"),
        Line::from("List: o record outcome, n next contact, s skip, p keep an unsaved outcome, f send kept outcomes, l recent calls"),
        Line::from("Outcome form: j/k or 1-9 pick, tab notes, enter save, esc cancel"),
        Line::from(""),
        Line::from("The next contact opens only after the current one has an outcome, is kept for later, or is skipped."),
    ];

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, modal);
}

fn field_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{}: ", label),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(value.to_string()),
    ])
}

fn centered_rect(percent_x: u16, percent_y: u16, rect: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(rect);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
