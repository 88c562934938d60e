use chrono::Utc;
use pulseboard_core::format::relative_time;
use pulseboard_core::models::Section;
use pulseboard_core::Gateway;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::render_load_failure;
use crate::ui::App;

pub fn render_heartbeat<G: Gateway>(f: &mut Frame, app: &App<G>, area: Rect) {
    let palette = app.palette();
    if let Some(failure) = app.heartbeat.error() {
        render_load_failure(f, &palette, area, &failure);
        return;
    }

    let state = app.state();
    let Some(heartbeat) = state.heartbeat() else {
        let text = if state.is_loading(Section::Heartbeat) {
            "Loading heartbeat..."
        } else {
            "No heartbeat yet."
        };
        f.render_widget(Paragraph::new(text).style(palette.muted()), area);
        return;
    };
    let now = Utc::now();
    let name = &state.assistant_profile.name;

    let chunks = Layout::vertical([Constraint::Min(8), Constraint::Percentage(45)]).split(area);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{} is ", name), palette.text()),
            Span::styled(heartbeat.assistant_status.clone(), palette.heading()),
        ]),
        Line::from(Span::styled(
            match heartbeat.total_threads {
                Some(total) => format!("{} of {} threads active", heartbeat.active_threads, total),
                None => format!("{} threads active", heartbeat.active_threads),
            },
            palette.muted(),
        )),
        Line::from(Span::styled(
            format!(
                "Checks in every {} min{}",
                heartbeat.interval,
                heartbeat
                    .last_heartbeat
                    .map(|t| format!(" · last {}", relative_time(t, now)))
                    .unwrap_or_default()
            ),
            palette.muted(),
        )),
        Line::from(""),
        Line::from(Span::styled("Working on", palette.heading())),
    ];

    if heartbeat.active_tasks.is_empty() {
        lines.push(Line::from(Span::styled("  nothing right now", palette.dim())));
    }
    for work in &heartbeat.active_tasks {
        let started = work
            .started_at
            .map(|t| format!("  started {}", relative_time(t, now)))
            .unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled("  ◐ ", Style::default().fg(palette.accent_warning)),
            Span::styled(work.title.clone(), palette.text()),
            Span::styled(started, palette.dim()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Recently completed", palette.heading())));
    if heartbeat.recently_completed.is_empty() {
        lines.push(Line::from(Span::styled("  nothing yet", palette.dim())));
    }
    for work in &heartbeat.recently_completed {
        let when = work
            .completed_at
            .map(|t| format!("  {}", relative_time(t, now)))
            .unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled("  ● ", Style::default().fg(palette.accent_success)),
            Span::styled(work.title.clone(), palette.text()),
            Span::styled(when, palette.dim()),
        ]));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), chunks[0]);

    let content = app
        .heartbeat
        .content()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| "Loading heartbeat configuration...".to_string());
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(palette.border))
        .title(Span::styled(" HEARTBEAT.md ", palette.muted()));
    f.render_widget(
        Paragraph::new(content)
            .style(palette.text())
            .wrap(Wrap { trim: false })
            .block(block),
        chunks[1],
    );
}
