use pulseboard_core::views::ConnectionStatus;
use pulseboard_core::Gateway;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::ui::theme::Palette;
use crate::ui::App;

fn connection_line(status: Option<&ConnectionStatus>, palette: &Palette) -> Line<'static> {
    let (dot, color) = match status {
        None => ("○", palette.text_dim),
        Some(ConnectionStatus::Connected) => ("●", palette.accent_success),
        Some(ConnectionStatus::NotConfigured) => ("○", palette.accent_warning),
        Some(ConnectionStatus::Error(_)) => ("●", palette.accent_error),
    };
    let label = status
        .map(ConnectionStatus::label)
        .unwrap_or_else(|| "Not checked (press c)".to_string());
    Line::from(vec![
        Span::styled(format!("  {} ", dot), Style::default().fg(color)),
        Span::styled(label, palette.text()),
    ])
}

pub fn render_settings<G: Gateway>(f: &mut Frame, app: &App<G>, area: Rect) {
    let palette = app.palette();
    let state = app.state();
    let profile = &state.assistant_profile;

    let mut lines = vec![
        Line::from(Span::styled("Assistant", palette.heading())),
        Line::from(vec![
            Span::styled("  Name      ", palette.muted()),
            Span::styled(profile.name.clone(), palette.text()),
        ]),
        Line::from(vec![
            Span::styled("  Initials  ", palette.muted()),
            Span::styled(profile.initials.clone(), palette.text()),
        ]),
        Line::from(vec![
            Span::styled("  Role      ", palette.muted()),
            Span::styled(profile.description.clone(), palette.text()),
        ]),
        Line::from(""),
        Line::from(Span::styled("Worker", palette.heading())),
        Line::from(vec![
            Span::styled("  URL       ", palette.muted()),
            Span::styled(
                app.worker_url.clone().unwrap_or_else(|| "not set".to_string()),
                palette.text(),
            ),
        ]),
        connection_line(app.connection.as_ref(), &palette),
        Line::from(vec![
            Span::styled("  Theme     ", palette.muted()),
            Span::styled(state.theme.id(), palette.text()),
        ]),
        Line::from(""),
        Line::from(Span::styled(format!("{}'s access", profile.name), palette.heading())),
    ];

    if let Some(failure) = app.settings.access_error() {
        lines.push(Line::from(Span::styled(
            format!("  {}", failure.message),
            Style::default().fg(palette.accent_error),
        )));
    } else if app.settings.access_loading() && state.access().is_empty() {
        lines.push(Line::from(Span::styled("  Loading...", palette.dim())));
    } else if state.access().is_empty() {
        lines.push(Line::from(Span::styled("  No access entries", palette.dim())));
    }
    for entry in state.access() {
        let color = if entry.is_active() {
            palette.accent_success
        } else {
            palette.text_dim
        };
        lines.push(Line::from(vec![
            Span::styled("  ● ", Style::default().fg(color)),
            Span::styled(entry.name.clone(), palette.text()),
            Span::styled(format!("  {} · {}", entry.kind, entry.status), palette.dim()),
        ]));
        if !entry.description.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("    {}", entry.description),
                palette.muted(),
            )));
        }
    }

    f.render_widget(Paragraph::new(lines), area);
}
