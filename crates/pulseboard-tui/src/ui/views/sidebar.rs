use pulseboard_core::format::relative_time;
use pulseboard_core::models::View;
use pulseboard_core::Gateway;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::ui::{theme, App};

pub fn render_sidebar<G: Gateway>(f: &mut Frame, app: &App<G>, area: Rect) {
    let palette = app.palette();
    let state = app.state();
    let profile = &state.assistant_profile;
    let badges = app.store.get_badge_counts();
    let now = chrono::Utc::now();

    let avatar_color = theme::hex_color(&profile.color).unwrap_or(palette.accent_primary);
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!(" {} ", profile.initials),
                Style::default()
                    .bg(avatar_color)
                    .fg(palette.bg_app)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(profile.name.clone(), palette.text().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(Span::styled(format!("    {}", profile.description), palette.muted())),
        Line::from(""),
    ];

    for (idx, view) in View::ALL.iter().enumerate() {
        let active = *view == state.current_view;
        let marker = if active { "▌" } else { " " };
        let mut spans = vec![
            Span::styled(marker, Style::default().fg(palette.accent_primary)),
            Span::styled(
                format!(" {} {}", idx + 1, view.label()),
                if active { palette.heading() } else { palette.text() },
            ),
        ];
        if *view == View::Tasks && badges.tasks > 0 {
            spans.push(Span::styled(format!("  {}", badges.tasks), palette.muted()));
        }
        if *view == View::Tasks && badges.tasks_running {
            spans.push(Span::styled(" ◐", Style::default().fg(palette.accent_warning)));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    if let Some(heartbeat) = state.heartbeat() {
        lines.push(Line::from(vec![
            Span::styled(" ● ", Style::default().fg(palette.accent_success)),
            Span::styled(heartbeat.assistant_status.clone(), palette.text()),
        ]));
        if let Some(last) = heartbeat.last_heartbeat {
            lines.push(Line::from(Span::styled(
                format!("   seen {}", relative_time(last, now)),
                palette.dim(),
            )));
        }
    }
    if !app.focused {
        lines.push(Line::from(Span::styled(" ⏸ polling paused", palette.dim())));
    }
    if app.demo {
        lines.push(Line::from(Span::styled(" demo data", palette.dim())));
    }

    let sidebar = Paragraph::new(lines).block(Block::default().style(Style::default().bg(palette.bg_sidebar)));
    f.render_widget(sidebar, area);
}
