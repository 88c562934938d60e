use pulseboard_core::models::View;
use pulseboard_core::Gateway;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::ui::notifications::NotificationLevel;
use crate::ui::{self, App};

pub(crate) fn render<G: Gateway>(f: &mut Frame, app: &App<G>) {
    let palette = app.palette();
    f.render_widget(Block::default().style(Style::default().bg(palette.bg_app)), f.area());

    let rows = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).split(f.area());
    let columns = Layout::horizontal([Constraint::Length(ui::SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(rows[0]);

    ui::views::render_sidebar(f, app, columns[0]);

    let main = Layout::vertical([Constraint::Length(2), Constraint::Min(0)]).split(pad(columns[1]));
    let view = app.view();
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            view.label(),
            Style::default()
                .fg(palette.text_primary)
                .add_modifier(Modifier::BOLD),
        ))),
        main[0],
    );
    match view {
        View::Tasks => ui::views::render_tasks(f, app, main[1]),
        View::Heartbeat => ui::views::render_heartbeat(f, app, main[1]),
        View::Settings => ui::views::render_settings(f, app, main[1]),
    }

    render_statusbar(f, app, rows[1]);
    ui::views::render_modal(f, app);
}

fn pad(area: Rect) -> Rect {
    let h = ui::CONTENT_PADDING_H.min(area.width / 2);
    Rect {
        x: area.x + h,
        y: area.y + 1.min(area.height),
        width: area.width - 2 * h,
        height: area.height.saturating_sub(1),
    }
}

fn hints(view: View) -> &'static str {
    match view {
        View::Tasks => "space cycle · n new · e edit · d delete · r refresh · t theme · q quit",
        View::Heartbeat => "i interval · r refresh · t theme · q quit",
        View::Settings => "p name · x reset profile · a request access · c check · R reset all · q quit",
    }
}

fn render_statusbar<G: Gateway>(f: &mut Frame, app: &App<G>, area: Rect) {
    let palette = app.palette();
    let line = if app.pending_quit {
        Line::from(Span::styled(
            " ⚠ Press Ctrl+C again to quit",
            Style::default().fg(palette.accent_error),
        ))
    } else if let Some(notification) = app.notifications.current() {
        let color = match notification.level {
            NotificationLevel::Info => palette.accent_primary,
            NotificationLevel::Success => palette.accent_success,
            NotificationLevel::Warning => palette.accent_warning,
            NotificationLevel::Error => palette.accent_error,
        };
        Line::from(Span::styled(
            format!(" {} {}", notification.level.icon(), notification.message),
            Style::default().fg(color),
        ))
    } else {
        Line::from(Span::styled(format!(" {}", hints(app.view())), palette.dim()))
    };
    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(palette.bg_sidebar)),
        area,
    );
}
