mod heartbeat;
mod settings;
mod sidebar;
mod tasks;

pub use heartbeat::render_heartbeat;
pub use settings::render_settings;
pub use sidebar::render_sidebar;
pub use tasks::render_tasks;

use pulseboard_core::constants::HEARTBEAT_INTERVAL_CHOICES;
use pulseboard_core::views::LoadFailure;
use pulseboard_core::Gateway;
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::theme::Palette;
use super::{App, InputMode};

pub(crate) fn render_load_failure(f: &mut Frame, palette: &Palette, area: Rect, failure: &LoadFailure) {
    let hint = if failure.needs_setup {
        "Set workerUrl in the config file, then press r."
    } else {
        "Press r to retry."
    };
    let lines = vec![
        Line::from(Span::styled(
            failure.message.clone(),
            Style::default().fg(palette.accent_error),
        )),
        Line::from(""),
        Line::from(Span::styled(hint, palette.muted())),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

/// Dialog for the active input mode, drawn over everything else
pub fn render_modal<G: Gateway>(f: &mut Frame, app: &App<G>) {
    let palette = app.palette();
    let (title, lines): (&str, Vec<Line>) = match &app.mode {
        InputMode::Normal => return,
        InputMode::TaskEditor(editor) => {
            let repetition = editor
                .repetition
                .map(|r| r.label())
                .unwrap_or("One-off");
            (
                if editor.editing.is_some() { " Edit task " } else { " New task " },
                vec![
                    Line::from(Span::styled(format!("> {}▏", editor.input.value()), palette.text())),
                    Line::from(""),
                    Line::from(vec![
                        Span::styled("Repeats: ", palette.muted()),
                        Span::styled(repetition, palette.heading()),
                    ]),
                    Line::from(Span::styled("Enter save · Tab repeat · Esc cancel", palette.dim())),
                ],
            )
        }
        InputMode::ConfirmDelete { title, .. } => (
            " Delete task ",
            vec![
                Line::from(Span::styled(format!("Delete \"{}\"?", title), palette.text())),
                Line::from(""),
                Line::from(Span::styled("y delete · n keep", palette.dim())),
            ],
        ),
        InputMode::IntervalPicker { index } => {
            let spans: Vec<Span> = HEARTBEAT_INTERVAL_CHOICES
                .iter()
                .enumerate()
                .map(|(i, minutes)| {
                    let style = if i == *index { palette.selected() } else { palette.muted() };
                    Span::styled(format!(" {}m ", minutes), style)
                })
                .collect();
            (
                " Check-in interval ",
                vec![
                    Line::from(spans),
                    Line::from(""),
                    Line::from(Span::styled("←/→ choose · Enter save · Esc cancel", palette.dim())),
                ],
            )
        }
        InputMode::ProfileName(input) => (
            " Assistant name ",
            vec![
                Line::from(Span::styled(format!("> {}▏", input.value()), palette.text())),
                Line::from(""),
                Line::from(Span::styled("Enter save · Esc cancel", palette.dim())),
            ],
        ),
        InputMode::AccessRequest(input) => (
            " Request access ",
            vec![
                Line::from(Span::styled("Describe the access you want to grant or change", palette.muted())),
                Line::from(Span::styled(format!("> {}▏", input.value()), palette.text())),
                Line::from(""),
                Line::from(Span::styled("Enter send · Esc cancel", palette.dim())),
            ],
        ),
        InputMode::ConfirmReset => (
            " Reset everything ",
            vec![
                Line::from(Span::styled(
                    "Permanently delete all worker data and local preferences?",
                    Style::default().fg(palette.accent_error),
                )),
                Line::from(""),
                Line::from(Span::styled("y reset · n cancel", palette.dim())),
            ],
        ),
    };

    let area = centered(f.area(), 64, lines.len() as u16 + 2);
    let block = Block::default()
        .title(Span::styled(title, palette.heading()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .style(Style::default().bg(palette.bg_modal));
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}
