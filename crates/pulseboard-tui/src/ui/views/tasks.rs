use chrono::Utc;
use pulseboard_core::format::{relative_time, time_until};
use pulseboard_core::models::TaskStatus;
use pulseboard_core::views::{BoardSnapshot, TaskRow};
use pulseboard_core::Gateway;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::render_load_failure;
use crate::ui::theme::{self, Palette};
use crate::ui::App;

pub fn render_tasks<G: Gateway>(f: &mut Frame, app: &App<G>, area: Rect) {
    let palette = app.palette();
    let now = Utc::now();
    let snapshot = app.board.snapshot(now);

    if let Some(failure) = &snapshot.load_error {
        render_load_failure(f, &palette, area, failure);
        return;
    }
    if !snapshot.loaded {
        f.render_widget(Paragraph::new("Loading tasks...").style(palette.muted()), area);
        return;
    }
    if snapshot.is_empty() {
        f.render_widget(
            Paragraph::new("No tasks yet. Press n to add one.").style(palette.muted()),
            area,
        );
        return;
    }

    let lines = task_lines(&snapshot, &palette, app.selected, now);

    // Keep the selected row on screen
    let height = area.height as usize;
    let selected_line = lines
        .iter()
        .position(|(idx, _)| *idx == Some(app.selected))
        .unwrap_or(0);
    let scroll = selected_line.saturating_sub(height.saturating_sub(2));

    let text: Vec<Line> = lines.into_iter().map(|(_, line)| line).collect();
    f.render_widget(Paragraph::new(text).scroll((scroll as u16, 0)), area);
}

/// Lines tagged with the row index they show, `None` for headers
fn task_lines<'a>(
    snapshot: &'a BoardSnapshot,
    palette: &Palette,
    selected: usize,
    now: chrono::DateTime<Utc>,
) -> Vec<(Option<usize>, Line<'a>)> {
    let groups: [(&str, &[TaskRow]); 4] = [
        ("Recurring", &snapshot.recurring),
        ("Current", &snapshot.current),
        ("Up next", &snapshot.pending),
        ("Completed", &snapshot.completed),
    ];

    let mut lines = Vec::new();
    let mut idx = 0;
    for (title, rows) in groups {
        if rows.is_empty() {
            continue;
        }
        let header = if title == "Completed" && snapshot.completed_total > rows.len() {
            format!("{} ({} of {})", title, rows.len(), snapshot.completed_total)
        } else {
            format!("{} ({})", title, rows.len())
        };
        if !lines.is_empty() {
            lines.push((None, Line::from("")));
        }
        lines.push((None, Line::from(Span::styled(header, palette.heading()))));
        for row in rows {
            lines.push((Some(idx), task_line(row, palette, idx == selected, now)));
            idx += 1;
        }
    }
    lines
}

fn task_line<'a>(row: &'a TaskRow, palette: &Palette, selected: bool, now: chrono::DateTime<Utc>) -> Line<'a> {
    let task = &row.task;
    let base = if selected { palette.selected() } else { Style::default() };
    let mut title_style = base.fg(palette.text_primary);
    if task.status == TaskStatus::Completed {
        title_style = title_style.fg(palette.text_muted).add_modifier(Modifier::CROSSED_OUT);
    }

    let mut spans = vec![
        Span::styled(if selected { "› " } else { "  " }, base.fg(palette.accent_primary)),
        Span::styled(
            format!("{} ", theme::status_glyph(task.status)),
            base.fg(palette.status_color(task.status)),
        ),
        Span::styled(task.display_title(), title_style),
    ];

    let meta = if row.waiting_for_cooldown() {
        row.cooldown.map(|c| format!("ready {}", time_until(c.next_run_after, now)))
    } else if row.started_early() {
        Some("started early".to_string())
    } else {
        match task.status {
            TaskStatus::InProgress => task.started_at.map(|t| format!("started {}", relative_time(t, now))),
            TaskStatus::Completed => task.completed_at.map(|t| format!("done {}", relative_time(t, now))),
            TaskStatus::Pending => task.repetition.map(|r| r.label().to_string()),
        }
    };
    if let Some(meta) = meta {
        spans.push(Span::styled(format!("  {}", meta), base.fg(palette.text_dim)));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::DARK;
    use pulseboard_core::models::Task;

    fn row(id: &str, status: TaskStatus) -> TaskRow {
        let mut task = Task::new(id, Some(id.to_string()), None, None, Utc::now());
        task.status = status;
        TaskRow { task, cooldown: None }
    }

    #[test]
    fn test_lines_index_rows_across_groups() {
        let snapshot = BoardSnapshot {
            current: vec![row("a", TaskStatus::InProgress)],
            pending: vec![row("b", TaskStatus::Pending), row("c", TaskStatus::Pending)],
            loaded: true,
            ..Default::default()
        };
        let lines = task_lines(&snapshot, &DARK, 0, Utc::now());
        let indices: Vec<Option<usize>> = lines.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![None, Some(0), None, None, Some(1), Some(2)]);
    }
}
