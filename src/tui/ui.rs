use chrono::Utc;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Clear, Paragraph, Row, Table};

use crate::output::{format_rank, format_score};
use crate::scoring::EventResult;
use crate::tui::app::{App, Field, InputMode};
use crate::tui::theme::ThemeColors;

const TITLE: &str = "CMWMC Score Calculator";

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Handle very small terminal sizes gracefully
    if area.height < 12 || area.width < 60 {
        let msg = Paragraph::new("Terminal too small").alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    let banner_height = if app.failures.is_empty() { 0 } else { 1 };

    // Layout: Title(1) + Banner(0/1) + Body(fill) + Status(1)
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(banner_height),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    if banner_height > 0 {
        render_failure_banner(frame, chunks[1], app);
    }

    let body = Layout::horizontal([Constraint::Length(44), Constraint::Fill(1)]).split(chunks[2]);
    render_inputs(frame, body[0], app);
    render_results(frame, body[1], app);
    render_status_bar(frame, chunks[3], app);

    match app.input_mode {
        InputMode::EditGuess => render_edit_popup(frame, app),
        InputMode::Help => render_help_popup(frame, &app.theme),
        InputMode::Normal => {}
    }

    if app.is_loading {
        render_loading_overlay(frame, app);
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        TITLE,
        Style::default().fg(app.theme.title_color).bold(),
    )];

    let age = match app.loaded_at {
        Some(loaded_at) => {
            let secs = (Utc::now() - loaded_at).num_seconds().max(0);
            if secs < 60 {
                format!("scores loaded {}s ago", secs)
            } else {
                format!("scores loaded {}m ago", secs / 60)
            }
        }
        None => "scores not loaded".to_string(),
    };
    let padding_len = (area.width as usize).saturating_sub(TITLE.len() + age.len());
    spans.push(Span::raw(" ".repeat(padding_len)));
    spans.push(Span::styled(age, Style::default().fg(app.theme.muted)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_failure_banner(frame: &mut Frame, area: Rect, app: &App) {
    let names: Vec<String> = app
        .failures
        .iter()
        .map(|f| f.category.to_string())
        .collect();
    let text = format!(
        " Could not load: {} (ranks for these use no history, r to retry)",
        names.join(", ")
    );
    let banner = Paragraph::new(text).style(
        Style::default()
            .fg(app.theme.banner_fg)
            .bg(app.theme.banner_bg),
    );
    frame.render_widget(banner, area);
}

fn render_inputs(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let mut last_section = "";

    let rows: Vec<Row> = Field::ALL
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let section = field.section();
            let section_cell = if section != last_section {
                last_section = section;
                Cell::from(section).style(Style::default().fg(theme.section_color).bold())
            } else {
                Cell::from("")
            };

            let style = if idx == app.selected {
                theme.row_selected
            } else if idx % 2 == 1 {
                Style::default().bg(theme.row_alt_bg)
            } else {
                Style::default()
            };

            Row::new(vec![
                section_cell,
                Cell::from(field.label()),
                Cell::from(app.field_value(*field)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(11),
        Constraint::Length(24),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Event", "Input", "Value"])
                .style(theme.header_style)
                .bottom_margin(1),
        )
        .block(Block::bordered().title(" Team Results "));

    frame.render_widget(table, area);
}

fn event_line(name: &str, event: &EventResult, theme: &ThemeColors) -> Line<'static> {
    let mut spans = vec![
        Span::styled(format!("{:<11}", name), theme.header_style),
        Span::raw(format!("{:>7} raw ", format_score(event.raw))),
        Span::styled(
            format!("{:>6} ", format_score(event.normalized)),
            Style::default().fg(theme.score_color(event.normalized)),
        ),
    ];
    spans.extend(score_bar(event.normalized, 100.0, 20, theme).spans);
    Line::from(spans)
}

fn render_results(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let report = &app.report;
    let muted = Style::default().fg(theme.muted);

    let mut lines = Vec::new();
    for (i, c) in report.contestants.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::raw(format!("Contestant {}  ", i + 1)),
            Span::raw(format!("{:>6}", format_score(c.adjusted))),
            Span::styled(
                format!("  ({} estimathon)  ", format_score(c.estimathon)),
                muted,
            ),
            Span::styled(
                format_rank(c.rank),
                Style::default().fg(theme.section_color),
            ),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(event_line("Individual", &report.individual, theme));
    lines.push(event_line("Guts", &report.guts, theme));
    lines.push(event_line("Relay", &report.relay, theme));
    lines.push(Line::from(""));

    let overall_share = report.overall / 3.0;
    let mut overall_spans = vec![
        Span::styled(format!("{:<11}", "Overall"), theme.header_style),
        Span::styled(
            format!("{} / 300 ", format_score(report.overall)),
            Style::default().fg(theme.score_color(overall_share)).bold(),
        ),
    ];
    overall_spans.extend(score_bar(report.overall, 300.0, 20, theme).spans);
    lines.push(Line::from(overall_spans));
    lines.push(Line::from(vec![
        Span::styled(format!("{:<11}", "Team Rank"), theme.header_style),
        Span::styled(
            format_rank(report.overall_rank),
            Style::default().fg(theme.section_color).bold(),
        ),
        Span::styled(
            format!("  of {} past teams", app.history.overall.len()),
            muted,
        ),
    ]));

    let panel = Paragraph::new(lines).block(Block::bordered().title(" Scores "));
    frame.render_widget(panel, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let text = if let Some((ref msg, _)) = app.flash_message {
        let msg_color = if msg.starts_with("Error") || msg.starts_with("Refresh failed") {
            theme.flash_error
        } else if msg.starts_with("Refreshed") {
            theme.flash_success
        } else {
            theme.muted
        };
        Line::from(Span::styled(msg.clone(), Style::default().fg(msg_color)))
    } else {
        let hints = [
            ("j/k", ":nav "),
            ("h/l", ":adjust "),
            ("Space", ":toggle "),
            ("Enter", ":edit "),
            ("c", ":clear "),
            ("r", ":refresh "),
            ("?", ":help "),
            ("q", ":quit"),
        ];

        let mut spans = Vec::new();
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(theme.status_key_color)));
            spans.push(Span::raw(*label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(theme.status_bar_bg)),
        area,
    );
}

fn score_bar(score: f64, max_score: f64, width: usize, theme: &ThemeColors) -> Line<'static> {
    let ratio = if max_score > 0.0 {
        (score / max_score).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    let bar_color = theme.score_color(ratio * 100.0);

    let mut spans = Vec::new();
    if filled > 0 {
        spans.push(Span::styled("█".repeat(filled), Style::default().fg(bar_color)));
    }
    if empty > 0 {
        spans.push(Span::styled("░".repeat(empty), Style::default().fg(theme.bar_empty)));
    }

    Line::from(spans)
}

/// Render the estimathon guess input popup
fn render_edit_popup(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(44, 5, frame.area());
    frame.render_widget(Clear, popup_area);

    let title = format!(" {} ", app.selected_field().label());
    let block = Block::bordered()
        .title(Span::styled(title, app.theme.popup_title))
        .border_style(Style::default().fg(app.theme.popup_border));
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let chunks = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).split(inner);

    frame.render_widget(Paragraph::new(format!("{}|", app.edit_buffer)), chunks[0]);
    let help = Paragraph::new("Enter: confirm | Esc: cancel | empty = no guess")
        .style(Style::default().fg(app.theme.muted));
    frame.render_widget(help, chunks[1]);
}

/// Create a centered rectangle with fixed width and height
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect {
        x,
        y,
        width,
        height,
    }
}

fn render_help_popup(frame: &mut Frame, theme: &ThemeColors) {
    let popup_area = centered_rect_fixed(50, 15, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(Span::styled(" Keyboard Shortcuts ", theme.popup_title))
        .border_style(Style::default().fg(theme.popup_border));
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let key_style = Style::default().fg(theme.status_key_color).bold();
    let entries = [
        ("j / Down      ", "Next input"),
        ("k / Up        ", "Previous input"),
        ("l / + / Right ", "Increase count"),
        ("h / - / Left  ", "Decrease count"),
        ("Space         ", "Toggle relay time bonus"),
        ("Enter         ", "Edit estimathon guess"),
        ("c             ", "Clear all inputs"),
        ("r             ", "Reload scores (bypasses cache)"),
        ("?             ", "Show/hide this help"),
        ("q / Ctrl-c    ", "Quit"),
    ];

    let mut help_lines: Vec<Line> = entries
        .iter()
        .map(|(key, desc)| Line::from(vec![Span::styled(*key, key_style), Span::raw(*desc)]))
        .collect();
    help_lines.push(Line::from(""));
    help_lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(theme.muted),
    )));

    frame.render_widget(Paragraph::new(help_lines), inner);
}

fn render_loading_overlay(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(30, 3, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered().border_style(Style::default().fg(app.theme.popup_border));
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    // Braille spinner animation
    let spinner_chars = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let spinner = spinner_chars[app.spinner_frame % spinner_chars.len()];

    let text = if app.loaded_at.is_none() {
        format!("{} Loading scores...", spinner)
    } else {
        format!("{} Refreshing...", spinner)
    };

    let loading_text = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.title_color));
    frame.render_widget(loading_text, inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed_clamps() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect_fixed(50, 4, area);
        assert_eq!(rect.width, 20);
        assert_eq!(rect.height, 4);
        assert_eq!(rect.y, 3);
    }

    #[test]
    fn test_score_bar_fill() {
        let theme = ThemeColors::dark();
        let line = score_bar(50.0, 100.0, 10, &theme);
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].content.chars().count(), 5);

        let line = score_bar(0.0, 0.0, 10, &theme);
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content.chars().count(), 10);
    }
}
