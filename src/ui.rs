use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::challenge::AnswerOutcome;
use crate::game::GameStatus;
use crate::palette::ColorName;
use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;

/// Terminal rendering hint for a color identifier. Lives here, not in the
/// palette: the engine never cares how a color is drawn.
pub fn ink(color: ColorName) -> Color {
    match color {
        ColorName::Red => Color::Red,
        ColorName::Blue => Color::Blue,
        ColorName::Green => Color::Green,
        ColorName::Yellow => Color::Yellow,
        ColorName::White => Color::White,
        ColorName::Purple => Color::Magenta,
        ColorName::Orange => Color::Rgb(255, 165, 0),
        ColorName::Pink => Color::Rgb(255, 105, 180),
        ColorName::Cyan => Color::Cyan,
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state.status {
            GameStatus::Idle => render_idle(self, area, buf),
            GameStatus::Countdown => render_countdown(self, area, buf),
            GameStatus::Playing => render_playing(self, area, buf),
            GameStatus::Paused => {
                if self.state.round_answered() {
                    render_feedback(self, area, buf)
                } else {
                    render_paused(self, area, buf)
                }
            }
            GameStatus::Finished => render_results(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn centered_lines(lines: Vec<Line<'_>>, area: Rect, buf: &mut Buffer) {
    let height = lines.len() as u16;
    let top = area.height.saturating_sub(height) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(top),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}

fn render_idle(app: &App, area: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(Span::styled("stroop", bold().fg(Color::Cyan))),
        Line::from(""),
        Line::from("name the INK COLOR, not the word"),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "{} rounds · press space to start · esc to quit",
                app.state.total_rounds
            ),
            dim(),
        )),
    ];
    centered_lines(lines, area, buf);
}

fn render_countdown(app: &App, area: Rect, buf: &mut Buffer) {
    let remaining_ms = app.engine.countdown_remaining_ms().unwrap_or(0);
    let secs = remaining_ms / 1000 + u64::from(remaining_ms % 1000 > 0);
    let lines = vec![
        Line::from(Span::styled("get ready", dim())),
        Line::from(""),
        Line::from(Span::styled(
            format!("{}", secs.max(1)),
            bold().fg(Color::Yellow),
        )),
        Line::from(""),
        button_bar(app),
    ];
    centered_lines(lines, area, buf);
}

fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(challenge) = app.state.current_challenge else {
        return;
    };
    let pace = app.engine.pace();
    let word = challenge.word.label();

    let status = format!(
        "round {}/{} · streak {} · best {} · {}",
        app.state.current_round_number,
        app.state.total_rounds,
        app.state.current_streak,
        app.state.best_streak,
        pace.speed_level,
    );
    // Fall back to a compact header on narrow terminals.
    let status = if status.width() as u16 + HORIZONTAL_MARGIN * 2 > area.width {
        format!(
            "{}/{} · {}",
            app.state.current_round_number, app.state.total_rounds, app.state.current_streak
        )
    } else {
        status
    };
    let status_line = Line::from(Span::styled(status, dim()));

    let lines = vec![
        status_line,
        Line::from(""),
        Line::from(Span::styled(
            word,
            bold()
                .fg(ink(challenge.ink_color))
                .add_modifier(Modifier::UNDERLINED),
        )),
        Line::from(""),
        button_bar(app),
        Line::from(""),
        time_bar(app.engine.time_remaining_ms(), pace.timeout_ms, area),
        Line::from(Span::styled(
            format!("{} ms", app.engine.elapsed_ms()),
            dim(),
        )),
    ];
    centered_lines(lines, area, buf);
}

fn render_feedback(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(last) = app.state.last_round() else {
        return;
    };

    let (verdict, style) = match last.outcome {
        AnswerOutcome::Success => ("correct", bold().fg(Color::Green)),
        AnswerOutcome::ImpulseError => ("you read the word!", bold().fg(Color::Red)),
        AnswerOutcome::WrongChoice => ("wrong color", bold().fg(Color::Red)),
        AnswerOutcome::Timeout => ("too slow", bold().fg(Color::Yellow)),
    };

    let detail = format!(
        "{} in {} ink · answered in {} ms",
        last.challenge.word.label(),
        last.challenge.ink_color.label().to_lowercase(),
        last.reaction_time_ms,
    );

    let lines = vec![
        Line::from(Span::styled(verdict, style)),
        Line::from(""),
        Line::from(Span::styled(detail, dim())),
        Line::from(""),
        Line::from(Span::styled(
            format!("streak {} · space for next round", app.state.current_streak),
            dim(),
        )),
    ];
    centered_lines(lines, area, buf);
}

fn render_paused(_app: &App, area: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(Span::styled(
            "PAUSED",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "p to resume · the reaction clock restarts on resume",
            dim(),
        )),
    ];
    centered_lines(lines, area, buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let rounds = &app.state.rounds;
    let successes = rounds
        .iter()
        .filter(|r| r.outcome == AnswerOutcome::Success)
        .count();
    let accuracy = if rounds.is_empty() {
        0.0
    } else {
        successes as f64 / rounds.len() as f64 * 100.0
    };

    let breakdown = rounds
        .iter()
        .map(|r| r.outcome)
        .counts()
        .into_iter()
        .sorted_by_key(|(_, n)| std::cmp::Reverse(*n))
        .map(|(outcome, n)| format!("{outcome} {n}"))
        .join(" · ");

    let mut lines = vec![
        Line::from(Span::styled("session complete", bold().fg(Color::Cyan))),
        Line::from(""),
        Line::from(format!(
            "{} rounds · {:.0}% accuracy · best streak {}",
            rounds.len(),
            accuracy,
            app.state.best_streak
        )),
        Line::from(Span::styled(breakdown, dim())),
        Line::from(""),
    ];

    if let Some(report) = &app.report {
        if let Some(mean) = report.mean_reaction_ms {
            lines.push(Line::from(format!(
                "reaction: mean {:.0} ms · median {} ms · sd {:.0} ms",
                mean,
                report.median_reaction_ms.unwrap_or(0),
                report.std_dev_ms.unwrap_or(0.0),
            )));
        }
        if let Some(all_time) = report.all_time_best_streak {
            lines.push(Line::from(Span::styled(
                format!("all-time best streak {all_time}"),
                dim(),
            )));
        }
        if !report.color_summary.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("by ink color", bold())));
            for row in &report.color_summary {
                lines.push(Line::from(vec![
                    Span::styled(format!("{:>7}", row.ink_color.label()), bold().fg(ink(row.ink_color))),
                    Span::raw(format!(
                        "  {:>4.0} ms avg  {:>5.1}% missed  {} tries",
                        row.avg_reaction_ms, row.miss_rate, row.attempts
                    )),
                ]));
            }
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "r to go again · esc to quit",
        dim(),
    )));

    centered_lines(lines, area, buf);
}

/// Numbered answer buttons in the session's shuffled order, each painted
/// in its own ink.
fn button_bar(app: &App) -> Line<'static> {
    let mut spans: Vec<Span> = vec![];
    for (idx, color) in app.state.button_order.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(format!("[{}]", idx + 1), dim()));
        spans.push(Span::styled(
            color.label().to_string(),
            bold().fg(ink(*color)),
        ));
    }
    Line::from(spans)
}

/// Remaining-budget bar sized to the terminal, drained left to right.
fn time_bar(remaining_ms: u64, budget_ms: u64, area: Rect) -> Line<'static> {
    let usable = area.width.saturating_sub(HORIZONTAL_MARGIN * 2 + 20).max(10) as u64;
    let filled = if budget_ms == 0 {
        0
    } else {
        usable * remaining_ms.min(budget_ms) / budget_ms
    };

    let bar: String = "█".repeat(filled as usize);
    let rest: String = "░".repeat((usable - filled) as usize);
    let style = if remaining_ms * 4 < budget_ms {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    };

    Line::from(vec![
        Span::styled(bar, style),
        Span::styled(rest, dim()),
        Span::styled(format!(" {:>4} ms", remaining_ms), dim()),
    ])
}
