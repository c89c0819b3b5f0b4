use itertools::Itertools;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use skewdle::achievements::Achievement;

use crate::App;

pub fn render_stats(app: &App, f: &mut Frame) {
    let area = f.area();
    let engine = &app.engine;
    let progress = &engine.state().progress;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // totals
            Constraint::Length(Achievement::ALL.len() as u16 + 3),
            Constraint::Min(3), // recent sessions
            Constraint::Length(3),
        ])
        .split(area);

    let high_scores = engine
        .difficulties()
        .profiles()
        .iter()
        .map(|p| format!("{} {}", p.name, progress.high_score(&p.name)))
        .join("  ");
    let totals = Paragraph::new(Line::from(vec![
        Span::styled(format!("games {}", progress.games_played), bold),
        Span::raw("   "),
        Span::styled(format!("best streak {}", progress.best_streak_ever), bold),
        Span::raw("   high scores: "),
        Span::styled(high_scores, Style::default().fg(Color::Yellow)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Stats"))
    .alignment(Alignment::Center);
    f.render_widget(totals, chunks[0]);

    let rows = Achievement::ALL.iter().map(|achievement| {
        let (mark, style) = if progress.is_unlocked(*achievement) {
            ("✓", Style::default().fg(Color::Green))
        } else {
            ("·", Style::default().add_modifier(Modifier::DIM))
        };
        Row::new(vec![
            Cell::from(mark),
            Cell::from(achievement.title()),
            Cell::from(achievement.description()),
        ])
        .style(style)
    });
    let unlocked = Achievement::ALL
        .iter()
        .filter(|a| progress.is_unlocked(**a))
        .count();
    let achievements = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(14),
            Constraint::Min(10),
        ],
    )
    .header(Row::new(vec!["", "Achievement", ""]).style(bold.fg(Color::Cyan)))
    .block(Block::default().borders(Borders::ALL).title(format!(
        "Achievements ({unlocked}/{})",
        Achievement::ALL.len()
    )));
    f.render_widget(achievements, chunks[1]);

    if app.recent.is_empty() {
        let none = Paragraph::new("No finished sessions logged yet.")
            .block(Block::default().borders(Borders::ALL).title("Recent"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(none, chunks[2]);
    } else {
        let rows = app.recent.iter().map(|entry| {
            Row::new(vec![
                Cell::from(entry.date.format("%Y-%m-%d %H:%M").to_string()),
                Cell::from(entry.difficulty.clone()),
                Cell::from(entry.pack.clone()),
                Cell::from(entry.display_score.to_string()),
                Cell::from(entry.levels_completed.to_string()),
                Cell::from(entry.reason.clone()),
            ])
        });
        let recent = Table::new(
            rows,
            [
                Constraint::Length(17),
                Constraint::Length(8),
                Constraint::Length(10),
                Constraint::Length(6),
                Constraint::Length(7),
                Constraint::Min(8),
            ],
        )
        .header(
            Row::new(vec!["Date", "Level", "Pack", "Score", "Cleared", "Ended"])
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Recent"));
        f.render_widget(recent, chunks[2]);
    }

    let instructions = Paragraph::new("(b)ack")
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[3]);
}
