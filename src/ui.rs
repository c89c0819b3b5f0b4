pub mod screen;
pub mod stats;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use skewdle::{
    celebration::Celebration,
    session::{EndReason, SpanMark},
    util::{format_clock, share_text},
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 4;
const VERTICAL_MARGIN: u16 = 1;
const LOW_TIME_SECS: u32 = 30;
/// Stand-in for an annotation with no text, same for both kinds
const EMPTY_CLAIM: &str = "…";

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::GameOver => render_game_over(self, area, buf),
            _ => render_playing(self, area, buf),
        }
    }
}

fn frame_block(app: &App) -> Block<'static> {
    let border_style = if app.is_pulsing() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style)
        .title(" skewdle ")
        .title_alignment(Alignment::Center)
}

fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let block = frame_block(app);
    let inner = block.inner(area);
    block.render(area, buf);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // level, score, clock
            Constraint::Length(1),
            Constraint::Length(2), // title
            Constraint::Min(1),    // article
            Constraint::Length(1), // legend
        ])
        .split(inner);

    render_header(app, chunks[0], buf);

    let title = Paragraph::new(Span::styled(
        app.engine.current_article().title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .wrap(Wrap { trim: true });
    title.render(chunks[2], buf);

    Paragraph::new(article_lines(app))
        .wrap(Wrap { trim: false })
        .render(chunks[3], buf);

    let legend = if app.is_pulsing() {
        let penalty = app.pulse.map(|p| p.penalty_secs).unwrap_or_default();
        Span::styled(
            format!("That one was true! -{penalty}s"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            "←/→ move / enter pick / (esc) give up",
            Style::default().add_modifier(Modifier::ITALIC),
        )
    };
    Paragraph::new(legend).render(chunks[4], buf);
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let engine = &app.engine;
    let label = engine.level_label();
    let clock = engine.countdown();
    let score = format!(
        "score {}   streak {}",
        engine.live_display_score(),
        engine.state().current_streak
    );

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(label.width() as u16),
            Constraint::Min(1),
            Constraint::Length(clock.width() as u16),
        ])
        .split(area);

    let clock_style = if engine.state().time_remaining_secs <= LOW_TIME_SECS {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    Paragraph::new(Span::styled(label, Style::default().fg(Color::Cyan))).render(chunks[0], buf);
    Paragraph::new(Span::styled(score, Style::default().add_modifier(Modifier::DIM)))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
    Paragraph::new(Span::styled(clock, clock_style)).render(chunks[2], buf);
}

fn mark_style(mark: SpanMark) -> Style {
    match mark {
        SpanMark::Unselected => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::UNDERLINED),
        SpanMark::Correct => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        SpanMark::Incorrect => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::CROSSED_OUT),
    }
}

/// Article body split on line breaks, claims styled by selection state
fn article_lines(app: &App) -> Vec<Line<'static>> {
    let state = app.engine.state();
    let focused = state.selectable_ids().get(app.cursor).copied();
    let playing = app.state == AppState::Playing;

    let mut lines = vec![Line::default()];
    for span in &state.spans {
        let style = match span.id {
            None => Style::default(),
            Some(id) => {
                let style = mark_style(state.mark(id));
                if playing && Some(id) == focused {
                    style.add_modifier(Modifier::REVERSED)
                } else {
                    style
                }
            }
        };

        let text = if span.id.is_some() && span.text.is_empty() {
            EMPTY_CLAIM
        } else {
            span.text.as_str()
        };
        for (i, piece) in text.split('\n').enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            if let Some(line) = lines.last_mut() {
                line.push_span(Span::styled(piece.to_string(), style));
            }
        }
    }
    lines
}

fn end_headline(reason: Option<EndReason>) -> &'static str {
    match reason {
        Some(EndReason::Completed) => "Every false claim caught!",
        Some(EndReason::TimeExpired) => "Time's up!",
        Some(EndReason::Abandoned) | None => "Game over",
    }
}

fn render_game_over(app: &App, area: Rect, buf: &mut Buffer) {
    let engine = &app.engine;
    let state = engine.state();
    let profile = engine.profile();
    let display_score = state.display_score.unwrap_or_default();

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let block = frame_block(app);
    let inner = block.inner(area);
    block.render(area, buf);

    let mut lines = vec![
        Line::from(Span::styled(
            end_headline(state.end_reason),
            bold.fg(Color::Cyan),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled(format!("{display_score}"), bold.fg(Color::Yellow)),
            Span::styled(" points", bold),
        ]),
        Line::from(Span::styled(
            format!(
                "{} caught x{} on {}",
                state.raw_score, profile.score_multiplier, profile.name
            ),
            dim,
        )),
        Line::from(format!(
            "levels {}/{}   time left {}   best streak {}",
            state.levels_completed,
            engine.levels().len(),
            format_clock(state.time_remaining_secs),
            state.progress.best_streak_ever
        )),
    ];

    if app.new_high_score {
        lines.push(Line::from(Span::styled(
            "New high score!",
            bold.fg(Color::Green),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!("high score {}", state.progress.high_score(&profile.name)),
            dim,
        )));
    }

    if !app.new_unlocks.is_empty() {
        lines.push(Line::default());
        for achievement in &app.new_unlocks {
            lines.push(Line::from(vec![
                Span::styled("★ ", Style::default().fg(Color::Yellow)),
                Span::styled(achievement.title(), bold),
                Span::styled(format!("  {}", achievement.description()), dim),
            ]));
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        share_text(display_score),
        Style::default().add_modifier(Modifier::ITALIC),
    )));

    let can_open = engine.current_article().link.is_some() && Browser::is_available();
    let legend = if can_open {
        "(r)eplay / (m)enu / (s)tats / (o)pen source / (esc)ape"
    } else {
        "(r)eplay / (m)enu / (s)tats / (esc)ape"
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);
    Paragraph::new(Span::styled(legend, Style::default().add_modifier(Modifier::ITALIC)))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    if app.celebration.is_active {
        render_celebration(&app.celebration, area, buf);
    }
}

pub fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let engine = &app.engine;
    let progress = &engine.state().progress;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let block = frame_block(app);
    let inner = block.inner(area);
    block.render(area, buf);

    let mut lines = vec![
        Line::from(Span::styled("SKEWDLE", bold.fg(Color::Cyan))),
        Line::default(),
        Line::from("Every article hides highlighted claims. Some are false."),
        Line::from("Catch all the false ones to move on; picking a true one costs time."),
        Line::default(),
    ];

    for (i, profile) in engine.difficulties().profiles().iter().enumerate() {
        let selected = profile.name == engine.profile().name;
        let text = format!(
            "{} {:<8} {}  -{}s  x{}  best {}",
            i + 1,
            profile.name,
            format_clock(profile.time_budget_secs),
            profile.wrong_penalty_secs,
            profile.score_multiplier,
            progress.high_score(&profile.name)
        );
        let style = if selected {
            bold.fg(Color::Yellow).add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(text, style)));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("pack: {} ({} articles)", app.pack, engine.levels().len()),
        Style::default().add_modifier(Modifier::DIM),
    )));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);
    Paragraph::new(Span::styled(
        "←/→ difficulty / (enter) play / (s)tats / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);
}

/// Sparks on top of the game-over screen, fading with age
fn render_celebration(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for spark in &celebration.sparks {
        if spark.x < 0.0 || spark.y < 0.0 {
            continue;
        }
        let (x, y) = (spark.x as u16, spark.y as u16);
        if x >= area.width || y >= area.height {
            continue;
        }

        let color = colors[spark.color_index % colors.len()];
        let style = match spark.brightness() {
            b if b > 0.7 => Style::default().fg(color).add_modifier(Modifier::BOLD),
            b if b > 0.3 => Style::default().fg(color),
            _ => Style::default().fg(color).add_modifier(Modifier::DIM),
        };

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&spark.symbol.to_string());
            cell.set_style(style);
        }
    }

    if let Some(banner) = celebration.banner {
        let width = banner.width() as u16;
        if width <= area.width && area.height > 1 {
            let banner_area = Rect::new(area.x + (area.width - width) / 2, area.y + 1, width, 1);
            Paragraph::new(Span::styled(
                banner,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .render(banner_area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use skewdle::{
        article::Article, difficulty::DifficultyTable, engine::SessionEngine,
        store::MemoryProgressStore,
    };

    fn create_test_app(texts: &[&str]) -> App {
        let levels = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Article {
                id: i as u32 + 1,
                title: format!("Headline {}", i + 1),
                text: text.to_string(),
                category: "Markets".to_string(),
                link: Some("https://example.com/story".to_string()),
            })
            .collect();
        let engine = SessionEngine::new(
            levels,
            DifficultyTable::default(),
            Box::new(MemoryProgressStore::default()),
        )
        .unwrap();
        App::new(engine, "headlines")
    }

    /// Plain text of a rendered buffer, one string per row
    pub(crate) fn buffer_rows(buf: &Buffer) -> Vec<String> {
        let area = buf.area();
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .filter_map(|x| buf.cell((area.x + x, area.y + y)))
                    .map(|cell| cell.symbol())
                    .collect()
            })
            .collect()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn render(app: &App, width: u16, height: u16) -> (Buffer, String) {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        match app.state {
            AppState::Menu => render_menu(app, area, &mut buffer),
            _ => app.render(area, &mut buffer),
        }
        let text = buffer_rows(&buffer).join("\n");
        (buffer, text)
    }

    #[test]
    fn test_menu_lists_difficulties() {
        let app = create_test_app(&["Rates [rose] (fell)."]);
        let (_, text) = render(&app, 90, 24);

        assert!(text.contains("SKEWDLE"));
        assert!(text.contains("easy"));
        assert!(text.contains("medium"));
        assert!(text.contains("hard"));
        assert!(text.contains("pack: headlines (1 articles)"));
    }

    #[test]
    fn test_playing_shows_header_and_plain_claims() {
        let mut app = create_test_app(&["Rates [rose] while bonds (fell)."]);
        press(&mut app, KeyCode::Enter);
        let (_, text) = render(&app, 80, 20);

        assert!(text.contains("Level 1/1 · Markets"));
        assert!(text.contains("3:00"));
        assert!(text.contains("Headline 1"));
        assert!(text.contains("Rates rose while bonds fell."));
        assert!(!text.contains("[rose]"));
        assert!(!text.contains("(fell)"));
    }

    #[test]
    fn test_focused_claim_is_reversed() {
        let mut app = create_test_app(&["[alpha] (beta)"]);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Right);

        let lines = article_lines(&app);
        let beta = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "beta")
            .unwrap();
        let alpha = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "alpha")
            .unwrap();
        assert!(beta.style.add_modifier.contains(Modifier::REVERSED));
        assert!(!alpha.style.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_empty_claims_stay_visible() {
        let mut app = create_test_app(&["Rates [] and () [rose]"]);
        press(&mut app, KeyCode::Enter);

        let lines = article_lines(&app);
        let focused = lines[0]
            .spans
            .iter()
            .find(|s| s.style.add_modifier.contains(Modifier::REVERSED))
            .unwrap();
        assert_eq!(focused.content, EMPTY_CLAIM);
        let text: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "Rates … and … rose");
    }

    #[test]
    fn test_marks_are_styled() {
        assert_eq!(mark_style(SpanMark::Correct).fg, Some(Color::Green));
        assert_eq!(mark_style(SpanMark::Incorrect).fg, Some(Color::Red));
        assert!(mark_style(SpanMark::Unselected)
            .add_modifier
            .contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_article_lines_follow_line_breaks() {
        let mut app = create_test_app(&["first [line]\nsecond (line)"]);
        press(&mut app, KeyCode::Enter);

        let lines = article_lines(&app);
        assert_eq!(lines.len(), 2);
        let second: String = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(second, "second line");
    }

    #[test]
    fn test_wrong_pick_pulses_the_frame() {
        let mut app = create_test_app(&["[a] (b)"]);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        let (buffer, text) = render(&app, 60, 16);
        assert!(text.contains("That one was true! -20s"));
        assert_eq!(buffer.cell((0, 0)).unwrap().fg, Color::Red);
    }

    #[test]
    fn test_calm_frame_is_grey() {
        let mut app = create_test_app(&["[a] (b)"]);
        press(&mut app, KeyCode::Enter);
        let (buffer, _) = render(&app, 60, 16);
        assert_eq!(buffer.cell((0, 0)).unwrap().fg, Color::DarkGray);
    }

    #[test]
    fn test_game_over_summary() {
        let mut app = create_test_app(&["[a] [b] (c)"]);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::GameOver);
        app.celebration.stop();

        let (_, text) = render(&app, 100, 30);
        assert!(text.contains("Every false claim caught!"));
        assert!(text.contains("3 points"));
        assert!(text.contains("New high score!"));
        assert!(text.contains("First Steps"));
        assert!(text.contains("I scored 3 points in Skewdle!"));
        assert!(text.contains("(r)eplay"));
    }

    #[test]
    fn test_game_over_after_giving_up() {
        let mut app = create_test_app(&["[a] [b] (c)"]);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);
        let (_, text) = render(&app, 100, 30);
        assert!(text.contains("Game over"));
        assert!(text.contains("0 points"));
    }

    #[test]
    fn test_celebration_draws_banner() {
        let mut app = create_test_app(&["[a]"]);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        app.celebration.start(80, 24, true);

        let (_, text) = render(&app, 80, 24);
        assert!(text.contains("NEW HIGH SCORE!"));
    }

    #[test]
    fn test_end_headlines() {
        assert_eq!(end_headline(Some(EndReason::TimeExpired)), "Time's up!");
        assert_eq!(end_headline(None), "Game over");
    }

    #[test]
    fn test_tiny_areas_do_not_panic() {
        let mut app = create_test_app(&["[a] (b)"]);
        for (w, h) in [(1, 1), (5, 3), (20, 4)] {
            render(&app, w, h);
        }
        press(&mut app, KeyCode::Enter);
        for (w, h) in [(1, 1), (5, 3), (20, 4)] {
            render(&app, w, h);
        }
        press(&mut app, KeyCode::Esc);
        app.celebration.start(5, 3, true);
        for (w, h) in [(1, 1), (5, 3), (20, 4)] {
            render(&app, w, h);
        }
    }
}
