use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Points};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use super::super::playback::PlaybackController;
use super::super::present::{Tile, TileTone, ball_info_text, review_tiles};
use super::super::trajectory::Point3;
use super::super::truncate;

const BOUNDS_PADDING: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Projection {
    /// Horizontal distance against height.
    Side,
    /// Seen from above.
    Top,
}

impl Projection {
    pub(crate) fn toggle(self) -> Self {
        match self {
            Self::Side => Self::Top,
            Self::Top => Self::Side,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Side => "Side view (x / y)",
            Self::Top => "Top view (x / z)",
        }
    }
}

pub(crate) fn project(points: &[Point3], projection: Projection) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|p| match projection {
            Projection::Side => (p.x, p.y),
            Projection::Top => (p.x, p.z),
        })
        .collect()
}

/// Canvas bounds around `coords` with a margin, never collapsing to zero
/// width so single points and straight lines stay visible.
pub(crate) fn projection_bounds(coords: &[(f64, f64)]) -> ([f64; 2], [f64; 2]) {
    if coords.is_empty() {
        return ([-1.0, 1.0], [-1.0, 1.0]);
    }
    (
        padded_range(coords.iter().map(|c| c.0)),
        padded_range(coords.iter().map(|c| c.1)),
    )
}

fn padded_range(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let pad = ((max - min) * BOUNDS_PADDING).max(BOUNDS_PADDING);
    [min - pad, max + pad]
}

pub(super) fn draw_viewer(
    frame: &mut Frame,
    session_id: &str,
    playback: &PlaybackController,
    projection: Projection,
) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], session_id, playback);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);
    draw_trail(frame, body[0], playback, projection);
    draw_review_panel(frame, body[1], playback);

    draw_footer(frame, chunks[2], playback);
}

fn draw_header(frame: &mut Frame, area: Rect, session_id: &str, playback: &PlaybackController) {
    let count = playback.balls().len();
    let position = playback
        .active_index()
        .map(|i| format!("ball {}/{count}", i + 1))
        .unwrap_or_else(|| "no balls".to_string());
    let state = if playback.is_finished() {
        "FINISHED"
    } else if playback.is_paused() {
        "PAUSED"
    } else {
        "PLAYING"
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "DRSVIEW",
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(
            format!("session {}", truncate(session_id, 32)),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("   "),
        Span::styled(position, Style::default().fg(Color::White)),
        Span::raw("   "),
        Span::styled(state, Style::default().fg(Color::Yellow)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    frame.render_widget(header, area);
}

fn draw_trail(
    frame: &mut Frame,
    area: Rect,
    playback: &PlaybackController,
    projection: Projection,
) {
    // Bounds come from the whole trajectory so the view does not rescale
    // while points are revealed.
    let full = playback
        .active_ball()
        .map(|ball| project(&ball.positions, projection))
        .unwrap_or_default();
    let (x_bounds, y_bounds) = projection_bounds(&full);
    let trail = project(playback.trail(), projection);
    let head = playback
        .current_position()
        .and_then(|point| project(&[point], projection).first().copied());

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(projection.label()),
        )
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(move |ctx| {
            for pair in trail.windows(2) {
                ctx.draw(&CanvasLine::new(
                    pair[0].0,
                    pair[0].1,
                    pair[1].0,
                    pair[1].1,
                    Color::Cyan,
                ));
            }
            if let Some(point) = head {
                ctx.draw(&Points {
                    coords: &[point],
                    color: Color::White,
                });
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_review_panel(frame: &mut Frame, area: Rect, playback: &PlaybackController) {
    let Some(ball) = playback.active_ball() else {
        let empty = Paragraph::new("No trajectories loaded.")
            .block(Block::default().borders(Borders::ALL).title("Review"));
        frame.render_widget(empty, area);
        return;
    };
    let index = playback.active_index().unwrap_or_default();
    let tiles = review_tiles(ball);

    let mut constraints = vec![Constraint::Length(5)];
    constraints.extend(tiles.iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Min(3));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let info = format!(
        "{}\nRevealed: {}",
        ball_info_text(index, ball),
        playback.active_frame()
    );
    frame.render_widget(
        Paragraph::new(info).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Ball {}", truncate(&ball.ball_id, 20))),
        ),
        rows[0],
    );

    for (row, tile) in rows[1..].iter().zip(tiles.iter()) {
        frame.render_widget(tile_widget(tile), *row);
    }

    let decision = Paragraph::new(tiles.original_decision.clone())
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Original decision"),
        );
    if let Some(last) = rows.last() {
        frame.render_widget(decision, *last);
    }
}

fn tile_widget(tile: &Tile) -> Paragraph<'_> {
    let color = match tile.tone {
        TileTone::Pass => Color::Green,
        TileTone::Fail => Color::Red,
        TileTone::Neutral => Color::Yellow,
    };
    Paragraph::new(tile.text.as_str())
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::Black)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL).title(tile.title))
}

fn draw_footer(frame: &mut Frame, area: Rect, playback: &PlaybackController) {
    let nav = playback.navigation();
    let enabled = |on: bool| {
        if on {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };
    let footer = Paragraph::new(Line::from(vec![
        Span::styled("<- previous", enabled(nav.can_go_previous)),
        Span::raw(" | "),
        Span::styled("next ->", enabled(nav.can_go_next)),
        Span::raw(" | space pause | r replay | v view | q quit"),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Keys"));
    frame.render_widget(footer, area);
}
