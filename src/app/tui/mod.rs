mod render;
mod session;

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use super::playback::PlaybackController;
use super::trajectory::Ball;

use self::render::draw_viewer;
use self::session::ViewerSession;

pub(crate) use self::render::Projection;
#[cfg(test)]
pub(crate) use self::render::{project, projection_bounds};

const MAX_POLL_WAIT: Duration = Duration::from_millis(200);

pub(crate) fn run_viewer(session_id: &str, balls: Vec<Ball>, frame_rate: f64) -> Result<()> {
    let mut session = ViewerSession::enter()?;
    let mut playback = PlaybackController::new(frame_rate);
    playback.load(balls);
    let mut projection = Projection::Side;
    let mut last_tick = Instant::now();

    loop {
        session
            .terminal()
            .draw(|frame| draw_viewer(frame, session_id, &playback, projection))?;

        let wait = playback.frame_interval().min(MAX_POLL_WAIT);
        if event::poll(wait)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let ball_changed = match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Left | KeyCode::Char('h') => playback.previous(),
                KeyCode::Right | KeyCode::Char('l') => playback.next(),
                KeyCode::Char('r') => {
                    playback.replay();
                    true
                }
                KeyCode::Char(' ') => {
                    playback.toggle_pause();
                    false
                }
                KeyCode::Char('v') => {
                    projection = projection.toggle();
                    false
                }
                _ => false,
            };
            if ball_changed {
                last_tick = Instant::now();
            }
        }

        let now = Instant::now();
        playback.tick(now.duration_since(last_tick));
        last_tick = now;
    }

    session.leave()
}
