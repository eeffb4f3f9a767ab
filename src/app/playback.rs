use std::time::Duration;

use tracing::debug;

use super::trajectory::{Ball, Point3};

const MIN_FRAME_INTERVAL: Duration = Duration::from_nanos(1);

/// Fixed-rate ticker driven by caller-supplied elapsed time.
#[derive(Debug, Clone)]
pub(crate) struct FrameTicker {
    interval: Duration,
    accumulated: Duration,
}

impl FrameTicker {
    pub(crate) fn new(frame_rate: f64) -> Self {
        let default_interval = Duration::from_secs_f64(1.0 / crate::config::DEFAULT_FRAME_RATE);
        let interval = if frame_rate.is_finite() && frame_rate > 0.0 {
            Duration::try_from_secs_f64(1.0 / frame_rate).unwrap_or(default_interval)
        } else {
            default_interval
        };
        Self {
            interval: interval.max(MIN_FRAME_INTERVAL),
            accumulated: Duration::ZERO,
        }
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    pub(crate) fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }

    /// Adds `delta` and returns how many whole intervals were crossed.
    pub(crate) fn advance(&mut self, delta: Duration) -> usize {
        self.accumulated = self.accumulated.saturating_add(delta);
        let steps = self.accumulated.as_nanos() / self.interval.as_nanos();
        if steps == 0 {
            return 0;
        }
        let consumed = self.interval.as_nanos() * steps;
        self.accumulated = Duration::from_nanos((self.accumulated.as_nanos() - consumed) as u64);
        usize::try_from(steps).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct NavigationFlags {
    pub(crate) can_go_previous: bool,
    pub(crate) can_go_next: bool,
}

/// Which ball is active and how far its trail has been revealed.
///
/// The controller owns the only ticker, so switching balls or loading a new
/// set always restarts playback from frame 0.
#[derive(Debug, Clone)]
pub(crate) struct PlaybackController {
    balls: Vec<Ball>,
    active: Option<usize>,
    frame: usize,
    ticker: FrameTicker,
    paused: bool,
    navigation: NavigationFlags,
}

impl PlaybackController {
    pub(crate) fn new(frame_rate: f64) -> Self {
        Self {
            balls: Vec::new(),
            active: None,
            frame: 0,
            ticker: FrameTicker::new(frame_rate),
            paused: false,
            navigation: NavigationFlags::default(),
        }
    }

    pub(crate) fn load(&mut self, balls: Vec<Ball>) {
        self.balls = balls;
        self.active = None;
        self.paused = false;
        if self.balls.is_empty() {
            self.restart();
        } else {
            self.select(0);
        }
    }

    /// Makes `index` the active ball. Out-of-range indices are ignored.
    pub(crate) fn select(&mut self, index: usize) -> bool {
        if index >= self.balls.len() {
            return false;
        }
        self.active = Some(index);
        self.restart();
        debug!(index, frames = self.balls[index].positions.len(), "active ball changed");
        true
    }

    pub(crate) fn next(&mut self) -> bool {
        match self.active {
            Some(index) if index + 1 < self.balls.len() => self.select(index + 1),
            _ => false,
        }
    }

    pub(crate) fn previous(&mut self) -> bool {
        match self.active {
            Some(index) if index > 0 => self.select(index - 1),
            _ => false,
        }
    }

    /// Reveals one more point per elapsed frame interval. Returns whether
    /// the frame cursor moved.
    pub(crate) fn tick(&mut self, delta: Duration) -> bool {
        if self.paused || self.is_finished() {
            return false;
        }
        let Some(ball) = self.active_ball() else {
            return false;
        };
        let total = ball.positions.len();
        let steps = self.ticker.advance(delta);
        let before = self.frame;
        self.frame = self.frame.saturating_add(steps).min(total);
        if self.frame == total {
            self.ticker.reset();
        }
        self.frame != before
    }

    pub(crate) fn replay(&mut self) {
        self.paused = false;
        self.restart();
    }

    pub(crate) fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.active_ball()
            .is_none_or(|ball| self.frame >= ball.positions.len())
    }

    pub(crate) fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub(crate) fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub(crate) fn active_ball(&self) -> Option<&Ball> {
        self.active.and_then(|index| self.balls.get(index))
    }

    pub(crate) fn active_frame(&self) -> usize {
        self.frame
    }

    pub(crate) fn frame_interval(&self) -> Duration {
        self.ticker.interval()
    }

    pub(crate) fn navigation(&self) -> NavigationFlags {
        self.navigation
    }

    /// Points revealed so far for the active ball, oldest first.
    pub(crate) fn trail(&self) -> &[Point3] {
        self.active_ball()
            .map(|ball| &ball.positions[..self.frame.min(ball.positions.len())])
            .unwrap_or_default()
    }

    pub(crate) fn current_position(&self) -> Option<Point3> {
        self.trail().last().copied()
    }

    fn restart(&mut self) {
        self.frame = 0;
        self.ticker.reset();
        self.navigation = match self.active {
            Some(index) => NavigationFlags {
                can_go_previous: index > 0,
                can_go_next: index + 1 < self.balls.len(),
            },
            None => NavigationFlags::default(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::trajectory::ReviewFlag;

    fn ball(id: &str, frames: usize) -> Ball {
        Ball {
            ball_id: id.to_string(),
            positions: (0..frames)
                .map(|i| Point3 {
                    x: i as f64,
                    y: 0.0,
                    z: 0.0,
                })
                .collect(),
            speed: "N/A".to_string(),
            clip_url: None,
            hitting_stumps: ReviewFlag::default(),
            impact_inline: ReviewFlag::default(),
            pitching_inline: ReviewFlag::default(),
            lbw: ReviewFlag::default(),
            review_status: ReviewFlag::default(),
            original_decision: String::new(),
        }
    }

    fn loaded(counts: &[usize]) -> PlaybackController {
        let mut playback = PlaybackController::new(10.0);
        playback.load(
            counts
                .iter()
                .enumerate()
                .map(|(i, frames)| ball(&format!("b{i}"), *frames))
                .collect(),
        );
        playback
    }

    const FRAME: Duration = Duration::from_millis(100);

    #[test]
    fn load_selects_first_ball_or_empty_state() {
        let playback = loaded(&[3, 4]);
        assert_eq!(playback.active_index(), Some(0));
        assert_eq!(playback.active_frame(), 0);

        let empty = loaded(&[]);
        assert_eq!(empty.active_index(), None);
        assert!(empty.trail().is_empty());
        assert_eq!(empty.navigation(), NavigationFlags::default());
    }

    #[test]
    fn navigation_is_clamped_without_wraparound() {
        let mut playback = loaded(&[1, 1, 1]);
        assert!(!playback.previous());
        assert_eq!(playback.active_index(), Some(0));

        assert!(playback.next());
        assert!(playback.next());
        assert!(!playback.next());
        assert_eq!(playback.active_index(), Some(2));
        assert_eq!(
            playback.navigation(),
            NavigationFlags {
                can_go_previous: true,
                can_go_next: false
            }
        );
    }

    #[test]
    fn navigation_on_empty_set_is_a_no_op() {
        let mut playback = loaded(&[]);
        assert!(!playback.next());
        assert!(!playback.previous());
        assert!(!playback.select(0));
        assert!(!playback.tick(FRAME));
    }

    #[test]
    fn index_change_resets_frame_cursor() {
        let mut playback = loaded(&[5, 5]);
        playback.tick(FRAME * 3);
        assert_eq!(playback.active_frame(), 3);

        playback.next();
        assert_eq!(playback.active_frame(), 0);
        playback.tick(FRAME);
        playback.previous();
        assert_eq!(playback.active_frame(), 0);
    }

    #[test]
    fn tick_advances_once_per_interval_and_keeps_remainder() {
        let mut playback = loaded(&[10]);
        assert!(!playback.tick(Duration::from_millis(60)));
        assert_eq!(playback.active_frame(), 0);
        assert!(playback.tick(Duration::from_millis(60)));
        assert_eq!(playback.active_frame(), 1);
        assert!(playback.tick(Duration::from_millis(80)));
        assert_eq!(playback.active_frame(), 2);
        assert_eq!(playback.current_position().map(|p| p.x), Some(1.0));
    }

    #[test]
    fn playback_halts_at_end_of_trail() {
        let mut playback = loaded(&[3]);
        playback.tick(FRAME * 10);
        assert_eq!(playback.active_frame(), 3);
        assert!(playback.is_finished());
        assert!(!playback.tick(FRAME));
        assert_eq!(playback.trail().len(), 3);

        playback.replay();
        assert_eq!(playback.active_frame(), 0);
        assert!(!playback.is_finished());
    }

    #[test]
    fn zero_length_ball_is_immediately_finished() {
        let mut playback = loaded(&[0, 2]);
        assert!(playback.is_finished());
        assert!(!playback.tick(FRAME));
        assert_eq!(playback.current_position(), None);
    }

    #[test]
    fn pause_stops_advancement() {
        let mut playback = loaded(&[4]);
        assert!(playback.toggle_pause());
        assert!(!playback.tick(FRAME * 2));
        assert_eq!(playback.active_frame(), 0);
        assert!(!playback.toggle_pause());
        assert!(playback.tick(FRAME));
    }

    #[test]
    fn switching_ball_discards_partial_interval() {
        let mut playback = loaded(&[4, 4]);
        playback.tick(Duration::from_millis(90));
        playback.next();
        assert!(!playback.tick(Duration::from_millis(20)));
        assert_eq!(playback.active_frame(), 0);
    }

    #[test]
    fn load_replaces_previous_set() {
        let mut playback = loaded(&[4, 4, 4]);
        playback.next();
        playback.tick(FRAME * 2);
        playback.load(vec![ball("fresh", 2)]);
        assert_eq!(playback.active_index(), Some(0));
        assert_eq!(playback.active_frame(), 0);
        assert_eq!(playback.balls().len(), 1);
        assert_eq!(playback.balls()[0].ball_id, "fresh");
    }

    #[test]
    fn ticker_counts_crossed_intervals() {
        let mut ticker = FrameTicker::new(30.0);
        assert_eq!(ticker.interval(), Duration::from_nanos(33_333_333));
        assert_eq!(ticker.advance(Duration::from_millis(100)), 3);
        ticker.reset();
        assert_eq!(ticker.advance(Duration::from_millis(30)), 0);
        assert_eq!(FrameTicker::new(0.0).interval(), FrameTicker::new(30.0).interval());
    }

    #[test]
    fn unrepresentable_frame_rate_uses_default_interval() {
        let default = FrameTicker::new(crate::config::DEFAULT_FRAME_RATE).interval();
        assert_eq!(FrameTicker::new(1e-30).interval(), default);
        assert_eq!(FrameTicker::new(f64::MIN_POSITIVE).interval(), default);
        assert_eq!(FrameTicker::new(1e300).interval(), MIN_FRAME_INTERVAL);

        let mut playback = PlaybackController::new(1e-30);
        playback.load(vec![ball("b0", 2)]);
        assert_eq!(playback.frame_interval(), default);
    }

    #[test]
    fn huge_delta_saturates_instead_of_overflowing() {
        let mut ticker = FrameTicker::new(10.0);
        ticker.advance(Duration::from_millis(50));
        assert!(ticker.advance(Duration::MAX) > 0);

        let mut playback = loaded(&[3]);
        assert!(playback.tick(Duration::MAX));
        assert_eq!(playback.active_frame(), 3);
    }
}
