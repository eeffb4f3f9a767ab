//! Display rules for the review tiles and the ball summary.
//!
//! Two rules here are product decisions, not general patterns: an
//! "Umpire's Call" hitting-stumps label is always neutral, and the lbw tile
//! reads "Out"/"Not Out" from its flag instead of the label.

use super::trajectory::{Ball, ReviewFlag, UMPIRES_CALL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TileTone {
    Pass,
    Fail,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tile {
    pub(crate) title: &'static str,
    pub(crate) text: String,
    pub(crate) tone: TileTone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReviewTiles {
    pub(crate) hitting_stumps: Tile,
    pub(crate) impact_inline: Tile,
    pub(crate) pitching_inline: Tile,
    pub(crate) lbw: Tile,
    pub(crate) review_status: Tile,
    pub(crate) original_decision: String,
}

impl ReviewTiles {
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tile> {
        [
            &self.pitching_inline,
            &self.impact_inline,
            &self.hitting_stumps,
            &self.lbw,
            &self.review_status,
        ]
        .into_iter()
    }
}

pub(crate) fn review_tiles(ball: &Ball) -> ReviewTiles {
    ReviewTiles {
        hitting_stumps: hitting_stumps_tile(&ball.hitting_stumps),
        impact_inline: flag_tile("Impact", &ball.impact_inline),
        pitching_inline: flag_tile("Pitching", &ball.pitching_inline),
        lbw: lbw_tile(&ball.lbw),
        review_status: flag_tile("Review", &ball.review_status),
        original_decision: ball.original_decision.clone(),
    }
}

fn flag_tile(title: &'static str, flag: &ReviewFlag) -> Tile {
    Tile {
        title,
        text: flag.label.clone(),
        tone: if flag.pass {
            TileTone::Pass
        } else {
            TileTone::Fail
        },
    }
}

fn hitting_stumps_tile(flag: &ReviewFlag) -> Tile {
    if flag.label == UMPIRES_CALL {
        Tile {
            title: "Wickets",
            text: UMPIRES_CALL.to_string(),
            tone: TileTone::Neutral,
        }
    } else {
        flag_tile("Wickets", flag)
    }
}

fn lbw_tile(flag: &ReviewFlag) -> Tile {
    if flag.pass {
        Tile {
            title: "LBW",
            text: "Out".to_string(),
            tone: TileTone::Fail,
        }
    } else {
        Tile {
            title: "LBW",
            text: "Not Out".to_string(),
            tone: TileTone::Pass,
        }
    }
}

pub(crate) fn ball_info_text(index: usize, ball: &Ball) -> String {
    format!(
        "Ball: {}\nBall Speed: {}\nFrames: {}",
        index + 1,
        ball.speed,
        ball.positions.len()
    )
}
