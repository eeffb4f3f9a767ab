use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;

pub(crate) const PRACTICE_PATH_PREFIX: &str = "/api/v0/practice/";
pub(crate) const UMPIRES_CALL: &str = "Umpire's Call";

const MILLIMETERS_PER_METER: f64 = 1000.0;
const SPEED_UNAVAILABLE: &str = "N/A";

/// A point in meter space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Point3 {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) z: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ReviewFlag {
    pub(crate) label: String,
    pub(crate) pass: bool,
}

/// One recorded delivery: its trail plus the review verdicts shown next to it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Ball {
    pub(crate) ball_id: String,
    pub(crate) positions: Vec<Point3>,
    pub(crate) speed: String,
    pub(crate) clip_url: Option<String>,
    pub(crate) hitting_stumps: ReviewFlag,
    pub(crate) impact_inline: ReviewFlag,
    pub(crate) pitching_inline: ReviewFlag,
    pub(crate) lbw: ReviewFlag,
    pub(crate) review_status: ReviewFlag,
    pub(crate) original_decision: String,
}

pub(crate) struct TrajectoryClient<'a> {
    http: &'a HttpClient,
}

impl<'a> TrajectoryClient<'a> {
    pub(crate) fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    pub(crate) fn fetch(&self, session_id: &str, access_token: &str) -> ClientResult<Vec<Ball>> {
        let session_id = validate_session_id(session_id)?;
        let body = self.http.get(
            &format!("{PRACTICE_PATH_PREFIX}{session_id}"),
            Some(access_token),
        )?;
        let balls = decode_practice(&body)?;
        info!(session_id, balls = balls.len(), "session trajectories loaded");
        Ok(balls)
    }
}

pub(crate) fn validate_session_id(raw: &str) -> ClientResult<&str> {
    let session_id = raw.trim();
    if session_id.is_empty() {
        return Err(ClientError::InvalidInput("session id is empty".to_string()));
    }
    if session_id
        .chars()
        .any(|ch| ch.is_whitespace() || matches!(ch, '/' | '?' | '#' | '%'))
    {
        return Err(ClientError::InvalidInput(format!(
            "session id '{session_id}' contains characters not allowed in a path segment"
        )));
    }
    Ok(session_id)
}

/// Decodes a practice-session response body into balls.
///
/// Coordinate rows with fewer than three numeric components are skipped;
/// any structural mismatch fails the whole decode.
pub(crate) fn decode_practice(raw: &str) -> ClientResult<Vec<Ball>> {
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(ClientError::Decode(
            "practice response body is not a JSON object".to_string(),
        ));
    }
    let envelope: PracticeEnvelope = serde_json::from_value(value)?;
    if let Some(message) = envelope.message.as_deref() {
        debug!(message, "practice response");
    }
    let payloads = envelope
        .data
        .and_then(|data| data.balls)
        .unwrap_or_default();
    Ok(payloads.into_iter().map(BallPayload::into_ball).collect())
}

fn point_from_row(row: &[Value]) -> Option<Point3> {
    let [x, y, z] = [row.first()?, row.get(1)?, row.get(2)?].map(Value::as_f64);
    Some(Point3 {
        x: x? / MILLIMETERS_PER_METER,
        y: y? / MILLIMETERS_PER_METER,
        z: z? / MILLIMETERS_PER_METER,
    })
}

fn format_speed(speed: Option<&BallSpeed>) -> String {
    let Some(speed) = speed else {
        return SPEED_UNAVAILABLE.to_string();
    };
    let val = match &speed.val {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    };
    let unit = speed.unit.as_deref().unwrap_or_default().trim();
    let text = format!("{val} {unit}").trim().to_string();
    if text.is_empty() {
        SPEED_UNAVAILABLE.to_string()
    } else {
        text
    }
}

#[derive(Debug, Deserialize)]
struct PracticeEnvelope {
    message: Option<String>,
    data: Option<PracticeData>,
}

#[derive(Debug, Deserialize)]
struct PracticeData {
    balls: Option<Vec<BallPayload>>,
}

#[derive(Debug, Deserialize)]
struct BallSpeed {
    val: Option<Value>,
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BallPayload {
    #[serde(rename = "ballId", default)]
    ball_id: Option<String>,
    #[serde(rename = "ballClipUrl")]
    ball_clip_url: Option<String>,
    #[serde(rename = "ballSpeed")]
    ball_speed: Option<BallSpeed>,
    coordinates: Option<Vec<Vec<Value>>>,
    hitting_stumps: Option<String>,
    hitting_stumps_flag: Option<bool>,
    impact_inline: Option<String>,
    impact_inline_flag: Option<bool>,
    pitching_inline: Option<String>,
    pitching_inline_flag: Option<bool>,
    lbw: Option<String>,
    lbw_flag: Option<bool>,
    review_status: Option<String>,
    review_status_flag: Option<bool>,
    original_decision: Option<String>,
}

impl BallPayload {
    fn into_ball(self) -> Ball {
        let rows = self.coordinates.unwrap_or_default();
        let total_rows = rows.len();
        let positions = rows
            .iter()
            .filter_map(|row| point_from_row(row))
            .collect::<Vec<_>>();
        let dropped = total_rows - positions.len();
        if dropped > 0 {
            debug!(ball_id = ?self.ball_id, dropped, "skipped malformed coordinate rows");
        }

        let flag = |label: Option<String>, pass: Option<bool>| ReviewFlag {
            label: label.unwrap_or_default(),
            pass: pass.unwrap_or(false),
        };

        Ball {
            speed: format_speed(self.ball_speed.as_ref()),
            hitting_stumps: flag(self.hitting_stumps, self.hitting_stumps_flag),
            impact_inline: flag(self.impact_inline, self.impact_inline_flag),
            pitching_inline: flag(self.pitching_inline, self.pitching_inline_flag),
            lbw: flag(self.lbw, self.lbw_flag),
            review_status: flag(self.review_status, self.review_status_flag),
            original_decision: self.original_decision.unwrap_or_default(),
            clip_url: self.ball_clip_url.filter(|url| !url.is_empty()),
            ball_id: self.ball_id.unwrap_or_default(),
            positions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_are_scaled_from_millimeters() {
        let raw = r#"{"data":{"balls":[{"ballId":"b1","coordinates":[[1000,2000,3000]]}]}}"#;
        let balls = decode_practice(raw).expect("decode");
        assert_eq!(
            balls[0].positions,
            vec![Point3 {
                x: 1.0,
                y: 2.0,
                z: 3.0
            }]
        );
    }

    #[test]
    fn short_or_non_numeric_rows_are_dropped() {
        let raw = r#"{"data":{"balls":[{"ballId":"b1","coordinates":[
            [1, 2, 3], [4, 5], [], [6, "x", 7], [8, 9, 10, 11], [null, 1, 2]
        ]}]}}"#;
        let balls = decode_practice(raw).expect("decode");
        assert_eq!(balls[0].positions.len(), 2);
        assert_eq!(balls[0].positions[1].x, 0.008);
    }

    #[test]
    fn speed_falls_back_to_not_available() {
        let raw = r#"{"data":{"balls":[
            {"ballId":"b1","ballSpeed":{"val":"22","unit":"km/h"}},
            {"ballId":"b2"},
            {"ballId":"b3","ballSpeed":{"val":118.5,"unit":"km/h"}},
            {"ballId":"b4","ballSpeed":null}
        ]}}"#;
        let speeds = decode_practice(raw)
            .expect("decode")
            .into_iter()
            .map(|ball| ball.speed)
            .collect::<Vec<_>>();
        assert_eq!(speeds, vec!["22 km/h", "N/A", "118.5 km/h", "N/A"]);
    }

    #[test]
    fn missing_data_or_balls_is_an_empty_session() {
        for raw in [
            r#"{"status":200,"message":"ok"}"#,
            r#"{"data":null}"#,
            r#"{"data":{}}"#,
            r#"{"data":{"balls":[]}}"#,
        ] {
            assert!(decode_practice(raw).expect("decode").is_empty(), "{raw}");
        }
    }

    #[test]
    fn structural_mismatch_discards_the_whole_result() {
        for raw in [
            "not json",
            "[]",
            "[null,null]",
            "42",
            r#"{"data":{"balls":{"ballId":"b1"}}}"#,
            r#"{"data":{"balls":[{"ballId":"b1","coordinates":[1,2,3]}]}}"#,
        ] {
            let err = decode_practice(raw).expect_err(raw);
            assert!(matches!(err, ClientError::Decode(_)), "{raw}: {err}");
        }
    }

    #[test]
    fn ball_without_id_still_loads() {
        let raw = r#"{"data":{"balls":[
            {"ballId":"b1","coordinates":[[1000,0,0]]},
            {"coordinates":[[1,2,3]]},
            {"ballId":null,"coordinates":[]}
        ]}}"#;
        let balls = decode_practice(raw).expect("decode");
        assert_eq!(balls.len(), 3);
        assert_eq!(balls[0].ball_id, "b1");
        assert_eq!(balls[1].ball_id, "");
        assert_eq!(balls[1].positions.len(), 1);
        assert_eq!(balls[2].ball_id, "");
        assert!(balls[2].positions.is_empty());
    }

    #[test]
    fn flag_fields_map_verbatim() {
        let raw = r#"{"data":{"balls":[{
            "ballId":"b1",
            "ballClipUrl":"clips/b1.mp4",
            "hitting_stumps":"Umpire's Call","hitting_stumps_flag":true,
            "impact_inline":"In Line","impact_inline_flag":true,
            "pitching_inline":"Outside Leg","pitching_inline_flag":false,
            "lbw":"Out","lbw_flag":true,
            "review_status":"Retained","review_status_flag":true,
            "original_decision":"Not Out"
        }]}}"#;
        let ball = decode_practice(raw).expect("decode").remove(0);
        assert_eq!(ball.hitting_stumps.label, UMPIRES_CALL);
        assert!(ball.hitting_stumps.pass);
        assert_eq!(ball.pitching_inline.label, "Outside Leg");
        assert!(!ball.pitching_inline.pass);
        assert_eq!(ball.original_decision, "Not Out");
        assert_eq!(ball.clip_url.as_deref(), Some("clips/b1.mp4"));
        assert!(ball.positions.is_empty());
    }

    #[test]
    fn session_id_must_be_a_single_path_segment() {
        assert!(matches!(
            validate_session_id("   "),
            Err(ClientError::InvalidInput(_))
        ));
        assert!(validate_session_id("../admin").is_err());
        assert_eq!(validate_session_id(" 64ab01 ").expect("valid"), "64ab01");
    }
}
