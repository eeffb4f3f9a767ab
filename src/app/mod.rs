mod auth;
mod playback;
mod present;
mod trajectory;
mod tui;


use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local};

use crate::cli::{Cli, Command};
use crate::config::ClientConfig;
use crate::db::Database;
use crate::http::HttpClient;
use crate::paths::database_file_path;

use self::auth::{AuthClient, AuthState, TokenStore};
use self::present::{TileTone, review_tiles};
use self::trajectory::{Ball, TrajectoryClient, validate_session_id};

pub fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::from_env().with_overrides(
        cli.base_url.as_deref(),
        cli.timeout,
        cli.frame_rate,
    );
    let http = HttpClient::new(&config);
    let mut store = TokenStore::new(open_db()?);

    match cli.command {
        Some(Command::Login { phone }) => run_login(&http, &mut store, &phone)?,
        Some(Command::Verify) => run_verify(&http, &mut store)?,
        Some(Command::Fetch { session_id }) => {
            run_fetch(&http, &mut store, session_id.as_deref())?
        }
        Some(Command::Recent) => run_recent(store.database())?,
        Some(Command::Play { session_id }) => run_play(&http, &mut store, session_id.as_deref())?,
        None => run_play(&http, &mut store, None)?,
    }

    Ok(())
}

fn run_login(http: &HttpClient, store: &mut TokenStore, phone: &str) -> Result<()> {
    AuthClient::new(http, store)
        .login(phone)
        .context("login failed")?;
    println!("Logged in. Tokens saved.");
    Ok(())
}

fn run_verify(http: &HttpClient, store: &mut TokenStore) -> Result<()> {
    match AuthClient::new(http, store).verify_on_start()? {
        AuthState::Authenticated(_) => println!("Authenticated."),
        AuthState::Unauthenticated { cause } => {
            println!("{}", unauthenticated_message(cause.as_ref()));
        }
    }
    Ok(())
}

fn run_fetch(http: &HttpClient, store: &mut TokenStore, session_id: Option<&str>) -> Result<()> {
    let session_id = resolve_session_id(store.database(), session_id)?;
    let balls = fetch_session(http, store, &session_id)?;
    if balls.is_empty() {
        println!("Session {session_id} has no recorded balls.");
        return Ok(());
    }

    println!(
        "{:<4} {:<24} {:<12} {:<7} {:<16} {:<16} {:<16} {:<9} {:<16} {:<12} {:<32}",
        "#", "BALL ID", "SPEED", "FRAMES", "PITCHING", "IMPACT", "WICKETS", "LBW", "REVIEW",
        "ORIGINAL", "CLIP"
    );
    for (index, ball) in balls.iter().enumerate() {
        let tiles = review_tiles(ball);
        println!(
            "{:<4} {:<24} {:<12} {:<7} {:<16} {:<16} {:<16} {:<9} {:<16} {:<12} {:<32}",
            index + 1,
            truncate(&ball.ball_id, 24),
            truncate(&ball.speed, 12),
            ball.positions.len(),
            tile_cell(&tiles.pitching_inline.text, tiles.pitching_inline.tone),
            tile_cell(&tiles.impact_inline.text, tiles.impact_inline.tone),
            tile_cell(&tiles.hitting_stumps.text, tiles.hitting_stumps.tone),
            tile_cell(&tiles.lbw.text, tiles.lbw.tone),
            tile_cell(&tiles.review_status.text, tiles.review_status.tone),
            truncate(&tiles.original_decision, 12),
            ball.clip_url
                .as_deref()
                .map(|url| truncate(url, 32))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

fn run_recent(db: &Database) -> Result<()> {
    let sessions = db.list_sessions()?;
    if sessions.is_empty() {
        println!("No sessions fetched yet. Run `drsview fetch <session-id>` first.");
        return Ok(());
    }

    println!("{:<32} {:<8} {:<28}", "SESSION", "BALLS", "FETCHED");
    for session in sessions {
        println!(
            "{:<32} {:<8} {:<28}",
            truncate(&session.session_id, 32),
            session.ball_count,
            format_fetched_at(&session.fetched_at)
        );
    }
    Ok(())
}

fn run_play(http: &HttpClient, store: &mut TokenStore, session_id: Option<&str>) -> Result<()> {
    let session_id = resolve_session_id(store.database(), session_id)?;
    let balls = fetch_session(http, store, &session_id)?;
    if balls.is_empty() {
        println!("Session {session_id} has no recorded balls.");
        return Ok(());
    }
    tui::run_viewer(&session_id, balls, http.config().frame_rate)
}

/// Resolves a bearer token, then fetches the session. Input is checked
/// before any request goes out.
fn fetch_session(http: &HttpClient, store: &mut TokenStore, session_id: &str) -> Result<Vec<Ball>> {
    let session_id = validate_session_id(session_id)?;
    let access_token = require_access_token(http, store)?;
    let balls = TrajectoryClient::new(http)
        .fetch(session_id, &access_token)
        .with_context(|| format!("failed to fetch session {session_id}"))?;
    store.database().record_session(session_id, balls.len())?;
    Ok(balls)
}

fn require_access_token(http: &HttpClient, store: &mut TokenStore) -> Result<String> {
    match AuthClient::new(http, store).verify_on_start()? {
        AuthState::Authenticated(credentials) => Ok(credentials.access_token),
        AuthState::Unauthenticated { cause } => {
            Err(anyhow!(unauthenticated_message(cause.as_ref())))
        }
    }
}

fn resolve_session_id(db: &Database, explicit: Option<&str>) -> Result<String> {
    if let Some(session_id) = explicit {
        return Ok(session_id.to_string());
    }
    match db.last_session()? {
        Some(session) => Ok(session.session_id),
        None => bail!("no session id given and no session fetched yet"),
    }
}

fn unauthenticated_message(cause: Option<&crate::error::ClientError>) -> String {
    match cause {
        Some(cause) => format!("Not logged in ({cause}). Run `drsview login <phone>`."),
        None => "Not logged in. Run `drsview login <phone>`.".to_string(),
    }
}

fn tile_cell(text: &str, tone: TileTone) -> String {
    let marker = match tone {
        TileTone::Pass => '+',
        TileTone::Fail => '-',
        TileTone::Neutral => '~',
    };
    format!("{marker} {}", truncate(text, 14))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

fn format_fetched_at(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M %:z")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

fn open_db() -> Result<Database> {
    let db_path = database_file_path()?;
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}
