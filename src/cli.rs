use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "drsview",
    version,
    about = "Fetch and replay recorded cricket ball trajectories"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// API base URL (overrides DRSVIEW_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Read deadline for each request, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Playback speed in revealed points per second
    #[arg(long, global = true, value_name = "FPS")]
    pub frame_rate: Option<f64>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with a registered phone number
    Login { phone: String },
    /// Check the stored tokens, refreshing them if needed
    Verify,
    /// Print the balls recorded in a session
    Fetch { session_id: Option<String> },
    /// Replay a session in the terminal viewer
    Play { session_id: Option<String> },
    /// List recently fetched sessions
    Recent,
}

impl Cli {
    pub fn opens_viewer(&self) -> bool {
        matches!(self.command, Some(Command::Play { .. }) | None)
    }
}
