//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for gameplan
#[derive(Parser, Debug)]
#[command(name = "gameplan")]
#[command(author, version, about = "Credit-metered AI learning sessions")]
#[command(long_about = r#"
gameplan runs topic-based learning conversations with an AI tutor.

Every operation costs credits: starting a session, sending text, image or
audio messages. When the AI service cannot be reached the tutor answers in
offline practice mode, which is still charged.

Configuration files are loaded from (in priority order):
1. GAMEPLAN_* environment variables (GAMEPLAN_PROVIDERS__DEFAULT=direct)
2. --config <path>       Explicit config file
3. ./gameplan.toml       Project-level config
4. ~/.config/gameplan/config.toml   Global config

Example:
  gameplan topics
  gameplan --user alice play --topic intro-ai --difficulty hard
  gameplan --user alice resume 3f1c0c8e-...
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Signed-in user id
    #[arg(short, long, global = true, value_name = "ID")]
    pub user: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Directory for daily rolling logs and the conversation transcript
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Keep credits and sessions in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the available topics
    Topics,

    /// Show the credit balance (opens the account on first use)
    Balance,

    /// Start a new session and play interactively
    Play {
        /// Topic id (see `gameplan topics`)
        #[arg(short, long)]
        topic: String,

        /// easy, intermediate or hard (default from [session])
        #[arg(short, long)]
        difficulty: Option<String>,

        /// rpc or direct (default from [providers])
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Load a saved session and continue playing
    Resume {
        /// Session id printed by /save
        session_id: String,
    },

    /// Show configuration file locations and detected issues
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_with_global_flags() {
        let cli = Cli::try_parse_from([
            "gameplan",
            "play",
            "--topic",
            "intro-ai",
            "-d",
            "hard",
            "--user",
            "alice",
            "-vv",
            "--ephemeral",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("alice"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.ephemeral);
        match cli.command {
            Command::Play {
                topic,
                difficulty,
                provider,
            } => {
                assert_eq!(topic, "intro-ai");
                assert_eq!(difficulty.as_deref(), Some("hard"));
                assert!(provider.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn play_requires_topic() {
        assert!(Cli::try_parse_from(["gameplan", "play"]).is_err());
    }

    #[test]
    fn resume_takes_session_id() {
        let cli = Cli::try_parse_from(["gameplan", "resume", "abc-123"]).unwrap();
        assert!(matches!(cli.command, Command::Resume { session_id } if session_id == "abc-123"));
    }
}
