//! Interactive play loop

use colored::Colorize;
use gameplan_application::{GameError, GameOrchestrator, MessageOutcome};
use gameplan_domain::{
    ConversationMessage, Difficulty, GameSession, MessageInput, ResponseSource, Role, SessionId,
    TopicId,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line of player input.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplInput {
    Empty,
    Message(MessageInput),
    Difficulty(String),
    Topic(String),
    Save,
    Balance,
    Help,
    Quit,
    Unknown(String),
}

/// Parse a line. Plain text is a message; `/` starts a command.
pub fn parse_line(line: &str) -> ReplInput {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    if !line.starts_with('/') {
        return ReplInput::Message(MessageInput::text(line));
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    match (command, rest) {
        ("/quit" | "/exit" | "/q", _) => ReplInput::Quit,
        ("/help" | "/h" | "/?", _) => ReplInput::Help,
        ("/save", _) => ReplInput::Save,
        ("/balance", _) => ReplInput::Balance,
        ("/difficulty", level) if !level.is_empty() => ReplInput::Difficulty(level.to_string()),
        ("/topic", topic) if !topic.is_empty() => ReplInput::Topic(topic.to_string()),
        ("/image" | "/audio", rest) if !rest.is_empty() => {
            let (uri, text) = match rest.split_once(char::is_whitespace) {
                Some((uri, text)) => (uri.to_string(), text.trim().to_string()),
                None => (rest.to_string(), String::new()),
            };
            if command == "/image" {
                ReplInput::Message(MessageInput::Image { prompt: text, uri })
            } else {
                ReplInput::Message(MessageInput::Audio {
                    transcript: text,
                    uri,
                })
            }
        }
        _ => ReplInput::Unknown(line.to_string()),
    }
}

/// Interactive session REPL
pub struct GameRepl<'a> {
    orchestrator: &'a GameOrchestrator,
    session_id: SessionId,
}

impl<'a> GameRepl<'a> {
    pub fn new(orchestrator: &'a GameOrchestrator, session: &GameSession) -> Self {
        Self {
            orchestrator,
            session_id: session.id().clone(),
        }
    }

    /// Run until `/quit` or end of input. The open session is closed on exit.
    pub async fn run(mut self) -> std::io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("Type /help for commands.");
        println!();

        loop {
            print!("{} ", ">>>".bold());
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                println!();
                break;
            };

            match parse_line(&line) {
                ReplInput::Empty => continue,
                ReplInput::Quit => break,
                ReplInput::Help => print_help(),
                ReplInput::Message(input) => self.send(input).await,
                ReplInput::Difficulty(level) => self.change_difficulty(&level).await,
                ReplInput::Topic(topic) => self.change_topic(&topic).await,
                ReplInput::Save => self.save().await,
                ReplInput::Balance => match self.orchestrator.balance().await {
                    Ok(balance) => println!("Balance: {} credits", balance),
                    Err(e) => print_error(&e),
                },
                ReplInput::Unknown(command) => {
                    println!("Unknown command: {}", command);
                    println!("Type /help for available commands");
                }
            }
        }

        if let Err(e) = self.orchestrator.close_session(&self.session_id).await {
            print_error(&e);
        }
        println!("Bye!");
        Ok(())
    }

    async fn send(&self, input: MessageInput) {
        match self.orchestrator.send_message(&self.session_id, input).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => print_error(&e),
        }
    }

    async fn change_difficulty(&self, level: &str) {
        let difficulty = match level.parse::<Difficulty>() {
            Ok(difficulty) => difficulty,
            Err(_) => {
                println!("Difficulty must be easy, intermediate or hard");
                return;
            }
        };
        match self
            .orchestrator
            .change_difficulty(&self.session_id, difficulty)
            .await
        {
            Ok(session) => println!("Difficulty is now {}", session.difficulty()),
            Err(e) => print_error(&e),
        }
    }

    async fn change_topic(&mut self, topic: &str) {
        match self
            .orchestrator
            .change_topic(&self.session_id, &TopicId::new(topic))
            .await
        {
            Ok((previous, next)) => {
                println!(
                    "{}",
                    format!("Left '{}' (session {})", previous.topic().name, previous.id()).dimmed()
                );
                self.session_id = next.id().clone();
                print_header(&next);
                print_last_reply(&next);
            }
            Err(e) => print_error(&e),
        }
    }

    async fn save(&self) {
        match self.orchestrator.save_session(&self.session_id).await {
            Ok(()) => println!(
                "Saved. Resume with: gameplan resume {}",
                self.session_id.to_string().cyan()
            ),
            Err(e) => print_error(&e),
        }
    }
}

pub fn print_header(session: &GameSession) {
    println!();
    println!(
        "{} {} ({})",
        "Topic:".bold(),
        session.topic().name,
        session.difficulty()
    );
    println!("{} {}", "Session:".bold(), session.id());
    println!();
}

/// Replay the tail of a session's history (used when resuming).
pub fn print_history(session: &GameSession, count: usize) {
    let history = session.history();
    for message in &history[history.len().saturating_sub(count)..] {
        print_message(message);
    }
}

pub fn print_last_reply(session: &GameSession) {
    if let Some(message) = session
        .history()
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
    {
        print_message(message);
    }
}

fn print_message(message: &ConversationMessage) {
    match message.role {
        Role::User => println!("{} {}", "you:".green(), message.content),
        Role::System => println!("{}", message.content.dimmed()),
        Role::Assistant => {
            let tag = source_tag(message.source);
            println!("{}{} {}", "tutor".blue().bold(), tag, message.content);
        }
    }
}

fn source_tag(source: Option<ResponseSource>) -> String {
    let tag = match source {
        Some(ResponseSource::Synthetic) => format!(" {}", "[offline]".yellow()),
        Some(ResponseSource::Secondary) => format!(" {}", "[fallback]".dimmed()),
        _ => String::new(),
    };
    format!("{}:", tag)
}

fn print_outcome(outcome: &MessageOutcome) {
    print_message(&outcome.reply);
    println!(
        "{}",
        format!(
            "-{} credit(s), balance {}",
            outcome.credits_charged, outcome.balance
        )
        .dimmed()
    );
}

pub fn print_error(error: &GameError) {
    eprintln!("{} {}", "Error:".red().bold(), error.user_message());
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  <text>                     - Send a message");
    println!("  /image <uri> [prompt]      - Send an image");
    println!("  /audio <uri> [transcript]  - Send an audio clip");
    println!("  /difficulty <level>        - easy, intermediate or hard");
    println!("  /topic <id>                - Switch topic (starts a new session)");
    println!("  /save                      - Save this session");
    println!("  /balance                   - Show your credits");
    println!("  /quit, /exit, /q           - Leave (unsaved sessions are lost)");
    println!();
}
