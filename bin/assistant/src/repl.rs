//! Line-oriented terminal front end.

use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::error;
use travel_assistant_ai::LlmGateway;
use travel_assistant_conversation::{ConversationStore, EMPTY_SESSION_SUMMARY, Fallback, TurnEngine};
use travel_assistant_core::UserId;
use travel_assistant_travel::TravelDataSource;

const HELP: &str = "Commands: /new (start a new conversation), /history, /sessions, /summary, /help, /quit";

/// A line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A message for the assistant.
    Say(String),
    /// Start a new session.
    NewSession,
    /// Show the active session's messages.
    History,
    /// List the user's sessions.
    Sessions,
    /// Summarize the active session.
    Summary,
    /// Show the command list.
    Help,
    /// Leave the assistant.
    Quit,
    /// An unrecognized slash command.
    Unknown(String),
}

impl Command {
    /// Parses a line. Blank lines yield `None`.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let command = match line {
            "/new" => Self::NewSession,
            "/history" => Self::History,
            "/sessions" => Self::Sessions,
            "/summary" => Self::Summary,
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            other if other.starts_with('/') => Self::Unknown(other.to_string()),
            other => Self::Say(other.to_string()),
        };
        Some(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Say(text) => f.write_str(text),
            Self::NewSession => f.write_str("/new"),
            Self::History => f.write_str("/history"),
            Self::Sessions => f.write_str("/sessions"),
            Self::Summary => f.write_str("/summary"),
            Self::Help => f.write_str("/help"),
            Self::Quit => f.write_str("/quit"),
            Self::Unknown(command) => f.write_str(command),
        }
    }
}

/// Interactive loop for one user.
#[derive(Debug)]
pub struct Repl<S, G, D> {
    engine: Arc<TurnEngine<S, G, D>>,
    user_id: UserId,
}

impl<S, G, D> Repl<S, G, D>
where
    S: ConversationStore + 'static,
    G: LlmGateway + 'static,
    D: TravelDataSource + 'static,
{
    /// Creates a loop speaking for `user_id`.
    pub fn new(engine: Arc<TurnEngine<S, G, D>>, user_id: UserId) -> Self {
        Self { engine, user_id }
    }

    /// Reads commands until `/quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input or writing output fails.
    pub async fn run<R, W>(&self, input: R, output: &mut W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        write_line(output, HELP).await?;
        prompt(output).await?;

        while let Some(line) = lines.next_line().await? {
            if let Some(command) = Command::parse(&line) {
                let Some(reply) = self.handle(command).await else {
                    break;
                };
                write_line(output, &reply).await?;
            }
            prompt(output).await?;
        }

        output.flush().await
    }

    /// Returns the reply to print, or `None` to stop.
    async fn handle(&self, command: Command) -> Option<String> {
        let reply = match command {
            Command::Say(text) => {
                match self.engine.submit_turn(self.user_id.clone(), text).await {
                    Ok(outcome) => outcome.reply,
                    Err(e) => {
                        error!(error = %e, "turn task failed");
                        Fallback::GatewayUnavailable.text().to_string()
                    }
                }
            }
            Command::NewSession => match self.engine.start_new_session(&self.user_id).await {
                Ok(session_id) => format!("Started a new conversation ({session_id})."),
                Err(e) => {
                    error!(error = %e, "failed to start session");
                    Fallback::StoreUnavailable.text().to_string()
                }
            },
            Command::History => self.history().await,
            Command::Sessions => self.sessions().await,
            Command::Summary => self.summary().await,
            Command::Help => HELP.to_string(),
            Command::Quit => return None,
            Command::Unknown(command) => format!("Unknown command {command}. {HELP}"),
        };
        Some(reply)
    }

    async fn history(&self) -> String {
        let history = match self.engine.active_session(&self.user_id).await {
            Ok(Some(session_id)) => self.engine.history(session_id).await,
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(e),
        };

        match history {
            Ok(messages) if messages.is_empty() => "No messages yet.".to_string(),
            Ok(messages) => messages
                .iter()
                .map(|message| format!("{}: {}", message.role, message.content))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                error!(error = %e, "failed to load history");
                Fallback::StoreUnavailable.text().to_string()
            }
        }
    }

    async fn sessions(&self) -> String {
        match self.engine.list_sessions(&self.user_id).await {
            Ok(sessions) if sessions.is_empty() => "No conversations yet.".to_string(),
            Ok(sessions) => sessions
                .iter()
                .map(|session| {
                    format!(
                        "{} {} ({} messages, updated {})",
                        if session.is_active { "*" } else { " " },
                        session.id,
                        session.message_count,
                        session.updated_at.format("%Y-%m-%d %H:%M")
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                error!(error = %e, "failed to list sessions");
                Fallback::StoreUnavailable.text().to_string()
            }
        }
    }

    async fn summary(&self) -> String {
        let session_id = match self.engine.active_session(&self.user_id).await {
            Ok(Some(session_id)) => session_id,
            Ok(None) => return EMPTY_SESSION_SUMMARY.to_string(),
            Err(e) => {
                error!(error = %e, "failed to resolve session");
                return Fallback::StoreUnavailable.text().to_string();
            }
        };

        match self.engine.summarize(session_id).await {
            Ok(summary) => summary.full_summary,
            Err(e) => {
                error!(%session_id, error = %e, "failed to summarize");
                Fallback::GatewayUnavailable.text().to_string()
            }
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await
}

async fn prompt<W: AsyncWrite + Unpin>(output: &mut W) -> std::io::Result<()> {
    output.write_all(b"> ").await?;
    output.flush().await
}
