//! Session management CLI commands: list, show, create, delete, search.
//!
//! Provides session browsing with rich tables, a transcript view, and
//! deletion with a confirmation prompt.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use parley_types::chat::ChatSession;
use parley_types::llm::MessageRole;

use crate::state::AppState;

/// Session subcommands.
#[derive(Subcommand)]
pub enum SessionCommand {
    /// List sessions, most recently active first.
    #[command(alias = "ls")]
    List,

    /// Show a session's full transcript.
    Show {
        /// Session ID.
        id: String,
    },

    /// Create a new session.
    Create,

    /// Delete a session and its messages.
    #[command(alias = "rm")]
    Delete {
        /// Session ID to delete.
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Search session titles and last messages.
    Search {
        /// Case-insensitive substring to look for.
        query: String,
    },
}

/// Dispatch a session subcommand.
pub async fn run(state: &AppState, command: SessionCommand, json: bool) -> Result<()> {
    match command {
        SessionCommand::List => list_sessions(state, json).await,
        SessionCommand::Show { id } => show_session(state, &id, json).await,
        SessionCommand::Create => create_session(state, json).await,
        SessionCommand::Delete { id, force } => delete_session(state, &id, force, json).await,
        SessionCommand::Search { query } => search_sessions(state, &query, json).await,
    }
}

/// List all sessions.
///
/// # Examples
///
/// ```bash
/// parley sessions list
/// parley sessions list --json
/// ```
pub async fn list_sessions(state: &AppState, json: bool) -> Result<()> {
    let sessions = state.chat_service.list_sessions().await?;
    print_sessions(&sessions, "Sessions", json)
}

/// Search sessions by title or last message.
pub async fn search_sessions(state: &AppState, query: &str, json: bool) -> Result<()> {
    let sessions = state.chat_service.search_sessions(query).await?;
    print_sessions(&sessions, &format!("Sessions matching '{query}'"), json)
}

/// Print a session's transcript.
pub async fn show_session(state: &AppState, id: &str, json: bool) -> Result<()> {
    let session = state
        .chat_service
        .get_session(id)
        .await
        .with_context(|| format!("Session '{id}' not found"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style(&session.title).cyan().bold(),
        style(format!("({})", session.id)).dim()
    );
    println!();

    for message in &session.messages {
        let label = match message.role {
            MessageRole::User => style("You").green().bold(),
            MessageRole::Assistant => style("Assistant").cyan().bold(),
        };
        println!(
            "  {} {}",
            label,
            style(format_time(message.timestamp)).dim()
        );
        for line in message.content.lines() {
            println!("    {line}");
        }
        println!();
    }

    Ok(())
}

/// Create a session seeded with the welcome message.
pub async fn create_session(state: &AppState, json: bool) -> Result<()> {
    let session = state.chat_service.create_session().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        println!();
        println!(
            "  {} Created session {}",
            style("+").green().bold(),
            style(&session.id).cyan()
        );
        println!(
            "  {}",
            style(format!("parley chat {} \"<message>\"", session.id)).dim()
        );
        println!();
    }

    Ok(())
}

/// Delete a session with confirmation.
///
/// # Examples
///
/// ```bash
/// parley sessions delete <session-id>
/// parley sessions delete <session-id> --force
/// ```
pub async fn delete_session(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    let session = state
        .chat_service
        .get_session(id)
        .await
        .with_context(|| format!("Session '{id}' not found"))?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete session '{}' ({} messages)?",
                style(&session.title).red().bold(),
                session.messages.len()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.chat_service.delete_session(id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "session_id": id})
        );
    } else {
        println!(
            "  {} Session '{}' deleted.",
            style("x").red().bold(),
            session.id
        );
    }

    Ok(())
}

fn print_sessions(sessions: &[ChatSession], heading: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions found. Create one with: {}",
            style("i").blue().bold(),
            style("parley sessions create").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Last message").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
    ]);

    for session in sessions {
        table.add_row(vec![
            Cell::new(&session.id).fg(Color::DarkGrey),
            Cell::new(&session.title).fg(Color::Cyan),
            Cell::new(preview(&session.last_message, 40)).fg(Color::White),
            Cell::new(format_time(session.last_message_time)).fg(Color::DarkGrey),
            Cell::new(session.messages.len().to_string()).fg(Color::White),
        ]);
    }

    println!();
    println!("  {}", style(heading).bold());
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

// --- Formatting helpers ---

/// First line of `text`, cut to `max` characters with an ellipsis.
fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

/// Local wall-clock rendering of an epoch-milliseconds timestamp.
fn format_time(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
