//! `parley chat`: send one message to a running server and print the reply
//! as it streams in.

use std::io::Write;

use anyhow::{Context, Result};
use console::style;

use parley_infra::client::HttpChatClient;

/// Stream a reply for `message` in `session_id` from the server at `server`.
///
/// # Examples
///
/// ```bash
/// parley chat default "What is a lifetime?"
/// parley chat default "hi" --server http://localhost:8080
/// ```
pub async fn chat(server: &str, session_id: &str, message: &str, json: bool) -> Result<()> {
    let client = HttpChatClient::new(server)?;

    if json {
        let reply = client
            .chat(message, session_id, |_| {})
            .await
            .with_context(|| format!("Chat request to {server} failed"))?;
        println!(
            "{}",
            serde_json::json!({"session_id": session_id, "reply": reply})
        );
        return Ok(());
    }

    print!("\n  {} ", style("Assistant >").cyan().bold());
    let _ = std::io::stdout().flush();

    let result = client
        .chat(message, session_id, |chunk| {
            print!("{chunk}");
            let _ = std::io::stdout().flush();
        })
        .await;
    println!();
    println!();

    result.with_context(|| format!("Chat request to {server} failed"))?;
    Ok(())
}
