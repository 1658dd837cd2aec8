//! `ragwise chat`: Interactive or single-message chat mode.

use crate::runtime;
use ragwise_agent::{RagEngine, StreamEvent};
use ragwise_config::AppConfig;
use std::io::Write;
use tokio::io::{self, AsyncBufReadExt, BufReader};

const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "/quit"];

pub async fn run(
    message: Option<String>,
    thread: String,
    stream: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    runtime::require_api_key(&config)?;
    let engine = runtime::build_engine(&config)?;

    if let Some(msg) = message {
        return respond(&engine, &msg, &thread, stream).await;
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Ragwise Assistant: Interactive Mode    ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:     {}", config.provider.name);
    println!("  Model:        {}", config.provider.model);
    println!("  Vector store: {}", config.vector_store.backend);
    println!("  Thread:       {thread}");
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&line.to_lowercase().as_str()) {
            break;
        }

        if let Err(e) = respond(&engine, line, &thread, stream).await {
            eprintln!("  [Error] {e}");
        }
        println!();
    }

    println!("  Goodbye!");
    Ok(())
}

/// Answer one message, printing either the final reply or each stream event
/// as a JSON line.
async fn respond(
    engine: &RagEngine,
    message: &str,
    thread: &str,
    stream: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if stream {
        let mut rx = engine.chat_stream(message, thread)?;
        while let Some(event) = rx.recv().await {
            println!("{}", serde_json::to_string(&event)?);
            if let StreamEvent::Error { error } = &event {
                return Err(error.clone().into());
            }
        }
        return Ok(());
    }

    eprint!("  Thinking...");
    let reply = engine.chat(message, thread).await;
    eprint!("\r              \r");

    for line in reply?.content.lines() {
        println!("  Assistant > {line}");
    }
    Ok(())
}
