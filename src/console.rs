//! Console channel — reads lines from stdin, runs each through the engine,
//! prints the reply to stdout.
//!
//! The loop is deliberately synchronous per interaction: each outbound
//! completion call is awaited before the next line is read, so there is
//! never more than one in-flight request. Runs until the `shutdown` token
//! is cancelled (Ctrl-C), `/quit`, or stdin is closed.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::SupportEngine;
use crate::error::AppError;
use crate::session::{Conversation, Role};

// ── Commands ─────────────────────────────────────────────────────────────────

/// Slash commands understood by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Help,
    Clear,
    History,
    Kb,
    Quit,
}

impl Command {
    fn parse(input: &str) -> Option<Self> {
        match input {
            "/help" => Some(Self::Help),
            "/clear" => Some(Self::Clear),
            "/history" => Some(Self::History),
            "/kb" => Some(Self::Kb),
            "/quit" | "/exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

// ── run ──────────────────────────────────────────────────────────────────────

pub async fn run(
    engine: SupportEngine,
    config: &Config,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let mut conversation = Conversation::new(config.session.transcript_cap);
    info!(conversation_id = %conversation.id(), "console channel started");

    println!("─────────────────────────────────────────");
    println!(" {} console  (Ctrl-C or /quit to exit)", config.bot_name);
    println!(" Type /help for commands.");
    println!("─────────────────────────────────────────");

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        print!("you> ");
        use std::io::Write as _;
        let _ = std::io::stdout().flush();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!("\n[console] shutdown signal received — closing");
                info!("console channel shutting down");
                break;
            }

            line = lines.next_line() => {
                match line {
                    Err(e) => {
                        warn!("console read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!("console stdin closed");
                        break;
                    }
                    Ok(Some(input)) => {
                        let input = input.trim().to_string();
                        if input.is_empty() { continue; }

                        if let Some(cmd) = Command::parse(&input) {
                            if handle_command(cmd, &mut conversation, &engine, config) {
                                break;
                            }
                            continue;
                        }

                        debug!(input = %input, "console received query");
                        conversation.push(Role::User, &input);

                        let reply = engine.handle(&input).await;
                        conversation.push(Role::Assistant, &reply.text);

                        println!("{}", reply.text);
                        println!(
                            "  (intent: {} · confidence: {:.0}%)",
                            reply.intent,
                            reply.confidence * 100.0
                        );
                        if reply.needs_escalation {
                            println!(
                                "  ⚠ This looks like one for our human team: {} / {}",
                                config.business.support_email, config.business.support_phone
                            );
                        }
                    }
                }
            }
        }
    }

    info!(turns = conversation.len(), "console session ended");
    Ok(())
}

/// Handle a slash command. Returns `true` when the console should exit.
fn handle_command(
    cmd: Command,
    conversation: &mut Conversation,
    engine: &SupportEngine,
    config: &Config,
) -> bool {
    match cmd {
        Command::Help => {
            println!("Commands:");
            println!("  /help      show this help");
            println!("  /history   show the conversation so far");
            println!("  /kb        show knowledge base summary");
            println!("  /clear     clear the conversation history");
            println!("  /quit      exit");
            println!(
                "Human support: {} / {}",
                config.business.support_email, config.business.support_phone
            );
            false
        }
        Command::Clear => {
            conversation.clear();
            info!(conversation_id = %conversation.id(), "history cleared");
            println!("Chat history cleared.");
            false
        }
        Command::History => {
            if conversation.is_empty() {
                println!("No messages yet.");
            } else {
                for turn in conversation.turns() {
                    println!(
                        "[{}] {}: {}",
                        turn.timestamp.format("%H:%M:%S"),
                        turn.role.as_str(),
                        turn.content
                    );
                }
                println!("({} turns this conversation)", conversation.len());
            }
            false
        }
        Command::Kb => {
            let s = engine.knowledge().summary();
            println!("Knowledge base: {} sections, {} bytes", s.total_sections, s.total_size);
            for section in &s.sections {
                println!("  - {section}");
            }
            false
        }
        Command::Quit => true,
    }
}
