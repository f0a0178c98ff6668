//! TechHub support bot — console entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI args
//!   3. Load config
//!   4. Resolve effective log level (CLI `-v` flags > env > config)
//!   5. Init logger once
//!   6. Load the knowledge base
//!   7. Build the LLM provider and engine
//!   8. Spawn Ctrl-C → shutdown signal watcher
//!   9. Run the console channel until shutdown

use tokio_util::sync::CancellationToken;
use tracing::info;

use techhub_bot::config;
use techhub_bot::console;
use techhub_bot::engine::SupportEngine;
use techhub_bot::error::AppError;
use techhub_bot::knowledge::KnowledgeBase;
use techhub_bot::llm::providers;
use techhub_bot::logger;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    // Validate the configured level up front so a TOML typo is reported
    // even when a CLI -v flag overrides it.
    logger::parse_level(&config.log_level)?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    let force_cli_level = args.log_level.is_some();

    logger::init(effective_log_level, force_cli_level)?;

    info!(
        bot_name = %config.bot_name,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        llm_provider = %config.llm.provider,
        "config loaded"
    );

    let kb = KnowledgeBase::load(&config.knowledge.path, config.knowledge.max_matches);

    let provider = providers::build(&config.llm, config.llm_api_key.clone())
        .map_err(|e| AppError::Config(e.to_string()))?;

    let engine = SupportEngine::new(provider, kb, &config);

    print_startup_summary(&config, &engine);

    // Shared shutdown token — Ctrl-C cancels it, the console loop watches it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    console::run(engine, &config, shutdown).await?;

    use std::io::Write as _;
    println!("\nThanks for visiting {} :)", config.business.name);
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();

    Ok(())
}

fn print_startup_summary(config: &config::Config, engine: &SupportEngine) {
    let kb = engine.knowledge().summary();
    let escalation = if config.support.enable_escalation {
        format!("on (threshold {})", config.support.confidence_threshold)
    } else {
        "off".to_string()
    };

    let fit = |text: String| -> String {
        const WIDTH: usize = 56;
        let char_count = text.chars().count();
        if char_count >= WIDTH {
            let mut out = text.chars().take(WIDTH - 1).collect::<String>();
            out.push('…');
            out
        } else {
            format!("{text:<WIDTH$}")
        }
    };

    println!("╔═══════════════════════════════════════════════════════════╗");
    println!("║ 🤖 {}║", fit(format!("{} — ready", config.bot_name)));
    println!("╟───────────────────────────────────────────────────────────╢");
    println!(
        "║ 🧠 {}║",
        fit(format!(
            "llm: provider={} model={} timeout={}s",
            config.llm.provider, config.llm.openai.model, config.llm.openai.timeout_seconds
        ))
    );
    println!(
        "║ 📚 {}║",
        fit(format!(
            "knowledge: {} sections, {} bytes",
            kb.total_sections, kb.total_size
        ))
    );
    println!("║ 🚩 {}║", fit(format!("escalation: {escalation}")));
    println!(
        "║ 📧 {}║",
        fit(format!(
            "human support: {} / {}",
            config.business.support_email, config.business.support_phone
        ))
    );
    println!("╚═══════════════════════════════════════════════════════════╝");
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: techhub-bot [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    // Each -v raises verbosity one tier from the config default:
    //   -v      → warn   (suppress info noise, show warnings+errors only)
    //   -vv     → info   (normal operational output — the typical default)
    //   -vvv    → debug  (flow-level diagnostics: prompts, provider calls)
    //   -vvvv+  → trace  (full payload dumps, very verbose)
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, config_path }
}
