//! DOKI: multilingual health-assistant chat relay.

use std::path::PathBuf;
use std::sync::Arc;

use doki_chat::{Language, LLMConfig};
use doki_core::DokiConfig;
use doki_server::{build_router, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("DOKI_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn print_help() {
    println!("DOKI: multilingual health-assistant chat relay");
    println!();
    println!("Usage: doki [command]");
    println!();
    println!("Commands:");
    println!("  (none)                   Start the server");
    println!("  prompt [language]        Print the system instruction for a language");
    println!("  languages                List supported language codes");
    println!("  help                     Show this help message");
    println!();
    println!("Environment:");
    println!("  DEEPSEEK_API_KEY         Provider API key");
    println!("  DEEPSEEK_BASE_URL        Provider base URL (default https://api.deepseek.com)");
    println!("  DOKI_STREAM_FORMAT       Response framing: data (default) | text");
    println!("  DOKI_DATA_DIR            Directory holding llm-config.json (default ./data)");
    println!("  HOST, PORT               Listen address (default 0.0.0.0:3000)");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "prompt" => {
                let language = Language::resolve(args.get(2).map(String::as_str));
                println!("{}", language.system_instruction());
                return Ok(());
            }
            "languages" => {
                for lang in Language::all() {
                    println!("{:<10} {}", lang.code(), lang.display_name());
                }
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'doki help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = DokiConfig::from_env(&data_dir);
    let addr = config.bind_addr();

    let state = Arc::new(AppState::new(&config));
    log_provider(state.relay.config());

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("DOKI server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_provider(config: &LLMConfig) {
    if config.is_configured() {
        info!(
            "Chat provider at {} ({} framing)",
            config.base_url, config.stream_format
        );
    } else {
        warn!("DEEPSEEK_API_KEY not set; /api/chat will answer 500 until configured");
    }
}
