//! Quorum API server binary.
//!
//! Usage:
//!   quorum-api --config config.toml
//!   quorum-api --port 8080
//!   quorum-api --port 8080 --bind 0.0.0.0
//!
//! # Environment Variables
//!
//! - `OPENAI_API_KEY` - OpenAI API key (when not set in config)
//! - `TAVILY_API_KEY` - Tavily search API key (when not set in config)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use quorum_api::{serve, AppState};
use quorum_graph::{build_graph, GraphConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,quorum_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut port: u16 = 8080;
    let mut bind_addr: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut static_dir = PathBuf::from("./static");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1].parse().expect("Invalid port number");
                    i += 1;
                }
            }
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    bind_addr = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--static-dir" => {
                if i + 1 < args.len() {
                    static_dir = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Quorum API Server");
                println!();
                println!("Usage: quorum-api [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --port <PORT>        Port to listen on (default: 8080)");
                println!("  -b, --bind <ADDR>        Bind address (default: 127.0.0.1)");
                println!("  -c, --config <FILE>      Path to config.toml file");
                println!("      --static-dir <DIR>   Directory with the chat page (default: ./static)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => GraphConfig::from_file(&path)?,
        None => GraphConfig::default(),
    };

    let graph = build_graph(&config)?;
    let state = Arc::new(AppState::new(graph));

    let bind = bind_addr.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;

    serve(state, &static_dir, addr).await
}
