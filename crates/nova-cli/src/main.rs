use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use nova_client::{ChatClient, ClientConfig};
use nova_core::Role;
use nova_session::{ChatSession, HistoryLoad, SessionEvent};
use nova_store::{Category, HistoryItem, JsonFileStorage, StoreManager};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "nova")]
#[command(about = "Streaming chat client for OpenAI-compatible completion APIs")]
#[command(version)]
struct Cli {
    /// API key; persisted to the settings file when provided
    #[arg(long, env = "NOVA_API_KEY")]
    api_key: Option<String>,

    /// Model identifier; persisted to the settings file when provided
    #[arg(long)]
    model: Option<String>,

    /// Completion API base URL
    #[arg(long, default_value = "https://api.siliconflow.cn/v1")]
    base_url: String,

    /// Settings file path (defaults to ~/.nova/settings.json)
    #[arg(long, env = "NOVA_SETTINGS")]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let storage = match &cli.settings {
        Some(path) => JsonFileStorage::new(path),
        None => JsonFileStorage::at_default_path().context("resolving settings path")?,
    };
    let store = StoreManager::load(Arc::new(storage))
        .await
        .context("loading settings")?;

    if let Some(key) = &cli.api_key {
        store.set_api_key(key).await?;
    }
    if let Some(model) = &cli.model {
        store.set_selected_model(model).await?;
    }

    let config = ClientConfig::new(&cli.base_url)
        .with_api_key(store.api_key())
        .with_model(store.selected_model());
    let transport = Arc::new(ChatClient::new(config)?);

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let session = Arc::new(ChatSession::new(store.clone(), transport, Some(event_tx)));

    spawn_renderer(session.clone(), event_rx);

    println!("{}", "Nova Chat".bold());
    println!(
        "{}",
        format!("model: {} (/help for commands)", store.selected_model()).dimmed()
    );

    repl(session, store).await
}

/// Prints streamed characters as the typewriter reveals them.
fn spawn_renderer(
    session: Arc<ChatSession>,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
) {
    tokio::spawn(async move {
        let mut printed = 0usize;
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Updated => {
                    if let Some(message) = session.streaming_message() {
                        let text = message.display_text().to_string();
                        let suffix: String = text.chars().skip(printed).collect();
                        if !suffix.is_empty() {
                            print!("{}", suffix);
                            let _ = std::io::stdout().flush();
                            printed = text.chars().count();
                        }
                    }
                }
                SessionEvent::Settled { .. } => {
                    println!();
                    printed = 0;
                }
                SessionEvent::Failed { message } => {
                    println!("{}", message.red());
                    printed = 0;
                }
            }
        }
    });
}

async fn repl(session: Arc<ChatSession>, store: Arc<StoreManager>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt();
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(command, &session, &store).await? {
                break;
            }
        } else {
            print!("{} ", "nova>".cyan().bold());
            let _ = std::io::stdout().flush();
            session.submit(line, None).await?;
        }
        prompt();
    }

    Ok(())
}

/// Dispatch a `/command`; returns false when the REPL should exit.
async fn handle_command(
    command: &str,
    session: &Arc<ChatSession>,
    store: &Arc<StoreManager>,
) -> anyhow::Result<bool> {
    let (name, rest) = match command.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "quit" | "exit" => return Ok(false),
        "history" => print_history(&store.history_by_category()),
        "search" => {
            if rest.is_empty() {
                println!("usage: /search <query>");
            } else {
                print_history(&store.search_history(rest));
            }
        }
        "load" => match store.find_history(rest) {
            Some(item) => {
                session.load_history(HistoryLoad::from_item(item)).await?;
                print_transcript(session);
            }
            None => println!("no conversation with id {}", rest),
        },
        "remove" => {
            store.remove_history(rest).await?;
            println!("removed {}", rest);
        }
        "clear" => {
            store.clear_history().await?;
            println!("history cleared");
        }
        "help" => {
            println!("/history           list stored conversations");
            println!("/search <query>    filter history by title or summary");
            println!("/load <id>         continue a stored conversation");
            println!("/remove <id>       delete one conversation");
            println!("/clear             delete all conversations");
            println!("/quit              exit");
        }
        other => println!("unknown command: /{} (try /help)", other),
    }

    Ok(true)
}

fn print_history(history: &BTreeMap<Category, Vec<HistoryItem>>) {
    let mut empty = true;
    for (category, items) in history {
        if items.is_empty() {
            continue;
        }
        empty = false;
        println!("{}", category.to_string().blue().bold());
        for item in items {
            println!(
                "  {}  {}  {}",
                item.id.dimmed(),
                item.title.bold(),
                item.date.format("%Y-%m-%d %H:%M").to_string().dimmed()
            );
            println!("      {}", item.summary.dimmed());
        }
    }
    if empty {
        println!("{}", "no stored conversations".dimmed());
    }
}

fn print_transcript(session: &Arc<ChatSession>) {
    for message in session.messages() {
        let label = match message.role {
            Role::User => "you ".green().bold(),
            Role::Assistant => "nova".cyan().bold(),
        };
        if message.error {
            println!("{} {}", label, message.display_text().red());
        } else {
            println!("{} {}", label, message.display_text());
        }
    }
}

fn prompt() {
    print!("{} ", "you>".green().bold());
    let _ = std::io::stdout().flush();
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
