//! indexer-console: desktop console for a torznab indexer backend
//!
//! Usage:
//!   indexer-console                      - Open the console window
//!   indexer-console login <passphrase>   - Log in and store the token
//!   indexer-console list                 - List indexers
//!   indexer-console help                 - Show all commands

mod app;
mod backend;
mod banner;
mod commands;
mod config;
mod form;
mod registry;
mod row;
mod search;
mod session;

#[cfg(test)]
mod testing;

use std::env;
use std::process::ExitCode;

use app::Console;
use backend::error::Result;
use commands::Command;
use config::ConsoleConfig;
use iced::Size;
use registry::IndexerRegistry;
use session::SessionStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    // Initialize logging (try_init so a second call is harmless)
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = Command::parse(&args);

    let registry = match build_registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match command {
        Command::Gui => match start_gui(registry) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("Console window failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Command::Help => {
            println!("{}", Command::help_text());
            ExitCode::SUCCESS
        }
        Command::Invalid { message } => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
        command => {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Error: failed to create tokio runtime: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            match rt.block_on(handle_cli_command(&registry, command)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn build_registry() -> Result<IndexerRegistry> {
    let config = ConsoleConfig::load()?;
    let session = SessionStore::open(config.storage_path())?;
    tracing::debug!("Using backend at {}", config.resolve("/"));
    Ok(IndexerRegistry::new(config, session))
}

async fn handle_cli_command(registry: &IndexerRegistry, command: Command) -> Result<()> {
    match command {
        Command::Login { passphrase } => {
            session::login(registry.backend(), registry.session(), &passphrase).await?;
            println!("Logged in");
        }
        Command::Logout => {
            registry.session().clear()?;
            println!("Logged out");
        }
        Command::List => {
            require_session(registry)?;
            let indexers = registry.load_indexers().await?;
            for indexer in &indexers {
                println!(
                    "{:<20} {:<30} {:<8} {}",
                    indexer.id,
                    indexer.name,
                    if registry.is_enabled(&indexer.id) { "enabled" } else { "-" },
                    indexer.torznab_feed().unwrap_or_default()
                );
            }
        }
        Command::Config { indexer_id } => {
            require_session(registry)?;
            for (key, value) in registry.fetch_config(&indexer_id).await?.iter() {
                println!("{} = {}", key, value);
            }
        }
        Command::Test { indexer_id } => {
            let indexer = find_indexer(registry, &indexer_id).await?;
            let outcome = registry.test_indexer(&indexer).await?;
            if outcome.ok {
                println!("{}: OK", indexer.name);
            } else {
                println!("{}: Failed ({})", indexer.name, outcome.error.unwrap_or_default());
            }
        }
        Command::Disable { indexer_id } => {
            let indexer = find_indexer(registry, &indexer_id).await?;
            registry.disable_indexer(&indexer).await?;
            println!("{} disabled", indexer.name);
        }
        Command::Search { indexer_id, keywords } => {
            let indexer = find_indexer(registry, &indexer_id).await?;
            let results = registry.search(&indexer, &keywords).await?;
            for result in &results {
                println!(
                    "{:>10}  {:>4}/{:<4}  {}",
                    search::format_file_size(result.size),
                    result.seeders,
                    result.peers,
                    result.title
                );
            }
            println!("{} results", results.len());
        }
        Command::Gui | Command::Help | Command::Invalid { .. } => {}
    }
    Ok(())
}

fn require_session(registry: &IndexerRegistry) -> Result<()> {
    if registry.session().is_authenticated() {
        Ok(())
    } else {
        Err(backend::error::ConsoleError::Auth(
            "Not logged in. Run 'indexer-console login <passphrase>' first".to_string(),
        ))
    }
}

async fn find_indexer(registry: &IndexerRegistry, id: &str) -> Result<backend::types::Indexer> {
    require_session(registry)?;
    registry.load_indexers().await?;
    registry
        .get(id)
        .ok_or_else(|| backend::error::ConsoleError::Backend(format!("Unknown indexer {}", id)))
}

fn start_gui(registry: IndexerRegistry) -> iced::Result {
    tracing::info!("Starting indexer console");

    iced::application(Console::title, Console::update, Console::view)
        .subscription(Console::subscription)
        .theme(Console::theme)
        .window_size(Size::new(1100.0, 700.0))
        .antialiasing(true)
        .run_with(move || Console::new(registry))
}
