use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rabbit_ideas_mcp::{
    cli::{Cli, Command, SaveArguments, StoreArguments},
    error::{ServiceError, ServiceResult},
    ideas::{IdeaRepository, parse_drafts},
    metadata::{PKG_NAME, PKG_VERSION},
    runtime,
    status::StatusCache,
};

#[tokio::main]
async fn main() -> ServiceResult<()> {
    // stdout carries the stdio protocol, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().into_command() {
        Command::Start(args) => runtime::start_server(args).await,
        Command::Save(args) => save_from_cli(args),
        Command::Stats(args) => print_stats(args),
        Command::Version => {
            println!("{PKG_NAME} {PKG_VERSION}");
            Ok(())
        }
    }
}

fn save_from_cli(args: SaveArguments) -> ServiceResult<()> {
    let raw: serde_json::Value = serde_json::from_str(&args.ideas_json)
        .map_err(|e| ServiceError::Validation(format!("Ideas are not valid JSON: {e}")))?;
    let drafts = parse_drafts(&raw)?;
    let store = args.store.store();
    let outcome = IdeaRepository::new(&store).append(drafts)?;
    println!(
        "{} Successfully saved {} ideas. Total ideas: {}",
        "✔".green(),
        outcome.saved_count,
        outcome.total_ideas
    );
    Ok(())
}

fn print_stats(args: StoreArguments) -> ServiceResult<()> {
    let store = args.store();
    let stats = StatusCache::new(&store).stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
