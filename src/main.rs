//! Tenderctl CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tenderctl::cli::{commands, handle_error, Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let ctx = match commands::build_context(cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(err) => handle_error(&err, cli.json),
    };

    let result = match cli.command {
        Commands::Health => commands::health::execute(&ctx, cli.json).await,
        Commands::List(args) => commands::list::execute(args, &ctx, cli.json).await,
        Commands::Show(args) => commands::show::execute(args, &ctx, cli.json).await,
        Commands::Analyze(args) => commands::analyze::execute(args, &ctx, cli.json).await,
        Commands::Ask(args) => commands::ask::execute(args, &ctx, cli.json).await,
        Commands::Scraper(args) => commands::scraper::execute(args, &ctx, cli.json).await,
        Commands::Watch(args) => commands::watch::execute(args, &ctx, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(&err, cli.json);
    }
}
