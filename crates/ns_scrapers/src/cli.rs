use clap::{Args, Subcommand};
use ns_core::{Result, SourceStore};
use crate::manager::ScraperManager;
use crate::report::{format_run_report, format_source};

#[derive(Args, Debug, Clone)]
pub struct ScraperArgs {
    #[command(subcommand)]
    pub command: ScraperCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScraperCommands {
    /// Scrape front pages and store the articles found
    Scrape {
        /// Source names to scrape (e.g. lanacion infobae). If not specified, scrapes all enabled sources.
        names: Vec<String>,
    },
    /// List configured sources
    Sources,
    /// List available parsers
    Parsers,
}

/// Run a command against `manager`, printing results to stdout.
/// Returns `false` when any requested source failed.
pub async fn handle_command(args: ScraperArgs, manager: &ScraperManager) -> Result<bool> {
    match args.command {
        ScraperCommands::Scrape { names } => {
            let report = manager.run(&names).await?;
            println!("{}", format_run_report(&report));
            Ok(report.succeeded())
        }
        ScraperCommands::Sources => {
            let sources = manager.storage().list_sources().await?;
            if sources.is_empty() {
                println!("No sources configured");
            }
            for source in &sources {
                println!("{}", format_source(source));
            }
            Ok(true)
        }
        ScraperCommands::Parsers => {
            println!("Available parsers:");
            for name in manager.registry().names() {
                println!("  {}", name);
            }
            Ok(true)
        }
    }
}
