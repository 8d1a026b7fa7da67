use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use clap::Parser;
use ns_core::config::DEFAULT_DATABASE_PATH;
use ns_core::{Settings, StorageKind};
use ns_scrapers::cli::{handle_command, ScraperArgs, ScraperCommands as NsScraperCommands};
use ns_scrapers::{create_fetcher, init_logging, ParserRegistry, ScraperManager};
use tracing::{error, info};

/// A duration such as `30s`, `1m30s`, `500ms` or `2h`. A bare number is
/// read as seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total = Duration::ZERO;
        let mut chars = s.trim().chars().peekable();
        let mut parsed_any = false;

        while chars.peek().is_some() {
            let mut number = String::new();
            while let Some(c) = chars.peek().filter(|c| c.is_ascii_digit()) {
                number.push(*c);
                chars.next();
            }
            if number.is_empty() {
                return Err(format!("Invalid duration: {}", s));
            }
            let value: u64 = number
                .parse()
                .map_err(|_| format!("Invalid number in duration: {}", number))?;

            let mut unit = String::new();
            while let Some(c) = chars.peek().filter(|c| c.is_ascii_alphabetic()) {
                unit.push(*c);
                chars.next();
            }
            let seconds_per_unit = match unit.as_str() {
                "ms" => None,
                "" | "s" => Some(1),
                "m" => Some(60),
                "h" => Some(3600),
                "d" => Some(86400),
                other => return Err(format!("Invalid duration unit: {}", other)),
            };
            let part = match seconds_per_unit {
                Some(factor) => value.checked_mul(factor).map(Duration::from_secs),
                None => Some(Duration::from_millis(value)),
            };
            total = part
                .and_then(|part| total.checked_add(part))
                .ok_or_else(|| format!("Duration too large: {}", s))?;
            parsed_any = true;
        }

        if !parsed_any {
            return Err("Duration must include a number".to_string());
        }
        Ok(HumanDuration(total))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape news front pages and track their headlines", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Storage backend: sqlite or memory
    #[arg(long, env = "NS_STORAGE", default_value = "sqlite", global = true)]
    storage: StorageKind,
    /// SQLite database file
    #[arg(long, env = "NS_DATABASE", default_value = DEFAULT_DATABASE_PATH, global = true)]
    database: PathBuf,
    /// Page fetch timeout (e.g. 30s, 1m)
    #[arg(long, env = "NS_FETCH_TIMEOUT", default_value = "30s", global = true)]
    timeout: HumanDuration,
    /// User agent sent when fetching pages
    #[arg(long, env = "NS_USER_AGENT", global = true)]
    user_agent: Option<String>,
    /// Render pages in headless Chrome (needs the `browser` feature)
    #[arg(long, global = true)]
    browser: bool,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = Settings {
            storage: self.storage,
            database_path: self.database.clone(),
            fetch_timeout: self.timeout.0,
            use_browser: self.browser,
            ..Settings::default()
        };
        if let Some(user_agent) = &self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        settings
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Scrape front pages and store the articles found
    Scrape {
        /// Source names to scrape. If not specified, scrapes all enabled sources.
        names: Vec<String>,
        /// Keep running, scraping again after each interval (e.g. 1h, 30m, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// List configured sources
    Sources,
    /// List available parsers
    Parsers,
}

fn scraper_args(command: NsScraperCommands) -> ScraperArgs {
    ScraperArgs { command }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let settings = cli.settings();

    let storage = ns_storage::create_storage(&settings).await?;
    let fetcher = create_fetcher(&settings)?;
    let registry = ParserRegistry::with_default_parsers()?;
    info!(parsers = %registry.names().join(", "), "Parsers registered");

    let manager = ScraperManager::new(storage, fetcher, registry)
        .with_fetch_timeout(settings.fetch_timeout);

    match cli.command {
        Commands::Scrape { names, interval: Some(interval) } => {
            info!(seconds = interval.0.as_secs(), "Running in periodic mode");
            loop {
                info!("Starting scrape cycle");
                let args = scraper_args(NsScraperCommands::Scrape { names: names.clone() });
                if let Err(e) = handle_command(args, &manager).await {
                    error!(error = %e, "Scrape cycle failed");
                }
                info!(seconds = interval.0.as_secs(), "Waiting before next scrape");
                tokio::time::sleep(interval.0).await;
            }
        }
        Commands::Scrape { names, interval: None } => {
            let args = scraper_args(NsScraperCommands::Scrape { names });
            Ok(handle_command(args, &manager).await?)
        }
        Commands::Sources => Ok(handle_command(scraper_args(NsScraperCommands::Sources), &manager).await?),
        Commands::Parsers => Ok(handle_command(scraper_args(NsScraperCommands::Parsers), &manager).await?),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Values from .env feed the clap env fallbacks.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_human_duration() {
        let parse = |s: &str| s.parse::<HumanDuration>().map(|d| d.0);
        assert_eq!(parse("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse("45"), Ok(Duration::from_secs(45)));
        assert_eq!(parse("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse("1h15m30s"), Ok(Duration::from_secs(4530)));
        assert_eq!(parse("500ms"), Ok(Duration::from_millis(500)));
        assert!(parse("").is_err());
        assert!(parse("10x").is_err());
        assert!(parse("m").is_err());
    }

    #[test]
    fn test_human_duration_rejects_overflow() {
        let parse = |s: &str| s.parse::<HumanDuration>().map(|d| d.0);
        assert!(parse("999999999999999999d").is_err());
        assert!(parse("18446744073709551615s1s").is_err());
        assert_eq!(
            parse("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scrape_command() {
        let cli = Cli::try_parse_from([
            "ns", "--storage", "memory", "--timeout", "5s", "scrape", "lanacion", "infobae",
        ])
        .unwrap();
        let settings = cli.settings();
        assert_eq!(settings.storage, StorageKind::Memory);
        assert_eq!(settings.fetch_timeout, Duration::from_secs(5));
        match cli.command {
            Commands::Scrape { names, interval } => {
                assert_eq!(names, vec!["lanacion", "infobae"]);
                assert!(interval.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_storage() {
        assert!(Cli::try_parse_from(["ns", "--storage", "qdrant", "sources"]).is_err());
    }
}
