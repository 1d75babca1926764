/// BE Checker - command line front end
use be_checker::{error::CheckResult, metrics, BanChecker, CheckerConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "be-checker", version, about = "Check a player's BattlEye ban status")]
struct Cli {
    /// After the command, print Prometheus metrics recorded during this run to stderr
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check ban status, using the identifier cache
    Check { identifier: String },
    /// Check ban status, bypassing the identifier cache
    ForceCheck { identifier: String },
    /// Remove every cached identifier
    ClearCache,
    /// Show cache size and recent entries
    CacheStatus,
}

#[tokio::main]
async fn main() -> CheckResult<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "be_checker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = CheckerConfig::from_env()?;
    let checker = BanChecker::from_config(&config)?;

    match cli.command {
        Command::Check { identifier } => run_check(&checker, &identifier, true).await,
        Command::ForceCheck { identifier } => run_check(&checker, &identifier, false).await,
        Command::ClearCache => {
            let removed = checker.clear_cache().await;
            println!("Cache cleared, {} entries removed", removed);
        }
        Command::CacheStatus => {
            let stats = checker.cache_stats().await;
            if let Some(path) = checker.cache().snapshot_path() {
                println!("Snapshot: {}", path.display());
            }
            println!("Cached entries: {}", stats.size);
            if stats.sample.is_empty() {
                println!("Cache is empty");
            } else {
                println!("Recent entries (up to 10):");
                for (identifier, rid) in stats.sample {
                    println!("  - {} -> RID: {}", identifier, rid);
                }
            }
        }
    }

    // Counters start at zero in every process, so this only covers the command above
    if cli.metrics {
        eprint!("{}", metrics::render_metrics());
    }

    Ok(())
}

async fn run_check(checker: &BanChecker, identifier: &str, use_cache: bool) {
    let outcome = checker.resolve_and_check(identifier, use_cache).await;
    if outcome.ok {
        println!("{}", outcome.message);
    } else {
        println!("query failed: {}", outcome.message);
    }
}
