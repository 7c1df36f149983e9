use anyhow::Context;
use blog_search::{
    config::{Config, ObservabilityConfig},
    models::ContentRecord,
    search::{HealthStatus, SearchFilters, SearchService, SyncAction},
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use validator::Validate;

#[derive(Parser)]
#[command(name = "blog-search")]
#[command(about = "Blog search index administration", long_about = None, version)]
struct Cli {
    /// Configuration file (overrides BLOG_SEARCH_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the index if missing
    CreateIndex {
        /// Also load every published record
        #[arg(short, long)]
        populate: bool,
    },

    /// Drop the index and repopulate it from the content store
    Rebuild,

    /// Delete the index directory
    DropIndex,

    /// Run a search
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        #[arg(short, long)]
        category: Option<String>,

        /// Earliest publication date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Latest publication date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(short, long, default_value = "1")]
        page: usize,

        #[arg(short = 's', long)]
        per_page: Option<usize>,

        /// Append the query to the query log
        #[arg(long)]
        record: bool,
    },

    /// Autocomplete a partial query
    Suggest {
        #[arg(value_name = "PARTIAL")]
        partial: String,

        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Most frequent queries
    Popular {
        #[arg(short, long, default_value = "10")]
        limit: usize,

        #[arg(short, long, default_value = "30")]
        days: i64,
    },

    /// Coverage and query volume
    Stats,

    /// Index health report (exit code 2 when critical)
    Health,

    /// Load content records from a JSON array and index them
    Import {
        #[arg(value_name = "JSON_FILE")]
        file: PathBuf,
    },
}

#[derive(Serialize)]
struct ImportSummary {
    imported: usize,
    indexed: usize,
    skipped: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        std::env::set_var("BLOG_SEARCH_CONFIG", path);
    }
    let config = Config::load().context("Failed to load configuration")?;

    init_tracing(&config.observability);

    if config.observability.prometheus_enabled {
        if let Err(e) = blog_search::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
        }
    }

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.store.backend,
        index_path = ?config.search.index_path,
        "Starting blog-search"
    );

    let service = SearchService::from_config(&config)
        .await
        .context("Failed to open search service")?;

    match cli.command {
        Commands::CreateIndex { populate } => {
            let indexed = service.create_index(populate).await?;
            print_json(&serde_json::json!({ "created": true, "indexed": indexed }))?;
        }

        Commands::Rebuild => {
            let indexed = service.rebuild_index().await?;
            print_json(&serde_json::json!({ "rebuilt": true, "indexed": indexed }))?;
        }

        Commands::DropIndex => {
            service.drop_index().await?;
            print_json(&serde_json::json!({ "dropped": true }))?;
        }

        Commands::Search {
            query,
            category,
            from,
            to,
            page,
            per_page,
            record,
        } => {
            let filters = SearchFilters {
                category,
                date_from: from,
                date_to: to,
            };
            let per_page = per_page.unwrap_or(service.config().default_per_page);

            let result = service.search(&query, &filters, page, per_page).await;
            if record {
                service
                    .log_query(&query, result.total_results as u64, None, Some("blog-search-cli".into()))
                    .await;
            }
            print_json(&result)?;
        }

        Commands::Suggest { partial, limit } => {
            print_json(&service.suggest(&partial, limit).await)?;
        }

        Commands::Popular { limit, days } => {
            print_json(&service.popular(limit, days).await?)?;
        }

        Commands::Stats => {
            print_json(&service.get_stats().await?)?;
        }

        Commands::Health => {
            let report = service.health().await;
            print_json(&report)?;
            if report.status == HealthStatus::Critical {
                std::process::exit(2);
            }
        }

        Commands::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let records: Vec<ContentRecord> =
                serde_json::from_str(&raw).context("Expected a JSON array of content records")?;

            let summary = import(&service, records).await?;
            print_json(&summary)?;
        }
    }

    Ok(())
}

async fn import(service: &SearchService, records: Vec<ContentRecord>) -> anyhow::Result<ImportSummary> {
    let store = service.content_store();
    let mut summary = ImportSummary {
        imported: 0,
        indexed: 0,
        skipped: 0,
    };

    for record in records {
        if let Err(e) = record.validate() {
            tracing::warn!(content_id = record.id, error = %e, "Skipping invalid record");
            summary.skipped += 1;
            continue;
        }

        store.save_content(&record).await?;
        summary.imported += 1;

        if service.index_content(&record).await? == SyncAction::Indexed {
            summary.indexed += 1;
        }
    }

    tracing::info!(
        imported = summary.imported,
        indexed = summary.indexed,
        skipped = summary.skipped,
        "Import finished"
    );
    Ok(summary)
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("blog_search={}", observability.log_level).into());

    // Logs go to stderr so stdout stays valid JSON
    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
