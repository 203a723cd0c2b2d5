use app_catalog_search::{
    catalog::CatalogService,
    config::{Config, ObservabilityConfig},
    error::AppError,
    search::{ResultEnvelope, SearchRequest, SearchService, SortMode},
    state::InMemoryStore,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "catalog-search")]
#[command(about = "Search the demo app catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search apps
    Search {
        /// Search text; wrap in double quotes for an exact phrase
        #[arg(value_name = "QUERY")]
        query: String,

        /// Only apps supporting this device
        #[arg(short, long)]
        device: Option<String>,

        /// Category facet selection
        #[arg(short, long)]
        category: Option<String>,

        /// Price-range facet selection, e.g. "1.0 to 5.0"
        #[arg(short, long)]
        price_range: Option<String>,

        /// relevance, name or name-reverse
        #[arg(short, long, default_value = "relevance")]
        sort: String,

        /// Index of the first result
        #[arg(short, long, default_value = "0")]
        offset: usize,

        /// Print the result envelope as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show full details of an app
    Show {
        #[arg(value_name = "APP_ID")]
        id: u64,
    },
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("app_catalog_search={}", observability.log_level).into()
    });

    if observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config.observability);

    if let Err(e) = run(cli, config).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli, config: Config) -> Result<(), AppError> {
    tracing::info!("Starting catalog search v{}", env!("CARGO_PKG_VERSION"));

    let search = Arc::new(SearchService::new(config.search).await?);
    let catalog = CatalogService::new(Arc::new(InMemoryStore::new()), search);
    let loaded = catalog.load_demo_data().await?;
    tracing::info!(apps = loaded, "Demo catalog loaded");

    match cli.command {
        Commands::Search {
            query,
            device,
            category,
            price_range,
            sort,
            offset,
            json,
        } => {
            let mut request = SearchRequest::new(query)
                .with_sort(SortMode::parse(&sort))
                .with_offset(offset);
            if let Some(device) = device {
                request = request.with_device(device);
            }
            if let Some(category) = category {
                request = request.with_category(category);
            }
            if let Some(price_range) = price_range {
                request = request.with_price_range(price_range);
            }

            let envelope = catalog.search(&request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            } else {
                print_envelope(&envelope);
            }
        }
        Commands::Show { id } => {
            let app = catalog.app_details(id).await?;
            println!("{}", serde_json::to_string_pretty(&app)?);
        }
    }

    Ok(())
}

fn print_envelope(envelope: &ResultEnvelope) {
    println!(
        "{} matching apps ({}ms){}",
        envelope.total_hits,
        envelope.search_time_ms,
        if envelope.timed_out { ", partial results" } else { "" }
    );

    for (position, record) in envelope.records.iter().enumerate() {
        println!(
            "{:>3}. [{}] {} ({})",
            envelope.request.page_offset + position + 1,
            record.id,
            record.name,
            record.image
        );
    }

    for facet in [&envelope.category_facets, &envelope.price_range_facets] {
        if facet.buckets.is_empty() {
            continue;
        }
        println!("\n{}:", facet.name);
        for bucket in &facet.buckets {
            println!("  {} ({})", bucket.label, bucket.count);
        }
    }
}
