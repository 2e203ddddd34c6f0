//! FlexiMart catalog CLI
//!
//! Loads the product catalog into MongoDB (or process memory) and runs the
//! catalog queries against it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::{InMemoryProductRepository, LoadMode, MongoProductRepository, ProductService};
use eyre::Result;
use tracing::info;

mod commands;
mod config;
mod report;

use config::{Backend, Config, Overrides};
use report::Output;

#[derive(Parser)]
#[command(name = "fleximart")]
#[command(about = "Load and query the FlexiMart product catalog")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Catalog store (overrides FLEXIMART_BACKEND)
    #[arg(long, value_enum, global = true)]
    backend: Option<Backend>,

    /// MongoDB connection string (overrides MONGODB_URL)
    #[arg(long, global = true)]
    mongo_url: Option<String>,

    /// Database name (overrides MONGODB_DATABASE)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Collection name (overrides FLEXIMART_COLLECTION)
    #[arg(long, global = true)]
    collection: Option<String>,

    /// Catalog JSON file (overrides FLEXIMART_CATALOG)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bulk load the catalog file
    Load {
        /// Catalog file to read. Defaults to the configured catalog.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Keep existing products instead of replacing them
        #[arg(long)]
        append: bool,
    },

    /// Products in a category priced below a ceiling
    Electronics {
        #[arg(long, default_value = "Electronics")]
        category: String,

        /// Exclusive price ceiling
        #[arg(long, default_value_t = 50000.0)]
        max_price: f64,
    },

    /// Products whose average review rating meets a floor
    TopRated {
        #[arg(long, default_value_t = 4.0)]
        min_rating: f64,
    },

    /// Append a review to a product
    AddReview {
        #[arg(long)]
        product_id: String,

        #[arg(long)]
        user_id: String,

        #[arg(long)]
        username: String,

        /// Star rating, 1 to 5
        #[arg(long)]
        rating: i32,

        #[arg(long, default_value = "")]
        comment: String,

        /// Review time (RFC 3339). Defaults to now.
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },

    /// Price statistics per category
    Categories,

    /// Products with stock below a threshold
    LowStock {
        #[arg(long, default_value_t = 50)]
        threshold: i64,
    },

    /// Products carrying a tag
    Tag { tag: String },

    /// Products whose name starts with a prefix, ignoring case
    NamePrefix { prefix: String },

    /// Products with more than N reviews
    ReviewCount {
        #[arg(long, default_value_t = 3)]
        more_than: u64,
    },

    /// The newest reviews across all products
    RecentReviews {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// Full-text search over name and description
    Search {
        text: String,

        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// Show one product with its reviews
    Show { product_id: String },

    /// Create the catalog indexes
    Indexes,

    /// Check that the store answers
    Health,

    /// Load the catalog and run the core operations in sequence
    Demo {
        /// Catalog file to read. Defaults to the configured catalog.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Write a plain-text summary of the run here
        #[arg(long)]
        results_file: Option<PathBuf>,
    },
}

impl Commands {
    /// Whether the command brings its own catalog data
    fn loads_catalog(&self) -> bool {
        matches!(self, Commands::Load { .. } | Commands::Demo { .. })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();

    let config = Config::from_env()?.apply(Overrides {
        backend: cli.global.backend,
        mongo_url: cli.global.mongo_url,
        database: cli.global.database,
        collection: cli.global.collection,
        catalog: cli.global.catalog,
    });
    init_tracing(&config.environment);

    let output = Output {
        json: cli.global.json,
    };

    match config.backend {
        Backend::Mongo => {
            info!(url = %config.mongodb.redacted_url(), "Connecting to database...");
            let client =
                database::mongodb::connect_from_config_with_retry(&config.mongodb, None)
                    .await
                    .map_err(|e| eyre::eyre!("Database connection failed: {}", e))?;

            if let Commands::Health = cli.command {
                let status = database::mongodb::check_health_detailed(&client).await;
                return output.emit(&status, |s| {
                    format!(
                        "MongoDB {} ({} ms){}\n",
                        if s.healthy { "healthy" } else { "unhealthy" },
                        s.response_time_ms,
                        s.message
                            .as_deref()
                            .map(|m| format!(": {}", m))
                            .unwrap_or_default()
                    )
                });
            }

            let db = client.database(config.mongodb.database());
            let service =
                ProductService::new(MongoProductRepository::with_collection(&db, &config.collection));
            commands::run(&service, cli.command, &config, output).await
        }
        Backend::Memory => {
            let service = ProductService::new(InMemoryProductRepository::new());
            if !cli.command.loads_catalog() {
                let products = domain_products::read_catalog_file(&config.catalog).await?;
                service.load_products(products, LoadMode::Replace).await?;
            }
            commands::run(&service, cli.command, &config, output).await
        }
    }
}
