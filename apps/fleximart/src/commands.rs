//! Command execution over any catalog backend

use std::path::{Path, PathBuf};

use chrono::Utc;
use domain_products::{LoadMode, NewReview, ProductRepository, ProductService, read_catalog_file};
use eyre::{Result, WrapErr};
use serde::Serialize;
use tracing::info;

use crate::Commands;
use crate::config::Config;
use crate::report::{self, DemoSummary, Output, StepOutcome};

/// Product and review appended by the demo run
const DEMO_PRODUCT: &str = "ELEC001";

fn demo_review() -> NewReview {
    NewReview {
        user_id: "U999".to_string(),
        username: "NewReviewer".to_string(),
        rating: 4,
        comment: "Good value".to_string(),
        date: None,
    }
}

#[derive(Serialize)]
struct ReviewAdded<'a> {
    product_id: &'a str,
    review_count: usize,
}

#[derive(Serialize)]
struct IndexesCreated {
    indexes: Vec<String>,
}

#[derive(Serialize)]
struct StoreHealth {
    healthy: bool,
    products: u64,
}

async fn load<R: ProductRepository>(
    service: &ProductService<R>,
    path: &Path,
    mode: LoadMode,
) -> Result<domain_products::LoadReport> {
    let products = read_catalog_file(path).await?;
    service
        .load_products(products, mode)
        .await
        .wrap_err_with(|| format!("loading {}", path.display()))
}

pub async fn run<R: ProductRepository>(
    service: &ProductService<R>,
    command: Commands,
    config: &Config,
    output: Output,
) -> Result<()> {
    match command {
        Commands::Load { file, append } => {
            let path = file.unwrap_or_else(|| config.catalog.clone());
            let mode = if append {
                LoadMode::Append
            } else {
                LoadMode::Replace
            };

            let loaded = load(service, &path, mode).await?;
            info!(inserted = loaded.inserted, mode = %loaded.mode, "Load complete");
            output.emit(&loaded, |r| {
                format!("Loaded {} products ({}).\n", r.inserted, r.mode)
            })
        }

        Commands::Electronics {
            category,
            max_price,
        } => {
            let rows = service
                .find_by_category_below_price(&category, max_price)
                .await?;
            output.emit(rows.as_slice(), report::summaries)
        }

        Commands::TopRated { min_rating } => {
            let rows = service.top_rated(min_rating).await?;
            output.emit(rows.as_slice(), report::rated)
        }

        Commands::AddReview {
            product_id,
            user_id,
            username,
            rating,
            comment,
            date,
        } => {
            let input = NewReview {
                user_id,
                username,
                rating,
                comment,
                date,
            };
            let product = service.add_review(&product_id, input).await?;
            let added = ReviewAdded {
                product_id: &product.product_id,
                review_count: product.reviews.len(),
            };
            output.emit(&added, |a| {
                format!(
                    "Review added to {}; it now has {} reviews.\n",
                    a.product_id, a.review_count
                )
            })
        }

        Commands::Categories => {
            let rows = service.category_stats().await?;
            output.emit(rows.as_slice(), report::category_stats)
        }

        Commands::LowStock { threshold } => {
            let rows = service.low_stock(threshold).await?;
            output.emit(rows.as_slice(), report::stock_levels)
        }

        Commands::Tag { tag } => {
            let rows = service.find_by_tag(&tag).await?;
            output.emit(rows.as_slice(), report::tagged)
        }

        Commands::NamePrefix { prefix } => {
            let rows = service.find_by_name_prefix(&prefix).await?;
            output.emit(rows.as_slice(), report::name_matches)
        }

        Commands::ReviewCount { more_than } => {
            let rows = service.with_more_reviews_than(more_than).await?;
            output.emit(rows.as_slice(), report::review_tallies)
        }

        Commands::RecentReviews { limit } => {
            let rows = service.recent_reviews(limit).await?;
            output.emit(rows.as_slice(), report::recent_reviews)
        }

        Commands::Search { text, limit } => {
            let rows = service.search(&text, limit).await?;
            output.emit(rows.as_slice(), report::products)
        }

        Commands::Show { product_id } => {
            let product = service.get_product(&product_id).await?;
            output.emit(&product, report::product)
        }

        Commands::Indexes => {
            let created = IndexesCreated {
                indexes: service.init_indexes().await?,
            };
            output.emit(&created, |c| {
                if c.indexes.is_empty() {
                    "No indexes to create for this backend.\n".to_string()
                } else {
                    format!("Indexes: {}\n", c.indexes.join(", "))
                }
            })
        }

        Commands::Health => {
            let health = StoreHealth {
                healthy: true,
                products: service.count_products().await?,
            };
            output.emit(&health, |h| {
                format!("In-memory catalog healthy ({} products)\n", h.products)
            })
        }

        Commands::Demo { file, results_file } => {
            let path = file.unwrap_or_else(|| config.catalog.clone());
            demo(service, &path, results_file, config, output).await
        }
    }
}

async fn demo<R: ProductRepository>(
    service: &ProductService<R>,
    path: &Path,
    results_file: Option<PathBuf>,
    config: &Config,
    output: Output,
) -> Result<()> {
    let mut steps = Vec::new();

    let loaded = load(service, path, LoadMode::Replace).await?;
    steps.push(StepOutcome {
        name: "Load Data".to_string(),
        detail: format!("{} products from {}", loaded.inserted, path.display()),
    });

    let cheap = service
        .find_by_category_below_price("Electronics", 50000.0)
        .await?;
    if !output.json {
        println!("\nElectronics under 50000:");
    }
    output.emit(cheap.as_slice(), report::summaries)?;
    steps.push(StepOutcome {
        name: "Basic Query".to_string(),
        detail: format!("{} Electronics products under 50000", cheap.len()),
    });

    let rated = service.top_rated(4.0).await?;
    if !output.json {
        println!("\nAverage rating 4.0 or better:");
    }
    output.emit(rated.as_slice(), report::rated)?;
    steps.push(StepOutcome {
        name: "Review Analysis".to_string(),
        detail: format!("{} products rated 4.0 or better", rated.len()),
    });

    let updated = service.add_review(DEMO_PRODUCT, demo_review()).await?;
    if !output.json {
        println!(
            "\nReview added to {}; it now has {} reviews.",
            updated.product_id,
            updated.reviews.len()
        );
    }
    steps.push(StepOutcome {
        name: "Update Review".to_string(),
        detail: format!(
            "{} now has {} reviews",
            updated.product_id,
            updated.reviews.len()
        ),
    });

    let stats = service.category_stats().await?;
    if !output.json {
        println!("\nPrice statistics by category:");
    }
    output.emit(stats.as_slice(), report::category_stats)?;
    steps.push(StepOutcome {
        name: "Category Analysis".to_string(),
        detail: format!("{} categories", stats.len()),
    });

    if let Some(results_path) = results_file {
        let summary = DemoSummary {
            generated_at: Utc::now(),
            backend: config.backend.to_string(),
            database: config.mongodb.database.clone(),
            collection: config.collection.clone(),
            total_documents: service.count_products().await?,
            steps,
        };
        report::write_results_file(&results_path, &summary).await?;
    }

    Ok(())
}
