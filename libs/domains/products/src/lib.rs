//! Products Domain
//!
//! The FlexiMart product catalog: products with embedded reviews, stored in
//! MongoDB, and the fixed set of catalog queries run against them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ Catalog file │  ← JSON seed data
//! └──────┬───────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, load policy
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB and in-memory implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Pipelines  │  ← Filters, projections, aggregations
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{MongoProductRepository, ProductService, read_catalog_file};
//! use domain_products::models::LoadMode;
//! use mongodb::Client;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("fleximart_nosql");
//!
//! let service = ProductService::new(MongoProductRepository::new(&db));
//! let products = read_catalog_file(Path::new("products_catalog.json")).await?;
//! service.load_products(products, LoadMode::Replace).await?;
//!
//! let cheap = service.find_by_category_below_price("Electronics", 50000.0).await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog_file;
pub mod error;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod pipelines;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use catalog_file::{parse_catalog, read_catalog_file};
pub use error::{ProductError, ProductResult};
pub use memory::InMemoryProductRepository;
pub use models::{
    CategoryStats, LoadMode, LoadReport, NameMatch, NewReview, Product, ProductSummary,
    RatedProduct, RecentReview, Review, ReviewTally, StockLevel, TaggedProduct,
};
pub use mongodb::MongoProductRepository;
pub use repository::ProductRepository;
pub use service::ProductService;
