//! Product Service - validation and catalog policies over a repository

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    CategoryStats, LoadMode, LoadReport, NameMatch, NewReview, Product, ProductSummary,
    RatedProduct, RecentReview, ReviewTally, StockLevel, TaggedProduct,
};
use crate::repository::ProductRepository;

/// Upper bound for result limits
pub const MAX_LIMIT: i64 = 1000;

/// Catalog operations
///
/// Writes are validated here before they reach the repository: ratings stay
/// within 1..=5, prices and stock stay non-negative, and `product_id` stays
/// unique.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

fn check_limit(limit: i64) -> ProductResult<()> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(())
    } else {
        Err(ProductError::Validation(format!(
            "limit must be between 1 and {}, got {}",
            MAX_LIMIT, limit
        )))
    }
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Bulk load a batch of products
    ///
    /// The whole batch is validated first; nothing is written if any product
    /// is invalid or two share a `product_id`. In `Append` mode ids already in
    /// the store are rejected as well. `Replace` drops the collection along
    /// with its indexes, so the indexes are created again before inserting.
    #[instrument(skip(self, products, mode), fields(count = products.len(), %mode))]
    pub async fn load_products(
        &self,
        products: Vec<Product>,
        mode: LoadMode,
    ) -> ProductResult<LoadReport> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            product.validate().map_err(|e| {
                ProductError::Validation(format!("product '{}': {}", product.product_id, e))
            })?;
            if !seen.insert(product.product_id.as_str()) {
                return Err(ProductError::DuplicateProductId(product.product_id.clone()));
            }
        }

        match mode {
            LoadMode::Replace => self.repository.clear().await?,
            LoadMode::Append => {
                let ids = products.iter().map(|p| p.product_id.clone()).collect();
                let existing = self.repository.existing_product_ids(ids).await?;
                if let Some(id) = existing.into_iter().next() {
                    return Err(ProductError::DuplicateProductId(id));
                }
            }
        }
        self.repository.init_indexes().await?;

        let inserted = self.repository.insert_many(products).await?;
        tracing::info!(inserted, "Catalog loaded");

        Ok(LoadReport {
            inserted,
            mode: mode.to_string(),
        })
    }

    /// Products in `category` priced strictly below `max_price`
    #[instrument(skip(self))]
    pub async fn find_by_category_below_price(
        &self,
        category: &str,
        max_price: f64,
    ) -> ProductResult<Vec<ProductSummary>> {
        if !max_price.is_finite() {
            return Err(ProductError::Validation(format!(
                "max price must be a finite number, got {}",
                max_price
            )));
        }
        self.repository
            .find_by_category_below_price(category, max_price)
            .await
    }

    /// Products rated `min_rating` or better on average
    #[instrument(skip(self))]
    pub async fn top_rated(&self, min_rating: f64) -> ProductResult<Vec<RatedProduct>> {
        if !(0.0..=5.0).contains(&min_rating) {
            return Err(ProductError::Validation(format!(
                "minimum rating must be between 0 and 5, got {}",
                min_rating
            )));
        }
        self.repository.top_rated(min_rating).await
    }

    /// Append a review to one product
    ///
    /// Fails with `NotFound` when no product has `product_id`; nothing is
    /// written in that case.
    #[instrument(skip(self, input), fields(rating = input.rating))]
    pub async fn add_review(&self, product_id: &str, input: NewReview) -> ProductResult<Product> {
        input.validate()?;

        let review = input.into_review(Utc::now());
        self.repository
            .push_review(product_id, review)
            .await?
            .ok_or_else(|| ProductError::NotFound(product_id.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn category_stats(&self) -> ProductResult<Vec<CategoryStats>> {
        self.repository.category_stats().await
    }

    #[instrument(skip(self))]
    pub async fn low_stock(&self, threshold: i64) -> ProductResult<Vec<StockLevel>> {
        if threshold < 0 {
            return Err(ProductError::Validation(format!(
                "stock threshold must not be negative, got {}",
                threshold
            )));
        }
        self.repository.low_stock(threshold).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_tag(&self, tag: &str) -> ProductResult<Vec<TaggedProduct>> {
        if tag.trim().is_empty() {
            return Err(ProductError::Validation("tag must not be empty".to_string()));
        }
        self.repository.find_by_tag(tag).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_name_prefix(&self, prefix: &str) -> ProductResult<Vec<NameMatch>> {
        if prefix.is_empty() {
            return Err(ProductError::Validation(
                "name prefix must not be empty".to_string(),
            ));
        }
        self.repository.find_by_name_prefix(prefix).await
    }

    #[instrument(skip(self))]
    pub async fn with_more_reviews_than(&self, count: u64) -> ProductResult<Vec<ReviewTally>> {
        self.repository.with_more_reviews_than(count).await
    }

    #[instrument(skip(self))]
    pub async fn recent_reviews(&self, limit: i64) -> ProductResult<Vec<RecentReview>> {
        check_limit(limit)?;
        self.repository.recent_reviews(limit).await
    }

    #[instrument(skip(self))]
    pub async fn search(&self, text: &str, limit: i64) -> ProductResult<Vec<Product>> {
        if text.trim().is_empty() {
            return Err(ProductError::Validation(
                "search text must not be empty".to_string(),
            ));
        }
        check_limit(limit)?;
        self.repository.search(text, limit).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: &str) -> ProductResult<Product> {
        self.repository
            .get_by_product_id(product_id)
            .await?
            .ok_or_else(|| ProductError::NotFound(product_id.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn count_products(&self) -> ProductResult<u64> {
        self.repository.count().await
    }

    #[instrument(skip(self))]
    pub async fn init_indexes(&self) -> ProductResult<Vec<String>> {
        self.repository.init_indexes().await
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
