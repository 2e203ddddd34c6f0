use async_trait::async_trait;

use crate::error::ProductResult;
use crate::models::{
    CategoryStats, NameMatch, Product, ProductSummary, RatedProduct, RecentReview, Review,
    ReviewTally, StockLevel, TaggedProduct,
};

/// Data access for the product catalog
///
/// Implemented over MongoDB and over an in-process store with the same
/// semantics. Implementations do not validate input; the service does.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a batch of products, returning how many were written
    ///
    /// A `product_id` that is already stored fails the call with
    /// `ProductError::DuplicateProductId`.
    async fn insert_many(&self, products: Vec<Product>) -> ProductResult<usize>;

    /// Remove every product
    async fn clear(&self) -> ProductResult<()>;

    /// Which of `product_ids` are already stored
    async fn existing_product_ids(&self, product_ids: Vec<String>) -> ProductResult<Vec<String>>;

    /// Products in `category` priced strictly below `max_price`
    async fn find_by_category_below_price(
        &self,
        category: &str,
        max_price: f64,
    ) -> ProductResult<Vec<ProductSummary>>;

    /// Products whose mean rating is at least `min_rating`, best first
    ///
    /// Products without reviews have no mean and never qualify.
    async fn top_rated(&self, min_rating: f64) -> ProductResult<Vec<RatedProduct>>;

    /// Append `review` to the product's reviews and stamp `updated_at`
    ///
    /// Returns the updated product, or `None` when no product has that id.
    async fn push_review(&self, product_id: &str, review: Review)
    -> ProductResult<Option<Product>>;

    /// Price statistics per category, highest average price first
    async fn category_stats(&self) -> ProductResult<Vec<CategoryStats>>;

    /// Products with `stock < threshold`, lowest stock first
    async fn low_stock(&self, threshold: i64) -> ProductResult<Vec<StockLevel>>;

    /// Products carrying exactly `tag`
    async fn find_by_tag(&self, tag: &str) -> ProductResult<Vec<TaggedProduct>>;

    /// Products whose name starts with `prefix`, ignoring case
    async fn find_by_name_prefix(&self, prefix: &str) -> ProductResult<Vec<NameMatch>>;

    /// Products with more than `count` reviews, most reviewed first
    async fn with_more_reviews_than(&self, count: u64) -> ProductResult<Vec<ReviewTally>>;

    /// The newest `limit` reviews across all products
    async fn recent_reviews(&self, limit: i64) -> ProductResult<Vec<RecentReview>>;

    /// Full-text search over name and description
    async fn search(&self, text: &str, limit: i64) -> ProductResult<Vec<Product>>;

    async fn get_by_product_id(&self, product_id: &str) -> ProductResult<Option<Product>>;

    async fn count(&self) -> ProductResult<u64>;

    /// Create the catalog's secondary indexes, returning their names
    async fn init_indexes(&self) -> ProductResult<Vec<String>>;
}
