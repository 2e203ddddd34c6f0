//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{self, Bson, doc},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::ProductResult;
use crate::models::{
    CategoryStats, NameMatch, Product, ProductSummary, RatedProduct, RecentReview, Review,
    ReviewTally, StockLevel, TaggedProduct,
};
use crate::pipelines;
use crate::repository::ProductRepository;

/// Default collection holding the catalog
pub const PRODUCTS_COLLECTION: &str = "products";

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, PRODUCTS_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    async fn aggregate_into<T>(&self, pipeline: Vec<bson::Document>) -> ProductResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let cursor = self.collection.aggregate(pipeline).with_type::<T>().await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_into<T>(
        &self,
        filter: bson::Document,
        options: FindOptions,
    ) -> ProductResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let cursor = self
            .collection
            .clone_with_type::<T>()
            .find(filter)
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, products), fields(count = products.len()))]
    async fn insert_many(&self, products: Vec<Product>) -> ProductResult<usize> {
        if products.is_empty() {
            return Ok(0);
        }

        let result = self.collection.insert_many(&products).await?;

        tracing::info!(inserted = result.inserted_ids.len(), "Products inserted");
        Ok(result.inserted_ids.len())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> ProductResult<()> {
        self.collection.drop().await?;
        tracing::info!("Products collection dropped");
        Ok(())
    }

    #[instrument(skip(self, product_ids), fields(count = product_ids.len()))]
    async fn existing_product_ids(&self, product_ids: Vec<String>) -> ProductResult<Vec<String>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = self
            .collection
            .distinct("product_id", doc! { "product_id": { "$in": product_ids } })
            .await?;

        Ok(found
            .into_iter()
            .filter_map(|value| match value {
                Bson::String(id) => Some(id),
                _ => None,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_by_category_below_price(
        &self,
        category: &str,
        max_price: f64,
    ) -> ProductResult<Vec<ProductSummary>> {
        let options = FindOptions::builder()
            .projection(pipelines::summary_projection())
            .build();

        self.find_into(
            pipelines::category_below_price_filter(category, max_price),
            options,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn top_rated(&self, min_rating: f64) -> ProductResult<Vec<RatedProduct>> {
        self.aggregate_into(pipelines::top_rated_pipeline(min_rating))
            .await
    }

    #[instrument(skip(self, review), fields(rating = review.rating))]
    async fn push_review(
        &self,
        product_id: &str,
        review: Review,
    ) -> ProductResult<Option<Product>> {
        let update = pipelines::push_review_update(
            bson::to_document(&review)?,
            bson::DateTime::from_chrono(chrono::Utc::now()),
        );

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection
            .find_one_and_update(doc! { "product_id": product_id }, update)
            .with_options(options)
            .await?;

        match updated {
            Some(ref product) => tracing::info!(
                product_id,
                review_count = product.reviews.len(),
                "Review appended"
            ),
            None => tracing::warn!(product_id, "Review not appended, no such product"),
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn category_stats(&self) -> ProductResult<Vec<CategoryStats>> {
        self.aggregate_into(pipelines::category_stats_pipeline())
            .await
    }

    #[instrument(skip(self))]
    async fn low_stock(&self, threshold: i64) -> ProductResult<Vec<StockLevel>> {
        let options = FindOptions::builder()
            .projection(pipelines::stock_level_projection())
            .sort(doc! { "stock": 1, "product_id": 1 })
            .build();

        self.find_into(pipelines::low_stock_filter(threshold), options)
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_tag(&self, tag: &str) -> ProductResult<Vec<TaggedProduct>> {
        let options = FindOptions::builder()
            .projection(pipelines::tagged_projection())
            .build();

        self.find_into(pipelines::tag_filter(tag), options).await
    }

    #[instrument(skip(self))]
    async fn find_by_name_prefix(&self, prefix: &str) -> ProductResult<Vec<NameMatch>> {
        let options = FindOptions::builder()
            .projection(pipelines::name_match_projection())
            .build();

        self.find_into(pipelines::name_prefix_filter(prefix), options)
            .await
    }

    #[instrument(skip(self))]
    async fn with_more_reviews_than(&self, count: u64) -> ProductResult<Vec<ReviewTally>> {
        self.aggregate_into(pipelines::review_count_pipeline(count))
            .await
    }

    #[instrument(skip(self))]
    async fn recent_reviews(&self, limit: i64) -> ProductResult<Vec<RecentReview>> {
        self.aggregate_into(pipelines::recent_reviews_pipeline(limit))
            .await
    }

    #[instrument(skip(self))]
    async fn search(&self, text: &str, limit: i64) -> ProductResult<Vec<Product>> {
        let options = FindOptions::builder()
            .limit(limit)
            .sort(pipelines::text_score_sort())
            .build();

        self.find_into(pipelines::text_search_filter(text), options)
            .await
    }

    #[instrument(skip(self))]
    async fn get_by_product_id(&self, product_id: &str) -> ProductResult<Option<Product>> {
        let product = self
            .collection
            .find_one(doc! { "product_id": product_id })
            .await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn count(&self) -> ProductResult<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    #[instrument(skip(self))]
    async fn init_indexes(&self) -> ProductResult<Vec<String>> {
        let result = self
            .collection
            .create_indexes(pipelines::index_models())
            .await?;

        tracing::info!(indexes = ?result.index_names, "Product indexes created");
        Ok(result.index_names)
    }
}
