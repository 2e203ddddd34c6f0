//! In-process implementation of ProductRepository
//!
//! Runs the catalog without a MongoDB server. Every read reproduces the
//! result shape, ordering and rounding of the corresponding MongoDB query.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    CategoryStats, NameMatch, Product, ProductSummary, RatedProduct, RecentReview, Review,
    ReviewTally, StockLevel, TaggedProduct, round2,
};
use crate::repository::ProductRepository;

/// Products held in insertion order
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of products, as if bulk loaded
    pub fn with_products(products: Vec<Product>) -> ProductResult<Self> {
        let mut stored = Vec::with_capacity(products.len());
        admit(&mut stored, products)?;
        Ok(Self {
            products: RwLock::new(stored),
        })
    }
}

/// Append `incoming` to `stored`, enforcing `product_id` uniqueness
fn admit(stored: &mut Vec<Product>, incoming: Vec<Product>) -> ProductResult<usize> {
    let mut seen: HashSet<&str> = stored.iter().map(|p| p.product_id.as_str()).collect();
    for product in &incoming {
        if !seen.insert(product.product_id.as_str()) {
            return Err(ProductError::DuplicateProductId(product.product_id.clone()));
        }
    }

    let count = incoming.len();
    stored.extend(incoming.into_iter().map(|mut product| {
        product.id.get_or_insert_with(ObjectId::new);
        product
    }));
    Ok(count)
}

fn by_f64_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Lowercased words of `text`, split on anything that is not alphanumeric
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    #[instrument(skip(self, products), fields(count = products.len()))]
    async fn insert_many(&self, products: Vec<Product>) -> ProductResult<usize> {
        let mut stored = self.products.write().await;
        let inserted = admit(&mut stored, products)?;
        tracing::info!(inserted, "Products inserted");
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> ProductResult<()> {
        self.products.write().await.clear();
        Ok(())
    }

    #[instrument(skip(self, product_ids), fields(count = product_ids.len()))]
    async fn existing_product_ids(&self, product_ids: Vec<String>) -> ProductResult<Vec<String>> {
        let stored = self.products.read().await;
        let known: HashSet<&str> = stored.iter().map(|p| p.product_id.as_str()).collect();
        Ok(product_ids
            .into_iter()
            .filter(|id| known.contains(id.as_str()))
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_by_category_below_price(
        &self,
        category: &str,
        max_price: f64,
    ) -> ProductResult<Vec<ProductSummary>> {
        let stored = self.products.read().await;
        Ok(stored
            .iter()
            .filter(|p| p.category == category && p.price < max_price)
            .map(|p| ProductSummary {
                name: p.name.clone(),
                price: p.price,
                stock: p.stock,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn top_rated(&self, min_rating: f64) -> ProductResult<Vec<RatedProduct>> {
        let stored = self.products.read().await;
        let mut rated: Vec<RatedProduct> = stored
            .iter()
            .filter_map(|p| {
                let avg = p.average_rating()?;
                (avg >= min_rating).then(|| RatedProduct {
                    product_id: p.product_id.clone(),
                    name: p.name.clone(),
                    category: p.category.clone(),
                    price: p.price,
                    avg_rating: round2(avg),
                    review_count: p.reviews.len() as u64,
                })
            })
            .collect();

        rated.sort_by(|a, b| {
            by_f64_desc(a.avg_rating, b.avg_rating).then_with(|| a.product_id.cmp(&b.product_id))
        });
        Ok(rated)
    }

    #[instrument(skip(self, review), fields(rating = review.rating))]
    async fn push_review(
        &self,
        product_id: &str,
        review: Review,
    ) -> ProductResult<Option<Product>> {
        let mut stored = self.products.write().await;
        let Some(product) = stored.iter_mut().find(|p| p.product_id == product_id) else {
            tracing::warn!(product_id, "Review not appended, no such product");
            return Ok(None);
        };

        product.reviews.push(review);
        product.updated_at = Utc::now();
        tracing::info!(product_id, review_count = product.reviews.len(), "Review appended");
        Ok(Some(product.clone()))
    }

    #[instrument(skip(self))]
    async fn category_stats(&self) -> ProductResult<Vec<CategoryStats>> {
        struct Acc {
            count: u64,
            sum: f64,
            min: f64,
            max: f64,
            stock: i64,
        }

        let stored = self.products.read().await;
        let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
        for p in stored.iter() {
            let acc = groups.entry(p.category.as_str()).or_insert(Acc {
                count: 0,
                sum: 0.0,
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
                stock: 0,
            });
            acc.count += 1;
            acc.sum += p.price;
            acc.min = acc.min.min(p.price);
            acc.max = acc.max.max(p.price);
            acc.stock += p.stock;
        }

        let mut stats: Vec<CategoryStats> = groups
            .into_iter()
            .map(|(category, acc)| CategoryStats {
                category: category.to_string(),
                product_count: acc.count,
                avg_price: round2(acc.sum / acc.count as f64),
                min_price: round2(acc.min),
                max_price: round2(acc.max),
                total_stock: acc.stock,
            })
            .collect();

        stats.sort_by(|a, b| {
            by_f64_desc(a.avg_price, b.avg_price).then_with(|| a.category.cmp(&b.category))
        });
        Ok(stats)
    }

    #[instrument(skip(self))]
    async fn low_stock(&self, threshold: i64) -> ProductResult<Vec<StockLevel>> {
        let stored = self.products.read().await;
        let mut levels: Vec<StockLevel> = stored
            .iter()
            .filter(|p| p.stock < threshold)
            .map(|p| StockLevel {
                product_id: p.product_id.clone(),
                name: p.name.clone(),
                category: p.category.clone(),
                stock: p.stock,
            })
            .collect();

        levels.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.product_id.cmp(&b.product_id)));
        Ok(levels)
    }

    #[instrument(skip(self))]
    async fn find_by_tag(&self, tag: &str) -> ProductResult<Vec<TaggedProduct>> {
        let stored = self.products.read().await;
        Ok(stored
            .iter()
            .filter(|p| p.has_tag(tag))
            .map(|p| TaggedProduct {
                name: p.name.clone(),
                category: p.category.clone(),
                price: p.price,
                tags: p.tags.clone(),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_by_name_prefix(&self, prefix: &str) -> ProductResult<Vec<NameMatch>> {
        let prefix = prefix.to_lowercase();
        let stored = self.products.read().await;
        Ok(stored
            .iter()
            .filter(|p| p.name.to_lowercase().starts_with(&prefix))
            .map(|p| NameMatch {
                product_id: p.product_id.clone(),
                name: p.name.clone(),
                price: p.price,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn with_more_reviews_than(&self, count: u64) -> ProductResult<Vec<ReviewTally>> {
        let stored = self.products.read().await;
        let mut tallies: Vec<ReviewTally> = stored
            .iter()
            .filter(|p| p.reviews.len() as u64 > count)
            .map(|p| ReviewTally {
                product_id: p.product_id.clone(),
                name: p.name.clone(),
                review_count: p.reviews.len() as u64,
            })
            .collect();

        tallies.sort_by(|a, b| {
            b.review_count
                .cmp(&a.review_count)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        Ok(tallies)
    }

    #[instrument(skip(self))]
    async fn recent_reviews(&self, limit: i64) -> ProductResult<Vec<RecentReview>> {
        let stored = self.products.read().await;
        let mut flattened: Vec<(&Product, &Review)> = stored
            .iter()
            .flat_map(|p| p.reviews.iter().map(move |r| (p, r)))
            .collect();

        flattened.sort_by(|(pa, ra), (pb, rb)| {
            rb.date
                .cmp(&ra.date)
                .then_with(|| pa.product_id.cmp(&pb.product_id))
        });

        Ok(flattened
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(p, r)| RecentReview {
                product_id: p.product_id.clone(),
                product_name: p.name.clone(),
                username: r.username.clone(),
                rating: r.rating,
                comment: r.comment.clone(),
                date: r.date,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn search(&self, text: &str, limit: i64) -> ProductResult<Vec<Product>> {
        let terms: HashSet<String> = words(text).collect();
        let stored = self.products.read().await;

        let mut scored: Vec<(usize, &Product)> = stored
            .iter()
            .filter_map(|p| {
                let mut document: HashSet<String> = words(&p.name).collect();
                if let Some(ref description) = p.description {
                    document.extend(words(description));
                }
                let hits = terms.iter().filter(|t| document.contains(*t)).count();
                (hits > 0).then_some((hits, p))
            })
            .collect();

        scored.sort_by(|(ha, pa), (hb, pb)| hb.cmp(ha).then_with(|| pa.product_id.cmp(&pb.product_id)));

        Ok(scored
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(_, p)| p.clone())
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_by_product_id(&self, product_id: &str) -> ProductResult<Option<Product>> {
        let stored = self.products.read().await;
        Ok(stored.iter().find(|p| p.product_id == product_id).cloned())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> ProductResult<u64> {
        Ok(self.products.read().await.len() as u64)
    }

    #[instrument(skip(self))]
    async fn init_indexes(&self) -> ProductResult<Vec<String>> {
        tracing::debug!("In-memory catalog has no secondary indexes");
        Ok(Vec::new())
    }
}
