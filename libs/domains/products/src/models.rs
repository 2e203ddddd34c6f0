use std::collections::BTreeMap;

use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

/// A customer review, owned by its product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Review {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    /// Star rating, 1 to 5
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

/// Product document as stored in the `products` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Product {
    /// Store-assigned identifier, never used for lookups
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// External catalog identifier, unique across the collection
    #[validate(length(min = 1, max = 64))]
    pub product_id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0))]
    pub stock: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub warranty_months: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-form attributes (brand, ram, storage, ...)
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    #[validate(nested)]
    pub reviews: Vec<Review>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Mean review rating, or `None` when the product has no reviews
    pub fn average_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let total: i64 = self.reviews.iter().map(|r| i64::from(r.rating)).sum();
        Some(total as f64 / self.reviews.len() as f64)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Input for appending a review; `date` defaults to the time of the call
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewReview {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl NewReview {
    pub fn into_review(self, now: DateTime<Utc>) -> Review {
        Review {
            user_id: self.user_id,
            username: self.username,
            rating: self.rating,
            comment: self.comment,
            date: self.date.unwrap_or(now),
        }
    }
}

/// How a bulk load treats documents already in the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum LoadMode {
    /// Drop the existing documents first
    #[default]
    Replace,
    /// Keep existing documents; colliding `product_id`s are rejected
    Append,
}

/// Outcome of a bulk load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub inserted: usize,
    pub mode: String,
}

/// Row of the category/price-ceiling listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub name: String,
    pub price: f64,
    pub stock: i64,
}

/// Product whose mean review rating met the requested floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedProduct {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    /// Rounded to 2 decimal places
    pub avg_rating: f64,
    pub review_count: u64,
}

/// Price statistics for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub product_count: u64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub total_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedProduct {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMatch {
    pub product_id: String,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewTally {
    pub product_id: String,
    pub name: String,
    pub review_count: u64,
}

/// A review flattened out of its product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentReview {
    pub product_id: String,
    pub product_name: String,
    pub username: String,
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
    #[serde(deserialize_with = "chrono_datetime_as_bson_datetime::deserialize")]
    pub date: DateTime<Utc>,
}

/// Round half to even at 2 decimal places, matching the server's `$round`
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
