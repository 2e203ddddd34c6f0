//! Reading the product catalog from a JSON file
//!
//! The file is a JSON array of product documents, the same shape
//! `mongoimport --jsonArray` accepts. Timestamps may be RFC 3339 strings,
//! bare `YYYY-MM-DD` dates or Extended JSON `{"$date": ...}` values.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument};

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, Review};

#[derive(Deserialize)]
#[serde(untagged)]
enum DateRepr {
    Text(String),
    Extended {
        #[serde(rename = "$date")]
        date: ExtendedDate,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExtendedDate {
    Text(String),
    Millis(i64),
    Long {
        #[serde(rename = "$numberLong")]
        number_long: String,
    },
}

fn parse_date_text(text: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }
    Err(format!("unrecognized timestamp '{}'", text))
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| format!("timestamp {} ms is out of range", millis))
}

impl DateRepr {
    fn resolve(self) -> Result<DateTime<Utc>, String> {
        match self {
            DateRepr::Text(text) => parse_date_text(&text),
            DateRepr::Extended { date } => match date {
                ExtendedDate::Text(text) => parse_date_text(&text),
                ExtendedDate::Millis(millis) => from_millis(millis),
                ExtendedDate::Long { number_long } => number_long
                    .parse()
                    .map_err(|_| format!("invalid $numberLong '{}'", number_long))
                    .and_then(from_millis),
            },
        }
    }
}

fn flexible_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    DateRepr::deserialize(deserializer)?
        .resolve()
        .map_err(serde::de::Error::custom)
}

fn flexible_date_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DateRepr>::deserialize(deserializer)?
        .map(DateRepr::resolve)
        .transpose()
        .map_err(serde::de::Error::custom)
}

#[derive(Deserialize)]
struct CatalogReview {
    user_id: String,
    username: String,
    rating: i32,
    #[serde(default)]
    comment: String,
    #[serde(deserialize_with = "flexible_date")]
    date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct CatalogEntry {
    product_id: String,
    name: String,
    category: String,
    #[serde(default)]
    subcategory: Option<String>,
    #[serde(default)]
    description: Option<String>,
    price: f64,
    stock: i64,
    #[serde(default)]
    warranty_months: i32,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    specifications: BTreeMap<String, String>,
    #[serde(default)]
    reviews: Vec<CatalogReview>,
    #[serde(default, deserialize_with = "flexible_date_opt")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_date_opt")]
    updated_at: Option<DateTime<Utc>>,
}

impl CatalogEntry {
    fn into_product(self, now: DateTime<Utc>) -> Product {
        let created_at = self.created_at.unwrap_or(now);
        Product {
            id: None,
            product_id: self.product_id,
            name: self.name,
            category: self.category,
            subcategory: self.subcategory,
            description: self.description,
            price: self.price,
            stock: self.stock,
            warranty_months: self.warranty_months,
            tags: self.tags,
            specifications: self.specifications,
            reviews: self
                .reviews
                .into_iter()
                .map(|r| Review {
                    user_id: r.user_id,
                    username: r.username,
                    rating: r.rating,
                    comment: r.comment,
                    date: r.date,
                })
                .collect(),
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        }
    }
}

/// Parse catalog JSON; missing timestamps become `now`
pub fn parse_catalog(json: &str, now: DateTime<Utc>) -> ProductResult<Vec<Product>> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
    Ok(entries.into_iter().map(|e| e.into_product(now)).collect())
}

/// Read and parse a catalog file
#[instrument]
pub async fn read_catalog_file(path: &Path) -> ProductResult<Vec<Product>> {
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        ProductError::CatalogFile(format!("cannot read {}: {}", path.display(), e))
    })?;

    let products = parse_catalog(&json, Utc::now()).map_err(|e| match e {
        ProductError::CatalogFile(msg) => {
            ProductError::CatalogFile(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;

    debug!(count = products.len(), "Catalog file parsed");
    Ok(products)
}
