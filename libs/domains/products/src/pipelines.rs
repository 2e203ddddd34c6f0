//! Filters, projections and aggregation pipelines for the `products` collection
//!
//! Kept as plain functions returning BSON so the exact query shapes can be
//! checked without a server.

use mongodb::{
    IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};

pub const INDEX_PRODUCT_ID: &str = "idx_product_id_unique";
pub const INDEX_CATEGORY: &str = "idx_category";
pub const INDEX_PRICE: &str = "idx_price";
pub const INDEX_CATEGORY_PRICE: &str = "idx_category_price";
pub const INDEX_TEXT: &str = "idx_text_name_description";

/// `category == category && price < max_price`
pub fn category_below_price_filter(category: &str, max_price: f64) -> Document {
    doc! {
        "category": category,
        "price": { "$lt": max_price },
    }
}

pub fn summary_projection() -> Document {
    doc! { "_id": 0, "name": 1, "price": 1, "stock": 1 }
}

/// Mean rating per product, floor applied before rounding
///
/// `$avg` over an empty or missing `reviews` array yields null, which never
/// satisfies `$gte`, so unreviewed products drop out at the `$match`.
pub fn top_rated_pipeline(min_rating: f64) -> Vec<Document> {
    vec![
        doc! { "$addFields": { "avg_rating": { "$avg": "$reviews.rating" } } },
        doc! { "$match": { "avg_rating": { "$gte": min_rating } } },
        doc! {
            "$project": {
                "_id": 0,
                "product_id": 1,
                "name": 1,
                "category": 1,
                "price": 1,
                "avg_rating": { "$round": ["$avg_rating", 2] },
                "review_count": { "$size": { "$ifNull": ["$reviews", []] } },
            }
        },
        doc! { "$sort": { "avg_rating": -1, "product_id": 1 } },
    ]
}

/// Append one review and stamp the modification time
pub fn push_review_update(review: Document, now: mongodb::bson::DateTime) -> Document {
    doc! {
        "$push": { "reviews": review },
        "$set": { "updated_at": now },
    }
}

pub fn category_stats_pipeline() -> Vec<Document> {
    vec![
        doc! {
            "$group": {
                "_id": "$category",
                "avg_price": { "$avg": "$price" },
                "product_count": { "$sum": 1 },
                "min_price": { "$min": "$price" },
                "max_price": { "$max": "$price" },
                "total_stock": { "$sum": "$stock" },
            }
        },
        doc! {
            "$project": {
                "_id": 0,
                "category": "$_id",
                "product_count": 1,
                "total_stock": 1,
                "avg_price": { "$round": ["$avg_price", 2] },
                "min_price": { "$round": ["$min_price", 2] },
                "max_price": { "$round": ["$max_price", 2] },
            }
        },
        doc! { "$sort": { "avg_price": -1, "category": 1 } },
    ]
}

pub fn low_stock_filter(threshold: i64) -> Document {
    doc! { "stock": { "$lt": threshold } }
}

pub fn stock_level_projection() -> Document {
    doc! { "_id": 0, "product_id": 1, "name": 1, "category": 1, "stock": 1 }
}

/// Array equality on `tags` matches any element
pub fn tag_filter(tag: &str) -> Document {
    doc! { "tags": tag }
}

pub fn tagged_projection() -> Document {
    doc! { "_id": 0, "name": 1, "category": 1, "price": 1, "tags": 1 }
}

/// Case-insensitive prefix match; the prefix is escaped and matched literally
pub fn name_prefix_filter(prefix: &str) -> Document {
    doc! {
        "name": {
            "$regex": format!("^{}", regex::escape(prefix)),
            "$options": "i",
        }
    }
}

pub fn name_match_projection() -> Document {
    doc! { "_id": 0, "product_id": 1, "name": 1, "price": 1 }
}

/// Thresholds beyond `i64::MAX` saturate; no array is that long
pub fn review_count_pipeline(more_than: u64) -> Vec<Document> {
    let more_than = i64::try_from(more_than).unwrap_or(i64::MAX);
    vec![
        doc! {
            "$addFields": {
                "review_count": { "$size": { "$ifNull": ["$reviews", []] } }
            }
        },
        doc! { "$match": { "review_count": { "$gt": more_than } } },
        doc! { "$project": { "_id": 0, "product_id": 1, "name": 1, "review_count": 1 } },
        doc! { "$sort": { "review_count": -1, "product_id": 1 } },
    ]
}

/// Flatten reviews out of their products and keep the newest `limit`
pub fn recent_reviews_pipeline(limit: i64) -> Vec<Document> {
    vec![
        doc! { "$unwind": "$reviews" },
        doc! { "$sort": { "reviews.date": -1, "product_id": 1 } },
        doc! { "$limit": limit },
        doc! {
            "$project": {
                "_id": 0,
                "product_id": 1,
                "product_name": "$name",
                "username": "$reviews.username",
                "rating": "$reviews.rating",
                "comment": "$reviews.comment",
                "date": "$reviews.date",
            }
        },
    ]
}

pub fn text_search_filter(text: &str) -> Document {
    doc! { "$text": { "$search": text } }
}

pub fn text_score_sort() -> Document {
    doc! { "score": { "$meta": "textScore" } }
}

fn named(keys: Document, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(name.to_string()).build())
        .build()
}

/// Secondary indexes backing the catalog reads
pub fn index_models() -> Vec<IndexModel> {
    vec![
        // Enforces product_id uniqueness on load
        IndexModel::builder()
            .keys(doc! { "product_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(INDEX_PRODUCT_ID.to_string())
                    .build(),
            )
            .build(),
        named(doc! { "category": 1 }, INDEX_CATEGORY),
        named(doc! { "price": 1 }, INDEX_PRICE),
        named(doc! { "category": 1, "price": 1 }, INDEX_CATEGORY_PRICE),
        named(doc! { "name": "text", "description": "text" }, INDEX_TEXT),
    ]
}
