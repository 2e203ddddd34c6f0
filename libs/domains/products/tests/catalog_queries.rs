//! Catalog query tests against the in-memory repository
//!
//! These run the service over the demo catalog and check the observable
//! behaviour of every query:
//! - Projections carry only the documented fields
//! - Averages and price statistics are rounded to 2 places
//! - Review appends are visible to later reads
//! - Reads never change the catalog

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use domain_products::*;
use test_utils::assertions::*;

const CATALOG: &str = include_str!("../../../../demos/products_catalog.json");

async fn seeded() -> ProductService<InMemoryProductRepository> {
    let products = parse_catalog(CATALOG, Utc::now()).unwrap();
    let service = ProductService::new(InMemoryProductRepository::new());
    let report = service
        .load_products(products, LoadMode::Replace)
        .await
        .unwrap();
    assert_eq!(report.inserted, 12);
    service
}

fn sample_review() -> NewReview {
    NewReview {
        user_id: "U999".to_string(),
        username: "NewReviewer".to_string(),
        rating: 4,
        comment: "Good value".to_string(),
        date: None,
    }
}

// ============================================================================
// Load
// ============================================================================

#[tokio::test]
async fn test_replace_load_discards_previous_catalog() {
    let service = seeded().await;
    let products = parse_catalog(CATALOG, Utc::now()).unwrap();

    let report = service
        .load_products(products, LoadMode::Replace)
        .await
        .unwrap();

    assert_eq!(report.inserted, 12);
    assert_eq!(service.count_products().await.unwrap(), 12);
}

#[tokio::test]
async fn test_append_load_rejects_existing_product_id() {
    let service = seeded().await;
    let products = parse_catalog(CATALOG, Utc::now()).unwrap();

    let err = service
        .load_products(products, LoadMode::Append)
        .await
        .unwrap_err();

    assert!(matches!(err, ProductError::DuplicateProductId(_)));
    assert_eq!(service.count_products().await.unwrap(), 12);
}

#[tokio::test]
async fn test_loaded_products_get_store_identifiers() {
    let service = seeded().await;
    let product = service.get_product("ELEC001").await.unwrap();
    assert!(product.id.is_some());
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_electronics_below_price() {
    let service = seeded().await;

    let rows = service
        .find_by_category_below_price("Electronics", 50000.0)
        .await
        .unwrap();

    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Sony WH-1000XM5 Headphones", "OnePlus Nord CE 3"]);
    assert!(rows.iter().all(|r| r.price < 50000.0));
    assert_eq!(rows[0].price, 29990.0);
    assert_eq!(rows[0].stock, 200);
    assert_eq!(rows[1].price, 26999.0);
    assert_eq!(rows[1].stock, 180);
}

#[tokio::test]
async fn test_price_ceiling_is_exclusive() {
    let service = seeded().await;
    let rows = service
        .find_by_category_below_price("Electronics", 26999.0)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_top_rated_orders_and_rounds() {
    let service = seeded().await;

    let rated = service.top_rated(4.0).await.unwrap();

    let ids: Vec<&str> = rated.iter().map(|r| r.product_id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "FASH006", "ELEC002", "FASH002", "ELEC001", "ELEC003", "ELEC006", "FASH001",
            "FASH005"
        ]
    );

    let galaxy = rated.iter().find(|r| r.product_id == "ELEC001").unwrap();
    assert_eq!(galaxy.avg_rating, 4.67);
    assert_eq!(galaxy.review_count, 3);
    assert!(rated.iter().all(|r| r.avg_rating >= 4.0));
}

#[tokio::test]
async fn test_top_rated_excludes_unreviewed_products() {
    let service = seeded().await;

    let rated = service.top_rated(0.0).await.unwrap();

    assert_eq!(rated.len(), 11);
    assert!(rated.iter().all(|r| r.product_id != "FASH004"));
}

#[tokio::test]
async fn test_category_stats() {
    let service = seeded().await;

    let stats = service.category_stats().await.unwrap();

    assert_eq!(stats.len(), 2);
    let electronics = &stats[0];
    assert_eq!(electronics.category, "Electronics");
    assert_eq!(electronics.product_count, 6);
    assert_eq!(electronics.avg_price, 74497.5);
    assert_eq!(electronics.min_price, 26999.0);
    assert_eq!(electronics.max_price, 189999.0);
    assert_eq!(electronics.total_stock, 670);

    let fashion = &stats[1];
    assert_eq!(fashion.avg_price, 6132.5);
    assert_eq!(fashion.min_price, 1499.0);
    assert_eq!(fashion.max_price, 12995.0);
    assert_eq!(fashion.total_stock, 960);

    let total: u64 = stats.iter().map(|s| s.product_count).sum();
    assert_eq!(total, service.count_products().await.unwrap());
    for s in &stats {
        assert!(s.min_price <= s.avg_price && s.avg_price <= s.max_price);
    }
}

#[tokio::test]
async fn test_low_stock_lowest_first() {
    let service = seeded().await;

    let levels = service.low_stock(50).await.unwrap();

    let stocks: Vec<i64> = levels.iter().map(|l| l.stock).collect();
    assert_eq!(stocks, [15, 25, 35, 40, 45]);
    assert_eq!(levels[0].product_id, "FASH006");
}

#[tokio::test]
async fn test_find_by_tag_is_exact() {
    let service = seeded().await;

    let tagged = service.find_by_tag("5G").await.unwrap();
    let names: Vec<&str> = tagged.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Samsung Galaxy S21 Ultra", "OnePlus Nord CE 3"]);
    assert!(tagged.iter().all(|t| t.tags.iter().any(|tag| tag == "5G")));

    assert!(service.find_by_tag("5g").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_name_prefix_ignores_case() {
    let service = seeded().await;

    let matches = service.find_by_name_prefix("samsung").await.unwrap();
    let ids: Vec<&str> = matches.iter().map(|m| m.product_id.as_str()).collect();
    assert_eq!(ids, ["ELEC001", "ELEC006"]);

    // Metacharacters are literal
    assert!(service.find_by_name_prefix("H&M.").await.unwrap().is_empty());
    assert_eq!(service.find_by_name_prefix("H&M").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_more_reviews_than_is_strict() {
    let service = seeded().await;

    let tallies = service.with_more_reviews_than(3).await.unwrap();
    let ids: Vec<&str> = tallies.iter().map(|t| t.product_id.as_str()).collect();
    assert_eq!(ids, ["ELEC002", "FASH002"]);
    assert!(tallies.iter().all(|t| t.review_count == 4));
}

#[tokio::test]
async fn test_recent_reviews_newest_first() {
    let service = seeded().await;

    let recent = service.recent_reviews(3).await.unwrap();

    let ids: Vec<&str> = recent.iter().map(|r| r.product_id.as_str()).collect();
    assert_eq!(ids, ["FASH006", "FASH002", "ELEC006"]);
    assert_eq!(recent[0].product_name, "Zara Leather Biker Jacket");
    assert_eq!(
        recent[0].date,
        Utc.with_ymd_and_hms(2024, 3, 28, 12, 0, 0).unwrap()
    );
    assert!(recent.windows(2).all(|w| w[0].date >= w[1].date));
}

#[tokio::test]
async fn test_search_matches_name_and_description() {
    let service = seeded().await;

    let found = service.search("wireless headphones", 10).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].product_id, "ELEC003");
}

#[tokio::test]
async fn test_search_matches_description_only_terms() {
    let service = seeded().await;

    // "cancellation" appears in the Sony description, not in any name
    let found = service.search("cancellation", 10).await.unwrap();
    let ids: Vec<&str> = found.iter().map(|p| p.product_id.as_str()).collect();
    assert_eq!(ids, ["ELEC003"]);
    assert!(!found[0].name.to_lowercase().contains("cancellation"));
}

#[tokio::test]
async fn test_more_reviews_than_huge_threshold_matches_nothing() {
    let service = seeded().await;
    assert!(service.with_more_reviews_than(u64::MAX).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rating_floor_compares_unrounded_average() {
    // 199 fours and one three average 3.995, which rounds to 4.0
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let reviews = (0..200)
        .map(|i| Review {
            user_id: format!("U{:03}", i),
            username: format!("Reviewer{}", i),
            rating: if i == 0 { 3 } else { 4 },
            comment: String::new(),
            date: at,
        })
        .collect();
    let product = Product {
        id: None,
        product_id: "EDGE001".to_string(),
        name: "Borderline Speaker".to_string(),
        category: "Electronics".to_string(),
        subcategory: None,
        description: None,
        price: 4999.0,
        stock: 10,
        warranty_months: 12,
        tags: Vec::new(),
        specifications: BTreeMap::new(),
        reviews,
        created_at: at,
        updated_at: at,
    };
    assert_eq!(product.average_rating().map(models::round2), Some(4.0));

    let repository = InMemoryProductRepository::with_products(vec![product]).unwrap();
    let service = ProductService::new(repository);

    assert!(service.top_rated(4.0).await.unwrap().is_empty());
    let rated = service.top_rated(3.99).await.unwrap();
    assert_eq!(rated.len(), 1);
    assert_eq!(rated[0].avg_rating, 4.0);
}

#[tokio::test]
async fn test_reads_do_not_change_results() {
    let service = seeded().await;

    let first = service.top_rated(4.0).await.unwrap();
    service.category_stats().await.unwrap();
    service.low_stock(50).await.unwrap();
    let second = service.top_rated(4.0).await.unwrap();

    assert_eq!(first, second);
}

// ============================================================================
// Review append
// ============================================================================

#[tokio::test]
async fn test_add_review_appends_in_order() {
    let service = seeded().await;
    let before = service.get_product("ELEC001").await.unwrap();

    let after = service
        .add_review("ELEC001", sample_review())
        .await
        .unwrap();

    assert_eq!(after.reviews.len(), before.reviews.len() + 1);
    assert_eq!(&after.reviews[..before.reviews.len()], &before.reviews[..]);
    let last = assert_some(after.reviews.last(), "appended review");
    assert_eq!(last.username, "NewReviewer");
    assert!(after.updated_at > before.updated_at);

    let rated = service.top_rated(4.0).await.unwrap();
    let galaxy = rated.iter().find(|r| r.product_id == "ELEC001").unwrap();
    assert_close(galaxy.avg_rating, 4.5, "average after append");
    assert_eq!(galaxy.review_count, 4);
}

#[tokio::test]
async fn test_add_review_to_unknown_product() {
    let service = seeded().await;

    let err = service
        .add_review("NOPE404", sample_review())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(service.count_products().await.unwrap(), 12);
}
