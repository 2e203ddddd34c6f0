//! Integration tests for the MongoDB repository
//!
//! These use a real MongoDB via testcontainers to check that the query
//! shapes the server runs agree with the in-memory semantics.

use chrono::Utc;
use domain_products::*;
use test_utils::{TestDataBuilder, TestMongo, assertions::*};

const CATALOG: &str = include_str!("../../../../demos/products_catalog.json");

async fn seeded(mongo: &TestMongo, test_name: &str) -> ProductService<MongoProductRepository> {
    let builder = TestDataBuilder::from_test_name(test_name);
    let db = mongo.database(&builder.database_name());

    let service = ProductService::new(MongoProductRepository::new(&db));
    let products = parse_catalog(CATALOG, Utc::now()).unwrap();
    service
        .load_products(products, LoadMode::Replace)
        .await
        .unwrap();
    service
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_queries_against_server() {
    let mongo = TestMongo::new().await;
    let service = seeded(&mongo, "queries_against_server").await;

    let cheap = service
        .find_by_category_below_price("Electronics", 50000.0)
        .await
        .unwrap();
    assert_eq!(cheap.len(), 2);

    let rated = service.top_rated(4.0).await.unwrap();
    assert_eq!(rated[0].product_id, "FASH006");
    let galaxy = rated.iter().find(|r| r.product_id == "ELEC001").unwrap();
    assert_close(galaxy.avg_rating, 4.67, "ELEC001 average");
    assert!(rated.iter().all(|r| r.product_id != "FASH004"));

    let stats = service.category_stats().await.unwrap();
    assert_eq!(stats[0].category, "Electronics");
    assert_eq!(stats[0].total_stock, 670);

    let tagged = service.find_by_tag("5G").await.unwrap();
    assert_eq!(tagged.len(), 2);

    let names = service.find_by_name_prefix("samsung").await.unwrap();
    assert_eq!(names.len(), 2);

    let recent = service.recent_reviews(3).await.unwrap();
    assert_eq!(recent[0].product_id, "FASH006");

    let found = service.search("wireless headphones", 5).await.unwrap();
    assert_eq!(found[0].product_id, "ELEC003");

    let found = service.search("cancellation", 5).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].product_id, "ELEC003");

    assert!(service.top_rated(5.0).await.unwrap().iter().all(|r| r.avg_rating == 5.0));
    assert!(service.with_more_reviews_than(u64::MAX).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_review_append_and_missing_product() {
    let mongo = TestMongo::new().await;
    let service = seeded(&mongo, "review_append").await;
    let builder = TestDataBuilder::from_test_name("review_append");

    let input = NewReview {
        user_id: builder.user_id(),
        username: builder.name("reviewer", "one"),
        rating: 4,
        comment: "Good value".to_string(),
        date: None,
    };

    let updated = service.add_review("ELEC001", input.clone()).await.unwrap();
    assert_eq!(updated.reviews.len(), 4);

    let err = service.add_review("NOPE404", input).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_unique_index_rejects_duplicate_insert() {
    let mongo = TestMongo::new().await;
    let service = seeded(&mongo, "unique_index").await;

    // A second replace drops the collection; the unique index must come back
    let products = parse_catalog(CATALOG, Utc::now()).unwrap();
    service
        .load_products(products, LoadMode::Replace)
        .await
        .unwrap();

    let duplicate = parse_catalog(CATALOG, Utc::now())
        .unwrap()
        .into_iter()
        .take(1)
        .collect::<Vec<_>>();

    let err = service
        .repository()
        .insert_many(duplicate)
        .await
        .unwrap_err();
    assert!(matches!(err, ProductError::DuplicateProductId(_)));
}
