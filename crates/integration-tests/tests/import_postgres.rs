//! End-to-end import pipeline tests against a live `PostgreSQL` database.
//!
//! These tests require:
//! - A running `PostgreSQL` database reachable via `DATABASE_URL`
//!
//! Migrations are applied by the tests themselves. Run with:
//! `cargo test -p dalil-integration-tests -- --ignored`

use secrecy::SecretString;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use dalil_importer::store::{PgStore, postgres};
use dalil_importer::{Dataset, ErrorLog, ImportStats, pipeline};

/// Database URL for the test database (configurable via environment).
fn database_url() -> SecretString {
    SecretString::from(
        std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/dalil_test".to_string()),
    )
}

async fn connect_and_migrate() -> PgPool {
    let pool = postgres::create_pool(&database_url())
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../importer/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

async fn run_import(pool: &PgPool, dataset: &Dataset) -> ImportStats {
    let log_path = std::env::temp_dir().join(format!("dalil-pg-test-{}.log", Uuid::new_v4()));
    let error_log = ErrorLog::create(&log_path).expect("Failed to create error log");
    let store = PgStore::new(pool.clone());
    let stats = pipeline::run(&store, dataset, &error_log)
        .await
        .expect("Pipeline run failed");
    std::fs::remove_file(&log_path).ok();
    stats
}

async fn count_users_named(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM directory.app_user WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("count query")
}

async fn count_services_with_text(pool: &PgPool, embedding_text: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM directory.service WHERE embedding_text = $1")
        .bind(embedding_text)
        .fetch_one(pool)
        .await
        .expect("count query")
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_end_to_end_import_and_rerun() {
    let pool = connect_and_migrate().await;

    // Unique names per run so repeated test invocations don't collide.
    let run_id = Uuid::new_v4().simple().to_string();
    let owner = format!("Dr. X {run_id}");
    let shop = format!("Clinic A {run_id}");
    let embedding = format!("clinic a cardiology {run_id}");

    let dataset: Dataset = serde_json::from_value(json!({
        "entries": [{
            "user": { "name": owner.clone(), "role": "PROVIDER" },
            "shop": { "name": shop.clone() },
            "service": { "embeddingText": embedding.clone() },
            "reviews": [{
                "comment": format!("great {run_id}"),
                "rating": "4",
                "author": format!("Reviewer {run_id}")
            }]
        }]
    }))
    .expect("valid dataset");

    let stats = run_import(&pool, &dataset).await;
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.users_created, 2); // owner + anonymous reviewer
    assert_eq!(stats.shops_created, 1);
    assert_eq!(stats.services_created, 1);
    assert_eq!(stats.reviews_created, 1);
    assert_eq!(stats.subscriptions_created, 1);
    assert_eq!(stats.business_applications_created, 1);

    assert_eq!(count_users_named(&pool, &owner).await, 1);
    assert_eq!(count_services_with_text(&pool, &embedding).await, 1);

    let (status, city): (String, String) = sqlx::query_as(
        "SELECT a.status, a.business_city
         FROM directory.business_application a
         JOIN directory.app_user u ON u.id = a.applicant_id
         WHERE u.name = $1",
    )
    .bind(&owner)
    .fetch_one(&pool)
    .await
    .expect("application row");
    assert_eq!(status, "APPROVED");
    assert_eq!(city, "مصر");

    let rating: i32 = sqlx::query_scalar(
        "SELECT r.rating
         FROM directory.review r
         JOIN directory.service s ON s.id = r.service_id
         WHERE s.embedding_text = $1",
    )
    .bind(&embedding)
    .fetch_one(&pool)
    .await
    .expect("review row");
    assert_eq!(rating, 4);

    // Second run: pure skips, no new rows.
    let stats = run_import(&pool, &dataset).await;
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.users_created, 0);
    assert_eq!(stats.shops_created, 0);
    assert_eq!(stats.services_created, 0);
    assert_eq!(stats.reviews_created, 0);

    assert_eq!(count_users_named(&pool, &owner).await, 1);
    assert_eq!(count_services_with_text(&pool, &embedding).await, 1);

    pool.close().await;
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_taxonomy_cycle_resolution() {
    let pool = connect_and_migrate().await;

    let run_id = Uuid::new_v4().simple().to_string();
    let category_id = format!("cat-{run_id}");
    let category_name = format!("Category {run_id}");

    let dataset: Dataset = serde_json::from_value(json!({
        "categories": [{
            "id": category_id.clone(),
            "name": category_name,
            "sub_categories": [
                { "id": format!("sub-{run_id}"), "name": format!("Sub {run_id}") }
            ]
        }],
        "entries": []
    }))
    .expect("valid dataset");

    let stats = run_import(&pool, &dataset).await;
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.categories_created, 1);
    assert_eq!(stats.sub_categories_created, 1);

    // The category owns a design that back-references it.
    let (design_id, back_ref): (Option<String>, Option<String>) = sqlx::query_as(
        "SELECT c.design_id, d.category_id
         FROM directory.category c
         JOIN directory.design d ON d.id = c.design_id
         WHERE c.id = $1",
    )
    .bind(&category_id)
    .fetch_one(&pool)
    .await
    .expect("category/design row");
    assert!(design_id.is_some());
    assert_eq!(back_ref.as_deref(), Some(category_id.as_str()));

    pool.close().await;
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_tag_rows_unique_across_records() {
    let pool = connect_and_migrate().await;

    let run_id = Uuid::new_v4().simple().to_string();
    let tag = format!("tag-{run_id}");

    let dataset: Dataset = serde_json::from_value(json!({
        "entries": [
            {
                "user": { "name": format!("Dr. A {run_id}"), "role": "PROVIDER" },
                "shop": {
                    "name": format!("Shop A {run_id}"),
                    "tags": [tag.clone(), format!(" {tag} ")]
                },
                "service": { "embeddingText": format!("service a {run_id}") }
            },
            {
                "user": { "name": format!("Dr. B {run_id}"), "role": "PROVIDER" },
                "shop": { "name": format!("Shop B {run_id}") },
                "service": {
                    "embeddingText": format!("service b {run_id}"),
                    "tags": [tag.clone()]
                }
            }
        ]
    }))
    .expect("valid dataset");

    let stats = run_import(&pool, &dataset).await;
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.tags_created, 1);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM directory.tag WHERE name = $1")
        .bind(&tag)
        .fetch_one(&pool)
        .await
        .expect("tag count");
    assert_eq!(count, 1);

    pool.close().await;
}
