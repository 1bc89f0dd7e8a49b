//! Pipeline tests against the in-memory store.
//!
//! These cover the batch-level properties the importer guarantees:
//! idempotence, referential closure, taxonomy cycle resolution, tag
//! de-duplication and the city fallback chain. They run without any
//! external services; the live-PostgreSQL mirror lives in the
//! `dalil-integration-tests` crate.

use serde_json::json;

use dalil_core::{ApplicationStatus, PlanType, UserRole};
use dalil_importer::store::MemoryStore;
use dalil_importer::{Dataset, ErrorLog, ImportStats, pipeline};

fn dataset(value: serde_json::Value) -> Dataset {
    serde_json::from_value(value).expect("valid dataset document")
}

fn temp_log() -> ErrorLog {
    let path = std::env::temp_dir().join(format!("dalil-memtest-{}.log", uuid::Uuid::new_v4()));
    ErrorLog::create(path).expect("create error log")
}

async fn run(store: &MemoryStore, dataset: &Dataset) -> ImportStats {
    let error_log = temp_log();
    let stats = pipeline::run(store, dataset, &error_log)
        .await
        .expect("pipeline run");
    std::fs::remove_file(error_log.path()).ok();
    stats
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let store = MemoryStore::new();
    let input = dataset(json!({
        "entries": [{
            "user": { "name": "Dr. X", "role": "PROVIDER" },
            "shop": { "name": "Clinic A" },
            "service": { "embeddingText": "clinic a cardiology" },
            "reviews": [{ "comment": "great", "rating": "4" }]
        }]
    }));

    let stats = run(&store, &input).await;
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.shops_created, 1);
    assert_eq!(stats.services_created, 1);
    assert_eq!(stats.reviews_created, 1);
    assert_eq!(stats.business_applications_created, 1);
    assert_eq!(stats.subscriptions_created, 1);

    let snapshot = store.snapshot();

    // Owner plus the anonymous reviewer.
    assert_eq!(snapshot.users.len(), 2);
    let owner = snapshot
        .users
        .iter()
        .find(|u| u.name == "Dr. X")
        .expect("owner user");
    assert_eq!(owner.role, UserRole::Provider);
    assert!(owner.is_verified);
    let reviewer = snapshot
        .users
        .iter()
        .find(|u| u.name == "مريض سابق")
        .expect("anonymous reviewer");
    assert_eq!(reviewer.role, UserRole::Customer);

    let application = snapshot.applications.first().expect("application");
    assert_eq!(application.status, ApplicationStatus::Approved);
    assert_eq!(application.applicant_id, owner.id);
    assert_eq!(application.business_name, "Clinic A");
    assert_eq!(application.business_email, "dr.x@business.com");
    assert_eq!(application.reviewed_by.as_deref(), Some("system-import"));

    let subscription = snapshot.subscriptions.first().expect("subscription");
    assert_eq!(subscription.plan_type, PlanType::BasicFree);
    assert_eq!(subscription.provider_id, owner.id);

    assert_eq!(snapshot.shops.len(), 1);
    assert_eq!(snapshot.services.len(), 1);
    let review = snapshot.reviews.first().expect("review");
    assert_eq!(review.rating, 4);
    assert!(review.is_verified);
    assert_eq!(review.author_id, reviewer.id);

    // Second run: everything resolves, nothing is created.
    let stats = run(&store, &input).await;
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.users_created, 0);
    assert_eq!(stats.shops_created, 0);
    assert_eq!(stats.services_created, 0);
    assert_eq!(stats.reviews_created, 0);
    assert_eq!(stats.business_applications_created, 0);
    assert_eq!(stats.subscriptions_created, 0);
    assert_eq!(stats.users_skipped, 1);
    assert_eq!(stats.shops_skipped, 1);
    assert_eq!(stats.services_skipped, 1);

    let rerun_snapshot = store.snapshot();
    assert_eq!(rerun_snapshot.users.len(), 2);
    assert_eq!(rerun_snapshot.shops.len(), 1);
    assert_eq!(rerun_snapshot.services.len(), 1);
    assert_eq!(rerun_snapshot.reviews.len(), 1);
}

#[tokio::test]
async fn test_idempotence_with_taxonomy() {
    let store = MemoryStore::new();
    let input = dataset(json!({
        "categories": [
            { "id": "DERMA", "name": "Dermatology",
              "sub_categories": [
                  { "id": "derma-skin", "name": "Skin Care" },
                  { "id": "derma-laser", "name": "Laser" }
              ] }
        ],
        "entries": [
            {
                "user": { "name": "Dr. A", "phone": "0100", "role": "PROVIDER" },
                "shop": { "name": "Clinic A", "tags": ["skin"] },
                "service": {
                    "name_en": "Skin care",
                    "embeddingText": "clinic a skin care",
                    "category_id": "DERMA",
                    "sub_category_id": "derma-skin",
                    "tags": ["laser"]
                }
            },
            {
                "user": { "name": "Dr. B", "role": "PROVIDER" },
                "shop": { "name": "Clinic B" },
                "service": { "embeddingText": "clinic b general" }
            }
        ]
    }));

    let first = run(&store, &input).await;
    assert_eq!(first.errors, 0);
    let after_first = store.snapshot();

    let second = run(&store, &input).await;
    assert_eq!(second.errors, 0);
    let after_second = store.snapshot();

    assert_eq!(after_first.users.len(), after_second.users.len());
    assert_eq!(after_first.shops.len(), after_second.shops.len());
    assert_eq!(after_first.services.len(), after_second.services.len());
    assert_eq!(after_first.categories.len(), after_second.categories.len());
    assert_eq!(
        after_first.sub_categories.len(),
        after_second.sub_categories.len()
    );
    assert_eq!(after_first.designs.len(), after_second.designs.len());
    assert_eq!(after_first.tags.len(), after_second.tags.len());
    assert_eq!(
        after_first.subscriptions.len(),
        after_second.subscriptions.len()
    );
    assert_eq!(
        after_first.applications.len(),
        after_second.applications.len()
    );

    // All creates became skips.
    assert_eq!(second.users_created, 0);
    assert_eq!(second.users_skipped, 2);
    assert_eq!(second.services_created, 0);
    assert_eq!(second.services_skipped, 2);
    assert_eq!(second.categories_skipped, 1);
    assert_eq!(second.sub_categories_skipped, 2);
}

#[tokio::test]
async fn test_referential_closure_of_created_services() {
    let store = MemoryStore::new();
    let input = dataset(json!({
        "categories": [
            { "id": "derma", "name": "Dermatology",
              "sub_categories": [{ "id": "derma-skin", "name": "Skin Care" }] }
        ],
        "entries": [
            {
                "user": { "name": "Dr. A", "role": "PROVIDER" },
                "shop": { "name": "Clinic A" },
                "service": {
                    "embeddingText": "clinic a skin",
                    "category_id": "derma",
                    "sub_category_id": "derma-skin"
                }
            },
            {
                "user": { "name": "Dr. B", "role": "PROVIDER" },
                "shop": { "name": "Clinic B" },
                "service": { "embeddingText": "clinic b no taxonomy ids" }
            }
        ]
    }));

    let stats = run(&store, &input).await;
    assert_eq!(stats.errors, 0);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.services.len(), 2);
    for service in &snapshot.services {
        assert!(snapshot.shops.iter().any(|s| s.id == service.shop_id));
        assert!(
            snapshot
                .service_translations
                .iter()
                .any(|t| t.id == service.translation_id)
        );
        let category_id = service.category_id.as_ref().expect("category link");
        assert!(snapshot.categories.iter().any(|c| c.id == *category_id));
        if let Some(sub_id) = &service.sub_category_id {
            assert!(snapshot.sub_categories.iter().any(|s| s.id == *sub_id));
        }
    }

    // The fallback service (no source ids) landed on the first category and
    // its first subcategory.
    let fallback = snapshot
        .services
        .iter()
        .find(|s| s.embedding_text == "clinic b no taxonomy ids")
        .expect("fallback service");
    assert!(fallback.category_id.is_some());
    assert!(fallback.sub_category_id.is_some());
}

#[tokio::test]
async fn test_category_design_cycle_resolution() {
    let store = MemoryStore::new();
    let input = dataset(json!({
        "categories": [
            { "id": "derma", "name": "Dermatology" },
            { "id": "dent", "name": "Dentistry" }
        ],
        "entries": []
    }));

    let stats = run(&store, &input).await;
    assert_eq!(stats.errors, 0);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.categories.len(), 2);
    for category in &snapshot.categories {
        let design_id = category.design_id.as_ref().expect("category has a design");
        let design = snapshot
            .designs
            .iter()
            .find(|d| d.id == *design_id)
            .expect("owned design exists");
        assert_eq!(design.category_id.as_ref(), Some(&category.id));
    }

    // No design is left without an owning category, including the
    // provisional default one.
    for design in &snapshot.designs {
        assert!(design.category_id.is_some(), "dangling design {}", design.slug);
    }
}

#[tokio::test]
async fn test_tag_deduplication() {
    let store = MemoryStore::new();
    let input = dataset(json!({
        "entries": [{
            "user": { "name": "Dr. A", "role": "PROVIDER" },
            "shop": { "name": "Clinic A", "tags": ["A", "a ", "B"] },
            "service": {
                "embeddingText": "clinic a",
                "tags": ["A", "B", "", "  "]
            }
        }]
    }));

    let stats = run(&store, &input).await;
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.tags_created, 3);

    let snapshot = store.snapshot();
    let mut names: Vec<&str> = snapshot.tags.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["A", "B", "a"]);

    // Tag links are de-duplicated too: one link per distinct tag.
    let service = snapshot.services.first().expect("service");
    let links: Vec<_> = snapshot
        .service_tags
        .iter()
        .filter(|(service_id, _)| *service_id == service.id)
        .collect();
    assert_eq!(links.len(), 3);

    // A second record repeating the same tags creates no new tag rows.
    let repeat = dataset(json!({
        "entries": [{
            "user": { "name": "Dr. B", "role": "PROVIDER" },
            "shop": { "name": "Clinic B", "tags": ["a", "B"] },
            "service": { "embeddingText": "clinic b" }
        }]
    }));
    let stats = run(&store, &repeat).await;
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.tags_created, 0);
    assert_eq!(store.snapshot().tags.len(), 3);
}

#[tokio::test]
async fn test_city_fallback_chain() {
    let store = MemoryStore::new();
    let input = dataset(json!({
        "entries": [
            {
                "user": { "name": "Dr. A", "role": "PROVIDER" },
                "shop": { "name": "Clinic A", "city": "X" },
                "service": { "embeddingText": "clinic a" }
            },
            {
                "user": { "name": "Dr. B", "role": "PROVIDER" },
                "shop": { "name": "Clinic B" },
                "service": {
                    "embeddingText": "clinic b",
                    "description_ar": "عيادة متخصصة في طنطا"
                }
            },
            {
                "user": { "name": "Dr. C", "role": "PROVIDER" },
                "shop": { "name": "Clinic C" },
                "service": { "embeddingText": "clinic c" }
            }
        ]
    }));

    let stats = run(&store, &input).await;
    assert_eq!(stats.errors, 0);

    let snapshot = store.snapshot();
    let city_of = |name: &str| {
        snapshot
            .shops
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.city.clone())
            .expect("shop exists")
    };
    assert_eq!(city_of("Clinic A"), "X");
    assert_eq!(city_of("Clinic B"), "طنطا");
    assert_eq!(city_of("Clinic C"), "مصر");
}

#[tokio::test]
async fn test_shared_business_across_records_collides_quietly() {
    // Two records naming the same owner and shop: the second resolves
    // everything and must not log errors or duplicate dependents.
    let store = MemoryStore::new();
    let input = dataset(json!({
        "entries": [
            {
                "user": { "name": "Dr. A", "role": "PROVIDER" },
                "shop": { "name": "Clinic A" },
                "service": { "embeddingText": "clinic a cardiology" }
            },
            {
                "user": { "name": "Dr. A", "role": "PROVIDER" },
                "shop": { "name": "Clinic A" },
                "service": { "embeddingText": "clinic a dermatology" }
            }
        ]
    }));

    let stats = run(&store, &input).await;
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.users_created, 1);
    assert_eq!(stats.users_skipped, 1);
    assert_eq!(stats.shops_created, 1);
    assert_eq!(stats.shops_skipped, 1);
    // Distinct embedding texts mean two services under the same shop.
    assert_eq!(stats.services_created, 2);
    assert_eq!(stats.subscriptions_created, 1);
    assert_eq!(stats.business_applications_created, 1);
}

#[tokio::test]
async fn test_reviews_skip_duplicates_and_coerce_ratings() {
    let store = MemoryStore::new();
    let input = dataset(json!({
        "entries": [{
            "user": { "name": "Dr. A", "role": "PROVIDER" },
            "shop": { "name": "Clinic A" },
            "service": { "embeddingText": "clinic a" },
            "reviews": [
                { "comment": "great", "rating": "oops", "author": "Sam" },
                { "comment": "good", "rating": "3" },
                { "comment": "", "rating": 4 },
                { "comment": "no rating" }
            ]
        }]
    }));

    let stats = run(&store, &input).await;
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.reviews_created, 2);

    let snapshot = store.snapshot();
    let by_comment = |comment: &str| {
        snapshot
            .reviews
            .iter()
            .find(|r| r.comment == comment)
            .expect("review exists")
    };
    assert_eq!(by_comment("great").rating, 5);
    assert_eq!(by_comment("good").rating, 3);

    // Re-run: the same (comment, service) pairs are skipped.
    let stats = run(&store, &input).await;
    assert_eq!(stats.reviews_created, 0);
    assert_eq!(store.snapshot().reviews.len(), 2);
}
