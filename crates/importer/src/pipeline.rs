//! The record orchestrator and batch driver.
//!
//! Per record the steps are strictly ordered: user, then shop, then tags,
//! then service, then reviews — each resolved through the find-or-create
//! primitive so re-running a dataset skips everything it already created.
//!
//! Failure semantics: anything escaping a step aborts that record only. The
//! driver logs the failure, bumps the error counter and moves on to the next
//! record. Only bootstrap and driver-level failures are fatal to the batch.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use dalil_core::{
    ApplicationStatus, Category, DesignId, Service, Shop, SubCategoryId, TagId, User, UserRole,
};

use crate::bootstrap;
use crate::error::ImportError;
use crate::gazetteer::extract_city;
use crate::input::{Dataset, Entry, clean_phone, non_empty};
use crate::resolver::{Resolution, resolve};
use crate::stats::{ErrorLog, ImportStats};
use crate::store::{
    CreateApplication, CreateReview, CreateService, CreateServiceTranslation, CreateShop,
    CreateSubscription, CreateTranslation, CreateUser, Store, StoreError,
};

/// Reviewer identity recorded on auto-approved imported applications.
const SYSTEM_REVIEWER: &str = "system-import";
const AUTO_APPROVE_NOTE: &str = "Auto-approved during data import";

/// Directory hotline used when a business has no phone at all.
const FALLBACK_BUSINESS_PHONE: &str = "16676";
const SYNTHETIC_EMAIL_DOMAIN: &str = "business.com";
const DEFAULT_BUSINESS_DESCRIPTION: &str = "خدمات تجارية متخصصة";
const DEFAULT_BUSINESS_ADDRESS: &str = "محل تجاري";

/// Placeholder reviewer for anonymous source reviews.
const DEFAULT_REVIEWER_NAME: &str = "مريض سابق";

const DEFAULT_SHOP_ADDRESS_EN: &str = "Medical Clinic";
const DEFAULT_SHOP_ADDRESS_AR: &str = "عيادة طبية";
const DEFAULT_SERVICE_DESCRIPTION_EN: &str = "Professional medical services";
const DEFAULT_SERVICE_DESCRIPTION_AR: &str = "خدمات طبية متخصصة";

/// Run the full import: taxonomy bootstrap, then one record at a time.
///
/// Returns the final counter snapshot. Per-record failures are absorbed into
/// the counters and the error log; only batch-level failures propagate.
///
/// # Errors
///
/// Returns an error if the taxonomy bootstrap fails; nothing after it is
/// fatal.
pub async fn run<S: Store>(
    store: &S,
    dataset: &Dataset,
    error_log: &ErrorLog,
) -> Result<ImportStats, ImportError> {
    let mut stats = ImportStats {
        total_entries: u64::try_from(dataset.entries.len()).unwrap_or(u64::MAX),
        ..ImportStats::default()
    };

    info!(entries = dataset.entries.len(), "Starting data import");
    bootstrap::ensure_taxonomy(store, &dataset.categories, &mut stats).await?;

    info!("Processing entries");
    for (index, entry) in dataset.entries.iter().enumerate() {
        info!(
            entry = index + 1,
            total = dataset.entries.len(),
            user = %entry.user.name,
            "Processing entry"
        );

        if let Err(e) = process_entry(store, entry, &mut stats, error_log).await {
            stats.errors += 1;
            error_log.log_failure(
                &format!("Error processing entry {} ({})", index + 1, entry.user.name),
                &e,
            );
        }
    }

    stats.report();
    Ok(stats)
}

/// One record, strictly ordered: user → shop → tags → service → reviews.
async fn process_entry<S: Store>(
    store: &S,
    entry: &Entry,
    stats: &mut ImportStats,
    error_log: &ErrorLog,
) -> Result<(), ImportError> {
    let user = resolve_owner(store, entry, stats, error_log).await?;
    let shop = resolve_shop(store, entry, &user, stats).await?;
    let tag_ids = resolve_tags(store, entry, stats).await?;
    let service = resolve_service(store, entry, &user, &shop, tag_ids, stats).await?;
    import_reviews(store, entry, &shop, &service, stats).await?;
    Ok(())
}

/// Step 1: resolve the owning user by exact name.
///
/// Newly created providers also get a business application and the default
/// subscription; failures there stay inside this step (see
/// [`create_business_application`]).
async fn resolve_owner<S: Store>(
    store: &S,
    entry: &Entry,
    stats: &mut ImportStats,
    error_log: &ErrorLog,
) -> Result<User, ImportError> {
    let resolution = resolve(
        store.find_user_by_name(&entry.user.name),
        store.create_user(CreateUser {
            name: entry.user.name.clone(),
            phone: clean_phone(entry.user.phone.as_deref()),
            email: entry.user.email.clone(),
            role: entry.user.resolved_role(),
            is_verified: true,
            verified_at: Some(Utc::now()),
        }),
    )
    .await?;

    match resolution {
        Resolution::Created(user) => {
            stats.users_created += 1;
            info!(name = %user.name, "Created user");
            if user.role == UserRole::Provider {
                create_business_application(store, &user, entry, stats, error_log).await;
                create_provider_subscription(store, &user, stats, error_log).await;
            }
            Ok(user)
        }
        Resolution::Existing(user) => {
            stats.users_skipped += 1;
            debug!(name = %user.name, "User already exists");
            Ok(user)
        }
    }
}

/// Step 1a: business application for a newly created provider.
///
/// Never aborts the record. Conflicts are expected when multiple source
/// records share a business and are suppressed entirely; other failures are
/// logged and counted here, then processing continues.
async fn create_business_application<S: Store>(
    store: &S,
    user: &User,
    entry: &Entry,
    stats: &mut ImportStats,
    error_log: &ErrorLog,
) {
    let application = CreateApplication {
        applicant_id: user.id.clone(),
        business_name: entry.shop.name.clone(),
        business_email: entry
            .user
            .email
            .clone()
            .unwrap_or_else(|| synthesize_business_email(&entry.user.name)),
        business_phone: clean_phone(entry.shop.phone.as_deref())
            .or_else(|| clean_phone(entry.user.phone.as_deref()))
            .unwrap_or_else(|| FALLBACK_BUSINESS_PHONE.to_owned()),
        description: non_empty(entry.service.description_ar.as_deref())
            .or_else(|| non_empty(entry.service.description_en.as_deref()))
            .unwrap_or(DEFAULT_BUSINESS_DESCRIPTION)
            .to_owned(),
        business_address: non_empty(entry.shop.address_ar.as_deref())
            .or_else(|| non_empty(entry.shop.address_en.as_deref()))
            .unwrap_or(DEFAULT_BUSINESS_ADDRESS)
            .to_owned(),
        business_city: extract_city(entry),
        business_type: UserRole::Provider,
        status: ApplicationStatus::Approved,
        status_notes: Some(AUTO_APPROVE_NOTE.to_owned()),
        reviewed_by: Some(SYSTEM_REVIEWER.to_owned()),
        approved_at: Some(Utc::now()),
    };

    let result = resolve(
        store.find_application(&user.id, &entry.shop.name),
        store.create_application(application),
    )
    .await;

    match result {
        Ok(resolution) => {
            if resolution.was_created() {
                stats.business_applications_created += 1;
                info!(name = %user.name, "Created business application");
            }
        }
        Err(StoreError::Conflict(_)) => {
            debug!(name = %user.name, "Business application collision, already exists");
        }
        Err(e) => {
            stats.errors += 1;
            error_log.log_failure(
                &format!("Error creating business application for {}", user.name),
                &e,
            );
        }
    }
}

/// Step 1b: default subscription for a newly created provider.
///
/// Same containment as the business application: conflicts suppressed,
/// other failures logged and counted without aborting the record.
async fn create_provider_subscription<S: Store>(
    store: &S,
    user: &User,
    stats: &mut ImportStats,
    error_log: &ErrorLog,
) {
    let result = resolve(
        store.find_subscription_by_provider(&user.id),
        store.create_subscription(CreateSubscription::basic_free(user.id.clone())),
    )
    .await;

    match result {
        Ok(resolution) => {
            if resolution.was_created() {
                stats.subscriptions_created += 1;
                info!(provider = %user.id, "Created subscription");
            }
        }
        Err(StoreError::Conflict(_)) => {
            debug!(provider = %user.id, "Subscription collision, already exists");
        }
        Err(e) => {
            stats.errors += 1;
            error_log.log_failure(
                &format!("Error creating subscription for {}", user.id),
                &e,
            );
        }
    }
}

/// Step 2: resolve the shop by (name, owner).
async fn resolve_shop<S: Store>(
    store: &S,
    entry: &Entry,
    owner: &User,
    stats: &mut ImportStats,
) -> Result<Shop, ImportError> {
    let resolution = resolve(
        store.find_shop_by_name_and_owner(&entry.shop.name, &owner.id),
        async {
            // Address translation row precedes the shop that references it.
            let address = store
                .create_translation(CreateTranslation {
                    text_ar: non_empty(entry.shop.address_ar.as_deref())
                        .unwrap_or(DEFAULT_SHOP_ADDRESS_AR)
                        .to_owned(),
                    text_en: non_empty(entry.shop.address_en.as_deref())
                        .unwrap_or(DEFAULT_SHOP_ADDRESS_EN)
                        .to_owned(),
                })
                .await?;

            let design_id = shop_design(store, entry).await?;

            store
                .create_shop(CreateShop {
                    name: entry.shop.name.clone(),
                    phone: clean_phone(entry.shop.phone.as_deref()),
                    email: entry.shop.email.clone(),
                    description: non_empty(entry.service.description_ar.as_deref())
                        .or_else(|| non_empty(entry.service.description_en.as_deref()))
                        .map(ToOwned::to_owned),
                    city: extract_city(entry),
                    address_id: address.id,
                    owner_id: owner.id.clone(),
                    design_id,
                })
                .await
        },
    )
    .await?;

    match resolution {
        Resolution::Created(shop) => {
            stats.shops_created += 1;
            info!(name = %shop.name, "Created shop");
            Ok(shop)
        }
        Resolution::Existing(shop) => {
            stats.shops_skipped += 1;
            debug!(name = %shop.name, "Shop already exists");
            Ok(shop)
        }
    }
}

/// Design for a new shop: the source service's category design, else the
/// first design in the store.
async fn shop_design<S: Store>(store: &S, entry: &Entry) -> Result<Option<DesignId>, StoreError> {
    if let Some(category_id) = &entry.service.category_id
        && let Some(category) = store.find_category_by_id(category_id).await?
        && let Some(design_id) = category.design_id
    {
        return Ok(Some(design_id));
    }
    Ok(store.first_design().await?.map(|d| d.id))
}

/// Step 3: resolve the union of shop- and service-level tags.
///
/// Returns a de-duplicated id list preserving first-occurrence order.
async fn resolve_tags<S: Store>(
    store: &S,
    entry: &Entry,
    stats: &mut ImportStats,
) -> Result<Vec<TagId>, ImportError> {
    let mut tag_ids: Vec<TagId> = Vec::new();

    for raw in entry.shop.tags.iter().chain(&entry.service.tags) {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }

        let resolution = resolve(store.find_tag_by_name(name), store.create_tag(name)).await?;
        if resolution.was_created() {
            stats.tags_created += 1;
        }
        let id = resolution.into_inner().id;
        if !tag_ids.contains(&id) {
            tag_ids.push(id);
        }
    }

    if !tag_ids.is_empty() {
        debug!(count = tag_ids.len(), "Processed tags");
    }
    Ok(tag_ids)
}

/// Step 4: resolve the service by (shop, effective embedding text).
///
/// The effective text is computed before the find so a synthesized text
/// resolves to the same row on re-runs.
async fn resolve_service<S: Store>(
    store: &S,
    entry: &Entry,
    owner: &User,
    shop: &Shop,
    tag_ids: Vec<TagId>,
    stats: &mut ImportStats,
) -> Result<Service, ImportError> {
    let embedding_text = effective_embedding_text(entry);

    let resolution = resolve(
        async {
            store
                .find_service_by_shop_and_text(&shop.id, &embedding_text)
                .await
                .map_err(ImportError::from)
        },
        async {
            let translation = store
                .create_service_translation(CreateServiceTranslation {
                    name_ar: non_empty(entry.service.name_ar.as_deref())
                        .unwrap_or(&entry.user.name)
                        .to_owned(),
                    name_en: non_empty(entry.service.name_en.as_deref())
                        .unwrap_or(&entry.user.name)
                        .to_owned(),
                    description_ar: non_empty(entry.service.description_ar.as_deref())
                        .or_else(|| non_empty(entry.service.description_en.as_deref()))
                        .unwrap_or(DEFAULT_SERVICE_DESCRIPTION_AR)
                        .to_owned(),
                    description_en: non_empty(entry.service.description_en.as_deref())
                        .unwrap_or(DEFAULT_SERVICE_DESCRIPTION_EN)
                        .to_owned(),
                })
                .await?;

            let (category, sub_category_id) = service_taxonomy(store, entry).await?;
            let design_id = match category.design_id.clone() {
                Some(design_id) => Some(design_id),
                None => store.first_design().await?.map(|d| d.id),
            };

            store
                .create_service(CreateService {
                    embedding_text: embedding_text.clone(),
                    phone: clean_phone(entry.shop.phone.as_deref()),
                    city: extract_city(entry),
                    shop_id: shop.id.clone(),
                    owner_user_id: owner.id.clone(),
                    translation_id: translation.id,
                    category_id: Some(category.id),
                    sub_category_id,
                    design_id,
                    tag_ids,
                })
                .await
                .map_err(ImportError::from)
        },
    )
    .await?;

    match resolution {
        Resolution::Created(service) => {
            stats.services_created += 1;
            info!(shop = %shop.name, "Created service");
            Ok(service)
        }
        Resolution::Existing(service) => {
            stats.services_skipped += 1;
            debug!(shop = %shop.name, "Service already exists");
            Ok(service)
        }
    }
}

/// Category/subcategory links for a new service: exact source ids when they
/// resolve, else the first category in the store and its first subcategory.
async fn service_taxonomy<S: Store>(
    store: &S,
    entry: &Entry,
) -> Result<(Category, Option<SubCategoryId>), ImportError> {
    if let Some(category_id) = &entry.service.category_id
        && let Some(category) = store.find_category_by_id(category_id).await?
    {
        let mut sub_category_id = None;
        if let Some(source_sub_id) = &entry.service.sub_category_id
            && let Some(sub) = store.find_sub_category_by_id(source_sub_id).await?
        {
            sub_category_id = Some(sub.id);
        }
        return Ok((category, sub_category_id));
    }

    // Bootstrap guarantees a category exists; its absence means the store
    // was modified mid-batch.
    let category = store
        .first_category()
        .await?
        .ok_or(ImportError::MissingFallback("category"))?;
    let sub_category_id = store.first_sub_category_in(&category.id).await?.map(|s| s.id);
    Ok((category, sub_category_id))
}

/// Step 5: import reviews, skipping previously imported (comment, service)
/// pairs.
async fn import_reviews<S: Store>(
    store: &S,
    entry: &Entry,
    shop: &Shop,
    service: &Service,
    stats: &mut ImportStats,
) -> Result<(), ImportError> {
    let mut created_for_entry = 0u64;

    for review in &entry.reviews {
        let Some(comment) = non_empty(review.comment.as_deref()) else {
            continue;
        };
        let Some(raw_rating) = review.rating.as_ref() else {
            continue;
        };

        if store
            .find_review_by_comment_and_service(comment, &service.id)
            .await?
            .is_some()
        {
            debug!("Review already exists");
            continue;
        }

        let reviewer_name = non_empty(review.author.as_deref()).unwrap_or(DEFAULT_REVIEWER_NAME);
        let reviewer = resolve(
            store.find_user_by_name(reviewer_name),
            store.create_user(CreateUser {
                name: reviewer_name.to_owned(),
                phone: None,
                email: None,
                role: UserRole::Customer,
                is_verified: false,
                verified_at: None,
            }),
        )
        .await?;
        if reviewer.was_created() {
            stats.users_created += 1;
        }

        store
            .create_review(CreateReview {
                rating: coerce_rating(raw_rating),
                comment: comment.to_owned(),
                author_id: reviewer.into_inner().id,
                service_id: service.id.clone(),
                shop_id: Some(shop.id.clone()),
                is_verified: true,
            })
            .await?;
        created_for_entry += 1;
        stats.reviews_created += 1;
    }

    if created_for_entry > 0 {
        info!(count = created_for_entry, "Created reviews");
    }
    Ok(())
}

/// Synthesized applicant email: lowercase-compacted name at the fixed
/// business domain.
fn synthesize_business_email(name: &str) -> String {
    let compact: String = name.split_whitespace().collect();
    format!("{}@{SYNTHETIC_EMAIL_DOMAIN}", compact.to_lowercase())
}

/// The service's resolution text: the source embedding text, or the
/// synthesized concatenation of name, description and tag names.
fn effective_embedding_text(entry: &Entry) -> String {
    if let Some(text) = non_empty(entry.service.embedding_text.as_deref()) {
        return text.to_owned();
    }

    let name = non_empty(entry.service.name_en.as_deref())
        .or_else(|| non_empty(entry.service.name_ar.as_deref()))
        .unwrap_or(&entry.user.name);
    let description = non_empty(entry.service.description_en.as_deref())
        .or_else(|| non_empty(entry.service.description_ar.as_deref()))
        .unwrap_or_default();
    format!("{name} {description} {}", entry.service.tags.join(" "))
}

/// Coerce a source rating (number or string) into `1..=5`; parse failures
/// default to 5.
#[must_use]
pub fn coerce_rating(raw: &Value) -> i32 {
    #[allow(clippy::cast_possible_truncation)]
    let parsed = match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64)),
        _ => None,
    };
    parsed.map_or(5, |rating| i32::try_from(rating.clamp(1, 5)).unwrap_or(5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ServiceInput, ShopInput, UserInput};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn entry(user: &str, shop: &str, embedding: &str) -> Entry {
        Entry {
            user: UserInput {
                name: user.to_owned(),
                phone: None,
                email: None,
                role: None,
            },
            shop: ShopInput {
                name: shop.to_owned(),
                phone: None,
                email: None,
                city: None,
                address_ar: None,
                address_en: None,
                tags: Vec::new(),
            },
            service: ServiceInput {
                name_ar: None,
                name_en: None,
                description_ar: None,
                description_en: None,
                embedding_text: Some(embedding.to_owned()),
                city: None,
                category_id: None,
                sub_category_id: None,
                tags: Vec::new(),
            },
            reviews: Vec::new(),
        }
    }

    fn temp_log() -> ErrorLog {
        let path = std::env::temp_dir().join(format!("dalil-pipeline-{}.log", uuid::Uuid::new_v4()));
        ErrorLog::create(path).expect("create error log")
    }

    #[test]
    fn test_coerce_rating_parse_failure_defaults_to_five() {
        assert_eq!(coerce_rating(&json!("oops")), 5);
        assert_eq!(coerce_rating(&json!({})), 5);
    }

    #[test]
    fn test_coerce_rating_string_number() {
        assert_eq!(coerce_rating(&json!("3")), 3);
        assert_eq!(coerce_rating(&json!(" 4 ")), 4);
    }

    #[test]
    fn test_coerce_rating_clamps_into_range() {
        assert_eq!(coerce_rating(&json!(9)), 5);
        assert_eq!(coerce_rating(&json!(-2)), 1);
        assert_eq!(coerce_rating(&json!(0)), 1);
    }

    #[test]
    fn test_coerce_rating_truncates_fractions() {
        assert_eq!(coerce_rating(&json!(4.7)), 4);
        assert_eq!(coerce_rating(&json!("4.7")), 4);
    }

    #[test]
    fn test_synthesize_business_email() {
        assert_eq!(synthesize_business_email("Dr. X"), "dr.x@business.com");
        assert_eq!(
            synthesize_business_email("Cairo Dental Center"),
            "cairodentalcenter@business.com"
        );
    }

    #[test]
    fn test_effective_embedding_text_prefers_source() {
        let e = entry("Dr. X", "Clinic A", "clinic a cardiology");
        assert_eq!(effective_embedding_text(&e), "clinic a cardiology");
    }

    #[test]
    fn test_effective_embedding_text_synthesized() {
        let mut e = entry("Dr. X", "Clinic A", "");
        e.service.embedding_text = None;
        e.service.name_en = Some("Cardiology".to_owned());
        e.service.description_en = Some("Heart care".to_owned());
        e.service.tags = vec!["heart".to_owned(), "cardio".to_owned()];
        assert_eq!(effective_embedding_text(&e), "Cardiology Heart care heart cardio");
    }

    #[tokio::test]
    async fn test_error_isolation_keeps_batch_running() {
        let store = MemoryStore::new();
        let error_log = temp_log();

        let dataset = Dataset {
            entries: vec![
                entry("Dr. A", "Clinic A", "clinic a"),
                entry("Dr. B", "Clinic B", "clinic b"),
                entry("Dr. C", "Clinic C", "clinic c"),
            ],
            categories: Vec::new(),
        };

        // Fail the first service creation; entries two and three must still
        // process end to end.
        store.fail_service_creates.store(1, Ordering::SeqCst);
        let stats = run(&store, &dataset, &error_log).await.expect("run");

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.services_created, 2);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.services.len(), 2);
        // The failed entry's earlier steps are preserved: its user and shop
        // exist even though its service does not.
        assert_eq!(snapshot.users.len(), 3);
        assert_eq!(snapshot.shops.len(), 3);

        std::fs::remove_file(error_log.path()).ok();
    }

    #[tokio::test]
    async fn test_error_log_records_failed_entry() {
        let store = MemoryStore::new();
        let error_log = temp_log();
        let log_path = error_log.path().to_path_buf();

        let dataset = Dataset {
            entries: vec![entry("Dr. A", "Clinic A", "clinic a")],
            categories: Vec::new(),
        };

        store.fail_service_creates.store(1, Ordering::SeqCst);
        let stats = run(&store, &dataset, &error_log).await.expect("run");
        assert_eq!(stats.errors, 1);

        let content = std::fs::read_to_string(&log_path).expect("read log");
        assert!(content.contains("Error processing entry 1 (Dr. A)"));

        std::fs::remove_file(&log_path).ok();
    }
}
