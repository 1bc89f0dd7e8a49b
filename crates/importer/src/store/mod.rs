//! The persistent store seam.
//!
//! The pipeline is written against the [`Store`] trait so the same
//! orchestration runs against PostgreSQL ([`PgStore`]) and against the
//! in-memory backend ([`MemoryStore`]) used by `--dry-run` and the test
//! suite.
//!
//! Find methods with multiple candidate clauses evaluate them **in list
//! order, first match wins** — the ordered clause list is the store-level
//! contract the resolver builds on, and the place to substitute stronger
//! resolution keys per entity type.
//!
//! The pipeline only ever creates rows; the two `set_*` methods exist solely
//! for the one-time Category↔Design backfill during taxonomy bootstrap.

pub mod memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use dalil_core::{
    ApplicationStatus, BusinessApplication, Category, CategoryId, Design, DesignId, PlanType,
    ProviderSubscription, Review, Service, ServiceId, ServiceTranslation, Shop, ShopId,
    SubCategory, SubCategoryId, Tag, TagId, Translation, TranslationId, User, UserId, UserRole,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate tag name).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Whether this error is a uniqueness-constraint violation.
    ///
    /// Conflicts on dependent-record creation (business applications,
    /// subscriptions) are expected when source records overlap and are
    /// suppressed by the orchestrator instead of being counted as errors.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Parameters for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Parameters for creating a shop.
#[derive(Debug, Clone)]
pub struct CreateShop {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    pub city: String,
    pub address_id: TranslationId,
    pub owner_id: UserId,
    pub design_id: Option<DesignId>,
}

/// Parameters for creating a service, including its tag links.
#[derive(Debug, Clone)]
pub struct CreateService {
    pub embedding_text: String,
    pub phone: Option<String>,
    pub city: String,
    pub shop_id: ShopId,
    pub owner_user_id: UserId,
    pub translation_id: TranslationId,
    pub category_id: Option<CategoryId>,
    pub sub_category_id: Option<SubCategoryId>,
    pub design_id: Option<DesignId>,
    pub tag_ids: Vec<TagId>,
}

/// Parameters for creating a review.
#[derive(Debug, Clone)]
pub struct CreateReview {
    pub rating: i32,
    pub comment: String,
    pub author_id: UserId,
    pub service_id: ServiceId,
    pub shop_id: Option<ShopId>,
    pub is_verified: bool,
}

/// Parameters for creating a category.
///
/// The id is source-provided, not generated; taxonomy rows keep their
/// dataset identifiers.
#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub design_id: Option<DesignId>,
}

/// Parameters for creating a subcategory.
#[derive(Debug, Clone)]
pub struct CreateSubCategory {
    pub id: SubCategoryId,
    pub name: String,
    pub slug: String,
    pub category_id: CategoryId,
}

/// Parameters for creating a design.
///
/// `category_id` is `None` for the placeholder phase of the mutual
/// Category↔Design cycle; it is patched via [`Store::set_design_category`].
#[derive(Debug, Clone)]
pub struct CreateDesign {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
}

/// Parameters for creating a bilingual address translation.
#[derive(Debug, Clone)]
pub struct CreateTranslation {
    pub text_ar: String,
    pub text_en: String,
}

/// Parameters for creating a bilingual service translation.
#[derive(Debug, Clone)]
pub struct CreateServiceTranslation {
    pub name_ar: String,
    pub name_en: String,
    pub description_ar: String,
    pub description_en: String,
}

/// Parameters for creating a provider subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub provider_id: UserId,
    pub plan_type: PlanType,
    pub price_per_year: Decimal,
    pub can_take_bookings: bool,
    pub can_list_products: bool,
    pub search_priority: i32,
    pub has_priority_badge: bool,
    pub has_promotional_video: bool,
    pub total_discount: Decimal,
    pub is_active: bool,
    pub auto_renew: bool,
}

impl CreateSubscription {
    /// The zero-cost, feature-limited default plan assigned on import.
    #[must_use]
    pub fn basic_free(provider_id: UserId) -> Self {
        Self {
            provider_id,
            plan_type: PlanType::BasicFree,
            price_per_year: Decimal::ZERO,
            can_take_bookings: false,
            can_list_products: false,
            search_priority: 0,
            has_priority_badge: false,
            has_promotional_video: false,
            total_discount: Decimal::ZERO,
            is_active: true,
            auto_renew: false,
        }
    }
}

/// Parameters for creating a business application.
#[derive(Debug, Clone)]
pub struct CreateApplication {
    pub applicant_id: UserId,
    pub business_name: String,
    pub business_email: String,
    pub business_phone: String,
    pub description: String,
    pub business_address: String,
    pub business_city: String,
    pub business_type: UserRole,
    pub status: ApplicationStatus,
    pub status_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// Ordered candidate clauses for resolving a subcategory.
///
/// Evaluated in field order: id, then (name, category), then the id-derived
/// slug, then the name-derived slug. The first matching clause wins.
#[derive(Debug, Clone)]
pub struct SubCategoryLookup {
    pub id: SubCategoryId,
    pub name: String,
    pub category_id: CategoryId,
    pub id_slug: String,
    pub name_slug: String,
}

/// Persistent store operations used by the import pipeline.
///
/// All finds are side-effect free; every create performs exactly one store
/// mutation. "First" accessors use creation order so fallback resolution is
/// deterministic across backends.
pub trait Store {
    // ------------------------------------------------------------------
    // Designs
    // ------------------------------------------------------------------

    /// Find a design by its unique slug.
    fn find_design_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Design>, StoreError>> + Send;

    /// The earliest-created design, if any.
    fn first_design(&self) -> impl Future<Output = Result<Option<Design>, StoreError>> + Send;

    fn create_design(
        &self,
        design: CreateDesign,
    ) -> impl Future<Output = Result<Design, StoreError>> + Send;

    /// One-time backfill of a design's owning category.
    fn set_design_category(
        &self,
        id: &DesignId,
        category_id: &CategoryId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    fn find_category_by_id(
        &self,
        id: &CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, StoreError>> + Send;

    fn find_category_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Category>, StoreError>> + Send;

    /// The earliest-created category, if any.
    fn first_category(&self) -> impl Future<Output = Result<Option<Category>, StoreError>> + Send;

    fn create_category(
        &self,
        category: CreateCategory,
    ) -> impl Future<Output = Result<Category, StoreError>> + Send;

    /// One-time backfill of a category's canonical design.
    fn set_category_design(
        &self,
        id: &CategoryId,
        design_id: &DesignId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    // ------------------------------------------------------------------
    // Subcategories
    // ------------------------------------------------------------------

    /// Resolve a subcategory through the ordered clause list.
    fn find_sub_category(
        &self,
        lookup: &SubCategoryLookup,
    ) -> impl Future<Output = Result<Option<SubCategory>, StoreError>> + Send;

    fn find_sub_category_by_id(
        &self,
        id: &SubCategoryId,
    ) -> impl Future<Output = Result<Option<SubCategory>, StoreError>> + Send;

    /// The earliest-created subcategory of a category, if any.
    fn first_sub_category_in(
        &self,
        category_id: &CategoryId,
    ) -> impl Future<Output = Result<Option<SubCategory>, StoreError>> + Send;

    fn create_sub_category(
        &self,
        sub_category: CreateSubCategory,
    ) -> impl Future<Output = Result<SubCategory, StoreError>> + Send;

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Exact-name match; the directory's (weak) user resolution key.
    fn find_user_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    fn create_user(
        &self,
        user: CreateUser,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;

    // ------------------------------------------------------------------
    // Shops
    // ------------------------------------------------------------------

    fn find_shop_by_name_and_owner(
        &self,
        name: &str,
        owner_id: &UserId,
    ) -> impl Future<Output = Result<Option<Shop>, StoreError>> + Send;

    fn create_shop(
        &self,
        shop: CreateShop,
    ) -> impl Future<Output = Result<Shop, StoreError>> + Send;

    /// Create a bilingual address row referenced by a shop.
    fn create_translation(
        &self,
        translation: CreateTranslation,
    ) -> impl Future<Output = Result<Translation, StoreError>> + Send;

    // ------------------------------------------------------------------
    // Services
    // ------------------------------------------------------------------

    fn find_service_by_shop_and_text(
        &self,
        shop_id: &ShopId,
        embedding_text: &str,
    ) -> impl Future<Output = Result<Option<Service>, StoreError>> + Send;

    /// Create a service and its tag links in one atomic step.
    fn create_service(
        &self,
        service: CreateService,
    ) -> impl Future<Output = Result<Service, StoreError>> + Send;

    fn create_service_translation(
        &self,
        translation: CreateServiceTranslation,
    ) -> impl Future<Output = Result<ServiceTranslation, StoreError>> + Send;

    // ------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------

    /// Exact (trimmed, case-sensitive) tag name match.
    fn find_tag_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Tag>, StoreError>> + Send;

    fn create_tag(&self, name: &str) -> impl Future<Output = Result<Tag, StoreError>> + Send;

    // ------------------------------------------------------------------
    // Reviews
    // ------------------------------------------------------------------

    /// Duplicate-import guard: the same source review resolves to the same
    /// (comment, service) pair.
    fn find_review_by_comment_and_service(
        &self,
        comment: &str,
        service_id: &ServiceId,
    ) -> impl Future<Output = Result<Option<Review>, StoreError>> + Send;

    fn create_review(
        &self,
        review: CreateReview,
    ) -> impl Future<Output = Result<Review, StoreError>> + Send;

    // ------------------------------------------------------------------
    // Subscriptions & applications
    // ------------------------------------------------------------------

    fn find_subscription_by_provider(
        &self,
        provider_id: &UserId,
    ) -> impl Future<Output = Result<Option<ProviderSubscription>, StoreError>> + Send;

    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the provider already has a
    /// subscription (unique `provider_id`).
    fn create_subscription(
        &self,
        subscription: CreateSubscription,
    ) -> impl Future<Output = Result<ProviderSubscription, StoreError>> + Send;

    fn find_application(
        &self,
        applicant_id: &UserId,
        business_name: &str,
    ) -> impl Future<Output = Result<Option<BusinessApplication>, StoreError>> + Send;

    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if an application for the same
    /// (applicant, business name) pair already exists.
    fn create_application(
        &self,
        application: CreateApplication,
    ) -> impl Future<Output = Result<BusinessApplication, StoreError>> + Send;
}
