//! Persistent entities of the directory data model.
//!
//! These structs mirror the rows owned by the `directory` schema. The import
//! pipeline only creates and links them; updates are limited to the one-time
//! Category↔Design backfill during taxonomy bootstrap.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::types::{
    ApplicationId, ApplicationStatus, CategoryId, DesignId, PlanType, ReviewId, ServiceId, ShopId,
    SubCategoryId, SubscriptionId, TagId, TranslationId, UserId, UserRole,
};

/// A directory user account (provider, customer or admin).
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: UserRole,
    /// Imported owners are created verified.
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A storefront owned by a provider.
#[derive(Debug, Clone)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    pub city: String,
    /// Bilingual address text.
    pub address_id: TranslationId,
    pub owner_id: UserId,
    pub design_id: Option<DesignId>,
    pub created_at: DateTime<Utc>,
}

/// A service offered through a shop.
///
/// `embedding_text` is the stored descriptive string used downstream for
/// search; together with `shop_id` it forms the service's resolution key.
#[derive(Debug, Clone)]
pub struct Service {
    pub id: ServiceId,
    pub embedding_text: String,
    pub phone: Option<String>,
    pub city: String,
    pub shop_id: ShopId,
    pub owner_user_id: UserId,
    pub translation_id: TranslationId,
    pub category_id: Option<CategoryId>,
    pub sub_category_id: Option<SubCategoryId>,
    pub design_id: Option<DesignId>,
    pub created_at: DateTime<Utc>,
}

/// A top-level taxonomy entry.
///
/// Every category owns one canonical design; `design_id` is only null for
/// the instant between creation and the bootstrap backfill.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub design_id: Option<DesignId>,
    pub created_at: DateTime<Utc>,
}

/// A second-level taxonomy entry, belonging to exactly one category.
#[derive(Debug, Clone)]
pub struct SubCategory {
    pub id: SubCategoryId,
    pub name: String,
    pub slug: String,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
}

/// A storefront design template.
///
/// `category_id` is the placeholder side of the mutual Category↔Design
/// reference cycle: designs are created with no owner and patched once the
/// owning category exists.
#[derive(Debug, Clone)]
pub struct Design {
    pub id: DesignId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
}

/// A free-form tag; names are globally unique (trimmed, case-sensitive).
#[derive(Debug, Clone)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A customer review of a service.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: ReviewId,
    /// Star rating in `1..=5`.
    pub rating: i32,
    pub comment: String,
    pub author_id: UserId,
    pub service_id: ServiceId,
    pub shop_id: Option<ShopId>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// A bilingual (Arabic/English) text row referenced by shops and services.
#[derive(Debug, Clone)]
pub struct Translation {
    pub id: TranslationId,
    pub text_ar: String,
    pub text_en: String,
}

/// A bilingual name/description pair for a service.
#[derive(Debug, Clone)]
pub struct ServiceTranslation {
    pub id: TranslationId,
    pub name_ar: String,
    pub name_en: String,
    pub description_ar: String,
    pub description_en: String,
}

/// A provider's subscription plan; one per provider.
#[derive(Debug, Clone)]
pub struct ProviderSubscription {
    pub id: SubscriptionId,
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
    pub created_at: DateTime<Utc>,
}

/// An application to operate a business through the directory.
///
/// One per (applicant, business name) pair; imported applications are
/// auto-approved with a synthetic reviewer identity.
#[derive(Debug, Clone)]
pub struct BusinessApplication {
    pub id: ApplicationId,
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
    pub created_at: DateTime<Utc>,
}
