//! PostgreSQL store backend.
//!
//! All queries are runtime-checked (`sqlx::query_as` / `query_scalar`) to
//! avoid the offline cache requirements of the sqlx macros. Rows live in the
//! `directory` schema; see `crates/importer/migrations/`.
//!
//! Uniqueness violations surface as [`StoreError::Conflict`] so the
//! orchestrator can tell expected duplicate collisions apart from real
//! failures.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::debug;

use dalil_core::{
    ApplicationId, ApplicationStatus, BusinessApplication, Category, CategoryId, Design, DesignId,
    PlanType, ProviderSubscription, Review, ReviewId, Service, ServiceId, ServiceTranslation,
    Shop, ShopId, SubCategory, SubCategoryId, SubscriptionId, Tag, TagId, Translation,
    TranslationId, User, UserId, UserRole,
};

use super::{
    CreateApplication, CreateCategory, CreateDesign, CreateReview, CreateService,
    CreateServiceTranslation, CreateShop, CreateSubCategory, CreateSubscription,
    CreateTranslation, CreateUser, Store, StoreError, SubCategoryLookup,
};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Store backend over a `PostgreSQL` connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool (for migrations and shutdown).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a unique-constraint violation on insert to [`StoreError::Conflict`].
fn conflict_on_unique(e: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(format!("{what} already exists"));
    }
    StoreError::Database(e)
}

// ---------------------------------------------------------------------------
// Row types (runtime queries; enum columns are TEXT)
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    role: String,
    is_verified: bool,
    verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, StoreError> {
        let role = UserRole::from_str(&self.role)
            .map_err(|e| StoreError::DataCorruption(format!("invalid role in store: {e}")))?;
        Ok(User {
            id: UserId::new(self.id),
            name: self.name,
            phone: self.phone,
            email: self.email,
            role,
            is_verified: self.is_verified,
            verified_at: self.verified_at,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ShopRow {
    id: String,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    description: Option<String>,
    city: String,
    address_id: String,
    owner_id: String,
    design_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ShopRow> for Shop {
    fn from(row: ShopRow) -> Self {
        Self {
            id: ShopId::new(row.id),
            name: row.name,
            phone: row.phone,
            email: row.email,
            description: row.description,
            city: row.city,
            address_id: TranslationId::new(row.address_id),
            owner_id: UserId::new(row.owner_id),
            design_id: row.design_id.map(DesignId::new),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: String,
    embedding_text: String,
    phone: Option<String>,
    city: String,
    shop_id: String,
    owner_user_id: String,
    translation_id: String,
    category_id: Option<String>,
    sub_category_id: Option<String>,
    design_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Self {
            id: ServiceId::new(row.id),
            embedding_text: row.embedding_text,
            phone: row.phone,
            city: row.city,
            shop_id: ShopId::new(row.shop_id),
            owner_user_id: UserId::new(row.owner_user_id),
            translation_id: TranslationId::new(row.translation_id),
            category_id: row.category_id.map(CategoryId::new),
            sub_category_id: row.sub_category_id.map(SubCategoryId::new),
            design_id: row.design_id.map(DesignId::new),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    description: Option<String>,
    design_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            design_id: row.design_id.map(DesignId::new),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubCategoryRow {
    id: String,
    name: String,
    slug: String,
    category_id: String,
    created_at: DateTime<Utc>,
}

impl From<SubCategoryRow> for SubCategory {
    fn from(row: SubCategoryRow) -> Self {
        Self {
            id: SubCategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
            category_id: CategoryId::new(row.category_id),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DesignRow {
    id: String,
    name: String,
    slug: String,
    description: Option<String>,
    category_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<DesignRow> for Design {
    fn from(row: DesignRow) -> Self {
        Self {
            id: DesignId::new(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            category_id: row.category_id.map(CategoryId::new),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: String,
    rating: i32,
    comment: String,
    author_id: String,
    service_id: String,
    shop_id: Option<String>,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            rating: row.rating,
            comment: row.comment,
            author_id: UserId::new(row.author_id),
            service_id: ServiceId::new(row.service_id),
            shop_id: row.shop_id.map(ShopId::new),
            is_verified: row.is_verified,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    id: String,
    provider_id: String,
    plan_type: String,
    price_per_year: Decimal,
    can_take_bookings: bool,
    can_list_products: bool,
    search_priority: i32,
    has_priority_badge: bool,
    has_promotional_video: bool,
    total_discount: Decimal,
    is_active: bool,
    auto_renew: bool,
    created_at: DateTime<Utc>,
}

impl SubscriptionRow {
    fn into_subscription(self) -> Result<ProviderSubscription, StoreError> {
        let plan_type = PlanType::from_str(&self.plan_type)
            .map_err(|e| StoreError::DataCorruption(format!("invalid plan type in store: {e}")))?;
        Ok(ProviderSubscription {
            id: SubscriptionId::new(self.id),
            provider_id: UserId::new(self.provider_id),
            plan_type,
            price_per_year: self.price_per_year,
            can_take_bookings: self.can_take_bookings,
            can_list_products: self.can_list_products,
            search_priority: self.search_priority,
            has_priority_badge: self.has_priority_badge,
            has_promotional_video: self.has_promotional_video,
            total_discount: self.total_discount,
            is_active: self.is_active,
            auto_renew: self.auto_renew,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: String,
    applicant_id: String,
    business_name: String,
    business_email: String,
    business_phone: String,
    description: String,
    business_address: String,
    business_city: String,
    business_type: String,
    status: String,
    status_notes: Option<String>,
    reviewed_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl ApplicationRow {
    fn into_application(self) -> Result<BusinessApplication, StoreError> {
        let business_type = UserRole::from_str(&self.business_type).map_err(|e| {
            StoreError::DataCorruption(format!("invalid business type in store: {e}"))
        })?;
        let status = ApplicationStatus::from_str(&self.status).map_err(|e| {
            StoreError::DataCorruption(format!("invalid application status in store: {e}"))
        })?;
        Ok(BusinessApplication {
            id: ApplicationId::new(self.id),
            applicant_id: UserId::new(self.applicant_id),
            business_name: self.business_name,
            business_email: self.business_email,
            business_phone: self.business_phone,
            description: self.description,
            business_address: self.business_address,
            business_city: self.business_city,
            business_type,
            status,
            status_notes: self.status_notes,
            reviewed_by: self.reviewed_by,
            approved_at: self.approved_at,
            created_at: self.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Store implementation
// ---------------------------------------------------------------------------

const DESIGN_COLUMNS: &str = "id, name, slug, description, category_id, created_at";
const CATEGORY_COLUMNS: &str = "id, name, slug, description, design_id, created_at";
const SUB_CATEGORY_COLUMNS: &str = "id, name, slug, category_id, created_at";
const USER_COLUMNS: &str = "id, name, phone, email, role, is_verified, verified_at, created_at";
const SHOP_COLUMNS: &str =
    "id, name, phone, email, description, city, address_id, owner_id, design_id, created_at";
const SERVICE_COLUMNS: &str = "id, embedding_text, phone, city, shop_id, owner_user_id, \
     translation_id, category_id, sub_category_id, design_id, created_at";
const REVIEW_COLUMNS: &str =
    "id, rating, comment, author_id, service_id, shop_id, is_verified, created_at";
const SUBSCRIPTION_COLUMNS: &str = "id, provider_id, plan_type, price_per_year, \
     can_take_bookings, can_list_products, search_priority, has_priority_badge, \
     has_promotional_video, total_discount, is_active, auto_renew, created_at";
const APPLICATION_COLUMNS: &str = "id, applicant_id, business_name, business_email, \
     business_phone, description, business_address, business_city, business_type, status, \
     status_notes, reviewed_by, approved_at, created_at";

impl Store for PgStore {
    async fn find_design_by_slug(&self, slug: &str) -> Result<Option<Design>, StoreError> {
        let row: Option<DesignRow> = sqlx::query_as(&format!(
            "SELECT {DESIGN_COLUMNS} FROM directory.design WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Design::from))
    }

    async fn first_design(&self) -> Result<Option<Design>, StoreError> {
        let row: Option<DesignRow> = sqlx::query_as(&format!(
            "SELECT {DESIGN_COLUMNS} FROM directory.design ORDER BY created_at, id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Design::from))
    }

    async fn create_design(&self, design: CreateDesign) -> Result<Design, StoreError> {
        let id = DesignId::generate();
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO directory.design (id, name, slug, description, category_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING created_at",
        )
        .bind(id.as_str())
        .bind(&design.name)
        .bind(&design.slug)
        .bind(&design.description)
        .bind(design.category_id.as_ref().map(CategoryId::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "design"))?;

        debug!(id = %id, slug = %design.slug, "Created design");
        Ok(Design {
            id,
            name: design.name,
            slug: design.slug,
            description: design.description,
            category_id: design.category_id,
            created_at,
        })
    }

    async fn set_design_category(
        &self,
        id: &DesignId,
        category_id: &CategoryId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query::<sqlx::Postgres>(
            "UPDATE directory.design SET category_id = $1 WHERE id = $2",
        )
        .bind(category_id.as_str())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_category_by_id(&self, id: &CategoryId) -> Result<Option<Category>, StoreError> {
        let row: Option<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM directory.category WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, StoreError> {
        let row: Option<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM directory.category WHERE name = $1 \
             ORDER BY created_at, id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn first_category(&self) -> Result<Option<Category>, StoreError> {
        let row: Option<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM directory.category ORDER BY created_at, id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn create_category(&self, category: CreateCategory) -> Result<Category, StoreError> {
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO directory.category (id, name, slug, description, design_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING created_at",
        )
        .bind(category.id.as_str())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(category.design_id.as_ref().map(DesignId::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category"))?;

        debug!(id = %category.id, "Created category");
        Ok(Category {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            design_id: category.design_id,
            created_at,
        })
    }

    async fn set_category_design(
        &self,
        id: &CategoryId,
        design_id: &DesignId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query::<sqlx::Postgres>(
            "UPDATE directory.category SET design_id = $1 WHERE id = $2",
        )
        .bind(design_id.as_str())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_sub_category(
        &self,
        lookup: &SubCategoryLookup,
    ) -> Result<Option<SubCategory>, StoreError> {
        // Clauses evaluated in order; one query per clause keeps
        // first-match-wins semantics explicit.
        let by_id: Option<SubCategoryRow> = sqlx::query_as(&format!(
            "SELECT {SUB_CATEGORY_COLUMNS} FROM directory.sub_category WHERE id = $1"
        ))
        .bind(lookup.id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        if let Some(row) = by_id {
            return Ok(Some(row.into()));
        }

        let by_name: Option<SubCategoryRow> = sqlx::query_as(&format!(
            "SELECT {SUB_CATEGORY_COLUMNS} FROM directory.sub_category \
             WHERE name = $1 AND category_id = $2"
        ))
        .bind(&lookup.name)
        .bind(lookup.category_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        if let Some(row) = by_name {
            return Ok(Some(row.into()));
        }

        for slug in [&lookup.id_slug, &lookup.name_slug] {
            let by_slug: Option<SubCategoryRow> = sqlx::query_as(&format!(
                "SELECT {SUB_CATEGORY_COLUMNS} FROM directory.sub_category WHERE slug = $1"
            ))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
            if let Some(row) = by_slug {
                return Ok(Some(row.into()));
            }
        }

        Ok(None)
    }

    async fn find_sub_category_by_id(
        &self,
        id: &SubCategoryId,
    ) -> Result<Option<SubCategory>, StoreError> {
        let row: Option<SubCategoryRow> = sqlx::query_as(&format!(
            "SELECT {SUB_CATEGORY_COLUMNS} FROM directory.sub_category WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SubCategory::from))
    }

    async fn first_sub_category_in(
        &self,
        category_id: &CategoryId,
    ) -> Result<Option<SubCategory>, StoreError> {
        let row: Option<SubCategoryRow> = sqlx::query_as(&format!(
            "SELECT {SUB_CATEGORY_COLUMNS} FROM directory.sub_category \
             WHERE category_id = $1 ORDER BY created_at, id LIMIT 1"
        ))
        .bind(category_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SubCategory::from))
    }

    async fn create_sub_category(
        &self,
        sub_category: CreateSubCategory,
    ) -> Result<SubCategory, StoreError> {
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO directory.sub_category (id, name, slug, category_id)
             VALUES ($1, $2, $3, $4)
             RETURNING created_at",
        )
        .bind(sub_category.id.as_str())
        .bind(&sub_category.name)
        .bind(&sub_category.slug)
        .bind(sub_category.category_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "sub_category"))?;

        debug!(id = %sub_category.id, "Created subcategory");
        Ok(SubCategory {
            id: sub_category.id,
            name: sub_category.name,
            slug: sub_category.slug,
            category_id: sub_category.category_id,
            created_at,
        })
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM directory.app_user WHERE name = $1 \
             ORDER BY created_at, id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn create_user(&self, user: CreateUser) -> Result<User, StoreError> {
        let id = UserId::generate();
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO directory.app_user (id, name, phone, email, role, is_verified, verified_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING created_at",
        )
        .bind(id.as_str())
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.email)
        .bind(user.role.to_string())
        .bind(user.is_verified)
        .bind(user.verified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "user"))?;

        debug!(id = %id, name = %user.name, "Created user");
        Ok(User {
            id,
            name: user.name,
            phone: user.phone,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
            verified_at: user.verified_at,
            created_at,
        })
    }

    async fn find_shop_by_name_and_owner(
        &self,
        name: &str,
        owner_id: &UserId,
    ) -> Result<Option<Shop>, StoreError> {
        let row: Option<ShopRow> = sqlx::query_as(&format!(
            "SELECT {SHOP_COLUMNS} FROM directory.shop WHERE name = $1 AND owner_id = $2"
        ))
        .bind(name)
        .bind(owner_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Shop::from))
    }

    async fn create_shop(&self, shop: CreateShop) -> Result<Shop, StoreError> {
        let id = ShopId::generate();
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO directory.shop \
                 (id, name, phone, email, description, city, address_id, owner_id, design_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING created_at",
        )
        .bind(id.as_str())
        .bind(&shop.name)
        .bind(&shop.phone)
        .bind(&shop.email)
        .bind(&shop.description)
        .bind(&shop.city)
        .bind(shop.address_id.as_str())
        .bind(shop.owner_id.as_str())
        .bind(shop.design_id.as_ref().map(DesignId::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "shop"))?;

        debug!(id = %id, name = %shop.name, "Created shop");
        Ok(Shop {
            id,
            name: shop.name,
            phone: shop.phone,
            email: shop.email,
            description: shop.description,
            city: shop.city,
            address_id: shop.address_id,
            owner_id: shop.owner_id,
            design_id: shop.design_id,
            created_at,
        })
    }

    async fn create_translation(
        &self,
        translation: CreateTranslation,
    ) -> Result<Translation, StoreError> {
        let id = TranslationId::generate();
        sqlx::query::<sqlx::Postgres>(
            "INSERT INTO directory.shop_translation (id, text_ar, text_en) VALUES ($1, $2, $3)",
        )
        .bind(id.as_str())
        .bind(&translation.text_ar)
        .bind(&translation.text_en)
        .execute(&self.pool)
        .await?;

        Ok(Translation {
            id,
            text_ar: translation.text_ar,
            text_en: translation.text_en,
        })
    }

    async fn find_service_by_shop_and_text(
        &self,
        shop_id: &ShopId,
        embedding_text: &str,
    ) -> Result<Option<Service>, StoreError> {
        let row: Option<ServiceRow> = sqlx::query_as(&format!(
            "SELECT {SERVICE_COLUMNS} FROM directory.service \
             WHERE shop_id = $1 AND embedding_text = $2"
        ))
        .bind(shop_id.as_str())
        .bind(embedding_text)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Service::from))
    }

    async fn create_service(&self, service: CreateService) -> Result<Service, StoreError> {
        let id = ServiceId::generate();
        let mut tx = self.pool.begin().await?;

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO directory.service \
                 (id, embedding_text, phone, city, shop_id, owner_user_id, translation_id, \
                  category_id, sub_category_id, design_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING created_at",
        )
        .bind(id.as_str())
        .bind(&service.embedding_text)
        .bind(&service.phone)
        .bind(&service.city)
        .bind(service.shop_id.as_str())
        .bind(service.owner_user_id.as_str())
        .bind(service.translation_id.as_str())
        .bind(service.category_id.as_ref().map(CategoryId::as_str))
        .bind(service.sub_category_id.as_ref().map(SubCategoryId::as_str))
        .bind(service.design_id.as_ref().map(DesignId::as_str))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "service"))?;

        for tag_id in &service.tag_ids {
            sqlx::query::<sqlx::Postgres>(
                "INSERT INTO directory.service_tag (service_id, tag_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(id.as_str())
            .bind(tag_id.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(id = %id, shop = %service.shop_id, "Created service");
        Ok(Service {
            id,
            embedding_text: service.embedding_text,
            phone: service.phone,
            city: service.city,
            shop_id: service.shop_id,
            owner_user_id: service.owner_user_id,
            translation_id: service.translation_id,
            category_id: service.category_id,
            sub_category_id: service.sub_category_id,
            design_id: service.design_id,
            created_at,
        })
    }

    async fn create_service_translation(
        &self,
        translation: CreateServiceTranslation,
    ) -> Result<ServiceTranslation, StoreError> {
        let id = TranslationId::generate();
        sqlx::query::<sqlx::Postgres>(
            "INSERT INTO directory.service_translation \
                 (id, name_ar, name_en, description_ar, description_en)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id.as_str())
        .bind(&translation.name_ar)
        .bind(&translation.name_en)
        .bind(&translation.description_ar)
        .bind(&translation.description_en)
        .execute(&self.pool)
        .await?;

        Ok(ServiceTranslation {
            id,
            name_ar: translation.name_ar,
            name_en: translation.name_en,
            description_ar: translation.description_ar,
            description_en: translation.description_en,
        })
    }

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, StoreError> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT id, name FROM directory.tag WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id, name)| Tag {
            id: TagId::new(id),
            name,
        }))
    }

    async fn create_tag(&self, name: &str) -> Result<Tag, StoreError> {
        let id = TagId::generate();
        sqlx::query::<sqlx::Postgres>("INSERT INTO directory.tag (id, name) VALUES ($1, $2)")
            .bind(id.as_str())
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "tag"))?;

        Ok(Tag {
            id,
            name: name.to_owned(),
        })
    }

    async fn find_review_by_comment_and_service(
        &self,
        comment: &str,
        service_id: &ServiceId,
    ) -> Result<Option<Review>, StoreError> {
        let row: Option<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM directory.review \
             WHERE comment = $1 AND service_id = $2 \
             ORDER BY created_at, id LIMIT 1"
        ))
        .bind(comment)
        .bind(service_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Review::from))
    }

    async fn create_review(&self, review: CreateReview) -> Result<Review, StoreError> {
        let id = ReviewId::generate();
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO directory.review \
                 (id, rating, comment, author_id, service_id, shop_id, is_verified)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING created_at",
        )
        .bind(id.as_str())
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.author_id.as_str())
        .bind(review.service_id.as_str())
        .bind(review.shop_id.as_ref().map(ShopId::as_str))
        .bind(review.is_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "review"))?;

        Ok(Review {
            id,
            rating: review.rating,
            comment: review.comment,
            author_id: review.author_id,
            service_id: review.service_id,
            shop_id: review.shop_id,
            is_verified: review.is_verified,
            created_at,
        })
    }

    async fn find_subscription_by_provider(
        &self,
        provider_id: &UserId,
    ) -> Result<Option<ProviderSubscription>, StoreError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM directory.provider_subscription \
             WHERE provider_id = $1"
        ))
        .bind(provider_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(SubscriptionRow::into_subscription).transpose()
    }

    async fn create_subscription(
        &self,
        subscription: CreateSubscription,
    ) -> Result<ProviderSubscription, StoreError> {
        let id = SubscriptionId::generate();
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO directory.provider_subscription \
                 (id, provider_id, plan_type, price_per_year, can_take_bookings, \
                  can_list_products, search_priority, has_priority_badge, \
                  has_promotional_video, total_discount, is_active, auto_renew)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING created_at",
        )
        .bind(id.as_str())
        .bind(subscription.provider_id.as_str())
        .bind(subscription.plan_type.to_string())
        .bind(subscription.price_per_year)
        .bind(subscription.can_take_bookings)
        .bind(subscription.can_list_products)
        .bind(subscription.search_priority)
        .bind(subscription.has_priority_badge)
        .bind(subscription.has_promotional_video)
        .bind(subscription.total_discount)
        .bind(subscription.is_active)
        .bind(subscription.auto_renew)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "subscription"))?;

        debug!(provider = %subscription.provider_id, "Created subscription");
        Ok(ProviderSubscription {
            id,
            provider_id: subscription.provider_id,
            plan_type: subscription.plan_type,
            price_per_year: subscription.price_per_year,
            can_take_bookings: subscription.can_take_bookings,
            can_list_products: subscription.can_list_products,
            search_priority: subscription.search_priority,
            has_priority_badge: subscription.has_priority_badge,
            has_promotional_video: subscription.has_promotional_video,
            total_discount: subscription.total_discount,
            is_active: subscription.is_active,
            auto_renew: subscription.auto_renew,
            created_at,
        })
    }

    async fn find_application(
        &self,
        applicant_id: &UserId,
        business_name: &str,
    ) -> Result<Option<BusinessApplication>, StoreError> {
        let row: Option<ApplicationRow> = sqlx::query_as(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM directory.business_application \
             WHERE applicant_id = $1 AND business_name = $2"
        ))
        .bind(applicant_id.as_str())
        .bind(business_name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ApplicationRow::into_application).transpose()
    }

    async fn create_application(
        &self,
        application: CreateApplication,
    ) -> Result<BusinessApplication, StoreError> {
        let id = ApplicationId::generate();
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO directory.business_application \
                 (id, applicant_id, business_name, business_email, business_phone, \
                  description, business_address, business_city, business_type, status, \
                  status_notes, reviewed_by, approved_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING created_at",
        )
        .bind(id.as_str())
        .bind(application.applicant_id.as_str())
        .bind(&application.business_name)
        .bind(&application.business_email)
        .bind(&application.business_phone)
        .bind(&application.description)
        .bind(&application.business_address)
        .bind(&application.business_city)
        .bind(application.business_type.to_string())
        .bind(application.status.to_string())
        .bind(&application.status_notes)
        .bind(&application.reviewed_by)
        .bind(application.approved_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "business application"))?;

        debug!(applicant = %application.applicant_id, "Created business application");
        Ok(BusinessApplication {
            id,
            applicant_id: application.applicant_id,
            business_name: application.business_name,
            business_email: application.business_email,
            business_phone: application.business_phone,
            description: application.description,
            business_address: application.business_address,
            business_city: application.business_city,
            business_type: application.business_type,
            status: application.status,
            status_notes: application.status_notes,
            reviewed_by: application.reviewed_by,
            approved_at: application.approved_at,
            created_at,
        })
    }
}
