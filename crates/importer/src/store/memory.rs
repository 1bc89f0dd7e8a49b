//! In-memory store backend.
//!
//! Backs `--dry-run` dataset validation and the test suite. Rows live in
//! insertion-ordered vectors so "first" fallback accessors behave exactly
//! like the PostgreSQL backend's `ORDER BY created_at, id` queries, and the
//! schema's uniqueness constraints are enforced by explicit checks that
//! surface the same [`StoreError::Conflict`].

use std::sync::Mutex;

use chrono::Utc;

use dalil_core::{
    ApplicationId, BusinessApplication, Category, CategoryId, Design, DesignId,
    ProviderSubscription, Review, ReviewId, Service, ServiceId, ServiceTranslation, Shop, ShopId,
    SubCategory, SubCategoryId, SubscriptionId, Tag, TagId, Translation, TranslationId, User,
    UserId,
};

use super::{
    CreateApplication, CreateCategory, CreateDesign, CreateReview, CreateService,
    CreateServiceTranslation, CreateShop, CreateSubCategory, CreateSubscription,
    CreateTranslation, CreateUser, Store, StoreError, SubCategoryLookup,
};

/// Store backend over insertion-ordered in-memory tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    /// Remaining service creations to fail, for error-isolation tests.
    #[cfg(test)]
    pub(crate) fail_service_creates: std::sync::atomic::AtomicU32,
}

#[derive(Debug, Default)]
struct Inner {
    designs: Vec<Design>,
    categories: Vec<Category>,
    sub_categories: Vec<SubCategory>,
    users: Vec<User>,
    shops: Vec<Shop>,
    services: Vec<Service>,
    service_tags: Vec<(ServiceId, TagId)>,
    tags: Vec<Tag>,
    reviews: Vec<Review>,
    translations: Vec<Translation>,
    service_translations: Vec<ServiceTranslation>,
    subscriptions: Vec<ProviderSubscription>,
    applications: Vec<BusinessApplication>,
}

/// A full copy of the in-memory tables, for inspection after a run.
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    pub designs: Vec<Design>,
    pub categories: Vec<Category>,
    pub sub_categories: Vec<SubCategory>,
    pub users: Vec<User>,
    pub shops: Vec<Shop>,
    pub services: Vec<Service>,
    pub service_tags: Vec<(ServiceId, TagId)>,
    pub tags: Vec<Tag>,
    pub reviews: Vec<Review>,
    pub translations: Vec<Translation>,
    pub service_translations: Vec<ServiceTranslation>,
    pub subscriptions: Vec<ProviderSubscription>,
    pub applications: Vec<BusinessApplication>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out every table, preserving insertion order.
    #[must_use]
    pub fn snapshot(&self) -> MemorySnapshot {
        let inner = self.lock();
        MemorySnapshot {
            designs: inner.designs.clone(),
            categories: inner.categories.clone(),
            sub_categories: inner.sub_categories.clone(),
            users: inner.users.clone(),
            shops: inner.shops.clone(),
            services: inner.services.clone(),
            service_tags: inner.service_tags.clone(),
            tags: inner.tags.clone(),
            reviews: inner.reviews.clone(),
            translations: inner.translations.clone(),
            service_translations: inner.service_translations.clone(),
            subscriptions: inner.subscriptions.clone(),
            applications: inner.applications.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Store for MemoryStore {
    async fn find_design_by_slug(&self, slug: &str) -> Result<Option<Design>, StoreError> {
        Ok(self.lock().designs.iter().find(|d| d.slug == slug).cloned())
    }

    async fn first_design(&self) -> Result<Option<Design>, StoreError> {
        Ok(self.lock().designs.first().cloned())
    }

    async fn create_design(&self, design: CreateDesign) -> Result<Design, StoreError> {
        let mut inner = self.lock();
        if inner.designs.iter().any(|d| d.slug == design.slug) {
            return Err(StoreError::Conflict("design already exists".to_owned()));
        }
        let created = Design {
            id: DesignId::generate(),
            name: design.name,
            slug: design.slug,
            description: design.description,
            category_id: design.category_id,
            created_at: Utc::now(),
        };
        inner.designs.push(created.clone());
        Ok(created)
    }

    async fn set_design_category(
        &self,
        id: &DesignId,
        category_id: &CategoryId,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let design = inner
            .designs
            .iter_mut()
            .find(|d| d.id == *id)
            .ok_or(StoreError::NotFound)?;
        design.category_id = Some(category_id.clone());
        Ok(())
    }

    async fn find_category_by_id(&self, id: &CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.lock().categories.iter().find(|c| c.id == *id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, StoreError> {
        Ok(self.lock().categories.iter().find(|c| c.name == name).cloned())
    }

    async fn first_category(&self) -> Result<Option<Category>, StoreError> {
        Ok(self.lock().categories.first().cloned())
    }

    async fn create_category(&self, category: CreateCategory) -> Result<Category, StoreError> {
        let mut inner = self.lock();
        if inner
            .categories
            .iter()
            .any(|c| c.id == category.id || c.slug == category.slug)
        {
            return Err(StoreError::Conflict("category already exists".to_owned()));
        }
        let created = Category {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            design_id: category.design_id,
            created_at: Utc::now(),
        };
        inner.categories.push(created.clone());
        Ok(created)
    }

    async fn set_category_design(
        &self,
        id: &CategoryId,
        design_id: &DesignId,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let category = inner
            .categories
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or(StoreError::NotFound)?;
        category.design_id = Some(design_id.clone());
        Ok(())
    }

    async fn find_sub_category(
        &self,
        lookup: &SubCategoryLookup,
    ) -> Result<Option<SubCategory>, StoreError> {
        let inner = self.lock();
        // Ordered clause list: id, (name, category), id-slug, name-slug.
        let found = inner
            .sub_categories
            .iter()
            .find(|s| s.id == lookup.id)
            .or_else(|| {
                inner
                    .sub_categories
                    .iter()
                    .find(|s| s.name == lookup.name && s.category_id == lookup.category_id)
            })
            .or_else(|| {
                inner
                    .sub_categories
                    .iter()
                    .find(|s| s.slug == lookup.id_slug)
            })
            .or_else(|| {
                inner
                    .sub_categories
                    .iter()
                    .find(|s| s.slug == lookup.name_slug)
            });
        Ok(found.cloned())
    }

    async fn find_sub_category_by_id(
        &self,
        id: &SubCategoryId,
    ) -> Result<Option<SubCategory>, StoreError> {
        Ok(self
            .lock()
            .sub_categories
            .iter()
            .find(|s| s.id == *id)
            .cloned())
    }

    async fn first_sub_category_in(
        &self,
        category_id: &CategoryId,
    ) -> Result<Option<SubCategory>, StoreError> {
        Ok(self
            .lock()
            .sub_categories
            .iter()
            .find(|s| s.category_id == *category_id)
            .cloned())
    }

    async fn create_sub_category(
        &self,
        sub_category: CreateSubCategory,
    ) -> Result<SubCategory, StoreError> {
        let mut inner = self.lock();
        if inner.sub_categories.iter().any(|s| {
            s.id == sub_category.id
                || s.slug == sub_category.slug
                || (s.name == sub_category.name && s.category_id == sub_category.category_id)
        }) {
            return Err(StoreError::Conflict("sub_category already exists".to_owned()));
        }
        let created = SubCategory {
            id: sub_category.id,
            name: sub_category.name,
            slug: sub_category.slug,
            category_id: sub_category.category_id,
            created_at: Utc::now(),
        };
        inner.sub_categories.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.name == name).cloned())
    }

    async fn create_user(&self, user: CreateUser) -> Result<User, StoreError> {
        let created = User {
            id: UserId::generate(),
            name: user.name,
            phone: user.phone,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
            verified_at: user.verified_at,
            created_at: Utc::now(),
        };
        self.lock().users.push(created.clone());
        Ok(created)
    }

    async fn find_shop_by_name_and_owner(
        &self,
        name: &str,
        owner_id: &UserId,
    ) -> Result<Option<Shop>, StoreError> {
        Ok(self
            .lock()
            .shops
            .iter()
            .find(|s| s.name == name && s.owner_id == *owner_id)
            .cloned())
    }

    async fn create_shop(&self, shop: CreateShop) -> Result<Shop, StoreError> {
        let mut inner = self.lock();
        if inner
            .shops
            .iter()
            .any(|s| s.name == shop.name && s.owner_id == shop.owner_id)
        {
            return Err(StoreError::Conflict("shop already exists".to_owned()));
        }
        let created = Shop {
            id: ShopId::generate(),
            name: shop.name,
            phone: shop.phone,
            email: shop.email,
            description: shop.description,
            city: shop.city,
            address_id: shop.address_id,
            owner_id: shop.owner_id,
            design_id: shop.design_id,
            created_at: Utc::now(),
        };
        inner.shops.push(created.clone());
        Ok(created)
    }

    async fn create_translation(
        &self,
        translation: CreateTranslation,
    ) -> Result<Translation, StoreError> {
        let created = Translation {
            id: TranslationId::generate(),
            text_ar: translation.text_ar,
            text_en: translation.text_en,
        };
        self.lock().translations.push(created.clone());
        Ok(created)
    }

    async fn find_service_by_shop_and_text(
        &self,
        shop_id: &ShopId,
        embedding_text: &str,
    ) -> Result<Option<Service>, StoreError> {
        Ok(self
            .lock()
            .services
            .iter()
            .find(|s| s.shop_id == *shop_id && s.embedding_text == embedding_text)
            .cloned())
    }

    async fn create_service(&self, service: CreateService) -> Result<Service, StoreError> {
        #[cfg(test)]
        {
            use std::sync::atomic::Ordering;
            if self.fail_service_creates.load(Ordering::SeqCst) > 0 {
                self.fail_service_creates.fetch_sub(1, Ordering::SeqCst);
                return Err(StoreError::DataCorruption(
                    "injected service-create failure".to_owned(),
                ));
            }
        }

        let mut inner = self.lock();
        if inner
            .services
            .iter()
            .any(|s| s.shop_id == service.shop_id && s.embedding_text == service.embedding_text)
        {
            return Err(StoreError::Conflict("service already exists".to_owned()));
        }
        let created = Service {
            id: ServiceId::generate(),
            embedding_text: service.embedding_text,
            phone: service.phone,
            city: service.city,
            shop_id: service.shop_id,
            owner_user_id: service.owner_user_id,
            translation_id: service.translation_id,
            category_id: service.category_id,
            sub_category_id: service.sub_category_id,
            design_id: service.design_id,
            created_at: Utc::now(),
        };
        for tag_id in service.tag_ids {
            inner.service_tags.push((created.id.clone(), tag_id));
        }
        inner.services.push(created.clone());
        Ok(created)
    }

    async fn create_service_translation(
        &self,
        translation: CreateServiceTranslation,
    ) -> Result<ServiceTranslation, StoreError> {
        let created = ServiceTranslation {
            id: TranslationId::generate(),
            name_ar: translation.name_ar,
            name_en: translation.name_en,
            description_ar: translation.description_ar,
            description_en: translation.description_en,
        };
        self.lock().service_translations.push(created.clone());
        Ok(created)
    }

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, StoreError> {
        Ok(self.lock().tags.iter().find(|t| t.name == name).cloned())
    }

    async fn create_tag(&self, name: &str) -> Result<Tag, StoreError> {
        let mut inner = self.lock();
        if inner.tags.iter().any(|t| t.name == name) {
            return Err(StoreError::Conflict("tag already exists".to_owned()));
        }
        let created = Tag {
            id: TagId::generate(),
            name: name.to_owned(),
        };
        inner.tags.push(created.clone());
        Ok(created)
    }

    async fn find_review_by_comment_and_service(
        &self,
        comment: &str,
        service_id: &ServiceId,
    ) -> Result<Option<Review>, StoreError> {
        Ok(self
            .lock()
            .reviews
            .iter()
            .find(|r| r.comment == comment && r.service_id == *service_id)
            .cloned())
    }

    async fn create_review(&self, review: CreateReview) -> Result<Review, StoreError> {
        let created = Review {
            id: ReviewId::generate(),
            rating: review.rating,
            comment: review.comment,
            author_id: review.author_id,
            service_id: review.service_id,
            shop_id: review.shop_id,
            is_verified: review.is_verified,
            created_at: Utc::now(),
        };
        self.lock().reviews.push(created.clone());
        Ok(created)
    }

    async fn find_subscription_by_provider(
        &self,
        provider_id: &UserId,
    ) -> Result<Option<ProviderSubscription>, StoreError> {
        Ok(self
            .lock()
            .subscriptions
            .iter()
            .find(|s| s.provider_id == *provider_id)
            .cloned())
    }

    async fn create_subscription(
        &self,
        subscription: CreateSubscription,
    ) -> Result<ProviderSubscription, StoreError> {
        let mut inner = self.lock();
        if inner
            .subscriptions
            .iter()
            .any(|s| s.provider_id == subscription.provider_id)
        {
            return Err(StoreError::Conflict("subscription already exists".to_owned()));
        }
        let created = ProviderSubscription {
            id: SubscriptionId::generate(),
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
            created_at: Utc::now(),
        };
        inner.subscriptions.push(created.clone());
        Ok(created)
    }

    async fn find_application(
        &self,
        applicant_id: &UserId,
        business_name: &str,
    ) -> Result<Option<BusinessApplication>, StoreError> {
        Ok(self
            .lock()
            .applications
            .iter()
            .find(|a| a.applicant_id == *applicant_id && a.business_name == business_name)
            .cloned())
    }

    async fn create_application(
        &self,
        application: CreateApplication,
    ) -> Result<BusinessApplication, StoreError> {
        let mut inner = self.lock();
        if inner
            .applications
            .iter()
            .any(|a| {
                a.applicant_id == application.applicant_id
                    && a.business_name == application.business_name
            })
        {
            return Err(StoreError::Conflict(
                "business application already exists".to_owned(),
            ));
        }
        let created = BusinessApplication {
            id: ApplicationId::generate(),
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
            created_at: Utc::now(),
        };
        inner.applications.push(created.clone());
        Ok(created)
    }
}
