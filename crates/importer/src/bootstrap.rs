//! Taxonomy bootstrap.
//!
//! Runs once at the start of a batch, before any record is processed.
//! Guarantees that afterwards at least one category with a non-null design
//! and at least one subcategory exist, so per-record fallback resolution
//! always has a target. Failures here are fatal to the whole batch.
//!
//! The Category↔Design ownership cycle is broken with a two-phase create:
//! designs start with no owning category (the placeholder phase), the
//! category is created pointing at a design, and the design's owner is
//! patched once the real category id exists.

use tracing::{debug, info};

use dalil_core::{Category, CategoryId, Design, SubCategoryId};

use crate::error::ImportError;
use crate::input::CategoryInput;
use crate::resolver::resolve;
use crate::stats::ImportStats;
use crate::store::{CreateCategory, CreateDesign, CreateSubCategory, Store, SubCategoryLookup};

/// Slug of the design used for provisional category ownership.
pub const DEFAULT_DESIGN_SLUG: &str = "default";

/// Name of the fallback category created when the input has no taxonomy.
pub const DEFAULT_CATEGORY_NAME: &str = "Default";

/// Lowercase a string and collapse whitespace runs into single dashes.
pub(crate) fn slugify(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Ensure the default taxonomy exists, or materialize the input taxonomy.
///
/// # Errors
///
/// Any store failure here aborts the batch; there is no record boundary to
/// isolate it.
pub async fn ensure_taxonomy<S: Store>(
    store: &S,
    categories: &[CategoryInput],
    stats: &mut ImportStats,
) -> Result<(), ImportError> {
    let default_design = ensure_default_design(store, stats).await?;

    if categories.is_empty() {
        info!("No categories in input, using default taxonomy");
        ensure_default_category(store, &default_design, stats).await?;
    } else {
        info!(count = categories.len(), "Processing categories and designs");
        for category_input in categories {
            let category = ensure_category(store, category_input, &default_design, stats).await?;
            for sub_input in &category_input.sub_categories {
                ensure_sub_category(store, sub_input, &category, stats).await?;
            }
        }
    }

    // The provisional design may still be ownerless; backfill it so every
    // design ends up with an owning category.
    if default_design.category_id.is_none()
        && let Some(first) = store.first_category().await?
    {
        store.set_design_category(&default_design.id, &first.id).await?;
    }

    Ok(())
}

async fn ensure_default_design<S: Store>(
    store: &S,
    stats: &mut ImportStats,
) -> Result<Design, ImportError> {
    let resolution = resolve(
        store.find_design_by_slug(DEFAULT_DESIGN_SLUG),
        store.create_design(CreateDesign {
            name: "Default".to_owned(),
            slug: DEFAULT_DESIGN_SLUG.to_owned(),
            description: Some("Default design".to_owned()),
            category_id: None,
        }),
    )
    .await?;

    if resolution.was_created() {
        stats.designs_created += 1;
        info!("Default design created");
    }
    Ok(resolution.into_inner())
}

async fn ensure_default_category<S: Store>(
    store: &S,
    default_design: &Design,
    stats: &mut ImportStats,
) -> Result<(), ImportError> {
    let resolution = resolve(
        store.find_category_by_name(DEFAULT_CATEGORY_NAME),
        store.create_category(CreateCategory {
            id: CategoryId::generate(),
            name: DEFAULT_CATEGORY_NAME.to_owned(),
            slug: "default".to_owned(),
            description: Some("Default category".to_owned()),
            design_id: Some(default_design.id.clone()),
        }),
    )
    .await?;

    if resolution.was_created() {
        stats.categories_created += 1;
        let category = resolution.entity();
        store
            .create_sub_category(CreateSubCategory {
                id: SubCategoryId::generate(),
                name: "General".to_owned(),
                slug: "general".to_owned(),
                category_id: category.id.clone(),
            })
            .await?;
        stats.sub_categories_created += 1;
        info!("Default category and subcategory created");
    } else {
        stats.categories_skipped += 1;
        debug!("Default category already exists");
    }

    Ok(())
}

async fn ensure_category<S: Store>(
    store: &S,
    input: &CategoryInput,
    default_design: &Design,
    stats: &mut ImportStats,
) -> Result<Category, ImportError> {
    debug!(name = %input.name, "Processing category");

    let slug = input.id.as_str().to_lowercase();
    let resolution = resolve(
        // Ordered clauses: id first, then name.
        async {
            match store.find_category_by_id(&input.id).await? {
                Some(category) => Ok(Some(category)),
                None => store.find_category_by_name(&input.name).await,
            }
        },
        store.create_category(CreateCategory {
            id: input.id.clone(),
            name: input.name.clone(),
            slug: slug.clone(),
            description: Some(input.name.clone()),
            design_id: Some(default_design.id.clone()),
        }),
    )
    .await?;

    if !resolution.was_created() {
        stats.categories_skipped += 1;
        debug!(name = %input.name, "Category already exists");
        return Ok(resolution.into_inner());
    }

    let category = resolution.into_inner();
    stats.categories_created += 1;
    info!(name = %input.name, "Created category");

    // Two-phase cycle resolution: the dedicated design is born owned by the
    // category, then the category is repointed from the provisional design.
    let design = store
        .create_design(CreateDesign {
            name: input.name.clone(),
            slug,
            description: Some(format!("Design for {}", input.name)),
            category_id: Some(category.id.clone()),
        })
        .await?;
    stats.designs_created += 1;
    store.set_category_design(&category.id, &design.id).await?;

    Ok(Category {
        design_id: Some(design.id),
        ..category
    })
}

async fn ensure_sub_category<S: Store>(
    store: &S,
    input: &crate::input::SubCategoryInput,
    category: &Category,
    stats: &mut ImportStats,
) -> Result<(), ImportError> {
    let id_slug = slugify(input.id.as_str());
    let name_slug = slugify(&input.name);
    let lookup = SubCategoryLookup {
        id: input.id.clone(),
        name: input.name.clone(),
        category_id: category.id.clone(),
        id_slug: id_slug.clone(),
        name_slug,
    };

    let resolution = resolve(
        store.find_sub_category(&lookup),
        store.create_sub_category(CreateSubCategory {
            id: input.id.clone(),
            name: input.name.clone(),
            slug: id_slug,
            category_id: category.id.clone(),
        }),
    )
    .await?;

    if resolution.was_created() {
        stats.sub_categories_created += 1;
        info!(name = %input.name, "Created subcategory");
    } else {
        stats.sub_categories_skipped += 1;
        debug!(name = %input.name, "Subcategory already exists");
    }

    Ok(())
}
