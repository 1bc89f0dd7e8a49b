//! Input document types.
//!
//! The pipeline ingests a single JSON document:
//!
//! ```json
//! {
//!   "categories": [
//!     { "id": "derma", "name": "Dermatology",
//!       "sub_categories": [{ "id": "derma-skin", "name": "Skin Care" }] }
//!   ],
//!   "entries": [
//!     {
//!       "user": { "name": "Dr. X", "role": "PROVIDER" },
//!       "shop": { "name": "Clinic A", "tags": ["clinic"] },
//!       "service": { "embeddingText": "clinic a cardiology" },
//!       "reviews": [{ "comment": "great", "rating": "4" }]
//!     }
//!   ]
//! }
//! ```
//!
//! Unknown fields are ignored; optional fields fall back to the synthesized
//! defaults documented on the orchestrator.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use dalil_core::{CategoryId, SubCategoryId, UserRole};

use crate::error::ImportError;

/// The full input document.
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    /// Business records to import.
    pub entries: Vec<Entry>,
    /// Optional taxonomy; when absent, bootstrap falls back to defaults.
    #[serde(default)]
    pub categories: Vec<CategoryInput>,
}

impl Dataset {
    /// Load a dataset from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::InputRead`] if the file cannot be read and
    /// [`ImportError::InputParse`] if it is not a valid dataset document.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ImportError::InputRead {
                    path: path.to_path_buf(),
                    source,
                })?;
        serde_json::from_str(&content).map_err(|source| ImportError::InputParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// One business record: owner, storefront, service and optional reviews.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub user: UserInput,
    pub shop: ShopInput,
    pub service: ServiceInput,
    #[serde(default)]
    pub reviews: Vec<ReviewInput>,
}

/// Source fields for the owning user.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Role string; anything unrecognized resolves to `PROVIDER`.
    #[serde(default)]
    pub role: Option<String>,
}

impl UserInput {
    /// Resolve the effective role, defaulting to `PROVIDER` when the source
    /// omits the field or carries an unknown value.
    #[must_use]
    pub fn resolved_role(&self) -> UserRole {
        self.role
            .as_deref()
            .and_then(|r| UserRole::from_str(r).ok())
            .unwrap_or_default()
    }
}

/// Source fields for the shop.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopInput {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address_ar: Option<String>,
    #[serde(default)]
    pub address_en: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Source fields for the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInput {
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub description_ar: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
    /// Stored descriptive string; synthesized when absent.
    #[serde(default, rename = "embeddingText")]
    pub embedding_text: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub sub_category_id: Option<SubCategoryId>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One source review.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Ratings arrive as numbers or strings; see
    /// [`coerce_rating`](crate::pipeline::coerce_rating).
    #[serde(default)]
    pub rating: Option<Value>,
}

/// Source phone fields use `"N/A"` as a null marker; normalize it away.
#[must_use]
pub fn clean_phone(phone: Option<&str>) -> Option<String> {
    phone
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "N/A")
        .map(ToOwned::to_owned)
}

/// Non-empty trimmed string, or `None`.
#[must_use]
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A taxonomy category from the input document.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub sub_categories: Vec<SubCategoryInput>,
}

/// A taxonomy subcategory from the input document.
#[derive(Debug, Clone, Deserialize)]
pub struct SubCategoryInput {
    pub id: SubCategoryId,
    pub name: String,
}
