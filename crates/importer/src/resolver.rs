//! The find-or-create primitive.
//!
//! Every entity resolution in the pipeline goes through [`resolve`]: run a
//! find, return the existing row if any clause matched, otherwise run the
//! create. Exactly one store mutation (the create) or zero (resolve-only)
//! happens per call; the find side never mutates.
//!
//! Multi-clause lookups (category by id or name, subcategory by id, name or
//! slug variants) live behind the store seam and evaluate their clauses in
//! list order, first match wins — so stronger resolution keys can be swapped
//! in per entity type without touching orchestration.
//!
//! Find-then-create is deliberately not atomic. The pipeline is strictly
//! sequential, so nothing can slip between the find and the create; a
//! parallel caller must rely on the store's uniqueness constraints and treat
//! a conflict as "already exists".

use std::future::Future;

/// Outcome of a find-or-create resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<T> {
    /// An existing entity matched; no mutation happened.
    Existing(T),
    /// No clause matched; the entity was created.
    Created(T),
}

impl<T> Resolution<T> {
    /// Borrow the resolved entity regardless of outcome.
    pub const fn entity(&self) -> &T {
        match self {
            Self::Existing(entity) | Self::Created(entity) => entity,
        }
    }

    /// Consume the resolution, returning the entity.
    pub fn into_inner(self) -> T {
        match self {
            Self::Existing(entity) | Self::Created(entity) => entity,
        }
    }

    /// Whether this resolution created a new entity.
    pub const fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Resolve an entity: return the first existing match, or create it.
///
/// Both arguments are lazy futures; `create` is only awaited when `find`
/// yields nothing.
///
/// # Errors
///
/// Propagates whatever error the find or create future returns.
pub async fn resolve<T, E, F, C>(find: F, create: C) -> Result<Resolution<T>, E>
where
    F: Future<Output = Result<Option<T>, E>>,
    C: Future<Output = Result<T, E>>,
{
    if let Some(existing) = find.await? {
        return Ok(Resolution::Existing(existing));
    }
    create.await.map(Resolution::Created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_existing_short_circuits_create() {
        let result: Result<Resolution<u32>, ()> =
            resolve(async { Ok(Some(7)) }, async { panic!("create must not run") }).await;
        let resolution = result.expect("resolution");
        assert_eq!(resolution, Resolution::Existing(7));
        assert!(!resolution.was_created());
    }

    #[tokio::test]
    async fn test_missing_runs_create() {
        let result: Result<Resolution<u32>, ()> =
            resolve(async { Ok(None) }, async { Ok(42) }).await;
        let resolution = result.expect("resolution");
        assert_eq!(resolution, Resolution::Created(42));
        assert!(resolution.was_created());
        assert_eq!(resolution.into_inner(), 42);
    }

    #[tokio::test]
    async fn test_find_error_propagates() {
        let result: Result<Resolution<u32>, &str> =
            resolve(async { Err("boom") }, async { Ok(42) }).await;
        assert_eq!(result.expect_err("find error"), "boom");
    }
}
