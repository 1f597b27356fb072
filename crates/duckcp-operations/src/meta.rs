//! Catalog lifecycle.

use duckcp_core::{DuckcpContext, DuckcpResult};
use tracing::debug;

/// Creates the catalog and its schema. Returns `false` when it already exists and `force` is
/// not set.
pub fn meta_create(ctx: &DuckcpContext, force: bool) -> DuckcpResult<bool> {
    debug!(path = %ctx.catalog().path().display(), force, "creating catalog");
    Ok(ctx.catalog().create(force)?)
}

/// Removes the catalog file. Returns `false` when there was none.
pub fn meta_delete(ctx: &DuckcpContext) -> DuckcpResult<bool> {
    Ok(ctx.catalog().delete()?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        repository::{repository_create, repository_find},
        testing::{props, TestCatalog},
    };

    #[test]
    fn test_meta_create_and_delete() {
        let env = TestCatalog::uncreated();

        assert!(meta_create(&env.ctx, false).unwrap());
        assert!(env.ctx.catalog().exists());
        assert!(!meta_create(&env.ctx, false).unwrap());

        assert!(meta_delete(&env.ctx).unwrap());
        assert!(!meta_delete(&env.ctx).unwrap());
        assert!(!env.ctx.catalog().exists());
    }

    #[test]
    fn test_force_recreates_empty_catalog() {
        let env = TestCatalog::new();
        let properties = props(json!({"file": env.path("a.db")}));
        repository_create(&env.ctx, "a", "sqlite", properties).unwrap();
        assert!(repository_find(&env.ctx, "a").unwrap().is_some());

        assert!(meta_create(&env.ctx, true).unwrap());
        assert!(repository_find(&env.ctx, "a").unwrap().is_none());
    }
}
