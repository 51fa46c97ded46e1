//! Catalog reads
//!
//! The core consumes the catalog only as a read-only collaborator:
//! current unit price and display name for a variant at checkout time.
//! Catalog administration lives outside this service.

use sqlx::SqlitePool;

use crate::db::models::Variant;
use crate::utils::AppResult;

#[derive(Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_variant(&self, variant_id: &str) -> AppResult<Option<Variant>> {
        let variant = sqlx::query_as::<_, Variant>(
            "SELECT id, sku, product_name, unit_price, stock_quantity, reserved_quantity, \
                    is_active, created_at, updated_at \
             FROM product_variants WHERE id = ?1",
        )
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(variant)
    }

    /// Active variant only — what the storefront may sell
    pub async fn find_active_variant(&self, variant_id: &str) -> AppResult<Option<Variant>> {
        Ok(self
            .find_variant(variant_id)
            .await?
            .filter(|v| v.is_active))
    }
}
