use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
};

/// Price and snapshot data for a single catalog product, as read from the
/// trusted store. Client-supplied prices and titles never enter this type.
#[derive(Debug, Clone)]
pub struct PricedProduct {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub image: Option<String>,
    pub unit_price: Decimal,
    pub in_stock: bool,
}

impl From<product::Model> for PricedProduct {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            subtitle: model.subtitle,
            image: model.image,
            unit_price: model.price,
            in_stock: model.in_stock,
        }
    }
}

/// Read-only oracle over the product catalog. Unknown products are `None`,
/// never an error; callers decide how hard to fail.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Authoritative unit price (and snapshot fields) for one product.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn price_of(&self, product_id: Uuid) -> Result<Option<PricedProduct>, ServiceError> {
        let product = ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, product_id = %product_id, "Failed to read product");
                ServiceError::DatabaseError(e)
            })?;

        Ok(product.map(PricedProduct::from))
    }

    /// Stock flag for one product. Unknown products read as unavailable.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn is_in_stock(&self, product_id: Uuid) -> Result<bool, ServiceError> {
        Ok(self
            .price_of(product_id)
            .await?
            .map(|p| p.in_stock)
            .unwrap_or(false))
    }

    /// Batch read for the order builder: one round trip for all cart lines.
    /// The result preserves no order; callers match by id.
    #[instrument(skip(self, product_ids), fields(count = product_ids.len()))]
    pub async fn find_all(
        &self,
        product_ids: &[Uuid],
    ) -> Result<Vec<PricedProduct>, ServiceError> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let products = ProductEntity::find()
            .filter(product::Column::Id.is_in(product_ids.iter().copied()))
            .all(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to read products for cart validation");
                ServiceError::DatabaseError(e)
            })?;

        Ok(products.into_iter().map(PricedProduct::from).collect())
    }
}
