pub mod directory_service;
pub mod static_directory;

use crate::common::error::ServiceResult;
use crate::models::identities::IdentityRef;
use async_trait::async_trait;

/// Customer and seller records live in the marketplace, not here.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Resolves the display name, failing with `IdentitiesNotFound`.
    async fn resolve_identity(&self, identity: &IdentityRef) -> ServiceResult<String>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Resolves the product name, failing with `ProductsNotFound`.
    async fn resolve_product(&self, product_id: &str) -> ServiceResult<String>;
}
