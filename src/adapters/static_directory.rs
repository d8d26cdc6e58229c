use crate::adapters::{IdentityDirectory, ProductCatalog};
use crate::common::error::{AppError, ServiceResult};
use crate::models::identities::IdentityRef;
use async_trait::async_trait;
use hashbrown::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-process directory for local runs and tests.
#[derive(Default)]
pub struct StaticDirectory {
    identities: RwLock<HashMap<IdentityRef, String>>,
    products: RwLock<HashMap<String, String>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(self, identity: IdentityRef, display_name: &str) -> Self {
        self.insert_identity(identity, display_name);
        self
    }

    pub fn with_product(self, product_id: &str, name: &str) -> Self {
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(product_id.to_owned(), name.to_owned());
        self
    }

    pub fn insert_identity(&self, identity: IdentityRef, display_name: &str) {
        self.identities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity, display_name.to_owned());
    }
}

#[async_trait]
impl IdentityDirectory for StaticDirectory {
    async fn resolve_identity(&self, identity: &IdentityRef) -> ServiceResult<String> {
        self.identities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
            .ok_or(AppError::IdentitiesNotFound)
    }
}

#[async_trait]
impl ProductCatalog for StaticDirectory {
    async fn resolve_product(&self, product_id: &str) -> ServiceResult<String> {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(product_id)
            .cloned()
            .ok_or(AppError::ProductsNotFound)
    }
}
