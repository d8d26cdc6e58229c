use crate::adapters::{IdentityDirectory, ProductCatalog};
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::models::identities::{IdentityKind, IdentityRef};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct NamedRecord {
    name: String,
}

/// Timeouts and refused connections are retryable, anything else is
/// unexpected.
#[track_caller]
fn directory_error<T>(e: reqwest::Error) -> ServiceResult<T> {
    if e.is_timeout() || e.is_connect() {
        let caller = std::panic::Location::caller();
        warn!("Directory service unavailable at {caller}: {e}");
        return Err(AppError::DirectoryUnavailable);
    }
    unexpected(e)
}

/// Client for the marketplace directory service.
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpDirectory {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Directory service URL cannot be a base: {base_url}");
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn make_url(&self, segments: &[&str]) -> ServiceResult<Url> {
        let mut url = self.base_url.clone();
        match url.path_segments_mut() {
            Ok(mut path) => {
                path.pop_if_empty().extend(segments);
            }
            Err(()) => return unexpected(anyhow::anyhow!("Cannot extend {}", self.base_url)),
        }
        Ok(url)
    }

    async fn fetch_name(&self, url: Url, not_found: AppError) -> ServiceResult<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return directory_error(e),
        };
        if response.status() == StatusCode::NOT_FOUND {
            return Err(not_found);
        }
        let record = match response.error_for_status() {
            Ok(response) => response.json::<NamedRecord>().await,
            Err(e) => return directory_error(e),
        };
        match record {
            Ok(record) => Ok(record.name),
            Err(e) => directory_error(e),
        }
    }
}

fn collection(kind: IdentityKind) -> &'static str {
    match kind {
        IdentityKind::Customer => "customers",
        IdentityKind::Seller => "sellers",
    }
}

fn is_path_traversal(segment: &str) -> bool {
    matches!(segment, "" | "." | "..")
}

#[async_trait]
impl IdentityDirectory for HttpDirectory {
    async fn resolve_identity(&self, identity: &IdentityRef) -> ServiceResult<String> {
        identity.validate()?;
        let url = self.make_url(&["api", "v1", collection(identity.kind), &identity.id])?;
        self.fetch_name(url, AppError::IdentitiesNotFound).await
    }
}

#[async_trait]
impl ProductCatalog for HttpDirectory {
    async fn resolve_product(&self, product_id: &str) -> ServiceResult<String> {
        if is_path_traversal(product_id) {
            return Err(AppError::ProductsNotFound);
        }
        let url = self.make_url(&["api", "v1", "products", product_id])?;
        self.fetch_name(url, AppError::ProductsNotFound).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_stay_inside_their_path_segment() {
        let directory = HttpDirectory::new("http://directory.local/marketplace/").unwrap();
        let url = directory
            .make_url(&["api", "v1", "products", "../admin?x=1"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://directory.local/marketplace/api/v1/products/..%2Fadmin%3Fx=1"
        );
    }

    #[test]
    fn base_without_trailing_slash() {
        let directory = HttpDirectory::new("http://directory.local").unwrap();
        let url = directory.make_url(&["api", "v1", "sellers", "s-1"]).unwrap();
        assert_eq!(url.as_str(), "http://directory.local/api/v1/sellers/s-1");
    }

    #[tokio::test]
    async fn relative_product_ids_are_not_found() {
        let directory = HttpDirectory::new("http://directory.local").unwrap();
        for product_id in ["", ".", ".."] {
            assert!(matches!(
                directory.resolve_product(product_id).await,
                Err(AppError::ProductsNotFound)
            ));
        }
    }

    #[tokio::test]
    async fn unreachable_directory_is_retryable() {
        // nothing listens on port 1
        let directory = HttpDirectory::new("http://127.0.0.1:1").unwrap();
        let err = directory
            .resolve_identity(&IdentityRef::customer("c-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DirectoryUnavailable));
        assert!(err.is_retryable());
    }
}
