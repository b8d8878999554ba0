use std::future::Future;

use aws_config::{retry::RetryConfig, BehaviorVersion};
use futures::future::LocalBoxFuture;
use thiserror::Error;
use tracing::info;

use crate::{
    model::error::CsvBucketError,
    util::{object::Provider, retry::RetryPolicy},
};

pub mod gcs;
#[cfg(test)]
pub mod mock;
pub mod retrying;
pub mod s3;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("{0}")]
    Failed(String),
}

impl StorageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// The three storage calls the utility needs. A missing bucket or key is
/// reported as `StorageError::NotFound`.
pub trait ObjectAdapter {
    fn fs_put_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        body: &'a [u8],
    ) -> LocalBoxFuture<'a, Result<(), StorageError>>;

    fn fs_get_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, StorageError>>;

    /// Every key under `prefix`, in backend order, across all pages.
    fn fs_list_objects<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<String>, StorageError>>;
}

/// Follows continuation tokens until the backend stops returning one. Each
/// page yields its keys and the token for the next page.
pub async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<String>, StorageError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<String>, Option<String>), StorageError>>,
{
    let mut keys = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let (page, next) = fetch_page(token).await?;
        keys.extend(page);

        token = next.filter(|tok| !tok.is_empty());
        if token.is_none() {
            break;
        }
    }

    Ok(keys)
}

pub async fn connect(
    provider: Provider,
    retry: RetryPolicy,
) -> Result<Box<dyn ObjectAdapter>, CsvBucketError> {
    info!(provider = provider.scheme(), max_attempts = retry.max_attempts, "connect");

    match provider {
        Provider::AWS => {
            // retries are owned by RetryPolicy, not the SDK
            let config = aws_config::defaults(BehaviorVersion::latest())
                .retry_config(RetryConfig::disabled())
                .load()
                .await;
            let client = aws_sdk_s3::Client::new(&config);

            Ok(Box::new(retrying::Retrying::new(client, retry)))
        }
        Provider::GCS => {
            let config = google_cloud_storage::client::ClientConfig::default()
                .with_auth()
                .await
                .map_err(|err| CsvBucketError::Client(err.to_string()))?;
            let client = google_cloud_storage::client::Client::new(config);

            Ok(Box::new(retrying::Retrying::new(client, retry)))
        }
    }
}
