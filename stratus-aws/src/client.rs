//! Cloud-API boundary.
//!
//! The operations contract talks to the cloud exclusively through these
//! traits. Error classification matters more than the call surface: a
//! "not found" is the expected transient condition while polling for
//! convergence, anything else is fatal and aborts the wait.

use async_trait::async_trait;
use stratus_provider::error::ProviderError;
use thiserror::Error;

/// Errors returned by the cloud API.
#[derive(Debug, Clone, Error)]
pub enum CloudError {
    /// The addressed resource does not exist (yet, or anymore).
    #[error("not found: {0}")]
    NotFound(String),

    /// The resource already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The caller is not allowed to perform the call.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Any other API failure.
    #[error("api error: {0}")]
    Api(String),
}

impl CloudError {
    /// The one condition convergence polling may absorb and retry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }
}

impl From<CloudError> for ProviderError {
    fn from(e: CloudError) -> Self {
        match e {
            CloudError::NotFound(msg) => ProviderError::NotFound(msg),
            CloudError::AlreadyExists(msg) => ProviderError::Conflict(msg),
            other => ProviderError::Remote(other.to_string()),
        }
    }
}

/// S3 calls the bucket kind needs.
#[async_trait]
pub trait S3Api: Send + Sync {
    async fn create_bucket(&self, bucket: &str, acl: Option<&str>) -> Result<(), CloudError>;
    /// Existence probe; `NotFound` when the bucket is not observable.
    async fn head_bucket(&self, bucket: &str) -> Result<(), CloudError>;
    async fn get_bucket_acl(&self, bucket: &str) -> Result<String, CloudError>;
    async fn put_bucket_acl(&self, bucket: &str, acl: &str) -> Result<(), CloudError>;
    async fn delete_bucket(&self, bucket: &str) -> Result<(), CloudError>;
}

/// Live IAM group state.
#[derive(Debug, Clone)]
pub struct GroupRecord {
    pub group_name: String,
    pub path: String,
}

/// IAM calls the group kind needs.
#[async_trait]
pub trait IamApi: Send + Sync {
    async fn create_group(&self, group: &str, path: &str) -> Result<(), CloudError>;
    async fn get_group(&self, group: &str) -> Result<GroupRecord, CloudError>;
    async fn update_group(&self, group: &str, new_path: &str) -> Result<(), CloudError>;
    async fn delete_group(&self, group: &str) -> Result<(), CloudError>;
}
