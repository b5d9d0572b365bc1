//! S3 bucket resource kind.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use stratus_provider::diff::ObjectDiff;
use stratus_provider::error::{ProviderError, Result};
use stratus_provider::ident::{ResourceId, resolve_id};
use stratus_provider::ops::ResourceOps;
use stratus_provider::property::FieldFailure;
use stratus_provider::retry::{RetryPolicy, StateTarget, retry_until};

use crate::client::S3Api;

/// Kind token for S3 buckets.
pub const BUCKET_TOKEN: &str = "aws:s3/bucket:Bucket";

/// Bucket name limits. Legacy us-east-1 allowed 255; not supported here.
const MIN_BUCKET_NAME: usize = 3;
const MAX_BUCKET_NAME: usize = 63;

/// Property-name constants, for diffs and replace sets.
pub mod prop {
    pub const NAME: &str = "name";
    pub const BUCKET_NAME: &str = "bucketName";
    pub const ACCESS_CONTROL: &str = "accessControl";
}

/// Marshalable bucket resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Symbolic resource name.
    #[serde(default)]
    pub name: String,
    /// Explicit bucket name; when omitted an id is synthesized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    /// Canned ACL, e.g. `private` or `public-read`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_control: Option<String>,
}

/// Bucket operations against the S3 API boundary.
pub struct BucketOps {
    client: Arc<dyn S3Api>,
    retry: RetryPolicy,
}

impl BucketOps {
    pub fn new(client: Arc<dyn S3Api>) -> Self {
        Self::with_retry(client, RetryPolicy::default())
    }

    pub fn with_retry(client: Arc<dyn S3Api>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Polls the existence probe until the bucket matches the intended
    /// state. "Not found" is the expected transient condition; any other
    /// probe error is fatal and aborts the wait.
    async fn wait_for_bucket_state(&self, id: &ResourceId, target: StateTarget) -> Result<()> {
        let succeeded = retry_until(self.retry, || {
            let client = Arc::clone(&self.client);
            let bucket = id.as_str().to_string();
            async move {
                match client.head_bucket(&bucket).await {
                    Ok(()) => Ok(target.exists()),
                    Err(e) if e.is_not_found() => Ok(!target.exists()),
                    Err(e) => Err(ProviderError::from(e)),
                }
            }
        })
        .await?;
        if succeeded {
            Ok(())
        } else {
            Err(ProviderError::Convergence {
                id: id.to_string(),
                target,
            })
        }
    }
}

#[async_trait]
impl ResourceOps for BucketOps {
    type Resource = Bucket;
    const TOKEN: &'static str = BUCKET_TOKEN;
    const REPLACE_ON: &'static [&'static str] = &[prop::NAME, prop::BUCKET_NAME];

    fn symbolic_name(obj: &Bucket) -> &str {
        &obj.name
    }

    async fn check(&self, obj: &Bucket) -> Result<Vec<FieldFailure>> {
        let mut failures = Vec::new();
        if let Some(name) = &obj.bucket_name {
            if name.len() < MIN_BUCKET_NAME {
                failures.push(FieldFailure::new(
                    prop::BUCKET_NAME,
                    format!("less than minimum length of {MIN_BUCKET_NAME}"),
                ));
            } else if name.len() > MAX_BUCKET_NAME {
                failures.push(FieldFailure::new(
                    prop::BUCKET_NAME,
                    format!("exceeded maximum length of {MAX_BUCKET_NAME}"),
                ));
            }
        }
        // TODO: validate the name charset against the S3 bucket naming
        // rules, and the account-level bucket quota.
        Ok(failures)
    }

    async fn create(&self, obj: &Bucket) -> Result<ResourceId> {
        let id = resolve_id(obj.bucket_name.as_deref(), &obj.name, MAX_BUCKET_NAME);
        info!(name = %obj.name, id = %id, "creating s3 bucket");
        self.client
            .create_bucket(id.as_str(), obj.access_control.as_deref())
            .await?;

        // The create call is acknowledged before the bucket is
        // observable; block until it is.
        info!(id = %id, "bucket create submitted, waiting for it to become active");
        self.wait_for_bucket_state(&id, StateTarget::Created).await?;
        Ok(id)
    }

    async fn get(&self, id: &ResourceId) -> Result<Bucket> {
        self.client.head_bucket(id.as_str()).await?;
        let acl = self.client.get_bucket_acl(id.as_str()).await?;
        Ok(Bucket {
            name: id.to_string(),
            bucket_name: Some(id.to_string()),
            access_control: Some(acl),
        })
    }

    async fn update(
        &self,
        id: &ResourceId,
        _old: &Bucket,
        new: &Bucket,
        diff: &ObjectDiff,
    ) -> Result<()> {
        if diff.changed(prop::ACCESS_CONTROL) {
            let acl = new.access_control.as_deref().unwrap_or("private");
            info!(id = %id, acl = %acl, "updating bucket acl");
            self.client.put_bucket_acl(id.as_str(), acl).await?;
        }
        Ok(())
    }

    async fn delete(&self, id: &ResourceId) -> Result<()> {
        info!(id = %id, "deleting s3 bucket");
        self.client.delete_bucket(id.as_str()).await?;

        info!(id = %id, "bucket delete submitted, waiting for it to disappear");
        self.wait_for_bucket_state(id, StateTarget::Deleted).await
    }
}
