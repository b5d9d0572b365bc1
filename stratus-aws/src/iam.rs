//! IAM group resource kind.

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

use crate::client::IamApi;

/// Kind token for IAM groups.
pub const GROUP_TOKEN: &str = "aws:iam/group:Group";

const MAX_GROUP_NAME: usize = 128;
const MAX_PATH: usize = 512;

/// Property-name constants, for diffs and replace sets.
pub mod prop {
    pub const NAME: &str = "name";
    pub const GROUP_NAME: &str = "groupName";
    pub const PATH: &str = "path";
}

/// Marshalable group resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Symbolic resource name.
    #[serde(default)]
    pub name: String,
    /// Explicit group name; when omitted an id is synthesized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// IAM path, slash-delimited; defaults to `/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Group operations against the IAM API boundary.
pub struct GroupOps {
    client: Arc<dyn IamApi>,
    retry: RetryPolicy,
}

impl GroupOps {
    pub fn new(client: Arc<dyn IamApi>) -> Self {
        Self::with_retry(client, RetryPolicy::default())
    }

    pub fn with_retry(client: Arc<dyn IamApi>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn wait_for_group_state(&self, id: &ResourceId, target: StateTarget) -> Result<()> {
        let succeeded = retry_until(self.retry, || {
            let client = Arc::clone(&self.client);
            let group = id.as_str().to_string();
            async move {
                match client.get_group(&group).await {
                    Ok(_) => Ok(target.exists()),
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
impl ResourceOps for GroupOps {
    type Resource = Group;
    const TOKEN: &'static str = GROUP_TOKEN;
    const REPLACE_ON: &'static [&'static str] = &[prop::NAME, prop::GROUP_NAME];

    fn symbolic_name(obj: &Group) -> &str {
        &obj.name
    }

    async fn check(&self, obj: &Group) -> Result<Vec<FieldFailure>> {
        let mut failures = Vec::new();
        if let Some(name) = &obj.group_name {
            if name.is_empty() {
                failures.push(FieldFailure::new(prop::GROUP_NAME, "cannot be empty"));
            } else if name.len() > MAX_GROUP_NAME {
                failures.push(FieldFailure::new(
                    prop::GROUP_NAME,
                    format!("exceeded maximum length of {MAX_GROUP_NAME}"),
                ));
            }
        }
        if let Some(path) = &obj.path {
            if !path.starts_with('/') || !path.ends_with('/') {
                failures.push(FieldFailure::new(
                    prop::PATH,
                    "must begin and end with a slash",
                ));
            } else if path.len() > MAX_PATH {
                failures.push(FieldFailure::new(
                    prop::PATH,
                    format!("exceeded maximum length of {MAX_PATH}"),
                ));
            }
        }
        Ok(failures)
    }

    async fn create(&self, obj: &Group) -> Result<ResourceId> {
        let id = resolve_id(obj.group_name.as_deref(), &obj.name, MAX_GROUP_NAME);
        let path = obj.path.as_deref().unwrap_or("/");
        info!(name = %obj.name, id = %id, path = %path, "creating iam group");
        self.client.create_group(id.as_str(), path).await?;

        info!(id = %id, "group create submitted, waiting for it to become active");
        self.wait_for_group_state(&id, StateTarget::Created).await?;
        Ok(id)
    }

    async fn get(&self, id: &ResourceId) -> Result<Group> {
        let record = self.client.get_group(id.as_str()).await?;
        Ok(Group {
            name: record.group_name.clone(),
            group_name: Some(record.group_name),
            path: Some(record.path),
        })
    }

    async fn update(
        &self,
        id: &ResourceId,
        _old: &Group,
        new: &Group,
        diff: &ObjectDiff,
    ) -> Result<()> {
        if diff.changed(prop::PATH) {
            let path = new.path.as_deref().unwrap_or("/");
            info!(id = %id, path = %path, "updating iam group path");
            self.client.update_group(id.as_str(), path).await?;
        }
        Ok(())
    }

    async fn delete(&self, id: &ResourceId) -> Result<()> {
        info!(id = %id, "deleting iam group");
        self.client.delete_group(id.as_str()).await?;

        info!(id = %id, "group delete submitted, waiting for it to disappear");
        self.wait_for_group_state(id, StateTarget::Deleted).await
    }
}
