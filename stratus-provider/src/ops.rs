//! The per-kind operations contract.
//!
//! `ResourceOps` is the only component that talks to the cloud API. The
//! generic adapter handles marshaling, diffing, and replace decisions;
//! everything resource-specific, including convergence waits after
//! mutating calls, lives behind this trait.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::diff::ObjectDiff;
use crate::error::Result;
use crate::ident::ResourceId;
use crate::property::FieldFailure;

/// Resource-kind-specific lifecycle operations.
///
/// Implementations share nothing across instances beyond a read-only
/// handle to the cloud API client, so a single instance is safe to invoke
/// concurrently for different resource instances.
#[async_trait]
pub trait ResourceOps: Send + Sync + 'static {
    /// The strongly-typed resource object mirroring the wire schema.
    type Resource: Serialize + DeserializeOwned + Send + Sync;

    /// Kind token distinguishing this resource type, e.g.
    /// `aws:s3/bucket:Bucket`.
    const TOKEN: &'static str;

    /// Identity-defining property names whose change always forces
    /// destroy-and-recreate. Kind-specific additions come from
    /// [`ResourceOps::inspect_change`].
    const REPLACE_ON: &'static [&'static str];

    /// The resource's symbolic (non-durable) name.
    fn symbolic_name(obj: &Self::Resource) -> &str;

    /// Pure validation; no side effects and no external state mutation.
    /// Structural field problems come back as failures, not errors.
    async fn check(&self, obj: &Self::Resource) -> Result<Vec<FieldFailure>>;

    /// Allocates a new instance and returns its unique id. Must be
    /// effectively transactional: on any failure no resource is left live.
    /// After the mutating call succeeds, blocks until the resource is
    /// externally observable before returning.
    async fn create(&self, obj: &Self::Resource) -> Result<ResourceId>;

    /// Idempotent, side-effect-free read of live state. Always re-queries
    /// the source of truth; returns a not-found error distinguishably from
    /// other failures.
    async fn get(&self, id: &ResourceId) -> Result<Self::Resource>;

    /// Pure function augmenting the generically-computed replace set with
    /// kind-specific replace triggers. Default: no additions.
    async fn inspect_change(
        &self,
        _id: &ResourceId,
        _old: &Self::Resource,
        _new: &Self::Resource,
        _diff: &ObjectDiff,
    ) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Applies an in-place update for the changed properties. The adapter
    /// refuses replace-class changes before this is ever called.
    async fn update(
        &self,
        id: &ResourceId,
        old: &Self::Resource,
        new: &Self::Resource,
        diff: &ObjectDiff,
    ) -> Result<()>;

    /// Tears down an existing resource. On failure the resource is assumed
    /// to still exist. Blocks until the resource is observably absent.
    async fn delete(&self, id: &ResourceId) -> Result<()>;
}
