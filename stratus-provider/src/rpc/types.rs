//! Request/response shapes of the provider RPC surface.
//!
//! Field sets are kind-specific only inside the property payloads; the
//! method signatures are fixed for every resource kind.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::property::FieldFailure;

/// Validate a property payload for a resource of the given kind.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckRequest {
    /// Kind token, e.g. `aws:s3/bucket:Bucket`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Desired-state property payload.
    #[schema(value_type = Object)]
    pub properties: Value,
    /// Property names whose values are unknown/computed at plan time.
    #[serde(default)]
    pub unknowns: Vec<String>,
}

/// Check outcome. An empty failure list means the payload is valid.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckResponse {
    pub failures: Vec<FieldFailure>,
}

/// Resolve the symbolic name of a resource from its property payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NameRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(value_type = Object)]
    pub properties: Value,
    #[serde(default)]
    pub unknowns: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NameResponse {
    pub name: String,
}

/// Create a new resource instance.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(value_type = Object)]
    pub properties: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateResponse {
    /// Provider-assigned durable identifier.
    pub id: String,
}

/// Read the live state of a resource by id.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GetRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GetResponse {
    #[schema(value_type = Object)]
    pub properties: Value,
}

/// Ask what impact a hypothetical update would have.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InspectChangeRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[schema(value_type = Object)]
    pub olds: Value,
    #[schema(value_type = Object)]
    pub news: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InspectChangeResponse {
    /// Property names forcing destroy-and-recreate, sorted.
    pub replaces: Vec<String>,
}

/// Apply an in-place update.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[schema(value_type = Object)]
    pub olds: Value,
    #[schema(value_type = Object)]
    pub news: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateResponse {}

/// Tear down a resource by id.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {}

/// Service version information.
#[derive(Debug, Serialize, ToSchema)]
pub struct VersionInfo {
    pub version: String,
}

/// Registered resource kinds.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderList {
    pub kinds: Vec<String>,
}
