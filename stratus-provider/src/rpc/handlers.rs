//! RPC handlers, one per lifecycle method.

use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::info;

use super::types::*;
use super::{ApiError, AppState};
use crate::adapter::DynProvider;

fn lookup(state: &AppState, token: &str) -> Result<Arc<dyn DynProvider>, ApiError> {
    state
        .registry
        .get(token)
        .ok_or_else(|| ApiError::unknown_kind(token))
}

/// Validate a property payload
#[utoipa::path(
    post,
    path = "/v1/provider/check",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Validation outcome (failures are data)", body = CheckResponse),
        (status = 400, description = "Malformed payload", body = ApiError)
    ),
    tag = "provider"
)]
pub async fn check(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, ApiError> {
    let provider = lookup(&state, &req.kind)?;
    let failures = provider.check(&req.kind, &req.properties).await?;
    Ok(Json(CheckResponse { failures }))
}

/// Resolve a resource's symbolic name
#[utoipa::path(
    post,
    path = "/v1/provider/name",
    request_body = NameRequest,
    responses(
        (status = 200, description = "Resolved name", body = NameResponse),
        (status = 400, description = "Name empty or computed-unknown", body = ApiError)
    ),
    tag = "provider"
)]
pub async fn name(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NameRequest>,
) -> Result<Json<NameResponse>, ApiError> {
    let provider = lookup(&state, &req.kind)?;
    let name = provider
        .name(&req.kind, &req.properties, &req.unknowns)
        .await?;
    Ok(Json(NameResponse { name }))
}

/// Create a resource and wait for it to converge
#[utoipa::path(
    post,
    path = "/v1/provider/create",
    request_body = CreateRequest,
    responses(
        (status = 200, description = "Resource created and observable", body = CreateResponse),
        (status = 400, description = "Malformed payload", body = ApiError),
        (status = 502, description = "Remote API failure", body = ApiError),
        (status = 504, description = "Resource did not become created", body = ApiError)
    ),
    tag = "provider"
)]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRequest>,
) -> Result<Json<CreateResponse>, ApiError> {
    let provider = lookup(&state, &req.kind)?;
    let id = provider.create(&req.kind, &req.properties).await?;
    info!(kind = %req.kind, id = %id, "resource created");
    Ok(Json(CreateResponse {
        id: id.into_string(),
    }))
}

/// Read live resource state
#[utoipa::path(
    post,
    path = "/v1/provider/get",
    request_body = GetRequest,
    responses(
        (status = 200, description = "Live property payload", body = GetResponse),
        (status = 404, description = "Resource not found", body = ApiError)
    ),
    tag = "provider"
)]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetRequest>,
) -> Result<Json<GetResponse>, ApiError> {
    let provider = lookup(&state, &req.kind)?;
    let properties = provider.get(&req.kind, &req.id).await?;
    Ok(Json(GetResponse { properties }))
}

/// Compute the replace set for a hypothetical update
#[utoipa::path(
    post,
    path = "/v1/provider/inspect-change",
    request_body = InspectChangeRequest,
    responses(
        (status = 200, description = "Properties forcing replacement", body = InspectChangeResponse),
        (status = 400, description = "Malformed payload", body = ApiError)
    ),
    tag = "provider"
)]
pub async fn inspect_change(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InspectChangeRequest>,
) -> Result<Json<InspectChangeResponse>, ApiError> {
    let provider = lookup(&state, &req.kind)?;
    let replaces = provider
        .inspect_change(&req.kind, &req.id, &req.olds, &req.news)
        .await?;
    Ok(Json(InspectChangeResponse { replaces }))
}

/// Apply an in-place update
#[utoipa::path(
    post,
    path = "/v1/provider/update",
    request_body = UpdateRequest,
    responses(
        (status = 200, description = "Update applied", body = UpdateResponse),
        (status = 400, description = "Malformed payload", body = ApiError),
        (status = 500, description = "Replace-class change passed to update", body = ApiError)
    ),
    tag = "provider"
)]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let provider = lookup(&state, &req.kind)?;
    provider
        .update(&req.kind, &req.id, &req.olds, &req.news)
        .await?;
    info!(kind = %req.kind, id = %req.id, "resource updated");
    Ok(Json(UpdateResponse {}))
}

/// Delete a resource and wait for it to disappear
#[utoipa::path(
    post,
    path = "/v1/provider/delete",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Resource deleted and absent", body = DeleteResponse),
        (status = 404, description = "Resource not found", body = ApiError),
        (status = 504, description = "Resource did not become deleted", body = ApiError)
    ),
    tag = "provider"
)]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let provider = lookup(&state, &req.kind)?;
    provider.delete(&req.kind, &req.id).await?;
    info!(kind = %req.kind, id = %req.id, "resource deleted");
    Ok(Json(DeleteResponse {}))
}

/// Get service version
#[utoipa::path(
    get,
    path = "/v1/version",
    responses(
        (status = 200, description = "Service version", body = VersionInfo)
    ),
    tag = "system"
)]
pub async fn get_version() -> Json<VersionInfo> {
    Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List registered resource kinds
#[utoipa::path(
    get,
    path = "/v1/providers",
    responses(
        (status = 200, description = "Registered kind tokens", body = ProviderList)
    ),
    tag = "system"
)]
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProviderList> {
    Json(ProviderList {
        kinds: state
            .registry
            .tokens()
            .iter()
            .map(|t| (*t).to_string())
            .collect(),
    })
}
