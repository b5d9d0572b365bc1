use std::sync::Arc;

use axum::{Router, routing::{get, post}};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers;
use super::types;
use super::{ApiError, AppState};
use crate::property::FieldFailure;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "stratus provider engine",
        version = "0.1.0",
        description = "Resource provider lifecycle RPC: drives declared cloud resources through Check/Create/Get/InspectChange/Update/Delete against registered resource kinds."
    ),
    tags(
        (name = "system", description = "Service information"),
        (name = "provider", description = "Resource lifecycle operations")
    ),
    paths(
        handlers::get_version,
        handlers::list_providers,
        handlers::check,
        handlers::name,
        handlers::create,
        handlers::get,
        handlers::inspect_change,
        handlers::update,
        handlers::delete,
    ),
    components(schemas(
        types::CheckRequest,
        types::CheckResponse,
        types::NameRequest,
        types::NameResponse,
        types::CreateRequest,
        types::CreateResponse,
        types::GetRequest,
        types::GetResponse,
        types::InspectChangeRequest,
        types::InspectChangeResponse,
        types::UpdateRequest,
        types::UpdateResponse,
        types::DeleteRequest,
        types::DeleteResponse,
        types::VersionInfo,
        types::ProviderList,
        FieldFailure,
        ApiError,
    ))
)]
pub struct ApiDoc;

pub fn create_router(state: Arc<AppState>) -> Router {
    let provider_routes = Router::new()
        .route("/provider/check", post(handlers::check))
        .route("/provider/name", post(handlers::name))
        .route("/provider/create", post(handlers::create))
        .route("/provider/get", post(handlers::get))
        .route("/provider/inspect-change", post(handlers::inspect_change))
        .route("/provider/update", post(handlers::update))
        .route("/provider/delete", post(handlers::delete))
        // System
        .route("/version", get(handlers::get_version))
        .route("/providers", get(handlers::list_providers));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/v1", provider_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
