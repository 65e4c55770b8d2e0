use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::error_handling::HandleErrorLayer;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower::{BoxError, ServiceBuilder};
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};
use crate::error::api::ApiErrorKind;
use crate::fs::ResourcePath;
use crate::net::layer;
use crate::state::ArcShared;

pub mod query;
pub mod file;
pub mod workspace;

async fn ping() -> (StatusCode, &'static str) {
    (StatusCode::OK, "pong")
}

async fn handle_error(error: BoxError) -> ApiError {
    if error.is::<Elapsed>() {
        ApiError::from(ApiErrorKind::Timeout)
    } else {
        ApiError::new()
            .context("unhandled error when processing request")
            .source(error)
    }
}

/// every path that is not a fixed route ends up here. file urls contain an
/// arbitrary amount of segments so they are matched against the configured
/// prefixes instead of the router
async fn handle(
    State(state): State<ArcShared>,
    request: Request<Body>,
) -> ApiResult<Response> {
    let (parts, body) = request.into_parts();
    let files = state.files();

    if workspace::is_workspace_path(files, parts.uri.path()) {
        return if parts.method == Method::GET {
            Ok(workspace::retrieve(&state).await?.into_response())
        } else {
            Err(ApiError::from(ApiErrorKind::InvalidMethod))
        };
    }

    let resource = ResourcePath::from_uri_path(files.root(), parts.uri.path())?;

    tracing::debug!("resource: {resource}");

    match parts.method {
        Method::GET => file::retrieve(&state, resource, &parts).await,
        Method::PUT => file::upload::upload_file(&state, resource, &parts, body).await,
        Method::POST => file::create::create_item(&state, resource, &parts, body).await,
        Method::DELETE => file::delete(&state, resource, &parts).await,
        _ => Err(ApiError::from(ApiErrorKind::InvalidMethod)),
    }
}

pub fn routes(state: &ArcShared) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .fallback(handle)
        .layer(ServiceBuilder::new()
            .layer(layer::RIDLayer::new())
            .layer(TraceLayer::new_for_http()
                .make_span_with(layer::trace::make_span_with)
                .on_request(layer::trace::on_request)
                .on_response(layer::trace::on_response)
                .on_failure(layer::trace::on_failure))
            .layer(HandleErrorLayer::new(handle_error))
            .layer(TimeoutLayer::new(state.timeout())))
        .with_state(state.clone())
}
