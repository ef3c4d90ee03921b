use crate::error::Result;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use keyhole_core::{CreateUrlRequest, CreateUrlResponse, UrlResponse};

pub async fn create_url_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<CreateUrlResponse>)> {
    let response = state.service().create_short_url(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UrlResponse>> {
    let response = state.service().get_url(&short_code).await?;
    Ok(Json(response))
}

pub async fn delete_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state.service().delete_url(&short_code).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let original_url = state.service().redirect(&short_code).await?;
    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, original_url)]).into_response())
}
