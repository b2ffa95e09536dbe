use crate::error::{AppError, Result};
use crate::model::{ShortenRequest, ShortenResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use minilink_core::{Alias, Resolution};
use tracing::debug;

pub async fn shorten_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>> {
    let Json(request) = request.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let long_url = request
        .long_url
        .filter(|url| !url.trim().is_empty())
        .ok_or(AppError::MissingUrl)?;
    let ttl_seconds =
        u64::try_from(request.expires_in).map_err(|_| AppError::InvalidExpiry(request.expires_in))?;

    let alias = state.shortener().shorten(&long_url, ttl_seconds).await?;
    Ok(Json(ShortenResponse {
        short_url: alias.into_string(),
    }))
}

pub async fn redirect_handler(
    Path(alias): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    // Nothing outside the alias alphabet was ever issued.
    let Some(alias) = Alias::parse(&alias) else {
        debug!(alias = %alias, "Malformed alias");
        return Err(AppError::NotFound);
    };

    match state.resolver().resolve(&alias).await? {
        Resolution::Found(url) => {
            Ok((StatusCode::FOUND, [(header::LOCATION, url.into_string())]).into_response())
        }
        Resolution::NotFound => Err(AppError::NotFound),
        Resolution::Expired => Err(AppError::Expired),
    }
}
