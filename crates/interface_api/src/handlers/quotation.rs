//! Quotation handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use domain_quotation::{AssetType, Quote, QuoteStats};

use crate::dto::{ApiResponse, CreateQuoteRequest, Pagination};
use crate::error::ApiError;
use crate::QuotationState;

/// Creates a new quote
pub async fn create_quote(
    State(state): State<QuotationState>,
    Json(request): Json<CreateQuoteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Quote>>), ApiError> {
    let asset_type: AssetType = request.asset_type.parse().map_err(ApiError::from)?;
    let quote = state
        .service
        .create_quote(&request.client_id, asset_type, request.asset_value)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(quote))))
}

/// Lists quotes, newest first
pub async fn list_quotes(
    State(state): State<QuotationState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<Quote>>>, ApiError> {
    let (limit, offset) = pagination.clamped();
    let quotes = state.service.list_quotes(limit, offset).await?;
    Ok(Json(ApiResponse::ok(quotes)))
}

/// Gets a quote by id
pub async fn get_quote(
    State(state): State<QuotationState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Quote>>, ApiError> {
    let quote = state
        .service
        .get_quote(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Quote not found: {}", id)))?;
    Ok(Json(ApiResponse::ok(quote)))
}

/// Converts a quote, making it eligible for contract issuance
pub async fn convert_quote(
    State(state): State<QuotationState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Quote>>, ApiError> {
    let quote = state.service.convert_quote(&id).await?;
    Ok(Json(ApiResponse::ok(quote)))
}

/// Lists a client's quotes
pub async fn quotes_by_client(
    State(state): State<QuotationState>,
    Path(client_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Quote>>>, ApiError> {
    let quotes = state.service.quotes_for_client(&client_id).await?;
    Ok(Json(ApiResponse::ok(quotes)))
}

/// Quote counters and conversion rate
pub async fn stats(
    State(state): State<QuotationState>,
) -> Result<Json<ApiResponse<QuoteStats>>, ApiError> {
    let stats = state.service.stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}
