//! Claims handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use domain_claims::{Claim, ClaimStats, ClaimType};

use crate::dto::{
    ApiResponse, DeclareClaimRequest, EvaluateClaimRequest, IndemnifyClaimRequest, Pagination,
};
use crate::error::ApiError;
use crate::ClaimsState;

/// Declares a new claim against a contract
pub async fn declare_claim(
    State(state): State<ClaimsState>,
    Json(request): Json<DeclareClaimRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Claim>>), ApiError> {
    let claim_type: ClaimType = request.claim_type.parse().map_err(ApiError::from)?;
    let claim = state
        .service
        .declare_claim(
            &request.contract_id,
            claim_type,
            request.description,
            request.estimated_amount,
            request.occurred_at,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(claim))))
}

/// Lists claims, newest first
pub async fn list_claims(
    State(state): State<ClaimsState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<Claim>>>, ApiError> {
    let (limit, offset) = pagination.clamped();
    let claims = state.service.list_claims(limit, offset).await?;
    Ok(Json(ApiResponse::ok(claims)))
}

/// Gets a claim by id
pub async fn get_claim(
    State(state): State<ClaimsState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Claim>>, ApiError> {
    let claim = state
        .service
        .get_claim(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Claim not found: {}", id)))?;
    Ok(Json(ApiResponse::ok(claim)))
}

/// Records the assessment of a declared claim
pub async fn evaluate_claim(
    State(state): State<ClaimsState>,
    Path(id): Path<String>,
    Json(request): Json<EvaluateClaimRequest>,
) -> Result<Json<ApiResponse<Claim>>, ApiError> {
    let claim = state
        .service
        .evaluate_claim(&id, request.assessed_amount)
        .await?;
    Ok(Json(ApiResponse::ok(claim)))
}

/// Pays out an evaluated claim at the requested amount
pub async fn indemnify_claim(
    State(state): State<ClaimsState>,
    Path(id): Path<String>,
    Json(request): Json<IndemnifyClaimRequest>,
) -> Result<Json<ApiResponse<Claim>>, ApiError> {
    let claim = state
        .service
        .indemnify_claim(&id, request.indemnified_amount)
        .await?;
    Ok(Json(ApiResponse::ok(claim)))
}

/// Rejects a claim
pub async fn reject_claim(
    State(state): State<ClaimsState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Claim>>, ApiError> {
    let claim = state.service.reject_claim(&id).await?;
    Ok(Json(ApiResponse::ok(claim)))
}

/// Lists all claims filed against a contract
pub async fn claims_by_contract(
    State(state): State<ClaimsState>,
    Path(contract_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Claim>>>, ApiError> {
    let claims = state.service.claims_for_contract(&contract_id).await?;
    Ok(Json(ApiResponse::ok(claims)))
}

/// Claim counters and total paid out
pub async fn stats(
    State(state): State<ClaimsState>,
) -> Result<Json<ApiResponse<ClaimStats>>, ApiError> {
    let stats = state.service.stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}
