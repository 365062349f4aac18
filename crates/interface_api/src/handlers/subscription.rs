//! Subscription handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use core_kernel::QuoteId;
use domain_subscription::{Contract, ContractStats, TerminationReason};

use crate::dto::{
    ApiResponse, IssueContractRequest, ModifyContractRequest, Pagination,
    TerminateContractRequest,
};
use crate::error::ApiError;
use crate::SubscriptionState;

/// Issues a contract from a converted quote
pub async fn issue_contract(
    State(state): State<SubscriptionState>,
    Json(request): Json<IssueContractRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Contract>>), ApiError> {
    let quote_id: QuoteId = request
        .quote_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid quote id '{}'", request.quote_id)))?;
    let contract = state
        .service
        .issue_from_quote(
            quote_id,
            &request.client_id,
            &request.asset_type,
            request.premium,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(contract))))
}

/// Lists contracts, newest first
pub async fn list_contracts(
    State(state): State<SubscriptionState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<Contract>>>, ApiError> {
    let (limit, offset) = pagination.clamped();
    let contracts = state.service.list_contracts(limit, offset).await?;
    Ok(Json(ApiResponse::ok(contracts)))
}

/// Gets a contract by id
pub async fn get_contract(
    State(state): State<SubscriptionState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Contract>>, ApiError> {
    let contract = state
        .service
        .get_contract(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Contract not found: {}", id)))?;
    Ok(Json(ApiResponse::ok(contract)))
}

/// Amends an active contract
pub async fn modify_contract(
    State(state): State<SubscriptionState>,
    Path(id): Path<String>,
    Json(request): Json<ModifyContractRequest>,
) -> Result<Json<ApiResponse<Contract>>, ApiError> {
    let contract = state
        .service
        .modify_contract(&id, &request.change, request.new_value)
        .await?;
    Ok(Json(ApiResponse::ok(contract)))
}

/// Terminates a contract
pub async fn terminate_contract(
    State(state): State<SubscriptionState>,
    Path(id): Path<String>,
    Json(request): Json<TerminateContractRequest>,
) -> Result<Json<ApiResponse<Contract>>, ApiError> {
    let reason: TerminationReason = request
        .reason
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("unknown termination reason '{}'", request.reason)))?;
    let contract = state.service.terminate_contract(&id, reason).await?;
    Ok(Json(ApiResponse::ok(contract)))
}

/// Lists a client's contracts
pub async fn contracts_by_client(
    State(state): State<SubscriptionState>,
    Path(client_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Contract>>>, ApiError> {
    let contracts = state.service.contracts_for_client(&client_id).await?;
    Ok(Json(ApiResponse::ok(contracts)))
}

/// Contract counters
pub async fn stats(
    State(state): State<SubscriptionState>,
) -> Result<Json<ApiResponse<ContractStats>>, ApiError> {
    let stats = state.service.stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}
