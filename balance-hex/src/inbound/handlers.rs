//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use balance_types::{
    AppError, BalanceRepository, ErrorResponse, ExchangeRateProvider, GetBalanceRequest,
    GetHistoryRequest, HealthResponse, TransferRequest, UpdateBalanceRequest, ValidationErrors,
};

use crate::BalanceService;

/// Application state shared across handlers.
pub struct AppState<R: BalanceRepository, X: ExchangeRateProvider> {
    pub service: BalanceService<R, X>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

/// Unreadable bodies are reported like any other invalid argument.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(AppError::InvalidArgument(ValidationErrors::single(
            "body",
            rejection.body_text(),
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::InvalidArgument(_) | AppError::InsufficientFunds { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) | AppError::StorageUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if !self.0.is_client_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Request failed");
        }

        let (error, details) = match self.0 {
            AppError::InvalidArgument(errors) => ("invalid argument".to_string(), Some(errors)),
            other => (other.to_string(), None),
        };

        let body = ErrorResponse {
            error,
            code: status.as_u16(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".into(),
    })
}

/// Balance of a deposit, optionally converted to another currency.
#[tracing::instrument(skip_all)]
pub async fn get_balance<R: BalanceRepository, X: ExchangeRateProvider>(
    State(state): State<Arc<AppState<R, X>>>,
    payload: Result<Json<GetBalanceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let balance = state.service.get_balance(req).await?;
    Ok(Json(balance))
}

/// Top up (positive amount) or withdraw (negative amount).
#[tracing::instrument(skip_all)]
pub async fn update_balance<R: BalanceRepository, X: ExchangeRateProvider>(
    State(state): State<Arc<AppState<R, X>>>,
    payload: Result<Json<UpdateBalanceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let tx = state.service.update_balance(req).await?;
    Ok(Json(tx))
}

/// Transfer money between deposits.
#[tracing::instrument(skip_all)]
pub async fn transfer<R: BalanceRepository, X: ExchangeRateProvider>(
    State(state): State<Arc<AppState<R, X>>>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let tx = state.service.transfer(req).await?;
    Ok(Json(tx))
}

/// Page of a deposit's transaction history.
#[tracing::instrument(skip_all)]
pub async fn get_history<R: BalanceRepository, X: ExchangeRateProvider>(
    State(state): State<Arc<AppState<R, X>>>,
    payload: Result<Json<GetHistoryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let transactions = state.service.get_history(req).await?;
    Ok(Json(transactions))
}
