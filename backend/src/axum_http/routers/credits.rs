use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crates::domain::value_objects::enums::{
    subscription_periods::SubscriptionPeriod, subscription_types::SubscriptionType,
};

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::{credits::CreditsUseCase, subscriptions::SubscriptionsUseCase},
};

pub struct CreditsRouterState {
    pub credits: Arc<CreditsUseCase>,
    pub subscriptions: Arc<SubscriptionsUseCase>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RedeemCodeRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub subscription_type: SubscriptionType,
    pub subscription_period: SubscriptionPeriod,
}

#[derive(Debug, Deserialize)]
pub struct CancelSubscriptionRequest {
    pub subscription_id: Uuid,
}

pub fn routes(state: Arc<CreditsRouterState>) -> Router {
    Router::new()
        .route("/balance", get(get_balance))
        .route("/transactions", get(list_transactions))
        .route("/redeem", post(redeem_code))
        .route("/subscription/plans", get(list_plans))
        .route("/subscription/checkout", post(create_checkout))
        .route("/subscription/cancel", post(cancel_subscription))
        .route("/subscriptions", get(list_subscriptions))
        .with_state(state)
}

pub async fn get_balance(
    State(state): State<Arc<CreditsRouterState>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.credits.balance_summary(user_id).await?;
    Ok(Json(summary))
}

pub async fn list_transactions(
    State(state): State<Arc<CreditsRouterState>>,
    AuthUser { user_id, .. }: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = state
        .credits
        .list_transactions(user_id, query.limit.unwrap_or(50), query.offset.unwrap_or(0))
        .await?;
    Ok(Json(transactions))
}

pub async fn redeem_code(
    State(state): State<Arc<CreditsRouterState>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(request): Json<RedeemCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    info!(%user_id, "credits: redeem request received");
    let result = state.credits.redeem(user_id, &request.code).await?;
    Ok(Json(result))
}

pub async fn list_plans(
    State(state): State<Arc<CreditsRouterState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.subscriptions.plans()))
}

pub async fn create_checkout(
    State(state): State<Arc<CreditsRouterState>>,
    AuthUser { user_id, email }: AuthUser,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    info!(
        %user_id,
        subscription_type = %request.subscription_type,
        subscription_period = %request.subscription_period,
        "credits: checkout request received"
    );

    let email = email.ok_or_else(|| {
        AppError::BadRequest("an account email is required for checkout".to_string())
    })?;

    let checkout = state
        .subscriptions
        .create_checkout(
            user_id,
            &email,
            request.subscription_type,
            request.subscription_period,
        )
        .await?;
    Ok(Json(checkout))
}

pub async fn cancel_subscription(
    State(state): State<Arc<CreditsRouterState>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(request): Json<CancelSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    info!(%user_id, subscription_id = %request.subscription_id, "credits: cancel request received");
    let cancelled = state
        .subscriptions
        .cancel(user_id, request.subscription_id)
        .await?;
    Ok(Json(cancelled))
}

pub async fn list_subscriptions(
    State(state): State<Arc<CreditsRouterState>>,
    AuthUser { user_id, .. }: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let subscriptions = state
        .subscriptions
        .list_for_user(user_id, query.limit.unwrap_or(50), query.offset.unwrap_or(0))
        .await?;
    Ok(Json(subscriptions))
}
