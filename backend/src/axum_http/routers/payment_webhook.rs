use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use tracing::{error, info, warn};

use crates::domain::{
    repositories::payments::PaymentClient,
    value_objects::payment_events::{
        EVENT_SUBSCRIPTION_CANCELED, EVENT_SUBSCRIPTION_PAID, PaymentWebhookEvent,
    },
};

use crate::usecases::subscriptions::SubscriptionsUseCase;

const TIMESTAMP_HEADER: &str = "timestamp";
const SIGNATURE_HEADER: &str = "payment-signature";

pub struct PaymentWebhookState {
    pub payment_client: Arc<dyn PaymentClient + Send + Sync>,
    pub subscriptions: Arc<SubscriptionsUseCase>,
}

pub fn routes(state: Arc<PaymentWebhookState>) -> Router {
    Router::new()
        .route("/payment", post(handle_payment_webhook))
        .with_state(state)
}

pub async fn handle_payment_webhook(
    State(state): State<Arc<PaymentWebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(timestamp) = header_value(&headers, TIMESTAMP_HEADER) else {
        return (StatusCode::BAD_REQUEST, "missing timestamp header").into_response();
    };
    let Some(signature) = header_value(&headers, SIGNATURE_HEADER) else {
        return (StatusCode::BAD_REQUEST, "missing signature header").into_response();
    };

    let event = match state
        .payment_client
        .verify_webhook(&body, &timestamp, &signature)
    {
        Ok(event) => event,
        Err(err) => {
            error!(error = ?err, "payment_webhook: signature verification failed");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid signature" })),
            )
                .into_response();
        }
    };

    info!(event_type = %event.event_type, "payment_webhook: event received");

    match event.event_type.as_str() {
        EVENT_SUBSCRIPTION_PAID => handle_subscription_paid(&state, event).await,
        EVENT_SUBSCRIPTION_CANCELED => handle_subscription_canceled(&state, event).await,
        other => {
            // Unrecognized events are acknowledged so the provider stops
            // retrying them.
            info!(event_type = other, "payment_webhook: ignoring event");
            (StatusCode::OK, Json(json!({ "message": "Event received" }))).into_response()
        }
    }
}

async fn handle_subscription_paid(
    state: &PaymentWebhookState,
    event: PaymentWebhookEvent,
) -> Response {
    let Some(object) = event.object else {
        return missing_field("object");
    };
    let Some(subscription_id) = object.subscription_id() else {
        return missing_field("subscription_id");
    };
    let Some(user_id) = object.user_id() else {
        return missing_field("user_id");
    };

    match state.subscriptions.handle_paid(subscription_id, user_id).await {
        Ok(subscription) => {
            info!(
                %subscription_id,
                %user_id,
                status = %subscription.status,
                "payment_webhook: subscription payment applied"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Subscription activated successfully",
                    "subscription_id": subscription_id,
                })),
            )
                .into_response()
        }
        Err(err) => {
            // Non-2xx so the provider retries the event.
            error!(%subscription_id, error = ?err, "payment_webhook: failed to apply payment");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to activate subscription" })),
            )
                .into_response()
        }
    }
}

async fn handle_subscription_canceled(
    state: &PaymentWebhookState,
    event: PaymentWebhookEvent,
) -> Response {
    let Some(object) = event.object else {
        return missing_field("object");
    };
    let Some(subscription_id) = object.subscription_id() else {
        return missing_field("subscription_id");
    };
    let Some(user_id) = object.user_id() else {
        return missing_field("user_id");
    };

    match state.subscriptions.cancel(user_id, subscription_id).await {
        Ok(_) => {
            info!(%subscription_id, %user_id, "payment_webhook: subscription cancelled");
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Subscription canceled successfully",
                    "subscription_id": subscription_id,
                })),
            )
                .into_response()
        }
        Err(err) => {
            error!(%subscription_id, error = ?err, "payment_webhook: failed to cancel");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to cancel subscription" })),
            )
                .into_response()
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn missing_field(field: &str) -> Response {
    warn!(field, "payment_webhook: payload missing required field");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": format!("Missing {field} in webhook payload") })),
    )
        .into_response()
}
