use actix_web::{HttpResponse, route, web};
use connwatch::Directory;
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::validate_subscription;

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    channel: Option<String>,
    endpoint: Option<String>,
}

#[route("/subscribe", method = "GET", method = "POST")]
pub async fn subscribe_route(
    query: web::Query<SubscriptionQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (channel, endpoint) =
        validate_subscription(query.channel.as_deref(), query.endpoint.as_deref())?;

    state
        .directory
        .subscribe(channel, &endpoint)
        .await
        .map_err(|source| ApiError::Storage { action: "subscribe", source })?;

    info!(%channel, %endpoint, "subscribed");
    Ok(HttpResponse::Ok().finish())
}

#[route("/unsubscribe", method = "GET", method = "POST")]
pub async fn unsubscribe_route(
    query: web::Query<SubscriptionQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (channel, endpoint) =
        validate_subscription(query.channel.as_deref(), query.endpoint.as_deref())?;

    state
        .directory
        .unsubscribe(channel, &endpoint)
        .await
        .map_err(|source| ApiError::Storage { action: "unsubscribe", source })?;

    info!(%channel, %endpoint, "unsubscribed");
    Ok(HttpResponse::Ok().finish())
}

macros_utils::routes! {
    route subscribe_route,
    route unsubscribe_route,
}
