use actix_web::{HttpRequest, HttpResponse, Responder, route, web};
use chrono::Utc;
use tracing::debug;

use crate::state::AppState;

/// Liveness signal from the watched peer. No body required.
#[route("/ping", method = "GET", method = "POST")]
pub async fn ping_route(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    debug!(remote = ?req.peer_addr(), "received ping");
    state.detector.record_signal(Utc::now());
    HttpResponse::Ok()
}
