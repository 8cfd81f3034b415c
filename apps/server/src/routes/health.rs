use actix_web::{HttpResponse, Responder, get, web};

use crate::state::AppState;

/// Health check route
/// This route returns no content, the response status is enough.
#[get("/health")]
pub async fn health_route() -> impl Responder {
    HttpResponse::Ok()
}

/// Current liveness state as JSON
#[get("/status")]
pub async fn status_route(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.detector.snapshot())
}
