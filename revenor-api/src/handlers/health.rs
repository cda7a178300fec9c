use actix_web::{get, web, HttpResponse, Responder};
use std::time::Instant;

/// Process start time, captured once in main
pub struct StartedAt(pub Instant);

/// Liveness. Must not touch the database or any external service.
#[get("/health")]
pub async fn health(started: web::Data<StartedAt>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "uptime_seconds": started.0.elapsed().as_secs(),
    }))
}

#[get("/ping")]
pub async fn ping() -> impl Responder {
    HttpResponse::Ok().body("pong")
}
