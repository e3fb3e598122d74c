use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{availability, booking, client, content, health, package};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/backend", get(health::backend_info))

        // Availability
        .route("/api/v1/availability", get(availability::list_availability))
        .route("/api/v1/availability/{date}", get(availability::get_availability).put(availability::upsert_availability))
        .route("/api/v1/availability/{date}/generate", post(availability::generate_slots))
        .route("/api/v1/availability/{date}/slots", post(availability::add_slot).delete(availability::remove_slot))

        // Bookings
        .route("/api/v1/bookings", post(booking::create_booking).get(booking::list_bookings))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking).put(booking::update_booking).delete(booking::delete_booking))

        // Catalogue & CRM
        .route("/api/v1/packages", get(package::list_packages))
        .route("/api/v1/packages/{package_id}", put(package::upsert_package).delete(package::delete_package))
        .route("/api/v1/clients", get(client::list_clients))
        .route("/api/v1/clients/{client_id}", get(client::get_client).put(client::upsert_client).delete(client::delete_client))

        // Site content
        .route("/api/v1/content", get(content::get_content).put(content::save_content))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        admin = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
