// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    models::{
        Booking, BookingListResponse, BookingResponse, CreateBookingRequest,
        CreateTherapistRequest, CreatedResponse, DeletedResponse, Therapist,
        TherapistDetailResponse, TherapistListResponse, UpdateBookingRequest,
    },
    state::AppState,
};

pub mod bookings;
pub mod extract;
pub mod health;
pub mod index;
pub mod therapists;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(index::greeting))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route(
            "/therapists",
            get(therapists::list_therapists).post(therapists::create_therapist),
        )
        .route(
            "/therapists/{therapist_id}",
            get(therapists::get_therapist).delete(therapists::delete_therapist),
        )
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/bookings/{booking_id}",
            get(bookings::get_booking)
                .patch(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

#[derive(OpenApi)]
#[openapi(
    paths(
        index::greeting,
        health::liveness,
        health::readiness,
        therapists::list_therapists,
        therapists::get_therapist,
        therapists::create_therapist,
        therapists::delete_therapist,
        bookings::list_bookings,
        bookings::get_booking,
        bookings::create_booking,
        bookings::update_booking,
        bookings::delete_booking
    ),
    components(
        schemas(
            Therapist,
            Booking,
            CreateTherapistRequest,
            CreateBookingRequest,
            UpdateBookingRequest,
            TherapistListResponse,
            TherapistDetailResponse,
            BookingListResponse,
            BookingResponse,
            CreatedResponse,
            DeletedResponse,
            health::HealthResponse,
            health::ReadyResponse
        )
    ),
    tags(
        (name = "Therapists", description = "Therapist management"),
        (name = "Bookings", description = "Booking management"),
        (name = "Health", description = "Liveness, readiness and greeting")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::test_state;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn send(method: &str, uri: &str) -> (StatusCode, serde_json::Value, Option<String>) {
        let response = router(test_state())
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let request_id = response
            .headers()
            .get("x-request-id")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body, request_id)
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(test_state());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn unmatched_route_is_json_404() {
        let (status, body, _) = send("GET", "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Resource Not Found");
    }

    #[tokio::test]
    async fn wrong_method_is_json_405() {
        let (status, body, _) = send("PUT", "/therapists").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], 405);
    }

    #[tokio::test]
    async fn public_list_needs_no_token() {
        let (status, body, request_id) = send("GET", "/therapists").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_therapists"], 0);
        assert!(request_id.is_some());
    }

    #[tokio::test]
    async fn openapi_lists_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/bookings/{booking_id}"));
        assert!(doc.paths.paths.contains_key("/therapists"));
    }
}
