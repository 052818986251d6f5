// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use super::extract::{JsonBody, PathParam, QueryParams};
use crate::{
    auth::{DeleteBookings, GetBookings, PatchBookings, Permitted, PostBookings},
    error::ApiError,
    models::{
        Booking, BookingListResponse, BookingResponse, CreateBookingRequest, CreatedResponse,
        DeletedResponse, UpdateBookingRequest,
    },
    pagination::{format_page, Page, PageQuery},
    state::AppState,
    storage::{BookingChanges, BookingRepository, NewBooking},
};

#[utoipa::path(
    get,
    path = "/bookings",
    params(PageQuery),
    tag = "Bookings",
    responses(
        (status = 200, body = BookingListResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Missing get:bookings")
    )
)]
pub async fn list_bookings(
    _: Permitted<GetBookings>,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PageQuery>,
) -> Result<Json<BookingListResponse>, ApiError> {
    let bookings = BookingRepository::new(&state.db).list_all()?;
    let page = format_page::<_, Booking>(bookings, Page::from(&query));

    Ok(Json(BookingListResponse {
        success: true,
        bookings: page.items,
        total_bookings: page.total,
    }))
}

#[utoipa::path(
    get,
    path = "/bookings/{booking_id}",
    params(("booking_id" = u64, Path, description = "Booking identifier")),
    tag = "Bookings",
    responses(
        (status = 200, body = BookingResponse),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    _: Permitted<GetBookings>,
    State(state): State<AppState>,
    PathParam(booking_id): PathParam<u64>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = BookingRepository::new(&state.db)
        .get(booking_id)?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(BookingResponse::new(booking)))
}

/// Book a therapist. `start_time` defaults to now.
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    tag = "Bookings",
    responses(
        (status = 200, body = CreatedResponse),
        (status = 422, description = "Missing or unknown therapist")
    )
)]
pub async fn create_booking(
    _: Permitted<PostBookings>,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateBookingRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let therapist_id = request.therapist_id.ok_or_else(ApiError::unprocessable)?;

    let booking = BookingRepository::new(&state.db).insert(&NewBooking {
        therapist_id,
        start_time: request.start_time,
    })?;
    tracing::info!(booking_id = booking.id, therapist_id, "Booking created");
    Ok(Json(CreatedResponse::new(booking.id)))
}

/// Move a booking to another therapist and/or time.
#[utoipa::path(
    patch,
    path = "/bookings/{booking_id}",
    params(("booking_id" = u64, Path, description = "Booking identifier")),
    request_body = UpdateBookingRequest,
    tag = "Bookings",
    responses(
        (status = 200, body = BookingResponse),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Empty update or unknown therapist")
    )
)]
pub async fn update_booking(
    _: Permitted<PatchBookings>,
    State(state): State<AppState>,
    PathParam(booking_id): PathParam<u64>,
    JsonBody(request): JsonBody<UpdateBookingRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    if request.therapist_id.is_none() && request.start_time.is_none() {
        return Err(ApiError::unprocessable());
    }

    let booking = BookingRepository::new(&state.db).update(
        booking_id,
        &BookingChanges {
            therapist_id: request.therapist_id,
            start_time: request.start_time,
        },
    )?;
    Ok(Json(BookingResponse::new(booking)))
}

#[utoipa::path(
    delete,
    path = "/bookings/{booking_id}",
    params(("booking_id" = u64, Path, description = "Booking identifier")),
    tag = "Bookings",
    responses(
        (status = 200, body = DeletedResponse),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn delete_booking(
    _: Permitted<DeleteBookings>,
    State(state): State<AppState>,
    PathParam(booking_id): PathParam<u64>,
) -> Result<Json<DeletedResponse>, ApiError> {
    BookingRepository::new(&state.db).delete(booking_id)?;
    Ok(Json(DeletedResponse::new(booking_id)))
}
