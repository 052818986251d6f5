// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use super::extract::{JsonBody, PathParam, QueryParams};
use crate::{
    auth::{DeleteTherapists, GetBookings, Permitted, PostTherapists},
    error::ApiError,
    models::{
        Booking, CreateTherapistRequest, CreatedResponse, DeletedResponse, Therapist,
        TherapistDetailResponse, TherapistListResponse,
    },
    pagination::{format_page, Page, PageQuery},
    state::AppState,
    storage::{BookingRepository, TherapistRepository},
};

/// List therapists, 10 per page. No authentication.
#[utoipa::path(
    get,
    path = "/therapists",
    params(PageQuery),
    tag = "Therapists",
    responses((status = 200, body = TherapistListResponse))
)]
pub async fn list_therapists(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PageQuery>,
) -> Result<Json<TherapistListResponse>, ApiError> {
    let therapists = TherapistRepository::new(&state.db).list_all()?;
    let page = format_page::<_, Therapist>(therapists, Page::from(&query));

    Ok(Json(TherapistListResponse {
        success: true,
        therapists: page.items,
        total_therapists: page.total,
    }))
}

/// Therapist with all of its bookings. Requires `get:bookings`.
#[utoipa::path(
    get,
    path = "/therapists/{therapist_id}",
    params(("therapist_id" = u64, Path, description = "Therapist identifier")),
    tag = "Therapists",
    responses(
        (status = 200, body = TherapistDetailResponse),
        (status = 404, description = "Therapist not found")
    )
)]
pub async fn get_therapist(
    _: Permitted<GetBookings>,
    State(state): State<AppState>,
    PathParam(therapist_id): PathParam<u64>,
) -> Result<Json<TherapistDetailResponse>, ApiError> {
    let therapist = TherapistRepository::new(&state.db)
        .get(therapist_id)?
        .ok_or_else(ApiError::not_found)?;
    let bookings = BookingRepository::new(&state.db).list_by_therapist(therapist_id)?;

    Ok(Json(TherapistDetailResponse {
        success: true,
        id: therapist.id,
        name: therapist.name,
        bookings: bookings.into_iter().map(Booking::from).collect(),
    }))
}

/// Requires `post:therapists`.
#[utoipa::path(
    post,
    path = "/therapists",
    request_body = CreateTherapistRequest,
    tag = "Therapists",
    responses(
        (status = 200, body = CreatedResponse),
        (status = 422, description = "Missing name")
    )
)]
pub async fn create_therapist(
    _: Permitted<PostTherapists>,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateTherapistRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    // Stored as submitted; whitespace-only counts as missing
    let name = request
        .name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(ApiError::unprocessable)?;

    let therapist = TherapistRepository::new(&state.db).insert(name)?;
    tracing::info!(therapist_id = therapist.id, "Therapist created");
    Ok(Json(CreatedResponse::new(therapist.id)))
}

/// Delete a therapist and its bookings. Requires `delete:therapists`.
#[utoipa::path(
    delete,
    path = "/therapists/{therapist_id}",
    params(("therapist_id" = u64, Path, description = "Therapist identifier")),
    tag = "Therapists",
    responses(
        (status = 200, body = DeletedResponse),
        (status = 404, description = "Therapist not found")
    )
)]
pub async fn delete_therapist(
    _: Permitted<DeleteTherapists>,
    State(state): State<AppState>,
    PathParam(therapist_id): PathParam<u64>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let cascaded = TherapistRepository::new(&state.db).delete(therapist_id)?;
    tracing::info!(therapist_id, cascaded, "Therapist deleted");
    Ok(Json(DeletedResponse::new(therapist_id)))
}
