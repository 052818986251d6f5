// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::extract::State;

use crate::state::AppState;

/// Plain-text greeting, louder when `EXCITED=true`.
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses((status = 200, description = "Greeting", body = String, content_type = "text/plain"))
)]
pub async fn greeting(State(state): State<AppState>) -> &'static str {
    if state.excited {
        "Hello!!!!!"
    } else {
        "Hello"
    }
}
