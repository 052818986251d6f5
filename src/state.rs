// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::storage::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub verifier: Arc<TokenVerifier>,
    /// Greeting flavour for `GET /`
    pub excited: bool,
}

impl AppState {
    pub fn new(db: Database, verifier: TokenVerifier) -> Self {
        Self {
            db: Arc::new(db),
            verifier: Arc::new(verifier),
            excited: false,
        }
    }

    pub fn with_excited(mut self, excited: bool) -> Self {
        self.excited = excited;
        self
    }
}
