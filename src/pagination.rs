// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Page slicing for list endpoints.
//!
//! Entities are formatted to their public representation first, then the
//! requested page is cut out of the formatted collection. The total always
//! refers to the whole collection.

use serde::Deserialize;
use utoipa::IntoParams;

/// Number of entries on one page.
pub const ENTRIES_PER_PAGE: usize = 10;

/// Raw `?page=` query parameter.
///
/// Kept as a string so that non-numeric input falls back to the first page
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number (defaults to 1)
    pub page: Option<String>,
}

/// A 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page(usize);

impl Page {
    pub const FIRST: Page = Page(1);

    /// Parse a page number. Missing, non-numeric, zero or negative input
    /// yields the first page.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
            Some(n) if n >= 1 => Page(usize::try_from(n).unwrap_or(usize::MAX)),
            _ => Page::FIRST,
        }
    }

    /// Item range of this page, clipped to `len`.
    fn bounds(self, size: usize, len: usize) -> (usize, usize) {
        let start = (self.0 - 1).saturating_mul(size).min(len);
        let end = start.saturating_add(size).min(len);
        (start, end)
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::FIRST
    }
}

impl From<&PageQuery> for Page {
    fn from(query: &PageQuery) -> Self {
        Page::parse(query.page.as_deref())
    }
}

/// One page of formatted entries plus the size of the whole collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Slice `entries` to the given page.
pub fn paginate<T>(entries: &[T], page: Page, size: usize) -> &[T] {
    let (start, end) = page.bounds(size, entries.len());
    &entries[start..end]
}

/// Format every entity to its public shape, then cut out one page.
pub fn format_page<S, P>(selection: Vec<S>, page: Page) -> Paginated<P>
where
    P: From<S> + Clone,
{
    let formatted: Vec<P> = selection.into_iter().map(P::from).collect();

    Paginated {
        items: paginate(&formatted, page, ENTRIES_PER_PAGE).to_vec(),
        total: formatted.len(),
    }
}
