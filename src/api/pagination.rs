//! Pagination utilities for list endpoints
//!
//! All collections live in memory, so pagination is a slice of an already
//! materialised Vec rather than a SQL OFFSET.

#![allow(dead_code)]

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PaginationParams {
    /// Page number (1-indexed)
    pub page: Option<u32>,

    /// Items per page
    pub per_page: Option<u32>,
}

impl PaginationParams {
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(20).clamp(1, Self::MAX_PER_PAGE)
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Paginated response wrapper
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T: Serialize> Paginated<T> {
    /// Slice `items` down to the requested page.
    pub fn slice(items: Vec<T>, params: &PaginationParams) -> Self {
        let per_page = params.per_page();
        let page = params.page();
        let total_items = items.len() as u64;
        let total_pages = (total_items as f64 / per_page as f64).ceil() as u32;

        // Widen before multiplying so a hostile ?page= cannot overflow u32.
        let start = (page as u64 - 1) * per_page as u64;
        let data: Vec<T> = items
            .into_iter()
            .skip(start as usize)
            .take(per_page as usize)
            .collect();

        Self {
            data,
            pagination: PaginationMeta {
                page,
                per_page,
                total_items,
                total_pages,
                has_next: page < total_pages,
                has_prev: page > 1,
            },
        }
    }
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_returns_the_requested_page() {
        let items: Vec<u32> = (0..45).collect();
        let params = PaginationParams {
            page: Some(2),
            per_page: Some(20),
        };

        let page = Paginated::slice(items, &params);
        assert_eq!(page.data.first(), Some(&20));
        assert_eq!(page.data.len(), 20);
        assert_eq!(page.pagination.total_items, 45);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.pagination.has_next);
        assert!(page.pagination.has_prev);
    }

    #[test]
    fn huge_page_number_does_not_overflow() {
        let items: Vec<u32> = (0..5).collect();
        let params = PaginationParams {
            page: Some(u32::MAX),
            per_page: Some(100),
        };
        let page = Paginated::slice(items, &params);
        assert!(page.data.is_empty());
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_prev);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let items: Vec<u32> = (0..5).collect();
        let params = PaginationParams {
            page: Some(9),
            per_page: Some(20),
        };
        let page = Paginated::slice(items, &params);
        assert!(page.data.is_empty());
        assert!(!page.pagination.has_next);
    }
}
