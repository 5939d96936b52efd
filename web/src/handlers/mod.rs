//! HTTP request handlers.

pub mod health;
pub mod products;
pub mod purchases;
pub mod sale_windows;
pub mod users;

use serde::Deserialize;

/// Common pagination query parameters, 1-based `page`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    /// Page number, starting at 1.
    pub page: Option<u32>,
    /// Items per page.
    pub page_size: Option<u32>,
}

impl Pagination {
    /// Resolve against a handler's default page size.
    #[must_use]
    pub fn resolve(self, default_page_size: u32) -> (u32, u32) {
        (
            self.page.unwrap_or(1).max(1),
            self.page_size.unwrap_or(default_page_size).clamp(1, 100),
        )
    }
}
