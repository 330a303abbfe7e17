//! Data Transfer Objects
//!
//! This module contains the request and response bodies exchanged between the
//! PromptLab server and its clients (HTTP client, CLI). DTOs are lightweight
//! representations of domain entities optimized for network transfer.

pub mod execution;
pub mod pipeline;
pub mod provider;
pub mod template;

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page size a caller may request
pub const MAX_LIMIT: i64 = 100;

/// `skip`/`limit` query parameters shared by every list endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Check that `skip >= 0` and `1 <= limit <= MAX_LIMIT`
    pub fn validate(&self) -> Result<(), String> {
        if self.skip < 0 {
            return Err("skip must not be negative".to_string());
        }
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(format!("limit must be between 1 and {}", MAX_LIMIT));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let page: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, DEFAULT_LIMIT);
        assert!(page.validate().is_ok());
    }

    #[test]
    fn test_pagination_bounds() {
        assert!(Pagination { skip: -1, limit: 10 }.validate().is_err());
        assert!(Pagination { skip: 0, limit: 0 }.validate().is_err());
        assert!(Pagination { skip: 0, limit: MAX_LIMIT + 1 }.validate().is_err());
        assert!(Pagination { skip: 5, limit: MAX_LIMIT }.validate().is_ok());
    }
}
