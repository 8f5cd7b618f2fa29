//! Pagination and sorting primitives shared across all list endpoints.

use serde::{Deserialize, Serialize};

/// Pagination query parameters (`?page=2&perPage=50`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    /// Maximum items per page.
    const MAX_PER_PAGE: i64 = 100;

    /// Default items per page.
    const DEFAULT_PER_PAGE: i64 = 25;

    pub fn limit(&self) -> i64 {
        self.per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.current_page() - 1) * self.limit()
    }

    pub fn current_page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Sort direction for list endpoints; defaults to newest/largest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Paged result envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T: Serialize> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        let per_page = pagination.limit();
        Self {
            items,
            total,
            page: pagination.current_page(),
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        }
    }
}

/// Incrementally built `WHERE` clause with positional `$n` placeholders.
///
/// Placeholders are numbered in push order; binds must follow the same order.
#[derive(Debug, Default)]
pub struct WhereClause {
    conditions: Vec<String>,
    next_param: u32,
}

impl WhereClause {
    /// Add a condition; every `$?` in `template` becomes the next placeholder.
    pub fn push(&mut self, template: &str) {
        self.next_param += 1;
        let placeholder = format!("${}", self.next_param);
        self.conditions.push(template.replace("$?", &placeholder));
    }

    /// Add a condition that takes no parameter.
    pub fn push_static(&mut self, condition: &str) {
        self.conditions.push(condition.to_string());
    }

    pub fn param_count(&self) -> u32 {
        self.next_param
    }

    pub fn to_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }
}
