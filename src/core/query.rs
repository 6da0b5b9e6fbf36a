//! List query parameters and pagination utilities

use crate::core::error::RequestError;
use crate::core::request::DashboardRequest;
use crate::core::store::{OrderBy, SortDirection};
use serde::Serialize;

/// Parameters of a list view
///
/// # Example
/// ```text
/// ?action=crud&crud_operation=list&object=book&page=2
/// ?action=crud&crud_operation=list&object=book&criteria=available
/// ?action=crud&crud_operation=list&object=book&order_by=author:asc,title:desc
/// ?action=crud&crud_operation=list&object=book&order_by[title]=desc
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    /// Page number (starts at 1)
    pub page: usize,

    /// Name of a predefined criteria
    pub criteria: Option<String>,

    /// Ordering clauses in the order they were given
    pub order_by: Vec<OrderBy>,
}

impl ListQuery {
    pub fn from_request(request: &DashboardRequest) -> Result<Self, RequestError> {
        let page = match request.query_param("page") {
            None => 1,
            Some(raw) => {
                let page: i64 = raw.trim().parse().map_err(|_| RequestError::InvalidParameter {
                    name: "page".to_string(),
                    value: raw.to_string(),
                })?;
                usize::try_from(page.max(1)).unwrap_or(usize::MAX)
            }
        };

        let mut order_by = Vec::new();
        for (key, value) in &request.query {
            if key == "order_by" {
                order_by.extend(OrderBy::parse(value)?);
            } else if let Some(field) = key
                .strip_prefix("order_by[")
                .and_then(|rest| rest.strip_suffix(']'))
            {
                let direction =
                    SortDirection::parse(value).ok_or_else(|| RequestError::InvalidParameter {
                        name: key.clone(),
                        value: value.clone(),
                    })?;
                order_by.push(OrderBy {
                    field: field.to_string(),
                    direction,
                });
            }
        }

        Ok(Self {
            page,
            criteria: request.query_param("criteria").map(str::to_string),
            order_by,
        })
    }

    /// Offset of the first item of the current page, saturating past the end
    pub fn offset(&self, results_per_page: usize) -> usize {
        self.page.saturating_sub(1).saturating_mul(results_per_page)
    }
}

/// Pages linked on each side of the current one
pub const PAGE_LINK_RADIUS: usize = 3;

/// Number of pages needed for `total` items, 0 when there are none
pub fn pages_count(total: usize, results_per_page: usize) -> usize {
    if total == 0 {
        0
    } else {
        total.div_ceil(results_per_page.max(1))
    }
}

/// Pagination metadata handed to list templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub results_per_page: usize,

    /// Total number of pages
    pub pages_count: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: usize, results_per_page: usize, pages_count: usize) -> Self {
        Self {
            page,
            results_per_page,
            pages_count,
            has_next: page < pages_count,
            has_prev: page > 1,
        }
    }

    /// Page numbers linked from the current page, empty past the last page
    pub fn window(&self, radius: usize) -> std::ops::RangeInclusive<usize> {
        let first = self.page.saturating_sub(radius).max(1);
        let last = self.page.saturating_add(radius).min(self.pages_count);
        first..=last
    }
}
