//! Result sets and ordering shared by object managers

use crate::core::entity::ManagedObject;
use crate::core::error::RequestError;
use crate::core::field::FieldValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// What a repository method returns
#[derive(Debug)]
pub enum CriteriaResult {
    /// Managed objects of the listed type
    Objects(Vec<Box<dyn ManagedObject>>),
    /// Arbitrary data; must be an array to be listed
    Json(serde_json::Value),
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// One ordering clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse an ordering expression
    ///
    /// # Format
    /// - `field` or `field:asc` (ascending)
    /// - `field:desc` (descending)
    /// - several clauses separated by commas: `author:asc,title:desc`
    pub fn parse(expression: &str) -> Result<Vec<OrderBy>, RequestError> {
        expression.split(',')
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(|clause| {
                let (field, direction) = clause.split_once(':').unwrap_or((clause, ""));
                let direction =
                    SortDirection::parse(direction).ok_or_else(|| RequestError::InvalidParameter {
                        name: "order_by".to_string(),
                        value: clause.to_string(),
                    })?;
                Ok(OrderBy {
                    field: field.trim().to_string(),
                    direction,
                })
            })
            .collect()
    }
}

/// Sort objects in place by the given clauses; missing fields sort as null
pub fn apply_order(objects: &mut [Box<dyn ManagedObject>], order_by: &[OrderBy]) {
    if order_by.is_empty() {
        return;
    }

    objects.sort_by(|a, b| {
        for clause in order_by {
            let left = a.get_field(&clause.field).unwrap_or(FieldValue::Null);
            let right = b.get_field(&clause.field).unwrap_or(FieldValue::Null);
            let ordering = match clause.direction {
                SortDirection::Asc => left.compare(&right),
                SortDirection::Desc => right.compare(&left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
