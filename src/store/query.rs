//! Filtered, ordered, paginated collection queries.
//!
//! A deliberately small filter language: conjunctions of per-column
//! comparisons. Both backends interpret the same `Query`; the mem backend
//! evaluates it over JSON documents, the postgres backend translates it
//! to SQL.

use serde_json::Value as JsonValue;

const DEFAULT_LIMIT: usize = 10000;

/// One filter condition over a column.
#[derive(Debug, Clone)]
pub enum Filter {
    Eq(String, JsonValue),
    Gt(String, JsonValue),
    Lt(String, JsonValue),
}

/// A collection query: AND-combined filters, ordering, pagination.
#[derive(Debug, Clone)]
pub struct Query {
    filters: Vec<Filter>,
    order: Vec<(String, bool)>,
    limit: usize,
    offset: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            order: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    pub fn filter(
        mut self,
        filter: Filter,
    ) -> Self {
        self.filters.push(filter);
        self
    }

    /// Order by a column; `rev` selects descending.
    pub fn order(
        mut self,
        column: &str,
        rev: bool,
    ) -> Self {
        self.order.push((column.to_string(), rev));
        self
    }

    pub fn set_limit(
        mut self,
        limit: usize,
    ) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn set_offset(
        mut self,
        offset: usize,
    ) -> Self {
        self.offset = offset;
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn order_by(&self) -> &[(String, bool)] {
        &self.order
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}
