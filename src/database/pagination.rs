use serde::{Deserialize, Serialize};

use crate::{constants::MAX_PAGE_SIZE, error::TypeError, form::Form};

/// Page-number pagination taken from `?page=` and `?limit=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: i64,
    pub limit: i64,
}

impl Paging {
    pub fn new(page: Option<i64>, limit: Option<i64>, page_size: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(page_size).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn from_form(form: &Form, page_size: i64) -> Result<Self, TypeError> {
        Ok(Self::new(
            form.get_number("page")?,
            form.get_number("limit")?,
            page_size,
        ))
    }

    /// Saturates, so an absurd page number reads past the end instead of overflowing.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, paging: Paging) -> Self {
        if rows.is_empty() {
            return Self::no_rows();
        }

        let page_count = (total_rows + paging.limit - 1) / paging.limit;
        let next = (paging.page < page_count).then_some(paging.page + 1);
        let previous = (paging.page > 1).then_some(paging.page - 1);

        Self {
            count: total_rows,
            next,
            previous,
            results: rows,
        }
    }

    pub fn no_rows() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: vec![],
        }
    }
}
