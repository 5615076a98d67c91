//! Pagination strategies.
//!
//! A [`PaginationStrategy`] turns the `page[...]` query group into a
//! [`Pagination`] and knows how to compute the `first`/`last`/`prev`/`next`
//! page parameters for a collection of a given size.
//!
//! Two strategies are provided:
//!
//! - [`PageNumberStrategy`]: `page[number]` (1-based) and `page[size]`
//! - [`OffsetLimitStrategy`]: `page[offset]` (0-based) and `page[limit]`

use crate::error::{JsonApiError, JsonApiResult};
use indexmap::IndexMap;
use std::fmt;

/// Raw `page[...]` members, keyed by the name inside the brackets.
pub type PageParams = IndexMap<String, String>;

/// A resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Page-number pagination.
    PageNumber {
        /// 1-based page number.
        number: usize,
        /// Page size.
        size: usize,
    },
    /// Offset-limit pagination.
    OffsetLimit {
        /// Number of items to skip.
        offset: usize,
        /// Maximum number of items.
        limit: usize,
    },
}

/// Page parameters for the four pagination links. `None` means no such page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinkParams {
    /// First page.
    pub first: Option<PageParams>,
    /// Last page.
    pub last: Option<PageParams>,
    /// Previous page.
    pub prev: Option<PageParams>,
    /// Next page.
    pub next: Option<PageParams>,
}

impl PageLinkParams {
    /// Iterates over `(link name, params)` in `first, last, prev, next` order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<&PageParams>)> {
        [
            ("first", self.first.as_ref()),
            ("last", self.last.as_ref()),
            ("prev", self.prev.as_ref()),
            ("next", self.next.as_ref()),
        ]
        .into_iter()
    }
}

impl Pagination {
    /// Number of items to skip.
    #[must_use]
    pub const fn offset(&self) -> usize {
        match *self {
            Self::PageNumber { number, size } => number.saturating_sub(1).saturating_mul(size),
            Self::OffsetLimit { offset, .. } => offset,
        }
    }

    /// Maximum number of items in the window.
    #[must_use]
    pub const fn limit(&self) -> usize {
        match *self {
            Self::PageNumber { size, .. } => size,
            Self::OffsetLimit { limit, .. } => limit,
        }
    }

    /// Computes the pagination link parameters for a collection of `total` items.
    #[must_use]
    pub fn link_params(&self, total: usize) -> PageLinkParams {
        match *self {
            Self::PageNumber { number, size } => {
                let last = total.div_ceil(size).max(1);
                let page = |n: usize| {
                    PageParams::from([
                        ("number".to_string(), n.to_string()),
                        ("size".to_string(), size.to_string()),
                    ])
                };
                PageLinkParams {
                    first: Some(page(1)),
                    last: Some(page(last)),
                    prev: (number > 1).then(|| page((number - 1).min(last))),
                    next: (number < last).then(|| page(number + 1)),
                }
            }
            Self::OffsetLimit { offset, limit } => {
                let last = if total == 0 { 0 } else { (total - 1) / limit * limit };
                let window = |o: usize| {
                    PageParams::from([
                        ("offset".to_string(), o.to_string()),
                        ("limit".to_string(), limit.to_string()),
                    ])
                };
                PageLinkParams {
                    first: Some(window(0)),
                    last: Some(window(last)),
                    prev: (offset > 0).then(|| window(offset.saturating_sub(limit))),
                    next: offset
                        .checked_add(limit)
                        .filter(|next| *next < total)
                        .map(window),
                }
            }
        }
    }
}

/// Parses `page[...]` parameters.
pub trait PaginationStrategy: Send + Sync + fmt::Debug {
    /// The keys accepted inside `page[...]`.
    fn keys(&self) -> &'static [&'static str];

    /// Parses the page group; `None` means the request carried no `page` parameter.
    fn parse(&self, params: Option<&PageParams>) -> JsonApiResult<Pagination>;
}

fn reject_unknown_keys(params: &PageParams, keys: &[&str]) -> JsonApiResult<()> {
    match params.keys().find(|key| !keys.contains(&key.as_str())) {
        Some(key) => Err(JsonApiError::invalid_page_parameter(
            format!("page[{key}]"),
            format!("unknown pagination key, expected one of: {}", keys.join(", ")),
        )),
        None => Ok(()),
    }
}

fn parse_number(params: &PageParams, key: &str, min: usize) -> JsonApiResult<Option<usize>> {
    let Some(raw) = params.get(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<usize>() {
        Ok(value) if value >= min => Ok(Some(value)),
        _ => Err(JsonApiError::invalid_page_parameter(
            format!("page[{key}]"),
            format!("expected an integer >= {min}, got '{raw}'"),
        )),
    }
}

fn check_max(key: &str, value: usize, max: usize) -> JsonApiResult<usize> {
    if value > max {
        return Err(JsonApiError::invalid_page_parameter(
            format!("page[{key}]"),
            format!("must not exceed {max}"),
        ));
    }
    Ok(value)
}

/// `page[number]` / `page[size]` pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumberStrategy {
    default_size: usize,
    max_size: usize,
}

impl PageNumberStrategy {
    /// Creates a strategy with a default and a maximum page size.
    #[must_use]
    pub const fn new(default_size: usize, max_size: usize) -> Self {
        Self {
            default_size,
            max_size,
        }
    }
}

impl Default for PageNumberStrategy {
    fn default() -> Self {
        Self::new(20, 100)
    }
}

impl PaginationStrategy for PageNumberStrategy {
    fn keys(&self) -> &'static [&'static str] {
        &["number", "size"]
    }

    fn parse(&self, params: Option<&PageParams>) -> JsonApiResult<Pagination> {
        let Some(params) = params else {
            return Ok(Pagination::PageNumber {
                number: 1,
                size: self.default_size,
            });
        };
        reject_unknown_keys(params, self.keys())?;
        let number = parse_number(params, "number", 1)?.unwrap_or(1);
        let size = match parse_number(params, "size", 1)? {
            Some(size) => check_max("size", size, self.max_size)?,
            None => self.default_size,
        };
        Ok(Pagination::PageNumber { number, size })
    }
}

/// `page[offset]` / `page[limit]` pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetLimitStrategy {
    default_limit: usize,
    max_limit: usize,
}

impl OffsetLimitStrategy {
    /// Creates a strategy with a default and a maximum limit.
    #[must_use]
    pub const fn new(default_limit: usize, max_limit: usize) -> Self {
        Self {
            default_limit,
            max_limit,
        }
    }
}

impl Default for OffsetLimitStrategy {
    fn default() -> Self {
        Self::new(20, 100)
    }
}

impl PaginationStrategy for OffsetLimitStrategy {
    fn keys(&self) -> &'static [&'static str] {
        &["offset", "limit"]
    }

    fn parse(&self, params: Option<&PageParams>) -> JsonApiResult<Pagination> {
        let Some(params) = params else {
            return Ok(Pagination::OffsetLimit {
                offset: 0,
                limit: self.default_limit,
            });
        };
        reject_unknown_keys(params, self.keys())?;
        let offset = parse_number(params, "offset", 0)?.unwrap_or(0);
        let limit = match parse_number(params, "limit", 1)? {
            Some(limit) => check_max("limit", limit, self.max_limit)?,
            None => self.default_limit,
        };
        Ok(Pagination::OffsetLimit { offset, limit })
    }
}
