//! Link construction.

use crate::document::Links;
use crate::pagination::Pagination;
use crate::params::RawParams;

/// Builds absolute URLs for resources, relationships and collections.
///
/// # Example
///
/// ```
/// use hermes_core::LinkBuilder;
///
/// let links = LinkBuilder::new("http://example.com/");
/// assert_eq!(links.resource("books", "11"), "http://example.com/books/11");
/// assert_eq!(
///     links.relationship("books", "11", "author"),
///     "http://example.com/books/11/relationships/author"
/// );
/// assert_eq!(links.related("books", "11", "author"), "http://example.com/books/11/author");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    /// Creates a builder. A trailing slash on `base_url` is ignored.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The path component of the base URL (`""` when mounted at the root).
    #[must_use]
    pub fn base_path(&self) -> &str {
        let after_scheme = self
            .base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_, rest)| rest);
        after_scheme
            .find('/')
            .map_or("", |index| &after_scheme[index..])
    }

    /// `{base}/{type}`
    #[must_use]
    pub fn collection(&self, type_name: &str) -> String {
        format!("{}/{type_name}", self.base_url)
    }

    /// `{base}/{type}/{id}`, with the id percent-encoded.
    #[must_use]
    pub fn resource(&self, type_name: &str, id: &str) -> String {
        format!("{}/{type_name}/{}", self.base_url, urlencoding::encode(id))
    }

    /// `{base}/{type}/{id}/relationships/{name}`
    #[must_use]
    pub fn relationship(&self, type_name: &str, id: &str, relationship: &str) -> String {
        format!("{}/relationships/{relationship}", self.resource(type_name, id))
    }

    /// `{base}/{type}/{id}/{name}`
    #[must_use]
    pub fn related(&self, type_name: &str, id: &str, relationship: &str) -> String {
        format!("{}/{relationship}", self.resource(type_name, id))
    }

    /// Appends `raw` as a query string to `url`.
    #[must_use]
    pub fn with_query(url: &str, raw: &RawParams) -> String {
        if raw.is_empty() {
            url.to_string()
        } else {
            format!("{url}?{}", raw.to_query_string())
        }
    }

    /// Builds document links for a response: `self`, plus pagination links
    /// when the response is a paginated collection of `total` items.
    #[must_use]
    pub fn document_links(
        url: &str,
        raw: &RawParams,
        pagination: Option<&Pagination>,
        total: Option<usize>,
    ) -> Links {
        let mut links = Links::new();
        links.insert("self".to_string(), Some(Self::with_query(url, raw)));
        if let (Some(pagination), Some(total)) = (pagination, total) {
            for (name, page) in pagination.link_params(total).iter() {
                let link = page.map(|page| Self::with_query(url, &raw.with_group("page", page.clone())));
                links.insert(name.to_string(), link);
            }
        }
        links
    }
}
