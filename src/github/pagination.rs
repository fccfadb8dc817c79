//! Page-number pagination for GitHub list endpoints.
//!
//! GitHub list endpoints accept `page` (1-based) and `per_page` (at most
//! 100). [`collect_pages`] keeps requesting pages while the previous batch
//! came back full.

use std::future::Future;

use tracing::debug;

use crate::error::ReleaseError;

/// Largest page size GitHub accepts.
pub const MAX_PER_PAGE: u8 = 100;

/// One page of a paginated list request.
///
/// # Example
///
/// ```
/// use releaser::github::pagination::PageRequest;
///
/// let first = PageRequest::first(100);
/// assert_eq!(first.page(), 1);
/// assert_eq!(first.next().page(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u8,
}

impl PageRequest {
    /// Creates a request for an arbitrary page.
    #[must_use]
    pub const fn new(page: u32, per_page: u8) -> Self {
        Self { page, per_page }
    }

    /// The first page with the given page size.
    #[must_use]
    pub const fn first(per_page: u8) -> Self {
        Self::new(1, per_page)
    }

    /// The page following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self::new(self.page.saturating_add(1), self.per_page)
    }

    /// Returns the page number (1-based).
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Returns the number of items per page.
    #[must_use]
    pub const fn per_page(&self) -> u8 {
        self.per_page
    }

    /// Checks the request against GitHub's limits.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::InvalidPagination`] when `page` is zero or
    /// `per_page` is outside `1..=100`.
    pub fn validate(&self) -> Result<(), ReleaseError> {
        if self.page == 0 {
            return Err(ReleaseError::InvalidPagination {
                message: "page must be at least 1".to_owned(),
            });
        }

        if self.per_page == 0 {
            return Err(ReleaseError::InvalidPagination {
                message: "per_page must be at least 1".to_owned(),
            });
        }

        if self.per_page > MAX_PER_PAGE {
            return Err(ReleaseError::InvalidPagination {
                message: format!("per_page must not exceed {MAX_PER_PAGE}"),
            });
        }

        Ok(())
    }

    pub(crate) fn query_values(&self) -> (String, String) {
        (self.page.to_string(), self.per_page.to_string())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(MAX_PER_PAGE)
    }
}

/// Requests pages until a batch shorter than `per_page` arrives.
///
/// # Errors
///
/// Returns the first error produced by `fetch`.
pub async fn collect_pages<T, F, Fut>(per_page: u8, mut fetch: F) -> Result<Vec<T>, ReleaseError>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ReleaseError>>,
{
    let mut request = PageRequest::first(per_page);
    request.validate()?;

    let mut items = Vec::new();
    loop {
        let batch = fetch(request).await?;
        let full = batch.len() >= usize::from(per_page);
        debug!(page = request.page(), count = batch.len(), "fetched page");
        items.extend(batch);
        if !full {
            return Ok(items);
        }
        request = request.next();
    }
}
