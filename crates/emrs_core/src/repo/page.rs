//! Paginated reader.
//!
//! # Invariants
//! - Content is ordered by ascending id, so rows inserted later never shift
//!   earlier pages.
//! - Count and content are separate queries; the total may briefly lag the
//!   content under concurrent writes.

use super::error::{RepoError, RepoResult};
use crate::store::{Entity, RecordStore, Select};
use serde::Serialize;

/// Validated page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    size: i64,
}

impl PageRequest {
    /// Fails with `InvalidPageRequest` when `page < 0` or `size <= 0`.
    pub fn new(page: i64, size: i64) -> RepoResult<Self> {
        if page < 0 || size <= 0 || page.checked_mul(size).is_none() {
            return Err(RepoError::InvalidPageRequest { page, size });
        }
        Ok(Self { page, size })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    fn offset(&self) -> i64 {
        self.page * self.size
    }
}

/// One page of records plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

/// Reads id-ordered pages from a `RecordStore`.
pub struct PageReader<'s, S: RecordStore> {
    store: &'s mut S,
}

impl<'s, S: RecordStore> PageReader<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    pub fn page<E: Entity>(&mut self, page: i64, size: i64) -> RepoResult<Page<E>> {
        let request = PageRequest::new(page, size)?;
        self.fetch(request)
    }

    pub fn fetch<E: Entity>(&mut self, request: PageRequest) -> RepoResult<Page<E>> {
        let content: Vec<E> = self
            .store
            .query(&Select::window(request.offset(), request.size()))?;
        let total_elements = self.store.count::<E>()?;

        Ok(Page {
            content,
            page: request.page(),
            size: request.size(),
            total_elements,
            total_pages: total_pages(total_elements, request.size()),
        })
    }
}

fn total_pages(total_elements: i64, size: i64) -> i64 {
    if total_elements <= 0 {
        return 0;
    }
    total_elements / size + i64::from(total_elements % size != 0)
}

#[cfg(test)]
mod tests {
    use super::{total_pages, PageRequest};
    use crate::repo::RepoError;

    #[test]
    fn rejects_out_of_range_requests() {
        for (page, size) in [(-1, 10), (0, 0), (0, -5), (i64::MAX, 2)] {
            assert!(matches!(
                PageRequest::new(page, size),
                Err(RepoError::InvalidPageRequest { .. })
            ));
        }
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(30, 10), 3);
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
    }

    #[test]
    fn total_pages_handles_sizes_near_i64_max() {
        assert_eq!(total_pages(2, i64::MAX), 1);
        assert_eq!(total_pages(i64::MAX, i64::MAX), 1);
        assert_eq!(total_pages(i64::MAX, 1), i64::MAX);
    }
}
