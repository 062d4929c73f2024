use serde::Serialize;

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Zero-based page request. Sizes are clamped to `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        Self::with_default_size(page, size, DEFAULT_PAGE_SIZE)
    }

    pub fn with_default_size(page: Option<i64>, size: Option<i64>, default_size: u32) -> Self {
        let page = page.unwrap_or(0).clamp(0, u32::MAX as i64) as u32;
        let size = size
            .unwrap_or(default_size as i64)
            .clamp(1, MAX_PAGE_SIZE as i64) as u32;
        Self { page, size }
    }

    pub fn offset(&self) -> i64 {
        self.page as i64 * self.size as i64
    }

    pub fn limit(&self) -> i64 {
        self.size as i64
    }
}

/// One page of results plus the totals clients need to paginate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: i64,
    pub total_pages: u32,
    pub first: bool,
    pub last: bool,
    pub number_of_elements: usize,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let total_elements = total_elements.max(0);
        let size = request.size.max(1) as i64;
        let total_pages = ((total_elements + size - 1) / size) as u32;
        let number_of_elements = content.len();
        Self {
            content,
            page_number: request.page,
            page_size: request.size,
            total_elements,
            total_pages,
            first: request.page == 0,
            last: request.page.saturating_add(1) >= total_pages,
            number_of_elements,
        }
    }

    /// Page over an in-memory slice that already holds every match.
    pub fn from_vec(items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len() as i64;
        let content = items
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size as usize)
            .collect();
        Self::new(content, request, total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            first: self.first,
            last: self.last,
            number_of_elements: self.number_of_elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 0, size: 20 });
        assert_eq!(PageRequest::new(Some(-3), Some(500)).size, 100);
        assert_eq!(PageRequest::new(Some(-3), Some(0)), PageRequest { page: 0, size: 1 });
        assert_eq!(PageRequest::new(Some(2), Some(10)).offset(), 20);
    }

    #[test]
    fn test_page_totals() {
        let page = Page::new(vec![1, 2, 3], PageRequest { page: 1, size: 3 }, 7);
        assert_eq!(page.total_pages, 3);
        assert!(!page.first);
        assert!(!page.last);
        assert_eq!(page.number_of_elements, 3);

        let empty: Page<i32> = Page::new(vec![], PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.first);
        assert!(empty.last);
    }

    #[test]
    fn test_page_from_vec_slices() {
        let page = Page::from_vec((0..25).collect(), PageRequest { page: 1, size: 10 });
        assert_eq!(page.content, (10..20).collect::<Vec<_>>());
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.map(|n| n * 2).content[0], 20);
    }

    #[test]
    fn test_page_past_the_end_is_last() {
        let request = PageRequest::new(Some(i64::MAX), Some(20));
        assert_eq!(request.page, u32::MAX);

        let page: Page<u8> = Page::new(vec![], request, 5);
        assert_eq!(page.total_pages, 1);
        assert!(!page.first);
        assert!(page.last);

        let sliced: Page<u8> = Page::from_vec(vec![1, 2, 3], request);
        assert!(sliced.content.is_empty());
        assert!(sliced.last);
    }
}
