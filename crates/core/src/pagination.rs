//! Pagination and list search for the table screens.
//!
//! Some list endpoints report a total row count, others do not. Without a
//! total the page count is approximated from the rows returned, which is
//! what the dashboard has always shown for those screens.

use serde::{Deserialize, Serialize};

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maximum rows per page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Clamp a user-provided page size to valid bounds.
pub fn clamp_page_size(page_size: Option<u32>) -> u32 {
    page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Clamp a user-provided 1-based page number.
pub fn clamp_page(page: Option<u32>) -> u32 {
    page.unwrap_or(1).max(1)
}

/// Number of pages to offer.
///
/// With a server total this is `ceil(total / page_size)`. Without one it
/// falls back to `ceil(returned_rows / page_size)`. A zero page size is
/// treated as one so the result is always a whole, non-negative number.
pub fn page_count(total: Option<u64>, returned_rows: usize, page_size: u32) -> u64 {
    let page_size = u64::from(page_size.max(1));
    let rows = total.unwrap_or(returned_rows as u64);
    rows.div_ceil(page_size)
}

/// A page of rows as returned by list endpoints: `{ data: [...], total? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> Paginated<T> {
    pub fn page_info(&self, page: u32, page_size: u32) -> PageInfo {
        PageInfo {
            page: page.max(1),
            page_size: page_size.max(1),
            total_pages: page_count(self.total, self.data.len(), page_size),
            approximate: self.total.is_none(),
        }
    }
}

/// Pagination footer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
    /// The page count is derived from returned rows, not a server total.
    pub approximate: bool,
}

impl PageInfo {
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn footer(&self) -> String {
        let marker = if self.approximate { "~" } else { "" };
        format!(
            "Page {} of {marker}{}",
            self.page,
            self.total_pages.max(1)
        )
    }
}

// ---------------------------------------------------------------------------
// Query + search
// ---------------------------------------------------------------------------

/// Query parameters shared by list endpoints (`?page=&search=`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            search: None,
        }
    }
}

impl ListQuery {
    pub fn new(page: Option<u32>, search: Option<&str>) -> Self {
        Self {
            page: clamp_page(page),
            search: normalize_search(search),
        }
    }

    /// Query-string pairs for reqwest.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string())];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}

fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Search input that only takes effect when committed (Enter).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchBox {
    input: String,
    query: ListQuery,
}

impl SearchBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the typed text. Does not change the active query.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Commit the typed text. Returns `true` when the search term changed,
    /// in which case the query returns to page 1.
    pub fn commit(&mut self) -> bool {
        let search = normalize_search(Some(&self.input));
        if search == self.query.search {
            return false;
        }
        self.query = ListQuery { page: 1, search };
        true
    }

    pub fn set_page(&mut self, page: u32) {
        self.query.page = page.max(1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_uses_total_when_present() {
        assert_eq!(page_count(Some(95), 10, 10), 10);
        assert_eq!(page_count(Some(100), 10, 10), 10);
        assert_eq!(page_count(Some(0), 0, 10), 0);
    }

    #[test]
    fn page_count_without_total_approximates_from_rows() {
        assert_eq!(page_count(None, 7, 10), 1);
        assert_eq!(page_count(None, 21, 10), 3);
        assert_eq!(page_count(None, 0, 10), 0);
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        assert_eq!(page_count(None, 3, 0), 3);
        assert_eq!(page_count(Some(4), 0, 0), 4);
    }

    #[test]
    fn clamps() {
        assert_eq!(clamp_page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_page_size(Some(0)), 1);
        assert_eq!(clamp_page_size(Some(1000)), MAX_PAGE_SIZE);
        assert_eq!(clamp_page(Some(0)), 1);
    }

    #[test]
    fn page_info_marks_approximate_counts() {
        let page: Paginated<u8> = Paginated {
            data: vec![1, 2, 3],
            total: None,
        };
        let info = page.page_info(1, 2);
        assert_eq!(info.total_pages, 2);
        assert!(info.approximate);
        assert!(info.has_next());
        assert!(!info.has_previous());
        assert_eq!(info.footer(), "Page 1 of ~2");
    }

    #[test]
    fn search_commits_only_on_enter() {
        let mut search = SearchBox::new();
        search.set_page(3);
        search.edit("  camry ");
        assert_eq!(search.query().search, None);
        assert_eq!(search.query().page, 3);

        assert!(search.commit());
        assert_eq!(search.query().search.as_deref(), Some("camry"));
        assert_eq!(search.query().page, 1);

        search.edit("camry");
        assert!(!search.commit());
    }

    #[test]
    fn list_query_pairs() {
        let q = ListQuery::new(Some(2), Some(" "));
        assert_eq!(q.to_pairs(), vec![("page", "2".to_string())]);
        let q = ListQuery::new(None, Some("bmw"));
        assert_eq!(
            q.to_pairs(),
            vec![("page", "1".to_string()), ("search", "bmw".to_string())]
        );
    }
}
