//! Fixed-size paging over an ordered slice.

/// Items shown per page in the product and cart menus
pub const DEFAULT_PER_PAGE: usize = 1;

/// A read-only page view over a slice; `page` is 1-based
#[derive(Debug, Clone, Copy)]
pub struct Paginator<'a, T> {
    items: &'a [T],
    page: usize,
    per_page: usize,
    pages: usize,
}

impl<'a, T> Paginator<'a, T> {
    pub fn new(items: &'a [T], page: usize) -> Self {
        Self::with_per_page(items, page, DEFAULT_PER_PAGE)
    }

    /// A `per_page` of zero is treated as one
    pub fn with_per_page(items: &'a [T], page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let pages = items.len().div_ceil(per_page);

        Self {
            items,
            page,
            per_page,
            pages,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Total page count, `ceil(len / per_page)`
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Items on the current page; empty when the page is out of range
    pub fn get_page(&self) -> &'a [T] {
        let start = self.page.saturating_sub(1).saturating_mul(self.per_page);
        if self.page == 0 || start >= self.items.len() {
            return &[];
        }
        let stop = (start + self.per_page).min(self.items.len());

        &self.items[start..stop]
    }

    /// Next page number, if there is one
    pub fn has_next(&self) -> Option<usize> {
        (self.page < self.pages).then(|| self.page + 1)
    }

    /// Previous page number, if there is one
    pub fn has_previous(&self) -> Option<usize> {
        (self.page > 1).then(|| self.page - 1)
    }
}
