//! One page of a Redmine collection.

/// A page of entities plus the envelope metadata Redmine sends around it.
///
/// `total_count` is the size of the whole collection on the server, not of
/// this page. When a server omits it (or reports zero while still returning
/// items) the serializers backfill it from `items.len()`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PagedResult<T> {
    /// The entities on this page, in server order.
    pub items: Vec<T>,

    /// Total number of entities matching the query.
    pub total_count: u64,

    /// Index of the first item of this page.
    pub offset: u64,

    /// Requested page size (0 when the server did not echo it).
    pub limit: u64,
}

impl<T> PagedResult<T> {
    /// Builds a page, applying the `total_count` backfill rule.
    pub fn new(items: Vec<T>, total_count: u64, offset: u64, limit: u64) -> Self {
        let total_count = backfill_total(total_count, items.len());
        Self {
            items,
            total_count,
            offset,
            limit,
        }
    }

    /// Returns `true` if more items exist after this page.
    ///
    /// # Examples
    ///
    /// ```
    /// use redmine_client::PagedResult;
    ///
    /// let page = PagedResult::new(vec![1, 2], 5, 0, 2);
    /// assert!(page.has_more());
    ///
    /// let last = PagedResult::new(vec![5], 5, 4, 2);
    /// assert!(!last.has_more());
    /// ```
    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as u64) < self.total_count
    }

    /// Maps every item while keeping the envelope.
    pub fn map<U, F>(self, f: F) -> PagedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

impl<T> IntoIterator for PagedResult<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Older servers omit `total_count`; trust the items we actually parsed.
pub(crate) fn backfill_total(total_count: u64, parsed: usize) -> u64 {
    if total_count == 0 {
        parsed as u64
    } else {
        total_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total_is_backfilled() {
        let page = PagedResult::new(vec!["a", "b", "c"], 0, 0, 25);
        assert_eq!(page.total_count, 3);
    }

    #[test]
    fn test_reported_total_is_kept() {
        let page = PagedResult::new(vec!["a"], 40, 10, 1);
        assert_eq!(page.total_count, 40);
        assert!(page.has_more());
    }
}
