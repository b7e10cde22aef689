use crate::record::Record;

/// A record together with its 1-based position in the full sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageEntry<'a> {
    pub position: usize,
    pub record: &'a Record,
}

/// One display window produced by [`ReviewQueue::paginate`](crate::ReviewQueue::paginate)
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    /// Page actually shown after clamping (1-based)
    pub number: usize,
    /// Always at least 1
    pub total_pages: usize,
    pub entries: Vec<PageEntry<'a>>,
}

impl Page<'_> {
    /// Check if a later page exists
    #[inline]
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    /// Check if an earlier page exists
    #[inline]
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}
