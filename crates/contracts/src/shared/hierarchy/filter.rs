use super::HierarchyRecord;

/// Pre-build filter applied to the flat input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyFilter {
    /// Case-insensitive substring over name and code; blank means no filtering
    pub search_term: Option<String>,
    /// When false, records with `activo == false` are excluded
    pub show_inactive: bool,
}

impl Default for HierarchyFilter {
    fn default() -> Self {
        Self {
            search_term: None,
            show_inactive: true,
        }
    }
}

impl HierarchyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn with_show_inactive(mut self, show_inactive: bool) -> Self {
        self.show_inactive = show_inactive;
        self
    }

    pub(crate) fn needle(&self) -> Option<String> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn accepts<T: HierarchyRecord>(&self, record: &T) -> bool {
        self.accepts_with(record, self.needle().as_deref())
    }

    pub(crate) fn accepts_with<T: HierarchyRecord>(&self, record: &T, needle: Option<&str>) -> bool {
        if !self.show_inactive && !record.is_active() {
            return false;
        }
        match needle {
            Some(needle) => record.matches_search(needle),
            None => true,
        }
    }
}
