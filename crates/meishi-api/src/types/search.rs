//! Search request shaping.

use serde::{Deserialize, Serialize};

/// Sort order for card listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Reverse-chronological by creation time.
    #[default]
    Newest,
    /// Grouped by company name.
    Company,
}

impl SortBy {
    /// Wire name of the sort mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::Company => "company",
        }
    }
}

/// Filters for the `search` operation. Empty members are omitted from
/// the outgoing query entirely rather than sent as empty filters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchParams {
    /// Free-text match across name, company, title, email and notes.
    pub q: String,
    /// Company substring filter.
    pub company: String,
    /// Single tag filter.
    pub tag: String,
    /// Inclusive lower bound on creation date, `YYYY-MM-DD`.
    pub from: String,
    /// Inclusive upper bound on creation date, `YYYY-MM-DD`.
    pub to: String,
    pub sort: SortBy,
}

impl SearchParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query pairs for the outgoing request. Empty filters are skipped;
    /// `sort` is always present.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        let filters = [
            ("q", &self.q),
            ("company", &self.company),
            ("tag", &self.tag),
            ("from", &self.from),
            ("to", &self.to),
        ];
        for (key, value) in filters {
            if !value.is_empty() {
                query.push((key, value.clone()));
            }
        }
        query.push(("sort", self.sort.as_str().to_string()));
        query
    }

    #[must_use]
    pub fn with_q(mut self, q: impl Into<String>) -> Self {
        self.q = q.into();
        self
    }

    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    #[must_use]
    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = to.into();
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortBy) -> Self {
        self.sort = sort;
        self
    }
}
