use serde::{Deserialize, Serialize};

/// Limit/offset page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: u64,
    pub offset: u64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u64 = 20;
    pub const MAX_LIMIT: u64 = 100;

    /// Limit is clamped to `1..=MAX_LIMIT`.
    pub fn new(limit: u64, offset: u64) -> Self {
        Self::bounded(Some(limit), Some(offset), Self::DEFAULT_LIMIT, Self::MAX_LIMIT)
    }

    /// Build a request from optional caller input, falling back to
    /// `default_limit` and clamping to `1..=max_limit`.
    pub fn bounded(limit: Option<u64>, offset: Option<u64>, default_limit: u64, max_limit: u64) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
            offset: offset.unwrap_or(0),
        }
    }

    /// Slice an already filtered and ordered sequence.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Page<T> {
        let all: Vec<T> = items.into_iter().collect();
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .collect();
        Page { items, total }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// One page of results plus the full match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
