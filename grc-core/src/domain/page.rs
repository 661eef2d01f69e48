// grc-core/src/domain/page.rs

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// Offset/limit pair, already clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub take: u32,
}

impl Window {
    pub fn new(skip: Option<u64>, take: Option<u32>) -> Self {
        Self::bounded(skip, take, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    /// Same as `new` with configured limits.
    pub fn bounded(skip: Option<u64>, take: Option<u32>, default_take: u32, max_take: u32) -> Self {
        let max_take = max_take.max(1);
        Self {
            skip: skip.unwrap_or(0),
            take: take.unwrap_or(default_take).clamp(1, max_take),
        }
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(None, None)
    }
}
