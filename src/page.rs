//! Pagination and sorting parameters, and the page returned to callers.

use serde::{Deserialize, Serialize};

/// Total reported when the count query fails
pub const COUNT_FALLBACK: u64 = i32::MAX as u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page number
    pub page: u64,
    /// `None` means unpaged
    pub size: Option<u64>,
}

impl PageRequest {
    pub fn of(page: u64, size: u64) -> Self {
        Self {
            page,
            size: Some(size),
        }
    }

    pub fn unpaged() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> u64 {
        self.size.map_or(0, |size| self.page.saturating_mul(size))
    }

    /// Applies the request to an already filtered and sorted sequence
    pub fn slice<T>(&self, rows: impl IntoIterator<Item = T>) -> Vec<T> {
        let rows = rows.into_iter().skip(self.offset() as usize);
        match self.size {
            Some(size) => rows.take(size as usize).collect(),
            None => rows.collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub page_number: u64,
    pub page_size: Option<u64>,
    /// `false` when `total_elements` is [`COUNT_FALLBACK`] rather than a real count
    pub total_exact: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            total_elements,
            page_number: request.page,
            page_size: request.size,
            total_exact: true,
        }
    }

    pub fn total_pages(&self) -> u64 {
        match self.page_size {
            Some(0) => 0,
            Some(size) => self.total_elements.div_ceil(size),
            None => u64::from(self.total_elements > 0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn keyword(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// `field` or `alias.field`
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    /// Parses the compact `"field,direction"` form, e.g. `"age,desc"`.
    /// The direction is optional; anything but `desc` sorts ascending.
    pub fn parse(spec: &str) -> Self {
        let (field, direction) = match spec.split_once(',') {
            Some((field, dir)) if dir.trim().eq_ignore_ascii_case("desc") => {
                (field, Direction::Desc)
            }
            Some((field, _)) => (field, Direction::Asc),
            None => (spec, Direction::Asc),
        };
        Self {
            field: field.trim().to_string(),
            direction,
        }
    }
}
