//! User-selected list criteria.
//!
//! A [`FilterState`] is an immutable snapshot: every setter returns a new
//! value and never performs I/O. Changing the search text, the status or the
//! assignment filter always moves back to the first page because the old page
//! number has no meaning under new criteria.

use serde::{Deserialize, Serialize};

use crate::DEFAULT_ITEMS_PER_PAGE;
use crate::domain::types::{OrderStatus, TypeConstraintError};

/// Which orders to show with respect to their assignee.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentFilter {
    #[default]
    All,
    Unassigned,
    AssignedToMe,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FilterState {
    search: String,
    status: Option<OrderStatus>,
    assignment: AssignmentFilter,
    page: usize,
    page_size: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            assignment: AssignmentFilter::All,
            page: 1,
            page_size: DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

impl FilterState {
    /// Creates the initial state for a view showing `page_size` orders per page.
    pub fn new(page_size: usize) -> Result<Self, TypeConstraintError> {
        if page_size == 0 {
            return Err(TypeConstraintError::InvalidValue(
                "page size must be positive".to_string(),
            ));
        }
        Ok(Self {
            page_size,
            ..Self::default()
        })
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn status(&self) -> Option<&OrderStatus> {
        self.status.as_ref()
    }

    pub fn assignment(&self) -> AssignmentFilter {
        self.assignment
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn with_search(&self, text: impl Into<String>) -> Self {
        Self {
            search: text.into(),
            page: 1,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_status(&self, status: Option<OrderStatus>) -> Self {
        Self {
            status,
            page: 1,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_assignment(&self, assignment: AssignmentFilter) -> Self {
        Self {
            assignment,
            page: 1,
            ..self.clone()
        }
    }

    /// Moves to page `page`, clamped into `1..=total_pages`.
    ///
    /// `total_pages` comes from the last known result; zero pages still allows
    /// page 1.
    #[must_use]
    pub fn with_page(&self, page: usize, total_pages: usize) -> Self {
        Self {
            page: page.clamp(1, total_pages.max(1)),
            ..self.clone()
        }
    }
}
