//! Query-string form mirroring the list filter, so a view can be restored
//! from (and written back to) its URL.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::filter::{AssignmentFilter, FilterState};
use crate::domain::types::OrderStatus;
use crate::forms::FormError;

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct FilterForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200, message = "Search text is too long"))]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<AssignmentFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 10000, message = "Page must be between 1 and 10000"))]
    pub page: Option<usize>,
}

impl FilterForm {
    pub fn from_query(query: &str) -> Result<Self, FormError> {
        serde_html_form::from_str(query).map_err(|e| FormError::MalformedQuery(e.to_string()))
    }

    pub fn to_query(&self) -> Result<String, FormError> {
        serde_html_form::to_string(self).map_err(|e| FormError::MalformedQuery(e.to_string()))
    }

    /// Validates the form and builds the filter it describes.
    ///
    /// The page count is unknown until the first response, so only the
    /// form's own bound applies; the backend clamps the rest.
    pub fn into_filter(self, page_size: usize) -> Result<FilterState, FormError> {
        self.validate()?;

        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(OrderStatus::new(raw).map_err(|_| FormError::InvalidStatus)?),
        };

        let filter = FilterState::new(page_size)?
            .with_search(self.search.unwrap_or_default())
            .with_status(status)
            .with_assignment(self.assignment.unwrap_or_default());

        Ok(match self.page {
            Some(page) => filter.with_page(page, usize::MAX),
            None => filter,
        })
    }
}

impl From<&FilterState> for FilterForm {
    fn from(filter: &FilterState) -> Self {
        Self {
            search: Some(filter.search().to_string()).filter(|s| !s.is_empty()),
            status: filter.status().map(|s| s.as_str().to_string()),
            assignment: Some(filter.assignment()).filter(|a| *a != AssignmentFilter::All),
            page: Some(filter.page()).filter(|p| *p > 1),
        }
    }
}
