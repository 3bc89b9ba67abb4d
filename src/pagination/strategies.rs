//! Pagination strategy implementations

use super::types::{NextPage, PaginationMeta, PaginationState, Paginator};
use crate::error::{Error, Result};
use crate::types::StringMap;

/// Default page size requested from the API
pub const DEFAULT_PAGE_LIMIT: u32 = 500;

// ============================================================================
// Start/Limit Pagination
// ============================================================================

/// Server-driven offset pagination, as used by every Pipedrive v1 list endpoint
///
/// Each request carries `start` and `limit`. The response says whether more
/// items exist (`more_items_in_collection`) and which `start` to send next
/// (`next_start`). The page size alone never decides termination.
#[derive(Debug, Clone)]
pub struct StartLimitPaginator {
    /// Query parameter name for the offset
    pub start_param: String,
    /// Query parameter name for the page size
    pub limit_param: String,
    /// Number of records per page
    pub limit: u32,
}

impl StartLimitPaginator {
    /// Create a paginator using `start`/`limit` with the given page size
    pub fn new(limit: u32) -> Self {
        Self {
            start_param: "start".to_string(),
            limit_param: "limit".to_string(),
            limit,
        }
    }
}

impl Default for StartLimitPaginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

impl Paginator for StartLimitPaginator {
    fn request_params(&self, state: &PaginationState) -> StringMap {
        let mut params = StringMap::new();
        params.insert(self.start_param.clone(), state.start.to_string());
        params.insert(self.limit_param.clone(), self.limit.to_string());
        params
    }

    fn process_response(
        &self,
        pagination: &PaginationMeta,
        state: &mut PaginationState,
    ) -> Result<NextPage> {
        state.add_page();

        if !pagination.has_more() {
            state.mark_done();
            return Ok(NextPage::Done);
        }

        // Re-requesting the same offset would never terminate
        let start = pagination.next_start.ok_or_else(|| {
            Error::pagination(format!(
                "more_items_in_collection is true but next_start is missing (start={})",
                state.start
            ))
        })?;

        state.start = start;
        Ok(NextPage::Continue { start })
    }
}
