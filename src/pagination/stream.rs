//! Lazy paginated fetch loop
//!
//! A `PageStream` issues its first request on the first poll and one more
//! request per poll until the server reports no further items. Dropping the
//! stream stops the fetch.

use super::strategies::StartLimitPaginator;
use super::types::{NextPage, PageBody, PaginationState, Paginator};
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::types::{Record, StringMap};
use futures::stream::{self, Stream};
use std::pin::Pin;
use tracing::debug;

/// Lazy, finite, non-restartable stream of record batches
///
/// Each item is the non-empty `data` array of one page. An `Err` item is
/// always the last one.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<Vec<Record>>> + Send>>;

/// Everything one fetch loop owns between polls
struct PageFetcher {
    client: HttpClient,
    url: String,
    headers: StringMap,
    params: StringMap,
    paginator: StartLimitPaginator,
    state: PaginationState,
}

impl PageFetcher {
    /// Fetch one page, returning its records and what comes next
    async fn fetch_page(&mut self) -> Result<(Vec<Record>, NextPage)> {
        let mut request = RequestConfig::new();
        request.headers.clone_from(&self.headers);
        request.query.clone_from(&self.params);
        request.query.extend(self.paginator.request_params(&self.state));

        let start = self.state.start;
        let body: PageBody = self.client.get_json_with_config(&self.url, request).await?;
        let pagination = body.pagination();
        let records = body.into_records();

        let next = self
            .paginator
            .process_response(&pagination, &mut self.state)?;

        debug!(
            "Page {} of {} (start={start}): {} records, next: {next:?}",
            self.state.pages_fetched,
            self.url,
            records.len()
        );

        Ok((records, next))
    }
}

/// Walk every page of `url`, yielding each non-empty `data` batch in order
///
/// `start` and `limit` are set by the paginator and take precedence over any
/// values already in `params`. Empty pages are skipped without ending the
/// stream; the only terminal condition is a missing or false
/// `more_items_in_collection`. Any HTTP or parse error is yielded once and
/// ends the stream.
pub fn paginated_get(
    client: HttpClient,
    url: impl Into<String>,
    headers: StringMap,
    params: StringMap,
    paginator: StartLimitPaginator,
) -> PageStream {
    let fetcher = PageFetcher {
        client,
        url: url.into(),
        headers,
        params,
        paginator,
        state: PaginationState::new(),
    };

    Box::pin(stream::try_unfold(Some(fetcher), next_batch))
}

/// Advance the loop to the next non-empty batch
///
/// `None` state means the previous page was the last one.
async fn next_batch(
    fetcher: Option<PageFetcher>,
) -> Result<Option<(Vec<Record>, Option<PageFetcher>)>> {
    let Some(mut fetcher) = fetcher else {
        return Ok(None);
    };

    loop {
        let (records, next) = fetcher.fetch_page().await?;

        if !records.is_empty() {
            let remaining = next.is_continue().then_some(fetcher);
            return Ok(Some((records, remaining)));
        }

        if next.is_done() {
            return Ok(None);
        }
    }
}
