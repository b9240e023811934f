use std::time::{Duration, Instant};

use tracing::debug;

use crate::{
    api::{ApiError, ListRequest},
    domain::{FilterPatch, ListPage, ListQuery, PageSize, SortField},
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// A list fetch to perform. `seq` identifies the query snapshot it was issued
/// for; only the completion carrying the latest `seq` is ever applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: ListQuery,
}

impl FetchTicket {
    pub fn request(&self) -> ListRequest {
        ListRequest::from(&self.query)
    }
}

/// Owner of the grid's filter, sort and paging state.
///
/// Every mutation bumps the sequence counter, so completions of fetches
/// issued for an earlier snapshot fall through `complete` without effect.
#[derive(Debug, Clone)]
pub struct ListQueryController {
    query: ListQuery,
    latest: u64,
    in_flight: Option<u64>,
    text_due: Option<Instant>,
    debounce: Duration,
    result: Option<ListPage>,
    fresh: bool,
    error: Option<String>,
}

impl ListQueryController {
    pub fn new(hide_disabled: bool) -> Self {
        Self {
            query: ListQuery::initial(hide_disabled),
            latest: 0,
            in_flight: None,
            text_due: None,
            debounce: DEFAULT_DEBOUNCE,
            result: None,
            fresh: false,
            error: None,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Last successfully applied page. May belong to an earlier query while a
    /// newer fetch is outstanding.
    pub fn current_result(&self) -> Option<&ListPage> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight == Some(self.latest)
    }

    pub fn has_pending_filter(&self) -> bool {
        self.text_due.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.text_due
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest
    }

    /// Applies a filter change. Enabled-filter changes fetch at once (taking
    /// any pending text with them); text-only changes wait for the debounce
    /// window and are picked up by [`tick`](Self::tick).
    pub fn set_filter(&mut self, patch: FilterPatch, now: Instant) -> Option<FetchTicket> {
        let mut enabled_changed = false;
        let mut text_changed = false;
        if let Some(enabled) = patch.enabled
            && enabled != self.query.enabled
        {
            self.query.enabled = enabled;
            enabled_changed = true;
        }
        if let Some(text) = patch.text
            && text != self.query.text
        {
            self.query.text = text;
            text_changed = true;
        }
        if !enabled_changed && !text_changed {
            return None;
        }

        self.query.page = 1;
        self.invalidate();
        if enabled_changed {
            return Some(self.issue());
        }
        self.text_due = Some(now + self.debounce);
        None
    }

    /// Fires the debounced text fetch once its window has elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<FetchTicket> {
        match self.text_due {
            Some(due) if now >= due => Some(self.issue()),
            _ => None,
        }
    }

    /// Same field flips direction; another field starts ascending.
    pub fn set_sort(&mut self, field: SortField) -> FetchTicket {
        if self.query.sort.field == field {
            self.query.sort.dir = self.query.sort.dir.toggled();
        } else {
            self.query.sort.field = field;
            self.query.sort.dir = Default::default();
        }
        self.invalidate();
        self.issue()
    }

    pub fn set_page(&mut self, page: u32) -> Option<FetchTicket> {
        if page == 0 || page == self.query.page {
            return None;
        }
        self.query.page = page;
        self.invalidate();
        Some(self.issue())
    }

    pub fn set_page_size(&mut self, page_size: PageSize) -> Option<FetchTicket> {
        if page_size == self.query.page_size {
            return None;
        }
        self.query.page_size = page_size;
        self.query.page = 1;
        self.invalidate();
        Some(self.issue())
    }

    /// Re-runs the active query unchanged, bypassing the cache.
    pub fn refresh(&mut self) -> FetchTicket {
        self.fresh = false;
        self.issue()
    }

    /// Fetches only when the cached page does not belong to the active query.
    pub fn ensure_loaded(&mut self) -> Option<FetchTicket> {
        if self.fresh || self.text_due.is_some() || self.is_loading() {
            return None;
        }
        Some(self.issue())
    }

    /// Applies a fetch completion. Returns `false` when the completion
    /// belongs to a superseded snapshot and was dropped.
    pub fn complete(&mut self, seq: u64, result: Result<ListPage, ApiError>) -> bool {
        if seq != self.latest {
            debug!(seq, latest = self.latest, "dropping stale list response");
            return false;
        }
        self.in_flight = None;
        match result {
            Ok(page) => {
                debug!(seq, rows = page.data.len(), total = page.total, "list applied");
                self.result = Some(page);
                self.fresh = true;
                self.error = None;
            }
            Err(error) => {
                debug!(seq, %error, "list fetch failed");
                self.error = Some(error.to_string());
            }
        }
        true
    }

    fn invalidate(&mut self) {
        self.latest += 1;
        self.fresh = false;
    }

    fn issue(&mut self) -> FetchTicket {
        self.latest += 1;
        self.in_flight = Some(self.latest);
        self.text_due = None;
        debug!(seq = self.latest, query = ?self.query, "list fetch issued");
        FetchTicket {
            seq: self.latest,
            query: self.query.clone(),
        }
    }
}
