//! Fetch strategies and the messages that carry their results.
//!
//! Every page of data enters the table through [`Model::dispatch`]: it
//! records which strategy is in flight, stamps the request with a
//! monotonically increasing token, and returns a command that resolves
//! to a [`FetchResultMsg`]. Responses whose token no longer matches the
//! latest dispatch are dropped, so a slow page-2 response can never
//! overwrite the page-3 data the user has already navigated to.

use super::model::{Mode, Model};
use crate::actions::ActionOutcomeMsg;
use crate::datasource::{DataSourceError, FilterMap, PageEnvelope, PageRequest, QueryParams};
use bubbletea_rs::{Cmd, Msg};
use std::sync::Arc;

/// Which backend operation produced (or will produce) the current page.
///
/// The table replays the active strategy when the user pages, refreshes,
/// or when an action completes, so pagination never silently drops an
/// applied filter or search term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Plain listing with no constraints.
    #[default]
    List,
    /// Listing constrained by filter selections.
    Filtered(FilterMap),
    /// Server-side search, optionally scoped to one column.
    Search {
        /// The search term.
        term: String,
        /// Column to search in, when the backend supports scoping.
        column: Option<String>,
    },
}

impl FetchStrategy {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            FetchStrategy::List => "list",
            FetchStrategy::Filtered(_) => "filter",
            FetchStrategy::Search { .. } => "search",
        }
    }
}

/// Result of a dispatched fetch, tagged with its request token.
///
/// The fields are public so embedding applications (and tests) can
/// construct these directly when driving the table without a runtime.
#[derive(Debug)]
pub struct FetchResultMsg {
    /// Token of the dispatch that produced this result.
    pub token: u64,
    /// The fetched page, or the error that replaced it.
    pub result: Result<PageEnvelope, DataSourceError>,
}

/// Instructs the table to re-run its last fetch when `key` differs from
/// the last one seen. Embedding applications bump the key after external
/// mutations; delivering the same key twice is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshMsg {
    /// The new refresh generation.
    pub key: u64,
}

/// Reports completion of a dropdown option load for one cache entity.
#[derive(Debug)]
pub struct OptionsLoadedMsg {
    /// Cache entity the load was for.
    pub entity: String,
    /// Whether the load succeeded.
    pub result: Result<(), DataSourceError>,
}

impl Model {
    /// Fetches `page` with the plain list strategy.
    pub fn load(&mut self, page: usize) -> Cmd {
        self.dispatch(FetchStrategy::List, page)
    }

    /// Re-fetches page 1 with the current filter selections.
    ///
    /// An empty selection falls back to the plain list strategy, so
    /// clearing the last filter behaves exactly like never filtering.
    pub fn apply_filters(&mut self) -> Cmd {
        self.apply_filter_map(self.filter_map())
    }

    /// Re-fetches page 1 constrained by an explicit filter map.
    pub fn apply_filter_map(&mut self, filters: FilterMap) -> Cmd {
        if filters.is_empty() {
            self.dispatch(FetchStrategy::List, 1)
        } else {
            self.dispatch(FetchStrategy::Filtered(filters), 1)
        }
    }

    /// Searches for `term` from page 1, scoped to the configured search
    /// column when one is set. A blank term reverts to the plain list.
    pub fn search(&mut self, term: &str) -> Cmd {
        let term = term.trim();
        if term.is_empty() {
            return self.dispatch(FetchStrategy::List, 1);
        }
        let strategy = FetchStrategy::Search {
            term: term.to_string(),
            column: self.search_column.clone(),
        };
        self.dispatch(strategy, 1)
    }

    /// Fetches `page` with whatever strategy is currently active.
    pub fn goto_page(&mut self, page: usize) -> Cmd {
        let strategy = self.last_strategy.clone();
        self.dispatch(strategy, page)
    }

    /// Re-runs the active strategy on the current page.
    ///
    /// Internal refreshes (the refresh key binding, post-action re-fetch)
    /// leave the external refresh generation untouched, so an embedder's
    /// next [`RefreshMsg`] bump still lands.
    pub fn refresh(&mut self) -> Cmd {
        self.goto_page(self.paginator.current_page)
    }

    /// Handles an externally bumped refresh generation. Returns the
    /// re-fetch command when `key` is new, `None` when it was already
    /// seen.
    pub fn set_refresh_key(&mut self, key: u64) -> Option<Cmd> {
        if key == self.refresh_key {
            return None;
        }
        self.refresh_key = key;
        Some(self.goto_page(self.paginator.current_page))
    }

    /// The query parameters the active strategy would send, without page
    /// or page size. Exports reuse these so a download matches what is
    /// on screen.
    pub fn current_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        match &self.last_strategy {
            FetchStrategy::List => {}
            FetchStrategy::Filtered(filters) => params.extend_filters(filters),
            FetchStrategy::Search { term, column } => {
                params.insert("search", term);
                if let Some(column) = column {
                    params.insert("search_column", column);
                }
            }
        }
        params
    }

    /// Starts a fetch: marks the table loading, advances the request
    /// token, and records `strategy` as the one to replay.
    pub(super) fn dispatch(&mut self, strategy: FetchStrategy, page: usize) -> Cmd {
        self.loading = true;
        self.fetch_seq += 1;
        let token = self.fetch_seq;
        self.last_strategy = strategy.clone();
        tracing::debug!(token, page, strategy = strategy.name(), "dispatching fetch");

        let source = Arc::clone(&self.source);
        let req = PageRequest::new(page, self.per_page);
        Box::pin(async move {
            let result = match strategy {
                FetchStrategy::List => source.list(&req).await,
                FetchStrategy::Filtered(filters) => source.filter_by(&filters, &req).await,
                FetchStrategy::Search { term, column } => {
                    source.search(&term, column.as_deref(), &req).await
                }
            };
            Some(Box::new(FetchResultMsg { token, result }) as Msg)
        })
    }

    /// Applies a fetch result, or drops it when a newer dispatch exists.
    ///
    /// On success the page contents, pagination metadata, and footer
    /// counts all come from the envelope; the table trusts the backend
    /// over its own bookkeeping. On failure the table resets to an empty
    /// page 1 and surfaces the error as a transient notice. Either way
    /// the selection and cursor reset with the new contents.
    pub(super) fn handle_fetch_result(&mut self, msg: &FetchResultMsg) -> Option<Cmd> {
        if msg.token != self.fetch_seq {
            tracing::warn!(
                token = msg.token,
                current = self.fetch_seq,
                "discarding stale fetch result"
            );
            return None;
        }
        self.loading = false;
        self.selected.clear();
        self.cursor = 0;

        match &msg.result {
            Ok(envelope) => {
                self.rows = envelope.rows.clone();
                let page_size = envelope.per_page.max(1);
                if self.rows.len() > page_size {
                    tracing::warn!(
                        rows = self.rows.len(),
                        per_page = page_size,
                        "truncating overfull page"
                    );
                    self.rows.truncate(page_size);
                }
                self.page_size = page_size;
                self.total_records = envelope.total_records;
                self.paginator.set_per_page(page_size);
                self.paginator.set_meta(envelope.current_page, envelope.total_pages);
            }
            Err(err) => {
                self.rows.clear();
                self.page_size = self.per_page;
                self.total_records = 0;
                self.paginator.set_per_page(self.per_page);
                self.paginator.set_meta(1, 1);
                self.notices.error(err.to_string());
            }
        }
        // Keep the loading spinner's tick chain alive across fetches.
        Some(self.spinner.tick())
    }

    /// Applies an action outcome: show its notice and, when the action
    /// mutated backend state, issue exactly one re-fetch.
    pub(super) fn handle_action_outcome(&mut self, outcome: &ActionOutcomeMsg) -> Option<Cmd> {
        self.notices.notify(outcome.severity, outcome.message.clone());
        if outcome.refresh {
            Some(self.refresh())
        } else {
            None
        }
    }

    /// Copies freshly loaded cache options into every filter descriptor
    /// that sources from `entity`.
    pub(super) fn handle_options_loaded(&mut self, msg: &OptionsLoadedMsg) -> Option<Cmd> {
        match &msg.result {
            Ok(()) => {
                let options = self
                    .option_cache
                    .as_ref()
                    .and_then(|cache| cache.get(&msg.entity));
                if let Some(options) = options {
                    for column in &mut self.columns {
                        if let Some(filter) = column.filter.as_mut() {
                            if filter.options_from.as_deref() == Some(msg.entity.as_str()) {
                                filter.options = options.as_ref().clone();
                            }
                        }
                    }
                }
            }
            Err(err) => self.notices.error(err.to_string()),
        }
        None
    }

    /// Returns a command that loads options for the focused filter's
    /// cache entity, or `None` when nothing needs loading.
    pub(super) fn ensure_options_cmd(&self) -> Option<Cmd> {
        if self.mode != Mode::Filter {
            return None;
        }
        let descriptor = self.focused_filter()?;
        if !descriptor.options.is_empty() {
            return None;
        }
        let entity = descriptor.options_from.clone()?;
        let cache = self.option_cache.clone()?;
        Some(Box::pin(async move {
            let result = cache.ensure_loaded(&entity).await.map(|_| ());
            Some(Box::new(OptionsLoadedMsg { entity, result }) as Msg)
        }))
    }
}
