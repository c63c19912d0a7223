//! Catalog search with genre post-filtering and an incremental controller.
//!
//! `search_page` serves one page. `SearchController` runs in its own task and
//! keeps the accumulated result list for a live search box: filter changes are
//! debounced and replace the list, `load_more` appends the next page.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Duration, Instant};

use crate::{
    error::AppResult,
    models::{MediaItem, SearchFilters, SearchPage},
    services::catalog::Catalog,
};

pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Fetches one page for `filters`.
///
/// Blank queries return an empty page without calling the catalog. When genres
/// are selected only items sharing at least one of them are kept.
pub async fn search_page(
    catalog: &dyn Catalog,
    filters: &SearchFilters,
    page: u32,
) -> AppResult<SearchPage> {
    if filters.is_empty_query() {
        return Ok(SearchPage::empty());
    }

    let response = catalog
        .search_multi(
            filters.query.trim().to_string(),
            page,
            filters.year.clone(),
            filters.region.clone(),
        )
        .await?;

    let results = if filters.genres.is_empty() {
        response.results
    } else {
        response
            .results
            .into_iter()
            .filter(|item| item.matches_any_genre(&filters.genres))
            .collect()
    };

    Ok(SearchPage {
        page: response.page,
        results,
        total_pages: response.total_pages,
        total_results: response.total_results,
        has_more: response.page < response.total_pages,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Loading,
    Loaded,
}

/// Snapshot published after every transition
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub filters: SearchFilters,
    pub status: SearchStatus,
    pub results: Vec<MediaItem>,
    pub page: u32,
    pub total_pages: u32,
    pub has_more: bool,
    pub error: Option<String>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            filters: SearchFilters::default(),
            status: SearchStatus::Idle,
            results: Vec::new(),
            page: 0,
            total_pages: 0,
            has_more: false,
            error: None,
        }
    }
}

enum Command {
    SetFilters(SearchFilters),
    LoadMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Reset,
    Append,
}

struct FetchDone {
    kind: FetchKind,
    generation: u64,
    result: AppResult<SearchPage>,
}

/// Handle to a running search task. Dropping it stops the task.
pub struct SearchController {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SearchState>,
}

impl SearchController {
    pub fn spawn(catalog: Arc<dyn Catalog>) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(SearchState::default());

        tokio::spawn(async move {
            Self::run(catalog, command_rx, state_tx).await;
        });

        Self { commands, state }
    }

    /// Replaces the filter set once it has been stable for [`DEBOUNCE`]
    pub fn set_filters(&self, filters: SearchFilters) {
        let _ = self.commands.send(Command::SetFilters(filters));
    }

    /// Requests the next page; ignored while loading or when nothing is left
    pub fn load_more(&self) {
        let _ = self.commands.send(Command::LoadMore);
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    async fn run(
        catalog: Arc<dyn Catalog>,
        mut command_rx: mpsc::UnboundedReceiver<Command>,
        state_tx: watch::Sender<SearchState>,
    ) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<FetchDone>();
        let mut state = SearchState::default();
        let mut pending: Option<SearchFilters> = None;
        let mut deadline: Option<Instant> = None;
        let mut generation = 0u64;
        let mut loading = false;
        let mut reset_queued = false;

        let fetch = |filters: SearchFilters, page: u32, kind: FetchKind, generation: u64| {
            let catalog = catalog.clone();
            let done_tx = done_tx.clone();
            tokio::spawn(async move {
                let result = search_page(catalog.as_ref(), &filters, page).await;
                let _ = done_tx.send(FetchDone {
                    kind,
                    generation,
                    result,
                });
            });
        };

        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    None => break,
                    Some(Command::SetFilters(filters)) => {
                        pending = Some(filters);
                        deadline = Some(Instant::now() + DEBOUNCE);
                    }
                    Some(Command::LoadMore) => {
                        if loading || !state.has_more {
                            tracing::debug!(loading, has_more = state.has_more, "Ignoring load more");
                            continue;
                        }
                        loading = true;
                        state.status = SearchStatus::Loading;
                        fetch(state.filters.clone(), state.page + 1, FetchKind::Append, generation);
                        state_tx.send_replace(state.clone());
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    let Some(filters) = pending.take() else { continue };
                    generation += 1;
                    state.filters = filters;

                    if state.filters.is_empty_query() {
                        reset_queued = false;
                        state = SearchState {
                            filters: state.filters.clone(),
                            ..SearchState::default()
                        };
                    } else if loading {
                        reset_queued = true;
                    } else {
                        loading = true;
                        state.status = SearchStatus::Loading;
                        state.error = None;
                        fetch(state.filters.clone(), 1, FetchKind::Reset, generation);
                    }
                    state_tx.send_replace(state.clone());
                },
                Some(done) = done_rx.recv() => {
                    loading = false;

                    if done.generation == generation {
                        match done.result {
                            Ok(page) => {
                                match done.kind {
                                    FetchKind::Reset => state.results = page.results,
                                    FetchKind::Append => state.results.extend(page.results),
                                }
                                state.page = page.page;
                                state.total_pages = page.total_pages;
                                state.has_more = page.has_more;
                                state.error = None;
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, query = %state.filters.query, "Search request failed");
                                state.error = Some(e.to_string());
                                // Shown results belong to the previous filters
                                if done.kind == FetchKind::Reset {
                                    state.page = 0;
                                    state.total_pages = 0;
                                    state.has_more = false;
                                }
                            }
                        }
                        state.status = SearchStatus::Loaded;
                    } else {
                        tracing::debug!(stale = done.generation, current = generation, "Discarding stale search page");
                    }

                    if reset_queued {
                        reset_queued = false;
                        loading = true;
                        state.status = SearchStatus::Loading;
                        state.error = None;
                        fetch(state.filters.clone(), 1, FetchKind::Reset, generation);
                    }
                    state_tx.send_replace(state.clone());
                },
            }
        }

        tracing::debug!("Search controller stopped");
    }
}
