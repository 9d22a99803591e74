//! Order list orchestration.
//!
//! [`OrderQueryController`] owns one view's filter and result page. Every
//! filter change mints a [`SequenceToken`] synchronously, in call order, and
//! spawns the backend call; a response is committed only while its token is
//! still current, so the visible page always belongs to the most recently
//! issued query. Search input goes through a [`Debouncer`] first.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::filter::{AssignmentFilter, FilterState};
use crate::domain::order::OrderPage;
use crate::domain::types::{BatchId, OrderId, OrderStatus, UserId};
use crate::dto::orders::QuerySnapshot;
use crate::pagination::page_window;
use crate::repository::errors::BackendResult;
use crate::repository::{OrderReader, OrderWriter, QueryOverrides, QueryRequest};
use crate::runtime::debounce::Debouncer;
use crate::runtime::sequence::{RequestSequencer, SequenceToken};
use crate::services::errors::{ErrorNormalizer, ReportOptions};
use crate::services::{ServiceError, ServiceResult};
use crate::{DEFAULT_ITEMS_PER_PAGE, SEARCH_DEBOUNCE};

/// Which slice of the order list a view shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewScope {
    /// Every order visible to the acting user.
    #[default]
    Orders,
    /// Orders assigned to the acting user.
    MyOrders,
    /// Orders of one batch; needs a batch id before it can query.
    Batch,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderView {
    pub scope: ViewScope,
    pub overrides: QueryOverrides,
}

impl OrderView {
    pub fn new(scope: ViewScope) -> Self {
        Self {
            scope,
            overrides: QueryOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: QueryOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Returns the acting user and the fixed criteria of this view, or the
    /// name of the missing piece of context.
    fn context(
        &self,
        acting_user: Option<UserId>,
        batch: Option<BatchId>,
    ) -> Result<(UserId, QueryOverrides), &'static str> {
        let user = acting_user.ok_or("acting user")?;
        let mut overrides = self.overrides.clone();
        match self.scope {
            ViewScope::Orders => {}
            ViewScope::MyOrders => overrides.assigned_to = Some(user),
            ViewScope::Batch => {
                overrides.batch_id = Some(batch.or(self.overrides.batch_id).ok_or("batch")?);
            }
        }
        Ok((user, overrides))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryPhase {
    /// No query has been issued yet.
    #[default]
    Idle,
    Loading,
    Ready,
    Errored,
}

/// First half of a fetch: the token and request minted by
/// [`OrderQueryController::begin_fetch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingFetch {
    pub token: SequenceToken,
    pub request: QueryRequest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControllerSettings {
    pub page_size: usize,
    pub search_debounce: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_ITEMS_PER_PAGE,
            search_debounce: SEARCH_DEBOUNCE,
        }
    }
}

struct ControllerState {
    filter: FilterState,
    acting_user: Option<UserId>,
    batch: Option<BatchId>,
    sequencer: RequestSequencer,
    page: OrderPage,
    phase: QueryPhase,
    is_initial_loading: bool,
    error: Option<String>,
}

struct Inner<R> {
    repo: Arc<R>,
    view: OrderView,
    errors: ErrorNormalizer,
    state: Mutex<ControllerState>,
    search: Mutex<Debouncer<String>>,
    commits: watch::Sender<u64>,
}

impl<R> Inner<R> {
    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn search(&self) -> MutexGuard<'_, Debouncer<String>> {
        self.search
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cheaply cloneable handle to one order list view.
pub struct OrderQueryController<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for OrderQueryController<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> OrderQueryController<R>
where
    R: OrderReader + OrderWriter + 'static,
{
    pub fn new(
        repo: Arc<R>,
        view: OrderView,
        page_size: usize,
        errors: ErrorNormalizer,
    ) -> ServiceResult<Self> {
        let settings = ControllerSettings {
            page_size,
            ..ControllerSettings::default()
        };
        Self::with_settings(repo, view, errors, settings)
    }

    pub fn with_settings(
        repo: Arc<R>,
        view: OrderView,
        errors: ErrorNormalizer,
        settings: ControllerSettings,
    ) -> ServiceResult<Self> {
        let filter = FilterState::new(settings.page_size)?;

        let inner = Arc::new_cyclic(|weak: &Weak<Inner<R>>| {
            let weak = weak.clone();
            let search = Debouncer::new(settings.search_debounce, move |text: String| {
                if let Some(inner) = weak.upgrade() {
                    OrderQueryController { inner }.commit_search(text);
                }
            });

            Inner {
                repo,
                view,
                errors,
                state: Mutex::new(ControllerState {
                    page: OrderPage::empty(filter.page_size()),
                    filter,
                    acting_user: None,
                    batch: None,
                    sequencer: RequestSequencer::new(),
                    phase: QueryPhase::Idle,
                    is_initial_loading: true,
                    error: None,
                }),
                search: Mutex::new(search),
                commits: watch::channel(0).0,
            }
        });

        Ok(Self { inner })
    }

    /// Updates the acting user and queries again if the view became ready.
    pub fn set_acting_user(&self, user: Option<UserId>) -> Option<JoinHandle<bool>> {
        self.inner.state().acting_user = user;
        self.dispatch()
    }

    /// Updates the selected batch and queries again if the view became ready.
    pub fn set_batch(&self, batch: Option<BatchId>) -> Option<JoinHandle<bool>> {
        self.inner.state().batch = batch;
        self.dispatch()
    }

    /// Derives the request from the current filter, mints its token and
    /// enters `Loading`. Returns `None` without consuming a token when the
    /// view's context is incomplete.
    pub fn begin_fetch(&self, overrides: Option<&QueryOverrides>) -> Option<PendingFetch> {
        let mut state = self.inner.state();

        let (user, base) = match self.inner.view.context(state.acting_user, state.batch) {
            Ok(context) => context,
            Err(missing) => {
                log::debug!("Skipping order query: {missing} is not available yet");
                return None;
            }
        };
        let overrides = match overrides {
            Some(call) => base.merge(call),
            None => base,
        };

        let request = QueryRequest::derive(&state.filter, Some(user), &overrides);
        let token = state.sequencer.begin();
        state.phase = QueryPhase::Loading;
        log::debug!("Issuing order query {token}: {request:?}");

        Some(PendingFetch { token, request })
    }

    /// Commits `result` if `token` is still current. Returns whether it was
    /// committed.
    pub fn complete_fetch(&self, token: SequenceToken, result: BackendResult<OrderPage>) -> bool {
        if !self.commit(token, result) {
            return false;
        }
        self.inner.commits.send_modify(|count| *count += 1);
        true
    }

    fn commit(&self, token: SequenceToken, result: BackendResult<OrderPage>) -> bool {
        let mut state = self.inner.state();
        state.is_initial_loading = false;

        if !state.sequencer.is_current(token) {
            log::debug!("Dropping stale response for order query {token}");
            return false;
        }

        match result {
            Ok(page) => {
                state.page = page;
                state.error = None;
                state.phase = QueryPhase::Ready;
            }
            Err(err) => {
                log::warn!("Order query {token} failed: {err}");
                state.error = Some(self.inner.errors.message_for(&err));
                state.phase = QueryPhase::Errored;
            }
        }
        true
    }

    /// Queries the backend with the current filter merged with `overrides`.
    /// Returns whether the response was committed.
    pub async fn fetch(&self, overrides: Option<&QueryOverrides>) -> bool {
        match self.begin_fetch(overrides) {
            Some(pending) => self.run(pending).await,
            None => false,
        }
    }

    pub async fn refetch(&self) -> bool {
        self.fetch(None).await
    }

    async fn run(&self, pending: PendingFetch) -> bool {
        let PendingFetch { token, request } = pending;
        let result = self.inner.repo.fetch_orders(request).await;
        self.complete_fetch(token, result)
    }

    fn dispatch(&self) -> Option<JoinHandle<bool>> {
        let pending = self.begin_fetch(None)?;
        let controller = self.clone();
        Some(tokio::spawn(async move { controller.run(pending).await }))
    }

    fn update_filter<F>(&self, change: F) -> Option<JoinHandle<bool>>
    where
        F: FnOnce(&ControllerState) -> FilterState,
    {
        {
            let mut state = self.inner.state();
            state.filter = change(&state);
        }
        self.dispatch()
    }

    /// Schedules a search; only the last text of a burst is applied.
    pub fn set_search(&self, text: impl Into<String>) {
        self.inner.search().schedule(text.into());
    }

    fn commit_search(&self, text: String) {
        // The spawned query completes on its own.
        let _ = self.update_filter(|state| state.filter.with_search(text));
    }

    pub fn set_status(&self, status: Option<OrderStatus>) -> Option<JoinHandle<bool>> {
        self.update_filter(|state| state.filter.with_status(status))
    }

    pub fn set_assignment_filter(&self, assignment: AssignmentFilter) -> Option<JoinHandle<bool>> {
        self.update_filter(|state| state.filter.with_assignment(assignment))
    }

    /// Moves to `page`, clamped to the page count of the last accepted result.
    pub fn set_page(&self, page: usize) -> Option<JoinHandle<bool>> {
        self.update_filter(|state| state.filter.with_page(page, state.page.total_pages))
    }

    /// Replaces the whole filter, e.g. when restoring a view from its URL.
    pub fn set_filter(&self, filter: FilterState) -> Option<JoinHandle<bool>> {
        self.update_filter(|_| filter)
    }

    /// Assigns `order_id` to the acting user and reloads the list.
    ///
    /// Failures are stored, notified and returned so the caller can reset
    /// any per-row progress indicator.
    pub async fn assign(&self, order_id: OrderId) -> ServiceResult<()> {
        let user = self
            .acting_user()
            .ok_or(ServiceError::ContextNotReady("acting user"))?;

        match self.inner.repo.assign_order(order_id, user).await {
            Ok(()) => {
                log::info!("Order {order_id} assigned to user {user}");
                self.refetch().await;
                Ok(())
            }
            Err(err) => {
                log::warn!("Failed to assign order {order_id}: {err}");
                let report = self
                    .inner
                    .errors
                    .report(&err, None, ReportOptions::default());
                self.inner.state().error = Some(report.message);
                Err(ServiceError::Backend(err))
            }
        }
    }

    /// Watches the number of committed responses, including those of
    /// debounced searches that no caller awaits.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.commits.subscribe()
    }

    pub fn clear_error(&self) {
        self.inner.state().error = None;
    }

    pub fn snapshot(&self) -> QuerySnapshot {
        let state = self.inner.state();
        QuerySnapshot {
            items: state.page.items.clone(),
            total_count: state.page.total_count,
            current_page: state.page.current_page,
            total_pages: state.page.total_pages,
            pages: page_window(state.page.total_pages, state.page.current_page),
            is_loading: state.phase == QueryPhase::Loading,
            is_initial_loading: state.is_initial_loading,
            error: state.error.clone(),
            phase: state.phase,
            filter: state.filter.clone(),
        }
    }

    pub fn filter(&self) -> FilterState {
        self.inner.state().filter.clone()
    }

    pub fn phase(&self) -> QueryPhase {
        self.inner.state().phase
    }

    pub fn acting_user(&self) -> Option<UserId> {
        self.inner.state().acting_user
    }

    pub fn last_token(&self) -> Option<SequenceToken> {
        self.inner.state().sequencer.current()
    }

    pub fn view(&self) -> &OrderView {
        &self.inner.view
    }

    /// Cancels a pending search; later searches are ignored.
    pub fn dispose(&self) {
        self.inner.search().dispose();
    }
}
