//! Paginated users view.

use std::sync::Arc;

use postr_client::RemoteCollectionClient;
use postr_core::{Error, Page, Pager, QueryEntry, QueryKey, QueryOptions, Subscription, User};

use super::{FetchFuture, RenderState};
use crate::app::App;
use crate::keys;
use crate::location::{Location, NavState};

fn fetch_page(
    remote: Arc<dyn RemoteCollectionClient>, page: u32, page_size: u32,
) -> impl FnOnce() -> FetchFuture<Page<User>> {
    move || -> FetchFuture<Page<User>> { Box::pin(async move { remote.list_users(page, page_size).await }) }
}

fn fetch_count(remote: Arc<dyn RemoteCollectionClient>) -> impl FnOnce() -> FetchFuture<u64> {
    move || -> FetchFuture<u64> { Box::pin(async move { remote.count_users().await }) }
}

/// Users list with the page cursor held in the location's `page` parameter.
///
/// While a page loads, the last page shown stays on screen as a placeholder.
pub struct UsersView {
    app: App,
    page: u32,
    previous: Option<Arc<Page<User>>>,
    subscription: Subscription,
}

impl UsersView {
    pub fn new(app: &App) -> Self {
        let page = app.navigator.current().page();
        Self { app: app.clone(), page, previous: None, subscription: app.cache.subscribe() }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn key(&self) -> QueryKey {
        keys::users_page(self.page)
    }

    /// Query the current page and derive what to show.
    pub fn load(&mut self) -> RenderState<Page<User>> {
        let fetcher = fetch_page(Arc::clone(&self.app.remote), self.page, self.app.page_size);
        let entry = self.app.cache.query(&self.key(), fetcher, QueryOptions::default());
        self.derive(&entry)
    }

    /// Like `load`, but wait for the fetch to finish.
    pub async fn settle(&mut self) -> RenderState<Page<User>> {
        let fetcher = fetch_page(Arc::clone(&self.app.remote), self.page, self.app.page_size);
        let entry = self.app.cache.query_settled(&self.key(), fetcher, QueryOptions::default()).await;
        self.derive(&entry)
    }

    /// Current state without starting a fetch.
    pub fn render(&mut self) -> RenderState<Page<User>> {
        let entry = self.app.cache.entry(&self.key());
        self.derive(&entry)
    }

    fn derive(&mut self, entry: &QueryEntry<Page<User>>) -> RenderState<Page<User>> {
        if let Some(data) = &entry.data {
            self.previous = Some(Arc::clone(data));
        }
        RenderState::from_entry(entry, self.previous.clone())
    }

    fn known_total(&self) -> Option<u32> {
        self.app
            .cache
            .get_snapshot::<Page<User>>(&self.key())
            .or_else(|| self.previous.clone())
            .map(|page| page.total_pages)
    }

    /// Pager over the known total. Until a page has loaded the total is the
    /// current page.
    pub fn pager(&self) -> Pager {
        Pager::new(self.page, self.known_total().unwrap_or(self.page))
    }

    /// Move to page `n`, clamped to the known range.
    ///
    /// Before any page has loaded only the lower bound applies. The
    /// location's `page` parameter is replaced, not pushed.
    pub fn set_page(&mut self, n: u32) -> RenderState<Page<User>> {
        let page = match self.known_total() {
            Some(_) => self.pager().clamp(n),
            None => n.max(1),
        };
        if page != self.page {
            tracing::debug!("users page {} -> {}", self.page, page);
            self.page = page;
            let location = self.app.navigator.current().with_page(page);
            self.app.navigator.replace(location);
        }
        self.load()
    }

    pub fn prev(&mut self) -> RenderState<Page<User>> {
        let page = self.pager().prev();
        self.set_page(page)
    }

    pub fn next(&mut self) -> RenderState<Page<User>> {
        let page = match self.known_total() {
            Some(_) => self.pager().next(),
            None => self.page.saturating_add(1),
        };
        self.set_page(page)
    }

    /// Navigate to a user's posts, remembering the current page.
    pub fn open_user(&self, user_id: &str) {
        self.app
            .navigator
            .push(Location::user_posts(user_id, NavState { page: Some(self.page) }));
    }

    /// Wait for the current page to change, then re-derive.
    ///
    /// An invalidated page is re-queried so it refetches.
    pub async fn next_change(&mut self) -> Result<RenderState<Page<User>>, Error> {
        let key = self.key();
        self.subscription.wait_for(&key).await?;
        let entry = self.app.cache.entry::<Page<User>>(&key);
        if entry.is_invalidated && !entry.is_fetching {
            return Ok(self.load());
        }
        Ok(self.derive(&entry))
    }

    /// Total number of users, fetched alongside the list.
    pub fn load_count(&self) -> RenderState<u64> {
        let entry = self
            .app
            .cache
            .query(&keys::users_count(), fetch_count(Arc::clone(&self.app.remote)), QueryOptions::default());
        RenderState::from_entry(&entry, None)
    }

    pub async fn settle_count(&self) -> RenderState<u64> {
        let entry = self
            .app
            .cache
            .query_settled(&keys::users_count(), fetch_count(Arc::clone(&self.app.remote)), QueryOptions::default())
            .await;
        RenderState::from_entry(&entry, None)
    }
}
