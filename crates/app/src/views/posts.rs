//! A user's posts, with create and delete.

use std::sync::Arc;

use postr_client::RemoteCollectionClient;
use postr_core::{Change, Error, NewPost, Post, QueryKey, QueryOptions, Subscription, User};

use super::{FetchFuture, RenderState};
use crate::app::App;
use crate::keys;
use crate::location::Location;
use crate::mutations::{CreatePostFlow, DeletePostFlow};

fn fetch_posts(remote: Arc<dyn RemoteCollectionClient>, user_id: String) -> impl FnOnce() -> FetchFuture<Vec<Post>> {
    move || -> FetchFuture<Vec<Post>> { Box::pin(async move { remote.list_posts_by_user(&user_id).await }) }
}

fn fetch_user(remote: Arc<dyn RemoteCollectionClient>, user_id: String) -> impl FnOnce() -> FetchFuture<User> {
    move || -> FetchFuture<User> { Box::pin(async move { remote.get_user(&user_id).await }) }
}

/// "1 Post", "3 Posts", "0 Posts".
pub fn post_count_label(count: usize) -> String {
    if count == 1 { "1 Post".to_string() } else { format!("{count} Posts") }
}

/// Both halves of the posts screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostsRender {
    pub user: RenderState<User>,
    pub posts: RenderState<Vec<Post>>,
}

impl PostsRender {
    pub fn post_count_label(&self) -> Option<String> {
        self.posts.data().map(|posts| post_count_label(posts.len()))
    }
}

pub struct PostsView {
    app: App,
    user_id: String,
    return_page: u32,
    create: CreatePostFlow,
    delete: DeletePostFlow,
    subscription: Subscription,
}

impl PostsView {
    /// Bind to `user_id`; the users page to return to comes from the
    /// current navigation state.
    pub fn new(app: &App, user_id: &str) -> Self {
        let return_page = app.navigator.current().state().page.unwrap_or(1);
        Self {
            app: app.clone(),
            user_id: user_id.to_string(),
            return_page,
            create: app.create_post_flow(),
            delete: app.delete_post_flow(),
            subscription: app.cache.subscribe(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn return_page(&self) -> u32 {
        self.return_page
    }

    pub fn posts_key(&self) -> QueryKey {
        keys::user_posts(&self.user_id)
    }

    pub fn user_key(&self) -> QueryKey {
        keys::user_details(&self.user_id)
    }

    pub fn load(&self) -> PostsRender {
        let remote = &self.app.remote;
        let cache = &self.app.cache;
        let user =
            cache.query(&self.user_key(), fetch_user(Arc::clone(remote), self.user_id.clone()), QueryOptions::default());
        let posts = cache.query(
            &self.posts_key(),
            fetch_posts(Arc::clone(remote), self.user_id.clone()),
            QueryOptions::default(),
        );
        PostsRender { user: RenderState::from_entry(&user, None), posts: RenderState::from_entry(&posts, None) }
    }

    /// Like `load`, but wait for both fetches to finish.
    pub async fn settle(&self) -> PostsRender {
        let remote = &self.app.remote;
        let cache = &self.app.cache;
        let user_key = self.user_key();
        let posts_key = self.posts_key();
        let (user, posts) = tokio::join!(
            cache.query_settled(&user_key, fetch_user(Arc::clone(remote), self.user_id.clone()), QueryOptions::default()),
            cache.query_settled(&posts_key, fetch_posts(Arc::clone(remote), self.user_id.clone()), QueryOptions::default()),
        );
        PostsRender { user: RenderState::from_entry(&user, None), posts: RenderState::from_entry(&posts, None) }
    }

    /// Current state without starting a fetch.
    pub fn render(&self) -> PostsRender {
        let user = self.app.cache.entry(&self.user_key());
        let posts = self.app.cache.entry(&self.posts_key());
        PostsRender { user: RenderState::from_entry(&user, None), posts: RenderState::from_entry(&posts, None) }
    }

    /// Wait for either key to change, then re-derive. Invalidated entries are
    /// re-queried.
    pub async fn next_change(&mut self) -> Result<PostsRender, Error> {
        let user_key = self.user_key();
        let posts_key = self.posts_key();
        loop {
            match self.subscription.next().await? {
                Change::Key(key) if key == user_key || key == posts_key => break,
                Change::Key(_) => continue,
                Change::Lagged => break,
            }
        }

        let user = self.app.cache.entry::<User>(&user_key);
        let posts = self.app.cache.entry::<Vec<Post>>(&posts_key);
        let stale = (user.is_invalidated && !user.is_fetching) || (posts.is_invalidated && !posts.is_fetching);
        if stale {
            return Ok(self.load());
        }
        Ok(PostsRender { user: RenderState::from_entry(&user, None), posts: RenderState::from_entry(&posts, None) })
    }

    /// Return to the users list at the remembered page.
    pub fn back(&self) {
        self.app.navigator.push(Location::users(Some(self.return_page)));
    }

    pub fn create_flow(&self) -> &CreatePostFlow {
        &self.create
    }

    pub fn delete_flow(&self) -> &DeletePostFlow {
        &self.delete
    }

    /// Create a post owned by this view's user.
    pub async fn create_post(&self, title: &str, body: &str) -> Result<Post, Error> {
        self.create.submit(NewPost::new(self.user_id.as_str(), title, body)).await
    }

    /// Delete one of this user's posts optimistically.
    pub async fn delete_post(&self, post_id: &str) -> Result<(), Error> {
        self.delete.submit(post_id, &self.posts_key()).await
    }
}
