//! In-memory remote used by the scenario tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use postr_app::{App, Location};
use postr_client::RemoteCollectionClient;
use postr_core::validation::validate_id;
use postr_core::{AppConfig, Error, NewPost, Page, Post, TransportError, User};
use tokio::sync::Notify;

pub fn user_id(n: usize) -> String {
    format!("{n:032x}")
}

fn user(n: usize) -> User {
    User {
        id: user_id(n),
        firstname: format!("First{n}"),
        lastname: format!("Last{n}"),
        email: format!("user{n}@example.com"),
        street: format!("{n} Main St"),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zipcode: "62701".to_string(),
    }
}

fn server_error() -> Error {
    Error::Transport(TransportError::Http { status: 500, message: Some("INTERNAL: boom".to_string()) })
}

/// Users and posts held in memory, with switches for failures and delays.
#[derive(Default)]
pub struct FakeRemote {
    users: Vec<User>,
    posts: Mutex<Vec<Post>>,
    calls: Mutex<Vec<String>>,
    next_post: AtomicU64,
    pub fail_list_users: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
    pub hold_create: AtomicBool,
    pub hold_delete: AtomicBool,
    pub release: Notify,
}

impl FakeRemote {
    pub fn with_users(count: usize) -> Arc<Self> {
        Arc::new(Self { users: (1..=count).map(user).collect(), next_post: AtomicU64::new(1), ..Default::default() })
    }

    pub fn add_post(&self, owner: &str, title: &str) -> Post {
        let id = format!("{:032x}", 0xf000_0000 + self.next_post.fetch_add(1, Ordering::SeqCst));
        let post = Post {
            id,
            user_id: owner.to_string(),
            title: title.to_string(),
            body: format!("{title} body"),
            created_at: None,
        };
        self.posts.lock().unwrap().push(post.clone());
        post
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn fail(&self, switch: &AtomicBool, on: bool) {
        switch.store(on, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteCollectionClient for FakeRemote {
    async fn list_users(&self, page: u32, page_size: u32) -> Result<Page<User>, Error> {
        self.record(format!("list_users:{page}"));
        if self.fail_list_users.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        let size = page_size as usize;
        let total_pages = self.users.len().div_ceil(size) as u32;
        let start = (page as usize - 1) * size;
        let items = self.users.iter().skip(start).take(size).cloned().collect();
        Ok(Page::new(items, page, total_pages, self.users.len() as u64))
    }

    async fn count_users(&self) -> Result<u64, Error> {
        self.record("count_users".to_string());
        Ok(self.users.len() as u64)
    }

    async fn list_posts_by_user(&self, user_id: &str) -> Result<Vec<Post>, Error> {
        validate_id(user_id)?;
        self.record(format!("list_posts:{user_id}"));
        Ok(self.posts.lock().unwrap().iter().filter(|p| p.user_id == user_id).cloned().collect())
    }

    async fn get_user(&self, user_id: &str) -> Result<User, Error> {
        validate_id(user_id)?;
        self.record(format!("get_user:{user_id}"));
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(Error::Transport(TransportError::Http { status: 404, message: None }))
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, Error> {
        post.validate()?;
        self.record(format!("create_post:{}", post.user_id));
        if self.hold_create.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        let created = self.add_post(&post.user_id, &post.title);
        Ok(created)
    }

    async fn delete_post(&self, post_id: &str) -> Result<(), Error> {
        validate_id(post_id)?;
        self.record(format!("delete_post:{post_id}"));
        if self.hold_delete.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        self.posts.lock().unwrap().retain(|p| p.id != post_id);
        Ok(())
    }
}

pub fn app(remote: &Arc<FakeRemote>, location: &str) -> App {
    app_with(remote, location, &AppConfig::default())
}

pub fn app_with(remote: &Arc<FakeRemote>, location: &str, config: &AppConfig) -> App {
    let remote: Arc<dyn RemoteCollectionClient> = Arc::clone(remote) as Arc<dyn RemoteCollectionClient>;
    App::new(remote, config, Location::parse(location).unwrap())
}
