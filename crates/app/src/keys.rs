//! Query keys used by the views and mutation flows.

use postr_core::QueryKey;

const USERS: &str = "users";
const USERS_COUNT: &str = "usersCount";
const USER_POSTS: &str = "userPosts";
const USER_DETAILS: &str = "userDetails";

/// `("users", page)`
pub fn users_page(page: u32) -> QueryKey {
    QueryKey::new(USERS).with(page)
}

/// Prefix of every users page.
pub fn users_prefix() -> QueryKey {
    QueryKey::new(USERS)
}

/// `("usersCount")`
pub fn users_count() -> QueryKey {
    QueryKey::new(USERS_COUNT)
}

/// `("userPosts", user_id)`
pub fn user_posts(user_id: &str) -> QueryKey {
    QueryKey::new(USER_POSTS).with(user_id)
}

/// `("userDetails", user_id)`
pub fn user_details(user_id: &str) -> QueryKey {
    QueryKey::new(USER_DETAILS).with(user_id)
}
