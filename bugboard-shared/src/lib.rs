//! # Bugboard Shared Library
//!
//! Core of the Bugboard issue tracker: the entity store, the permission
//! guard, and the list, thread, search and sidebar engines. The HTTP server
//! in `bugboard-api` is a thin layer over this crate.
//!
//! ## Module Organization
//!
//! - `db`: SQLite pool and migrations
//! - `models`: Users, projects, issues, comments and memberships
//! - `auth`: Password hashing, JWT, request middleware and permission checks
//! - `error`: Core error type
//! - `listing`: Filtered, sorted, paginated list views
//! - `lifecycle`: Create/update/delete and open/close operations
//! - `members`: Adding and removing assigned users
//! - `detail`: Detail views and their visit counting
//! - `threads`: Comment threads
//! - `search`: Cross-entity search
//! - `sidebar`: Sidebar context

pub mod auth;
pub mod db;
pub mod detail;
pub mod error;
pub mod lifecycle;
pub mod listing;
pub mod members;
pub mod models;
pub mod search;
pub mod sidebar;
pub mod threads;

/// Current version of the Bugboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
