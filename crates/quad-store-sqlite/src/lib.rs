//! SQLite backend for the Quad social store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Because every statement funnels through
//! that one connection, each closure passed to `call` is serialised against
//! all others; get-or-create operations rely on this plus the UNIQUE
//! constraints in [`schema`].

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
