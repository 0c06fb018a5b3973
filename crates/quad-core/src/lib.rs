//! Core types and trait definitions for the Quad social backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod error;
pub mod event;
pub mod graph;
pub mod message;
pub mod notification;
pub mod post;
pub mod store;
pub mod story;
pub mod user;

pub use error::{Error, ErrorKind, Result};
