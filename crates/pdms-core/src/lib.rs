//! Core types and trait definitions for the program document store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod account;
pub mod document;
pub mod error;
pub mod section;
pub mod snapshot;
pub mod store;
pub mod version;

pub use error::{Classify, Error, ErrorClass, Result};
