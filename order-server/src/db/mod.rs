//! Database layer
//!
//! Repositories over the document store.

pub mod repository;
