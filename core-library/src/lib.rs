//! # Video Library Module
//!
//! Owns the local video catalog database and the repositories that read and
//! write it.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite connection pooling and embedded migrations
//! - Domain models for videos, categories, comments, favorites, watch and
//!   search history
//! - One repository per entity, each exclusively owning its table
//! - The [`VersionedStore`](repositories::VersionedStore) seam used by
//!   versioned merge

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use db::{create_pool, create_test_pool, DatabaseConfig};
