// SPDX-License-Identifier: MPL-2.0

mod db;
mod manager;
mod posts;
mod schema;

pub use db::StoreDb;
pub use manager::{StoreManager, store_key};
pub use posts::{PostStore, WriteFailure, WriteReport};

use thiserror::Error;

/// Failures the cache can produce.
///
/// Lifecycle calls (`StoreManager::get_or_open`) propagate these; the
/// writer and reader recover internally, log, and surface per-post
/// failures only through [`WriteReport`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// A collection element could not be normalized; the post is not
    /// written.
    #[error("post {post_id} failed validation: {reason}")]
    Validation { post_id: String, reason: String },
    /// No store is open for the current (server, user) pair. Distinct
    /// from an opened store that holds no rows.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The engine rejected a write.
    #[error("write rejected: {0}")]
    Persistence(String),
    /// The engine rejected a read.
    #[error("read rejected: {0}")]
    Query(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store path error: {0}")]
    Path(String),
}
