// SPDX-License-Identifier: MPL-2.0

//! Offline post cache for a mobile chat client.
//!
//! Server-fetched posts arrive in ragged wire shapes: a collection field
//! may be an ordered list, an object keyed by a natural key (URL for
//! images, id otherwise), or absent. This crate normalizes those payloads
//! into one canonical shape and mirrors them into a per-account SQLite
//! file, so channels stay readable offline.
//!
//! - [`types`] declares the wire and canonical post shapes.
//! - [`normalize`] converts between them.
//! - [`store`] persists canonical posts: [`StoreManager`] owns one open
//!   store per (server URL, user id) pair, [`PostStore`] upserts batches
//!   in a single transaction and reads channels back newest-first.
//!
//! Writes are idempotent upserts keyed by post id, so retrying a fetch is
//! safe. A malformed post in a batch is logged and reported without
//! sinking its siblings, and reads never fail outward; the UI always gets
//! whatever the store can produce.

pub mod normalize;
pub mod store;
pub mod types;

pub use store::{PostStore, StoreDb, StoreError, StoreManager, WriteFailure, WriteReport};
pub use types::{Post, PostMetadata, PostProps, ServerPost};
