// SPDX-License-Identifier: MPL-2.0

/// SQL schema for a per-account post store.
///
/// Scalar post fields get their own columns; nested structures (ordered
/// file id list, props, metadata) are JSON columns that are NULL rather
/// than empty when there is nothing to store. `channel_id` and
/// `create_at` are indexed for the channel-scoped, newest-first read.
pub const SCHEMA: &str = r#"
-- Database version for migrations
PRAGMA user_version = 1;

CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    channel_id TEXT NOT NULL,
    user_id TEXT NOT NULL DEFAULT '',
    create_at INTEGER NOT NULL DEFAULT 0,
    update_at INTEGER NOT NULL DEFAULT 0,
    edit_at INTEGER NOT NULL DEFAULT 0,
    delete_at INTEGER NOT NULL DEFAULT 0,
    is_pinned INTEGER NOT NULL DEFAULT 0,
    root_id TEXT NOT NULL DEFAULT '',
    parent_id TEXT NOT NULL DEFAULT '',
    original_id TEXT NOT NULL DEFAULT '',
    message TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL DEFAULT '',
    hashtags TEXT NOT NULL DEFAULT '',
    pending_post_id TEXT NOT NULL DEFAULT '',
    file_ids_json TEXT,
    props_json TEXT,
    metadata_json TEXT
);

CREATE INDEX IF NOT EXISTS idx_posts_channel ON posts(channel_id);
CREATE INDEX IF NOT EXISTS idx_posts_channel_create_at ON posts(channel_id, create_at DESC);
"#;
