// SPDX-License-Identifier: MPL-2.0

use rusqlite::{Transaction, params};

use crate::normalize::to_canonical;
use crate::store::{StoreDb, StoreError};
use crate::types::{Post, ServerPost};

const POST_COLUMNS: &str = "id, channel_id, user_id, create_at, update_at, edit_at, delete_at, \
     is_pinned, root_id, parent_id, original_id, message, type, hashtags, pending_post_id, \
     file_ids_json, props_json, metadata_json";

/// Store operations for posts.
pub struct PostStore<'a> {
    db: &'a StoreDb,
}

/// Per-call outcome of a batch write. The call itself never fails; posts
/// that could not be normalized or persisted are listed in `failed` with
/// the error that sank them.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<String>,
    pub failed: Vec<WriteFailure>,
}

#[derive(Debug)]
pub struct WriteFailure {
    pub post_id: String,
    pub error: StoreError,
}

impl<'a> PostStore<'a> {
    pub fn new(db: &'a StoreDb) -> Self {
        Self { db }
    }

    /// Upsert a batch of wire-shaped posts in one transaction.
    ///
    /// Each post is normalized and then inserted-or-replaced by id, so
    /// repeated writes of the same post leave exactly one row. A failure
    /// on one post is logged and recorded without aborting its siblings;
    /// nothing becomes visible to readers until the transaction commits.
    pub fn write_posts(&self, posts: Vec<ServerPost>) -> WriteReport {
        let mut report = WriteReport::default();
        if posts.is_empty() {
            return report;
        }

        let mut conn = self.db.conn();
        let tx = match conn.transaction() {
            Ok(tx) => tx,
            Err(e) => {
                let error = StoreError::Persistence(e.to_string());
                tracing::warn!(error = %error, "failed to begin write transaction");
                for post in posts {
                    report.failed.push(WriteFailure {
                        post_id: post.id,
                        error: StoreError::Persistence(e.to_string()),
                    });
                }
                return report;
            },
        };

        for post in posts {
            let post_id = post.id.clone();
            match to_canonical(post).and_then(|post| Self::upsert(&tx, &post)) {
                Ok(()) => report.written.push(post_id),
                Err(error) => {
                    tracing::warn!(post_id = %post_id, error = %error, "failed to write post");
                    report.failed.push(WriteFailure { post_id, error });
                },
            }
        }

        if let Err(e) = tx.commit() {
            // Rolled back: everything in this batch is gone.
            let error = StoreError::Persistence(e.to_string());
            tracing::warn!(error = %error, "failed to commit write transaction");
            for post_id in std::mem::take(&mut report.written) {
                report.failed.push(WriteFailure {
                    post_id,
                    error: StoreError::Persistence(e.to_string()),
                });
            }
        }

        report
    }

    fn upsert(tx: &Transaction, post: &Post) -> Result<(), StoreError> {
        // Empty nested structures persist as NULL, never as empty JSON.
        let file_ids_json = if post.file_ids.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&post.file_ids)?)
        };
        let props_json = post.props.as_ref().map(serde_json::to_string).transpose()?;
        let metadata_json = if post.metadata.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&post.metadata)?)
        };

        tx.execute(
            r#"
            INSERT INTO posts (
                id, channel_id, user_id, create_at, update_at, edit_at, delete_at,
                is_pinned, root_id, parent_id, original_id, message, type, hashtags,
                pending_post_id, file_ids_json, props_json, metadata_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            ON CONFLICT(id) DO UPDATE SET
                channel_id = excluded.channel_id,
                user_id = excluded.user_id,
                create_at = excluded.create_at,
                update_at = excluded.update_at,
                edit_at = excluded.edit_at,
                delete_at = excluded.delete_at,
                is_pinned = excluded.is_pinned,
                root_id = excluded.root_id,
                parent_id = excluded.parent_id,
                original_id = excluded.original_id,
                message = excluded.message,
                type = excluded.type,
                hashtags = excluded.hashtags,
                pending_post_id = excluded.pending_post_id,
                file_ids_json = excluded.file_ids_json,
                props_json = excluded.props_json,
                metadata_json = excluded.metadata_json
            "#,
            params![
                post.id,
                post.channel_id,
                post.user_id,
                post.create_at,
                post.update_at,
                post.edit_at,
                post.delete_at,
                post.is_pinned,
                post.root_id,
                post.parent_id,
                post.original_id,
                post.message,
                post.post_type,
                post.hashtags,
                post.pending_post_id,
                file_ids_json,
                props_json,
                metadata_json,
            ],
        )
        .map_err(|e| StoreError::Persistence(e.to_string()))?;

        Ok(())
    }

    /// All posts in a channel, newest first (`create_at` descending).
    ///
    /// Never fails: a query or row error is logged and whatever has been
    /// accumulated so far is returned, which keeps an offline UI usable
    /// even over a damaged store.
    pub fn read_posts(&self, channel_id: &str) -> Vec<Post> {
        let conn = self.db.conn();
        let sql =
            format!("SELECT {POST_COLUMNS} FROM posts WHERE channel_id = ?1 ORDER BY create_at DESC");

        let mut stmt = match conn.prepare(&sql) {
            Ok(stmt) => stmt,
            Err(e) => {
                let error = StoreError::Query(e.to_string());
                tracing::warn!(error = %error, "post query failed");
                return Vec::new();
            },
        };
        let mut rows = match stmt.query([channel_id]) {
            Ok(rows) => rows,
            Err(e) => {
                let error = StoreError::Query(e.to_string());
                tracing::warn!(error = %error, "post query failed");
                return Vec::new();
            },
        };

        let mut posts = Vec::new();
        loop {
            match rows.next() {
                Ok(Some(row)) => match Self::row_to_post(row) {
                    Ok(post) => posts.push(post),
                    Err(error) => {
                        tracing::warn!(error = %error, "skipping unreadable post row");
                    },
                },
                Ok(None) => break,
                Err(e) => {
                    let error = StoreError::Query(e.to_string());
                    tracing::warn!(error = %error, "post query failed mid-read");
                    break;
                },
            }
        }

        posts
    }

    /// Primary keys only, same filter and order as [`read_posts`](Self::read_posts).
    /// Skips JSON deserialization of the nested columns entirely.
    pub fn read_post_ids(&self, channel_id: &str) -> Vec<String> {
        let conn = self.db.conn();

        let mut stmt = match conn
            .prepare("SELECT id FROM posts WHERE channel_id = ?1 ORDER BY create_at DESC")
        {
            Ok(stmt) => stmt,
            Err(e) => {
                let error = StoreError::Query(e.to_string());
                tracing::warn!(error = %error, "post id query failed");
                return Vec::new();
            },
        };
        let mut rows = match stmt.query([channel_id]) {
            Ok(rows) => rows,
            Err(e) => {
                let error = StoreError::Query(e.to_string());
                tracing::warn!(error = %error, "post id query failed");
                return Vec::new();
            },
        };

        let mut ids = Vec::new();
        loop {
            match rows.next() {
                Ok(Some(row)) => match row.get(0) {
                    Ok(id) => ids.push(id),
                    Err(e) => {
                        let error = StoreError::Query(e.to_string());
                        tracing::warn!(error = %error, "skipping unreadable post id");
                    },
                },
                Ok(None) => break,
                Err(e) => {
                    let error = StoreError::Query(e.to_string());
                    tracing::warn!(error = %error, "post id query failed mid-read");
                    break;
                },
            }
        }

        ids
    }

    fn row_to_post(row: &rusqlite::Row) -> Result<Post, StoreError> {
        let file_ids_json: Option<String> = row.get(15)?;
        let props_json: Option<String> = row.get(16)?;
        let metadata_json: Option<String> = row.get(17)?;

        Ok(Post {
            id: row.get(0)?,
            channel_id: row.get(1)?,
            user_id: row.get(2)?,
            create_at: row.get(3)?,
            update_at: row.get(4)?,
            edit_at: row.get(5)?,
            delete_at: row.get(6)?,
            is_pinned: row.get(7)?,
            root_id: row.get(8)?,
            parent_id: row.get(9)?,
            original_id: row.get(10)?,
            message: row.get(11)?,
            post_type: row.get(12)?,
            hashtags: row.get(13)?,
            pending_post_id: row.get(14)?,
            file_ids: file_ids_json
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?
                .unwrap_or_default(),
            props: props_json.as_deref().map(serde_json::from_str).transpose()?,
            metadata: metadata_json
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}
