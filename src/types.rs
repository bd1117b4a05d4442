// SPDX-License-Identifier: MPL-2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A collection field as it arrives off the wire: either an ordered list
/// or an object keyed by a natural key (URL for images, id otherwise).
/// The keyed form decodes into a `BTreeMap` so flattening it back into a
/// sequence is deterministic (ascending key order).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireCollection<T> {
    List(Vec<T>),
    Keyed(BTreeMap<String, T>),
}

impl<T> Default for WireCollection<T> {
    fn default() -> Self {
        WireCollection::List(Vec::new())
    }
}

impl<T> WireCollection<T> {
    /// Flattens to a sequence. Lists pass through unchanged.
    pub fn into_values(self) -> Vec<T> {
        match self {
            WireCollection::List(items) => items,
            WireCollection::Keyed(map) => map.into_values().collect(),
        }
    }

    /// Like `into_values`, but keeps the map key for elements that
    /// arrived in the keyed encoding.
    pub fn into_entries(self) -> Vec<(Option<String>, T)> {
        match self {
            WireCollection::List(items) => items.into_iter().map(|item| (None, item)).collect(),
            WireCollection::Keyed(map) => {
                map.into_iter().map(|(key, item)| (Some(key), item)).collect()
            },
        }
    }
}

/// Wire fields that may hold a single value or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// A post as fetched from the server or built optimistically before the
/// network round-trip. Only `id`, `channel_id` and `create_at` are
/// guaranteed; every collection field may be list- or map-encoded, null,
/// or absent. Unknown fields are dropped at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerPost {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    #[serde(default)]
    pub edit_at: i64,
    #[serde(default)]
    pub delete_at: i64,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub root_id: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub original_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub post_type: String,
    #[serde(default)]
    pub hashtags: String,
    #[serde(default)]
    pub pending_post_id: String,
    #[serde(default)]
    pub file_ids: Option<WireCollection<String>>,
    #[serde(default)]
    pub props: Option<PostProps>,
    #[serde(default)]
    pub metadata: Option<ServerMetadata>,
}

/// Wire shape of post metadata. Each collection may be a list or a keyed
/// object; embed list entries may be null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerMetadata {
    #[serde(default)]
    pub images: Option<WireCollection<ImageMetadata>>,
    #[serde(default)]
    pub files: Option<WireCollection<FileInfo>>,
    #[serde(default)]
    pub emojis: Option<WireCollection<CustomEmoji>>,
    #[serde(default)]
    pub reactions: Option<WireCollection<Reaction>>,
    #[serde(default)]
    pub embeds: Option<WireCollection<Option<ServerEmbed>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerEmbed {
    #[serde(rename = "type", default)]
    pub embed_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub data: Option<ServerEmbedData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerEmbedData {
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub determiner: String,
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub locales_alternate: Option<OneOrMany<String>>,
    #[serde(default)]
    pub images: Option<WireCollection<EmbedMedia>>,
    #[serde(default)]
    pub audios: Option<WireCollection<EmbedMedia>>,
    #[serde(default)]
    pub videos: Option<WireCollection<EmbedMedia>>,
}

/// A post in canonical shape: every collection is an ordered sequence,
/// `props` is `None` rather than present-but-empty. This is what gets
/// persisted and what readers get back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    #[serde(default)]
    pub edit_at: i64,
    #[serde(default)]
    pub delete_at: i64,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub root_id: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub original_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub post_type: String,
    #[serde(default)]
    pub hashtags: String,
    #[serde(default)]
    pub pending_post_id: String,
    /// Order-significant; never deduplicated or reordered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<PostProps>,
    #[serde(default, skip_serializing_if = "PostMetadata::is_empty")]
    pub metadata: PostMetadata,
}

/// The fixed optional-key bag a post can carry (webhook overrides and
/// "added user" ephemeral-message fields). An all-`None` record counts
/// as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_webhook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_display_name: Option<String>,
    #[serde(rename = "addedUserId", default, skip_serializing_if = "Option::is_none")]
    pub added_user_id: Option<String>,
    #[serde(rename = "addedUsername", default, skip_serializing_if = "Option::is_none")]
    pub added_username: Option<String>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl PostProps {
    pub fn is_empty(&self) -> bool {
        self.from_webhook.is_none()
            && self.override_icon_url.is_none()
            && self.override_username.is_none()
            && self.webhook_display_name.is_none()
            && self.added_user_id.is_none()
            && self.added_username.is_none()
            && self.user_id.is_none()
            && self.username.is_none()
    }
}

/// Canonical post metadata. Always carried on a post, but zero-length
/// collections are omitted when serialized rather than stored empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emojis: Vec<CustomEmoji>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl PostMetadata {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
            && self.files.is_empty()
            && self.emojis.is_empty()
            && self.reactions.is_empty()
            && self.embeds.is_empty()
    }

    /// The images collection keyed by URL, for callers that consume the
    /// map-shaped view. Images are the one collection that is map-shaped
    /// on the way out; files, emojis, reactions and embeds stay
    /// sequences in both directions.
    pub fn images_by_url(&self) -> BTreeMap<String, ImageMetadata> {
        self.images
            .iter()
            .map(|image| (image.url.clone(), image.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Natural key. In the keyed wire encoding this lives in the map key
    /// rather than the value; normalization re-attaches it.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub frame_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub post_id: String,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    #[serde(default)]
    pub delete_at: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_preview_image: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomEmoji {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    #[serde(default)]
    pub delete_at: i64,
    #[serde(default)]
    pub creator_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub post_id: String,
    #[serde(default)]
    pub emoji_name: String,
    #[serde(default)]
    pub create_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(rename = "type", default)]
    pub embed_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EmbedData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedData {
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub determiner: String,
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locales_alternate: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<EmbedMedia>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audios: Vec<EmbedMedia>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<EmbedMedia>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedMedia {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub secure_url: String,
    #[serde(rename = "type", default)]
    pub media_type: String,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
}
