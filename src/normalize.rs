// SPDX-License-Identifier: MPL-2.0

//! Converts wire-shaped posts into the canonical store shape.
//!
//! Collection fields arrive as either ordered lists or objects keyed by a
//! natural key; canonical posts hold sequences only. Keyed collections
//! flatten in ascending key order, so normalization is deterministic for
//! a given input. The read-side map view of images lives on
//! [`crate::types::PostMetadata::images_by_url`].

use crate::store::StoreError;
use crate::types::{
    Embed, EmbedData, ImageMetadata, Post, PostMetadata, ServerEmbed, ServerEmbedData,
    ServerMetadata, ServerPost, WireCollection,
};

/// Normalizes a wire-shaped post for persistence.
///
/// Empty `props` become `None` so "no props" round-trips losslessly.
/// Absent metadata becomes an empty metadata record (empty collections
/// are omitted again at serialization time). Fails with
/// [`StoreError::Validation`] if an image element has no URL after the
/// map key has been consulted; a malformed entry is never silently
/// dropped into the store.
pub fn to_canonical(post: ServerPost) -> Result<Post, StoreError> {
    let metadata = canonical_metadata(post.metadata, &post.id)?;

    Ok(Post {
        id: post.id,
        channel_id: post.channel_id,
        user_id: post.user_id,
        create_at: post.create_at,
        update_at: post.update_at,
        edit_at: post.edit_at,
        delete_at: post.delete_at,
        is_pinned: post.is_pinned,
        root_id: post.root_id,
        parent_id: post.parent_id,
        original_id: post.original_id,
        message: post.message,
        post_type: post.post_type,
        hashtags: post.hashtags,
        pending_post_id: post.pending_post_id,
        file_ids: post.file_ids.unwrap_or_default().into_values(),
        props: post.props.filter(|props| !props.is_empty()),
        metadata,
    })
}

fn canonical_metadata(
    metadata: Option<ServerMetadata>,
    post_id: &str,
) -> Result<PostMetadata, StoreError> {
    let Some(metadata) = metadata else {
        return Ok(PostMetadata::default());
    };

    Ok(PostMetadata {
        images: canonical_images(metadata.images.unwrap_or_default(), post_id)?,
        files: metadata.files.unwrap_or_default().into_values(),
        emojis: metadata.emojis.unwrap_or_default().into_values(),
        reactions: metadata.reactions.unwrap_or_default().into_values(),
        embeds: canonical_embeds(metadata.embeds.unwrap_or_default()),
    })
}

/// In the keyed encoding the URL lives in the map key and not in the
/// value, so it is re-attached here. A value-level URL wins if both are
/// present.
fn canonical_images(
    images: WireCollection<ImageMetadata>,
    post_id: &str,
) -> Result<Vec<ImageMetadata>, StoreError> {
    images
        .into_entries()
        .into_iter()
        .map(|(key, mut image)| {
            if image.url.is_empty() {
                if let Some(url) = key.filter(|key| !key.is_empty()) {
                    image.url = url;
                }
            }
            if image.url.is_empty() {
                return Err(StoreError::Validation {
                    post_id: post_id.to_string(),
                    reason: "image metadata has no url".to_string(),
                });
            }
            Ok(image)
        })
        .collect()
}

/// Null entries in the embed list are dropped; nested media collections
/// get the same list-or-map coercion as top-level ones.
fn canonical_embeds(embeds: WireCollection<Option<ServerEmbed>>) -> Vec<Embed> {
    embeds
        .into_values()
        .into_iter()
        .flatten()
        .map(|embed| Embed {
            embed_type: embed.embed_type,
            url: embed.url,
            data: embed.data.map(canonical_embed_data),
        })
        .collect()
}

fn canonical_embed_data(data: ServerEmbedData) -> EmbedData {
    EmbedData {
        data_type: data.data_type,
        url: data.url,
        title: data.title,
        description: data.description,
        determiner: data.determiner,
        site_name: data.site_name,
        locale: data.locale,
        locales_alternate: data
            .locales_alternate
            .map(|locales| locales.into_vec())
            .unwrap_or_default(),
        images: data.images.unwrap_or_default().into_values(),
        audios: data.audios.unwrap_or_default().into_values(),
        videos: data.videos.unwrap_or_default().into_values(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server_post(value: serde_json::Value) -> ServerPost {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_map_images_become_sequence_with_url_from_key() {
        let post = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "create_at": 100,
            "metadata": {
                "images": {
                    "https://a/y.png": {"width": 5, "height": 5, "format": "png"},
                    "https://a/x.png": {"width": 10, "height": 20, "format": "png", "frame_count": 3},
                }
            }
        }));

        let canonical = to_canonical(post).unwrap();
        let images = &canonical.metadata.images;
        assert_eq!(images.len(), 2);
        // Keyed collections flatten in ascending key order.
        assert_eq!(images[0].url, "https://a/x.png");
        assert_eq!(images[0].width, 10);
        assert_eq!(images[0].height, 20);
        assert_eq!(images[0].format, "png");
        assert_eq!(images[0].frame_count, 3);
        assert_eq!(images[1].url, "https://a/y.png");
        assert_eq!(images[1].width, 5);
    }

    #[test]
    fn test_list_images_pass_through_in_order() {
        let post = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "metadata": {
                "images": [
                    {"url": "https://a/z.png", "width": 1, "height": 1},
                    {"url": "https://a/a.png", "width": 2, "height": 2},
                ]
            }
        }));

        let canonical = to_canonical(post).unwrap();
        let urls: Vec<_> = canonical
            .metadata
            .images
            .iter()
            .map(|image| image.url.as_str())
            .collect();
        assert_eq!(urls, ["https://a/z.png", "https://a/a.png"]);
    }

    #[test]
    fn test_image_without_url_fails_validation() {
        let post = server_post(json!({
            "id": "p-bad",
            "channel_id": "c1",
            "metadata": {
                "images": [{"width": 10, "height": 10, "format": "png"}]
            }
        }));

        let error = to_canonical(post).unwrap_err();
        match error {
            StoreError::Validation { post_id, .. } => assert_eq!(post_id, "p-bad"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_value_url_wins_over_map_key() {
        let post = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "metadata": {
                "images": {
                    "https://key.example": {"url": "https://value.example", "width": 1, "height": 1}
                }
            }
        }));

        let canonical = to_canonical(post).unwrap();
        assert_eq!(canonical.metadata.images[0].url, "https://value.example");
    }

    #[test]
    fn test_empty_and_absent_props_both_become_none() {
        let with_empty = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "props": {}
        }));
        let without = server_post(json!({
            "id": "p2",
            "channel_id": "c1"
        }));
        let unknown_keys_only = server_post(json!({
            "id": "p3",
            "channel_id": "c1",
            "props": {"some_plugin_field": "x"}
        }));

        assert_eq!(to_canonical(with_empty).unwrap().props, None);
        assert_eq!(to_canonical(without).unwrap().props, None);
        assert_eq!(to_canonical(unknown_keys_only).unwrap().props, None);
    }

    #[test]
    fn test_populated_props_survive() {
        let post = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "props": {"username": "alice", "addedUsername": "bob"}
        }));

        let props = to_canonical(post).unwrap().props.unwrap();
        assert_eq!(props.username.as_deref(), Some("alice"));
        assert_eq!(props.added_username.as_deref(), Some("bob"));
        assert_eq!(props.from_webhook, None);
    }

    #[test]
    fn test_absent_metadata_becomes_empty_record() {
        let post = server_post(json!({"id": "p1", "channel_id": "c1"}));
        let canonical = to_canonical(post).unwrap();
        assert!(canonical.metadata.is_empty());
    }

    #[test]
    fn test_reactions_map_becomes_sequence() {
        let post = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "metadata": {
                "reactions": {
                    "u1": {"user_id": "u1", "post_id": "p1", "emoji_name": "wave", "create_at": 1},
                    "u2": {"user_id": "u2", "post_id": "p1", "emoji_name": "fire", "create_at": 2},
                }
            }
        }));

        let reactions = to_canonical(post).unwrap().metadata.reactions;
        assert_eq!(reactions.len(), 2);
        assert_eq!(reactions[0].user_id, "u1");
        assert_eq!(reactions[1].emoji_name, "fire");
    }

    #[test]
    fn test_null_embed_entries_dropped() {
        let post = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "metadata": {
                "embeds": [null, {"type": "opengraph", "url": "https://a"}, null]
            }
        }));

        let embeds = to_canonical(post).unwrap().metadata.embeds;
        assert_eq!(embeds.len(), 1);
        assert_eq!(embeds[0].embed_type, "opengraph");
        assert_eq!(embeds[0].url.as_deref(), Some("https://a"));
    }

    #[test]
    fn test_embed_data_collections_coerced() {
        let post = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "metadata": {
                "embeds": [{
                    "type": "opengraph",
                    "url": "https://a",
                    "data": {
                        "type": "opengraph",
                        "url": "https://a",
                        "title": "A",
                        "locales_alternate": "en_GB",
                        "images": {
                            "https://a/og.png": {"url": "https://a/og.png", "width": 100, "height": 50}
                        }
                    }
                }]
            }
        }));

        let embeds = to_canonical(post).unwrap().metadata.embeds;
        let data = embeds[0].data.as_ref().unwrap();
        assert_eq!(data.title, "A");
        assert_eq!(data.locales_alternate, ["en_GB"]);
        assert_eq!(data.images.len(), 1);
        assert_eq!(data.images[0].url, "https://a/og.png");
        assert_eq!(data.images[0].width, 100);
    }

    #[test]
    fn test_embed_data_list_images_pass_through() {
        let post = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "metadata": {
                "embeds": [{
                    "type": "opengraph",
                    "data": {
                        "type": "opengraph",
                        "images": [{"url": "https://b/1.png"}, {"url": "https://b/2.png"}]
                    }
                }]
            }
        }));

        let embeds = to_canonical(post).unwrap().metadata.embeds;
        let data = embeds[0].data.as_ref().unwrap();
        let urls: Vec<_> = data.images.iter().map(|image| image.url.as_str()).collect();
        assert_eq!(urls, ["https://b/1.png", "https://b/2.png"]);
    }

    #[test]
    fn test_file_ids_order_preserved() {
        let post = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "file_ids": ["f1", "f2", "f3"]
        }));

        assert_eq!(to_canonical(post).unwrap().file_ids, ["f1", "f2", "f3"]);
    }

    #[test]
    fn test_unknown_fields_dropped_silently() {
        let post = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "create_at": 5,
            "some_future_field": {"nested": true},
            "metadata": {
                "unknown_collection": [1, 2, 3]
            }
        }));

        let canonical = to_canonical(post).unwrap();
        assert_eq!(canonical.id, "p1");
        assert_eq!(canonical.create_at, 5);
    }

    #[test]
    fn test_images_by_url_view() {
        let post = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "metadata": {
                "images": [
                    {"url": "https://a/x.png", "width": 10, "height": 20, "format": "png"}
                ]
            }
        }));

        let canonical = to_canonical(post).unwrap();
        let by_url = canonical.metadata.images_by_url();
        assert_eq!(by_url.len(), 1);
        assert_eq!(by_url["https://a/x.png"].width, 10);
    }

    #[test]
    fn test_null_collections_treated_as_absent() {
        let post = server_post(json!({
            "id": "p1",
            "channel_id": "c1",
            "file_ids": null,
            "metadata": {
                "images": null,
                "reactions": null,
                "embeds": null
            }
        }));

        let canonical = to_canonical(post).unwrap();
        assert!(canonical.file_ids.is_empty());
        assert!(canonical.metadata.is_empty());
    }
}
