//! JSON rendering: compact record array or the upstream-API-shaped form.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};

use crate::post::Post;

/// Render the post set as a JSON document.
///
/// Compact mode serializes the [`Post`] records directly. Otherwise each
/// post becomes a nested `scheme`/`mblog` structure mimicking the upstream
/// API, with empty and null fields recursively pruned.
pub fn render(posts: &[Post], compact: bool) -> Result<String> {
    if compact {
        return serde_json::to_string_pretty(posts).context("Failed to serialize posts");
    }
    let records: Vec<Value> = posts.iter().filter_map(api_record).collect();
    serde_json::to_string_pretty(&records).context("Failed to serialize posts")
}

/// Build the upstream-API-shaped record for one post.
fn api_record(post: &Post) -> Option<Value> {
    let mut urls = Map::new();
    if let Some(video) = &post.video_url {
        if let Some(key) = video_quality_key(video) {
            urls.insert(key, Value::String(video.clone()));
        }
    }

    let pics: Vec<Value> = post
        .thumbnail_image_urls
        .iter()
        .zip(&post.full_image_urls)
        .map(|(thumbnail, full)| {
            json!({
                "url": thumbnail,
                "large": {"url": full},
            })
        })
        .collect();

    let record = json!({
        "scheme": post.canonical_url,
        "mblog": {
            "created_at": super::format_time(&post.published_at),
            "id": post.post_id(),
            "text": post.body_text,
            "screen_name": post.author.display_name,
            "user": {"id": post.author.numeric_id},
            "pics": pics,
            "page_info": {"urls": Value::Object(urls)},
        },
    });
    prune_empty(record)
}

/// The quality key of a video URL, `<label>_mp4`, from its `label` query
/// parameter. Unlabelled URLs get no entry (it is pruned away).
fn video_quality_key(video_url: &str) -> Option<String> {
    let parsed = url::Url::parse(video_url).ok()?;
    let label = parsed
        .query_pairs()
        .find(|(k, _)| k == "label")
        .map(|(_, v)| v.into_owned())?;
    Some(format!("{label}_mp4"))
}

/// Recursively drop null, empty-string, empty-array and empty-object
/// values. Numbers and booleans always survive.
fn prune_empty(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(items) => {
            let pruned: Vec<Value> = items.into_iter().filter_map(prune_empty).collect();
            if pruned.is_empty() {
                None
            } else {
                Some(Value::Array(pruned))
            }
        }
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| prune_empty(v).map(|v| (k, v)))
                .collect();
            if pruned.is_empty() {
                None
            } else {
                Some(Value::Object(pruned))
            }
        }
        other => Some(other),
    }
}
