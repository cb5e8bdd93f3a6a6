//! Username to numeric uid resolution via the mobile search API.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const LOOKUP_URL: &str = "https://m.weibo.cn/api/container/getIndex";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("profile lookup request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("no profile found for username `{0}`; check the name or use the uid directly")]
    NotFound(String),
}

/// Resolve a display name to its numeric uid.
pub async fn uid_for_username(
    client: &reqwest::Client,
    username: &str,
) -> Result<u64, LookupError> {
    let containerid = format!("100103type=3&q={username}");
    let response = client
        .get(LOOKUP_URL)
        .query(&[("queryVal", username), ("containerid", &containerid)])
        .send()
        .await?
        .error_for_status()?;

    let body: Value = response.json().await?;
    debug!(username = %username, "Lookup response received");
    parse_uid(&body).ok_or_else(|| LookupError::NotFound(username.to_string()))
}

/// Pull the uid out of the container API response shape:
/// `data.cards[1].card_group[0].user.id`.
fn parse_uid(body: &Value) -> Option<u64> {
    body.get("data")?
        .get("cards")?
        .get(1)?
        .get("card_group")?
        .get(0)?
        .get("user")?
        .get("id")?
        .as_u64()
}
