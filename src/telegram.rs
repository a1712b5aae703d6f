use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::discourse::Post;

/// Maximum number of sanitized body bytes quoted in a description.
const BODY_PREVIEW_BYTES: usize = 100;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    ok: bool,
}

/// Sends matched posts to a Telegram chat via the Bot API.
pub struct Notifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
    chat_id: i64,
    forum_url: String,
}

impl Notifier {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.telegram_api_url.trim_end_matches('/').to_string(),
            bot_token: config.telegram_bot_token.clone(),
            chat_id: config.telegram_chat_id,
            forum_url: config.discourse_url.clone(),
        }
    }

    /// Deliver one matched post as two messages: the description, then the
    /// post URL. Both sends must report success for the delivery to count.
    ///
    /// # Errors
    ///
    /// Returns an error if a request cannot be sent or the response body is
    /// not valid JSON.
    pub async fn deliver(&self, post: &Post) -> Result<bool, NotifyError> {
        // Both messages are always sent, even if the first one is rejected.
        let description_ok = self.send_message(&describe(post)).await?;
        let url_ok = self.send_message(&post_url(&self.forum_url, post)).await?;
        Ok(description_ok && url_ok)
    }

    async fn send_message(&self, text: &str) -> Result<bool, NotifyError> {
        let url = format!(
            "{}/bot{}/sendMessage?text={}&chat_id={}&parse_mode=Markdown",
            self.api_url,
            self.bot_token,
            urlencoding::encode(text),
            self.chat_id
        );

        let response = self.client.get(&url).send().await?;
        let body: SendMessageResponse = response.json().await?;

        if !body.ok {
            debug!(chat_id = self.chat_id, "Chat API reported ok=false");
        }
        Ok(body.ok)
    }
}

/// Strip non-ASCII bytes and escape Telegram Markdown control characters.
///
/// Escapes `_`, `*`, backtick and `[` with a backslash so user text cannot
/// break out of the surrounding Markdown formatting.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let code = c as u32;
        if code == 0 || code > 0x7F {
            continue;
        }
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Format the message body for a matched post: bold topic title, italic
/// username, display name in parentheses, then the first 100 bytes of the
/// sanitized body in a preformatted block.
#[must_use]
pub fn describe(post: &Post) -> String {
    let topic_title = sanitize(&post.topic_title);
    let username = sanitize(&post.username);
    let name = post.name.as_deref().map(sanitize);
    let body = sanitize(post.raw.as_deref().unwrap_or_default());
    // Sanitized text is pure ASCII, so byte indexing cannot split a char.
    let preview = &body[..body.len().min(BODY_PREVIEW_BYTES)];

    format!(
        "*{topic_title}* by _{username}_ ({})\n\n```\n{preview}\n```\n",
        name.as_deref().unwrap_or(&username),
    )
}

/// Canonical URL of a post within its topic.
#[must_use]
pub fn post_url(forum_url: &str, post: &Post) -> String {
    format!(
        "{}/t/{}/{}/{}",
        forum_url, post.topic_slug, post.topic_id, post.post_number
    )
}
