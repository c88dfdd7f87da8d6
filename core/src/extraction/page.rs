//! Page download and markup stripping

use crate::error::{FetchError, Result};
use regex::Regex;
use std::sync::LazyLock;

static HIDDEN_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|template)\b.*?</(script|style|noscript|template)\s*>|<!--.*?-->")
        .expect("hidden block pattern")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static NUMERIC_ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));").expect("numeric entity pattern")
});

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&ndash;", "-"),
    ("&mdash;", "-"),
    ("&deg;", "°"),
    ("&amp;", "&"),
];

/// Download a page and return its visible text, truncated to `max_chars`
pub async fn fetch_page_text(
    http: &reqwest::Client,
    url: &str,
    max_chars: usize,
) -> Result<String> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl {
            url: url.to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        }
        .into());
    }

    tracing::info!("Fetching {}", parsed);
    let response = http
        .get(parsed.clone())
        .send()
        .await
        .map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into());
    }

    let html = response.text().await.map_err(|e| FetchError::Request {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let text = strip_markup(&html);
    tracing::debug!("{} yielded {} characters of text", parsed, text.chars().count());
    Ok(truncate_chars(&text, max_chars))
}

/// Reduce an HTML document to its visible text on a single line
pub fn strip_markup(html: &str) -> String {
    let without_hidden = HIDDEN_BLOCK_RE.replace_all(html, " ");
    let without_tags = TAG_RE.replace_all(&without_hidden, " ");

    let mut text = decode_numeric_entities(&without_tags);
    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }

    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Decode `&#8217;` and `&#x2019;` style references; invalid code points stay as written
fn decode_numeric_entities(text: &str) -> String {
    NUMERIC_ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
                (None, None) => None,
            };
            match code.and_then(char::from_u32) {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Keep at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
