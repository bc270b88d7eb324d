//! Content payload pre-processing.
//!
//! Providers work best on plain text, so before fan-out the article fields
//! are stripped of markup. Payloads that are not article JSON are passed
//! through untouched.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};

/// Block-level elements removed from the body together with their content.
static BODY_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        "pull-quote",
        "web-pull-quote",
        "table",
        "promo-box",
        "web-inline-picture",
    ]
    .iter()
    .map(|tag| Regex::new(&format!(r"(?s)<{tag}\b.*?</{tag}>")).expect("valid block pattern"))
    .collect()
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Article fields understood by the pre-processor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticlePayload {
    /// Content UUID, forwarded unchanged.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Author line.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub byline: String,
    /// Article body markup.
    #[serde(rename = "bodyXML", default)]
    pub body: String,
    /// Headline.
    #[serde(rename = "title", default, skip_serializing_if = "String::is_empty")]
    pub headline: String,
}

/// Clean an article payload, or return it verbatim if it is not one.
pub fn prepare(payload: &[u8]) -> Cow<'_, [u8]> {
    let Ok(mut article) = serde_json::from_slice::<ArticlePayload>(payload) else {
        return Cow::Borrowed(payload);
    };

    article.byline = clean_text(&article.byline);
    article.body = clean_text(&strip_body_blocks(&article.body));
    article.headline = clean_text(&article.headline);

    match serde_json::to_vec(&article) {
        Ok(cleaned) => Cow::Owned(cleaned),
        Err(e) => {
            tracing::warn!(error = %e, "failed to re-encode cleaned payload, forwarding payload unchanged");
            Cow::Borrowed(payload)
        }
    }
}

fn strip_body_blocks(body: &str) -> String {
    BODY_BLOCKS
        .iter()
        .fold(body.to_owned(), |text, block| block.replace_all(&text, "").into_owned())
}

/// Decode entities, drop tags, trim, and collapse whitespace runs.
///
/// Markup that was itself entity-escaped is removed as well.
pub fn clean_text(input: &str) -> String {
    let decoded = fragment_text(input);
    let untagged = TAG.replace_all(&decoded, "");
    WHITESPACE
        .replace_all(untagged.trim(), " ")
        .into_owned()
}

/// Text content of an HTML fragment, with every character reference decoded.
fn fragment_text(input: &str) -> String {
    Html::parse_fragment(input)
        .root_element()
        .text()
        .collect()
}
