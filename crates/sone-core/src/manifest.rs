//! Manifest generation
//!
//! A manifest is the directory a Sone publishes: relative paths mapped to
//! typed byte content. It is rendered from an `InsertSnapshot` and nothing
//! else, so building it needs no lock.
//!
//! ## Entries
//!
//! - `index.html`: human-readable page with profile, posts and replies
//! - `sone.json`: the `PublishedSone` view for machine consumption

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};

use crate::errors::Result;
use crate::model::{PublishedSone, Reply};
use crate::snapshot::InsertSnapshot;

pub const INDEX_HTML: &str = "index.html";
pub const SONE_JSON: &str = "sone.json";

const MIME_HTML: &str = "text/html; charset=utf-8";
const MIME_JSON: &str = "application/json";

/// One document of a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Relative path to document, ordered by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        path: impl Into<String>,
        mime_type: impl Into<String>,
        content: Vec<u8>,
    ) {
        self.entries.insert(
            path.into(),
            ManifestEntry {
                mime_type: mime_type.into(),
                content,
            },
        );
    }

    pub fn get(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &ManifestEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total payload size in bytes
    pub fn size(&self) -> usize {
        self.entries.values().map(|e| e.content.len()).sum()
    }
}

/// Render all documents for a snapshot
///
/// # Errors
///
/// Returns `SoneError::Serialization` if `sone.json` cannot be encoded.
pub fn build_manifest(snapshot: &InsertSnapshot) -> Result<Manifest> {
    let mut manifest = Manifest::new();
    manifest.insert(
        INDEX_HTML,
        MIME_HTML,
        render_index(&snapshot.content).into_bytes(),
    );
    manifest.insert(
        SONE_JSON,
        MIME_JSON,
        serde_json::to_vec_pretty(&snapshot.content)?,
    );
    Ok(manifest)
}

fn render_index(sone: &PublishedSone) -> String {
    let title = escape_html(&sone.name);
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n"
    );
    if let Some(full_name) = sone.profile.full_name() {
        html.push_str(&format!(
            "<p class=\"profile\">{}</p>\n",
            escape_html(&full_name)
        ));
    }
    html.push_str(&format!(
        "<p class=\"request-uri\">{}</p>\n",
        escape_html(&sone.request_uri.to_string())
    ));

    let mut posts: Vec<_> = sone.posts.iter().collect();
    posts.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| a.id.cmp(&b.id)));

    html.push_str("<div class=\"posts\">\n");
    for post in posts {
        html.push_str(&format!(
            "<div class=\"post\" id=\"post-{}\">\n<p class=\"time\">{}</p>\n<p class=\"text\">{}</p>\n",
            escape_html(&post.id),
            format_time(post.time),
            escape_html(&post.text)
        ));
        let mut replies: Vec<&Reply> = sone
            .replies
            .iter()
            .filter(|r| r.post_id == post.id)
            .collect();
        replies.sort_by_key(|r| r.time);
        for reply in replies {
            html.push_str(&format!(
                "<div class=\"reply\" id=\"reply-{}\"><p class=\"time\">{}</p><p class=\"text\">{}</p></div>\n",
                escape_html(&reply.id),
                format_time(reply.time),
                escape_html(&reply.text)
            ));
        }
        html.push_str("</div>\n");
    }
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn format_time(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
