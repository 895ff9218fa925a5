use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::application::ports::entity_lookup::{EntityKind, EntityLookup, EntitySummary};

static SHORTCODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\{\{\s*(system|incident|checklist)\s*:\s*([^{}<>]*?)\s*\}\}").unwrap()
});
static SHORTCODE_START_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{\{\s*(?:system|incident|checklist)\s*:").unwrap());
// A token opened at the end of a text run and not yet closed.
static OPEN_TOKEN_TAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{\{\s*(?:system|incident|checklist)\s*:[^{}]*$").unwrap());

/// How many chunks past its opening a split token may reach for its `}}`.
const MAX_SPLIT_CHUNKS: usize = 16;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResolvedHtml {
    pub html: String,
    /// Occurrences replaced with a live entity block.
    pub resolved: usize,
    /// Occurrences replaced with a not-found marker.
    pub missing: usize,
    /// Kinds whose batch lookup errored; all of their tokens count as missing.
    pub failed_kinds: Vec<EntityKind>,
}

/// Replaces `{{kind:uuid}}` tokens in sanitized HTML with escaped entity
/// blocks, loading each kind once per call.
#[derive(Clone)]
pub struct ShortcodeResolver {
    lookup: Arc<dyn EntityLookup>,
}

fn parse_token(cap: &Captures<'_>) -> Option<(EntityKind, Option<Uuid>)> {
    let kind = EntityKind::parse(&cap[1])?;
    Some((kind, Uuid::parse_str(&cap[2]).ok()))
}

// Braces are escaped too, so substituted fields can never form a new token.
fn escape_text(s: &str) -> String {
    htmlescape::encode_minimal(s)
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}

fn render_block(kind: EntityKind, entity: &EntitySummary) -> String {
    let mut html = format!(
        "<span class=\"shortcode shortcode-{}\" data-entity-id=\"{}\">\
         <span class=\"shortcode-kind\">{}</span> <span class=\"shortcode-name\">{}</span>",
        kind.as_str(),
        entity.id,
        kind.label(),
        escape_text(&entity.name)
    );
    if let Some(status) = entity.status.as_deref().filter(|s| !s.is_empty()) {
        html.push_str(&format!(
            " <span class=\"shortcode-status\">{}</span>",
            escape_text(status)
        ));
    }
    if let Some(detail) = entity.detail.as_deref().filter(|s| !s.is_empty()) {
        html.push_str(&format!(
            " <span class=\"shortcode-detail\">{}</span>",
            escape_text(detail)
        ));
    }
    html.push_str("</span>");
    html
}

fn render_missing(kind: EntityKind) -> String {
    format!(
        "<span class=\"shortcode shortcode-missing\" data-entity-kind=\"{}\">{} not found</span>",
        kind.as_str(),
        kind.label()
    )
}

#[derive(Debug, Clone, PartialEq)]
enum Chunk {
    Tag(String),
    Text(String),
}

impl Chunk {
    fn as_str(&self) -> &str {
        match self {
            Chunk::Tag(s) | Chunk::Text(s) => s,
        }
    }
}

/// Byte offset just past the `>` closing the tag that starts `s`. Quoted
/// attribute values may contain `>`.
fn tag_end(s: &str) -> usize {
    let mut quote: Option<u8> = None;
    for (i, b) in s.bytes().enumerate().skip(1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return i + 1,
                _ => {}
            },
        }
    }
    s.len()
}

fn split_chunks(html: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut rest = html;
    while !rest.is_empty() {
        match rest.find('<') {
            Some(0) => {
                let end = tag_end(rest);
                chunks.push(Chunk::Tag(rest[..end].to_string()));
                rest = &rest[end..];
            }
            Some(i) => {
                chunks.push(Chunk::Text(rest[..i].to_string()));
                rest = &rest[i..];
            }
            None => {
                chunks.push(Chunk::Text(rest.to_string()));
                rest = "";
            }
        }
    }
    chunks
}

// (chunk index, byte offset past `}}`) of the first text run that closes a
// token opened before `chunks`.
fn find_token_close(chunks: &[Chunk]) -> Option<(usize, usize)> {
    for (j, chunk) in chunks.iter().enumerate().take(MAX_SPLIT_CHUNKS) {
        if let Chunk::Text(text) = chunk {
            match text.find(['{', '}']) {
                Some(k) if text[k..].starts_with("}}") => return Some((j, k + 2)),
                Some(_) => return None,
                None => {}
            }
        }
    }
    None
}

/// Rejoins tokens that inline markup split across text runs, such as
/// `{{system:<em>x</em>}}`. The token text is merged into one run and the
/// tags it spanned follow it, so open/close pairs stay balanced.
fn join_split_tokens(mut chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut out = Vec::with_capacity(chunks.len());
    let mut i = 0;
    while i < chunks.len() {
        let close = match &chunks[i] {
            Chunk::Text(text) if OPEN_TOKEN_TAIL_REGEX.is_match(text) => {
                find_token_close(&chunks[i + 1..])
            }
            _ => None,
        };
        let Some((offset, end)) = close else {
            out.push(chunks[i].clone());
            i += 1;
            continue;
        };
        let last = i + 1 + offset;
        let mut merged = chunks[i].as_str().to_string();
        let mut spanned_tags = Vec::new();
        for chunk in &chunks[i + 1..last] {
            match chunk {
                Chunk::Text(text) => merged.push_str(text),
                Chunk::Tag(_) => spanned_tags.push(chunk.clone()),
            }
        }
        let tail = chunks[last].as_str().to_string();
        merged.push_str(&tail[..end]);
        out.push(Chunk::Text(merged));
        out.extend(spanned_tags);
        // The remainder may open another token, so it goes round again.
        chunks[last] = Chunk::Text(tail[end..].to_string());
        i = last;
    }
    out
}

impl ShortcodeResolver {
    pub fn new(lookup: Arc<dyn EntityLookup>) -> Self {
        Self { lookup }
    }

    pub async fn resolve(&self, tenant_id: Uuid, html: &str) -> ResolvedHtml {
        if !SHORTCODE_START_REGEX.is_match(html) {
            return ResolvedHtml {
                html: html.to_string(),
                resolved: 0,
                missing: 0,
                failed_kinds: Vec::new(),
            };
        }
        let chunks = join_split_tokens(split_chunks(html));

        // Pass 1: distinct ids per kind
        let mut wanted: BTreeMap<EntityKind, BTreeSet<Uuid>> = BTreeMap::new();
        for chunk in &chunks {
            for cap in SHORTCODE_REGEX.captures_iter(chunk.as_str()) {
                if let Some((kind, Some(id))) = parse_token(&cap) {
                    wanted.entry(kind).or_default().insert(id);
                }
            }
        }

        // Pass 2: one batch call per kind
        let mut loaded: HashMap<EntityKind, HashMap<Uuid, EntitySummary>> = HashMap::new();
        let mut failed_kinds = Vec::new();
        for (kind, ids) in wanted {
            let ids: Vec<Uuid> = ids.into_iter().collect();
            match self.lookup.batch_load(tenant_id, kind, &ids).await {
                Ok(map) => {
                    loaded.insert(kind, map);
                }
                Err(e) => {
                    warn!(
                        %tenant_id,
                        kind = kind.as_str(),
                        ids = ids.len(),
                        error = ?e,
                        "shortcode_batch_load_failed"
                    );
                    failed_kinds.push(kind);
                }
            }
        }

        // Pass 3: substitute from the preloaded maps. Inside a tag only
        // escaped plain text is written.
        let mut resolved = 0usize;
        let mut missing = 0usize;
        let mut out = String::with_capacity(html.len());
        for chunk in &chunks {
            let in_tag = matches!(chunk, Chunk::Tag(_));
            let replaced = SHORTCODE_REGEX.replace_all(chunk.as_str(), |cap: &Captures<'_>| {
                let Some((kind, id)) = parse_token(cap) else {
                    return cap[0].to_string();
                };
                let hit = id.and_then(|id| loaded.get(&kind).and_then(|m| m.get(&id)));
                match (hit, in_tag) {
                    (Some(entity), false) => {
                        resolved += 1;
                        render_block(kind, entity)
                    }
                    (Some(entity), true) => {
                        resolved += 1;
                        htmlescape::encode_attribute(&entity.name)
                    }
                    (None, false) => {
                        missing += 1;
                        render_missing(kind)
                    }
                    (None, true) => {
                        missing += 1;
                        format!("{} not found", kind.label())
                    }
                }
            });
            out.push_str(&replaced);
        }

        ResolvedHtml {
            html: out,
            resolved,
            missing,
            failed_kinds,
        }
    }
}
