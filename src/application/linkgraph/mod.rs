use std::collections::HashSet;

use comrak::nodes::{AstNode, NodeValue};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::linkgraph_repository::LinkGraphRepository;
use crate::domain::documents::document::LinkEdge;

/// Absolute internal references look like `/docs/team/page`.
pub const INTERNAL_LINK_PREFIX: &str = "/docs/";
/// Optional file suffix on internal references (`team/page.md`).
pub const DOCUMENT_SUFFIX: &str = ".md";

static WIKI_LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!?\[\[([^\[\]|]+)(?:\|([^\[\]]+))?\]\]").unwrap());
static SCHEME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

/// Ordered, de-duplicated normalized paths referenced by `markdown`.
///
/// Markdown links and `[[wiki]]` references count; images, code, raw HTML
/// and anything with a URL scheme or a network-path prefix do not.
pub fn extract_link_paths(markdown: &str, source_path: &str) -> Vec<String> {
    let arena = comrak::Arena::new();
    let mut opts = comrak::ComrakOptions::default();
    opts.extension.table = true;
    opts.extension.strikethrough = true;
    opts.extension.tasklist = true;
    let root = comrak::parse_document(&arena, markdown, &opts);

    let mut raw = Vec::new();
    collect_references(root, &mut raw);

    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|r| normalize_link_path(r, source_path))
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

enum Step {
    Text(String),
    Link(String),
    Skip,
    Descend,
}

fn collect_references<'a>(node: &'a AstNode<'a>, out: &mut Vec<String>) {
    // Adjacent text nodes are buffered so a `[[...]]` split by the parser
    // at the brackets is still seen whole.
    let mut text = String::new();
    for child in node.children() {
        let step = match &child.data.borrow().value {
            NodeValue::Text(t) => Step::Text(t.clone()),
            NodeValue::Link(link) => Step::Link(link.url.clone()),
            NodeValue::Image(_)
            | NodeValue::Code(_)
            | NodeValue::CodeBlock(_)
            | NodeValue::HtmlBlock(_)
            | NodeValue::HtmlInline(_) => Step::Skip,
            _ => Step::Descend,
        };
        match step {
            Step::Text(t) => {
                text.push_str(&t);
                continue;
            }
            Step::Link(url) => {
                flush_wiki_refs(&mut text, out);
                out.push(url);
            }
            Step::Skip => flush_wiki_refs(&mut text, out),
            Step::Descend => {
                flush_wiki_refs(&mut text, out);
                collect_references(child, out);
            }
        }
    }
    flush_wiki_refs(&mut text, out);
}

fn flush_wiki_refs(text: &mut String, out: &mut Vec<String>) {
    if text.contains("[[") {
        for cap in WIKI_LINK_REGEX.captures_iter(text) {
            out.push(cap[1].trim().to_string());
        }
    }
    text.clear();
}

/// Maps one raw reference to a tenant-relative document path.
///
/// `/docs/` prefixed references are absolute. A reference with neither the
/// prefix nor any `/` (a bare name such as `sibling`) is resolved against the
/// directory of `source_path`, as are explicit `./` and `../` references.
/// Anything else containing a `/` is taken from the root.
pub fn normalize_link_path(raw: &str, source_path: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') || raw.starts_with("//") || SCHEME_REGEX.is_match(raw)
    {
        return None;
    }
    let cut = raw.find(['#', '?']).unwrap_or(raw.len());
    let target = urlencoding::decode(&raw[..cut])
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| raw[..cut].to_string());

    let relative = !target.starts_with(INTERNAL_LINK_PREFIX)
        && (target.starts_with("./") || target.starts_with("../") || !target.contains('/'));
    let rest = target.strip_prefix(INTERNAL_LINK_PREFIX).unwrap_or(&target);
    let rest = rest.strip_suffix(DOCUMENT_SUFFIX).unwrap_or(rest);

    let base = if relative {
        parent_dir(source_path)
    } else {
        ""
    };
    resolve_segments(base, rest)
}

/// Canonical form of a document's own path: no leading slash, no `.md`,
/// `.`/`..` resolved. None when nothing is left.
pub fn normalize_document_path(path: &str) -> Option<String> {
    let path = path.trim();
    let path = path.strip_suffix(DOCUMENT_SUFFIX).unwrap_or(path);
    resolve_segments("", path)
}

fn parent_dir(path: &str) -> &str {
    let path = path.trim().trim_start_matches('/');
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

fn resolve_segments(base: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for seg in base.split('/').chain(rel.split('/')) {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Replaces the outbound edges of one document with a fresh set derived from
/// `markdown`, the body of `revision_id`. Running it again on the same input
/// yields the same edges.
///
/// Returns None without touching the graph when `revision_id` is no longer
/// current: a newer save owns the edges and rebuilds them itself.
pub async fn rebuild_links<R: LinkGraphRepository + ?Sized>(
    repo: &R,
    tenant_id: Uuid,
    from_document_id: Uuid,
    from_document_path: &str,
    revision_id: Uuid,
    markdown: &str,
) -> anyhow::Result<Option<Vec<LinkEdge>>> {
    let paths = extract_link_paths(markdown, from_document_path);
    let mut edges = Vec::with_capacity(paths.len());
    for link_path in paths {
        let target = repo.find_document_id_by_path(tenant_id, &link_path).await?;
        edges.push(LinkEdge {
            tenant_id,
            from_document_id,
            to_document_id: target,
            broken: target.is_none(),
            link_path,
        });
    }
    if !repo
        .replace_outbound(tenant_id, from_document_id, revision_id, &edges)
        .await?
    {
        debug!(
            %tenant_id,
            document_id = %from_document_id,
            %revision_id,
            "links_rebuild_superseded"
        );
        return Ok(None);
    }
    debug!(
        %tenant_id,
        document_id = %from_document_id,
        %revision_id,
        edges = edges.len(),
        broken = edges.iter().filter(|e| e.broken).count(),
        "links_rebuilt"
    );
    Ok(Some(edges))
}

/// Flags every edge pointing at `path` as broken after a rename or delete.
/// Edges are repaired the next time their source document is saved.
pub async fn mark_path_broken<R: LinkGraphRepository + ?Sized>(
    repo: &R,
    tenant_id: Uuid,
    path: &str,
) -> anyhow::Result<u64> {
    let Some(path) = normalize_document_path(path) else {
        return Ok(0);
    };
    let touched = repo.mark_path_broken(tenant_id, &path).await?;
    debug!(%tenant_id, path = %path, touched, "link_path_marked_broken");
    Ok(touched)
}
