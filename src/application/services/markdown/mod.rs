use std::cell::RefCell;

use comrak::nodes::{Ast, AstNode, LineColumn, NodeValue};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::application::linkgraph::{INTERNAL_LINK_PREFIX, normalize_link_path};

pub const DEFAULT_MAX_SOURCE_BYTES: usize = 2 * 1024 * 1024;

static WIKI_LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]|]+)(?:\|([^\[\]]+))?\]\]").unwrap());

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RenderOptions {
    /// Tables, strikethrough, autolinks and task lists.
    pub gfm: bool,
    /// Emit data-sourcepos for editor<->preview sync
    pub sourcepos: bool,
    pub max_source_bytes: usize,
    /// Path of the document being rendered. When set, internal links are
    /// rewritten to canonical `/docs/...` hrefs resolved against it.
    pub document_path: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            sourcepos: false,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            document_path: None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("markdown source is {len} bytes, limit is {limit}")]
    TooLarge { len: usize, limit: usize },
    #[error("failed to format html")]
    Format(#[source] std::io::Error),
    #[error("rendered html is not valid utf-8")]
    Utf8(#[source] std::string::FromUtf8Error),
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RenderedHtml {
    pub html: String,
    pub hash: String,
}

/// Markdown to sanitized HTML. Holds only its default options; every call
/// builds its own parser arena and sanitizer.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    defaults: RenderOptions,
}

impl MarkdownRenderer {
    pub fn new(defaults: RenderOptions) -> Self {
        Self { defaults }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.defaults
    }

    pub fn render(&self, text: &str) -> Result<RenderedHtml, RenderError> {
        render(text, &self.defaults)
    }

    pub fn render_document(
        &self,
        text: &str,
        document_path: &str,
    ) -> Result<RenderedHtml, RenderError> {
        let opts = RenderOptions {
            document_path: Some(document_path.to_string()),
            ..self.defaults.clone()
        };
        render(text, &opts)
    }
}

fn sha256_hex(s: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let out = hasher.finalize();
    format!("{:x}", out)
}

fn new_node<'a>(
    arena: &'a comrak::Arena<AstNode<'a>>,
    value: NodeValue,
) -> &'a AstNode<'a> {
    arena.alloc(AstNode::new(RefCell::new(Ast::new(
        value,
        LineColumn { line: 1, column: 1 },
    ))))
}

fn inside_link<'a>(node: &'a AstNode<'a>) -> bool {
    node.ancestors()
        .skip(1)
        .any(|a| matches!(a.data.borrow().value, NodeValue::Link(_) | NodeValue::Image(_)))
}

/// Folds following text siblings into `node` so bracketed references split
/// by the parser are matched as one string.
fn merge_text_siblings<'a>(node: &'a AstNode<'a>) {
    while let Some(next) = node.next_sibling() {
        let text = match &next.data.borrow().value {
            NodeValue::Text(t) => t.clone(),
            _ => break,
        };
        if let NodeValue::Text(ref mut cur) = node.data.borrow_mut().value {
            cur.push_str(&text);
        }
        next.detach();
    }
}

fn expand_wiki_links<'a>(
    arena: &'a comrak::Arena<AstNode<'a>>,
    node: &'a AstNode<'a>,
    document_path: &str,
) {
    let text = match &node.data.borrow().value {
        NodeValue::Text(t) if t.contains("[[") => t.clone(),
        _ => return,
    };
    let mut last = 0usize;
    let mut changed = false;
    for cap in WIKI_LINK_REGEX.captures_iter(&text) {
        let Some(whole) = cap.get(0) else { continue };
        let target = cap[1].trim();
        let Some(path) = normalize_link_path(target, document_path) else {
            continue;
        };
        let label = cap.get(2).map(|m| m.as_str().trim()).unwrap_or(target);
        if whole.start() > last {
            node.insert_before(new_node(
                arena,
                NodeValue::Text(text[last..whole.start()].to_string()),
            ));
        }
        let html = format!(
            "<a href=\"{}{}\" class=\"wikilink\">{}</a>",
            INTERNAL_LINK_PREFIX,
            htmlescape::encode_minimal(&path),
            htmlescape::encode_minimal(label)
        );
        node.insert_before(new_node(arena, NodeValue::HtmlInline(html)));
        last = whole.end();
        changed = true;
    }
    if !changed {
        return;
    }
    if last < text.len() {
        node.insert_before(new_node(arena, NodeValue::Text(text[last..].to_string())));
    }
    node.detach();
}

pub fn render(text: &str, opts: &RenderOptions) -> Result<RenderedHtml, RenderError> {
    if text.len() > opts.max_source_bytes {
        return Err(RenderError::TooLarge {
            len: text.len(),
            limit: opts.max_source_bytes,
        });
    }

    let mut c_opts = comrak::ComrakOptions::default();
    c_opts.parse.smart = false;
    if opts.gfm {
        c_opts.extension.table = true;
        c_opts.extension.autolink = true;
        c_opts.extension.strikethrough = true;
        c_opts.extension.tasklist = true;
        c_opts.extension.tagfilter = false;
        c_opts.render.github_pre_lang = true;
    }
    c_opts.render.sourcepos = opts.sourcepos;
    // Raw HTML passes through here and is cleaned by ammonia below
    c_opts.render.unsafe_ = true;

    let arena = comrak::Arena::new();
    let root = comrak::parse_document(&arena, text, &c_opts);
    let document_path = opts.document_path.as_deref().unwrap_or("");

    let nodes: Vec<&AstNode> = root.descendants().collect();
    for node in nodes {
        // Detached by an earlier merge
        if node.parent().is_none() {
            continue;
        }
        if opts.document_path.is_some() {
            if let NodeValue::Link(ref mut link) = node.data.borrow_mut().value {
                if let Some(path) = normalize_link_path(&link.url, document_path) {
                    let fragment = link.url.find('#').map(|i| link.url[i..].to_string());
                    link.url = format!(
                        "{}{}{}",
                        INTERNAL_LINK_PREFIX,
                        path,
                        fragment.unwrap_or_default()
                    );
                }
                continue;
            }
        }
        let is_text = matches!(node.data.borrow().value, NodeValue::Text(_));
        if is_text && !inside_link(node) {
            merge_text_siblings(node);
            expand_wiki_links(&arena, node, document_path);
        }
    }

    let mut html = Vec::new();
    comrak::format_html(root, &c_opts, &mut html).map_err(RenderError::Format)?;
    let html = String::from_utf8(html).map_err(RenderError::Utf8)?;

    let mut builder = ammonia::Builder::default();
    builder.add_generic_attributes(["class", "id", "title", "data-sourcepos"]);
    builder.add_tags(["pre", "code", "span", "input"]);
    builder.add_tag_attributes("input", ["type", "checked", "disabled"]);
    // Relative hrefs such as /docs/... and #anchors stay as written
    builder.url_relative(ammonia::UrlRelative::PassThrough);
    builder.link_rel(Some("noopener noreferrer"));
    let safe_html = builder.clean(&html).to_string();

    let canon = format!(
        "{}\n{}|{}|{}|{}",
        text,
        opts.gfm,
        opts.sourcepos,
        opts.max_source_bytes,
        document_path
    );

    Ok(RenderedHtml {
        html: safe_html,
        hash: sha256_hex(&canon),
    })
}
