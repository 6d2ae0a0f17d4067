//! Lexical scanner for unresolved template markers in Markdown documents.
//!
//! Three kinds of findings:
//! - [`FindingKind::Placeholder`]: `<...>` tokens that are not HTML comments,
//!   autolinks or known HTML tags, plus literal `- ...` / `Label: ...`
//!   stand-ins. These are hard errors for the document validator.
//!   A `<` followed by a digit, space, `=` or `-` is prose (`<200ms`, `<-`).
//! - [`FindingKind::OpenTodo`]: `TODO`, `FIXME`, unchecked `- [ ]` items.
//! - [`FindingKind::PendingDecision`]: `TBD`, `TBC`, `???`.
//!
//! Fenced code blocks, inline code spans and HTML comments are never scanned.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Placeholder,
    OpenTodo,
    PendingDecision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// 1-indexed line number.
    pub line: usize,
    pub kind: FindingKind,
    pub text: String,
}

const HTML_TAGS: &[&str] = &[
    "a", "abbr", "article", "aside", "audio", "b", "big", "blockquote", "br", "caption",
    "center", "cite", "code", "col", "colgroup", "dd", "del", "details", "dfn", "div", "dl",
    "dt", "em", "figcaption", "figure", "font", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "i", "iframe", "img", "input", "ins", "kbd", "li", "main", "mark", "nav",
    "ol", "p", "picture", "pre", "q", "s", "samp", "section", "small", "source", "span",
    "strong", "sub", "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead", "time",
    "tr", "u", "ul", "var", "video", "wbr",
];

const BOOLEAN_ATTRS: &[&str] = &[
    "checked", "controls", "disabled", "hidden", "loop", "muted", "open", "readonly",
    "required", "selected",
];

static ANGLE_RE: OnceLock<Regex> = OnceLock::new();
static AUTOLINK_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();
static ATTR_RE: OnceLock<Regex> = OnceLock::new();
static LIST_STANDIN_RE: OnceLock<Regex> = OnceLock::new();
static LABEL_STANDIN_RE: OnceLock<Regex> = OnceLock::new();
static INLINE_CODE_RE: OnceLock<Regex> = OnceLock::new();
static TODO_RE: OnceLock<Regex> = OnceLock::new();
static DECISION_RE: OnceLock<Regex> = OnceLock::new();

fn angle_re() -> &'static Regex {
    ANGLE_RE.get_or_init(|| Regex::new(r"<([A-Za-z_/!?][^<>\n]*)?>").unwrap())
}

fn autolink_re() -> &'static Regex {
    AUTOLINK_RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]{1,31}:[^\s<>]*$").unwrap())
}

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[\w.+\-]+@[\w\-]+(\.[\w\-]+)+$").unwrap())
}

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"^(/?)([A-Za-z][A-Za-z0-9]*)((?:\s.*?)?)\s*(/?)$").unwrap())
}

fn attr_re() -> &'static Regex {
    ATTR_RE.get_or_init(|| {
        Regex::new(r#"^([A-Za-z_:][-A-Za-z0-9_:.]*)(\s*=\s*("[^"]*"|'[^']*'|[^\s"'=<>`]+))?"#)
            .unwrap()
    })
}

fn list_standin_re() -> &'static Regex {
    LIST_STANDIN_RE
        .get_or_init(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+(?:\.\.\.|…)\s*$").unwrap())
}

fn label_standin_re() -> &'static Regex {
    LABEL_STANDIN_RE.get_or_init(|| Regex::new(r"^\s*[^:\s][^:]*:\s*(?:\.\.\.|…)\s*$").unwrap())
}

fn inline_code_re() -> &'static Regex {
    INLINE_CODE_RE.get_or_init(|| Regex::new(r"`+[^`]*`+").unwrap())
}

fn todo_re() -> &'static Regex {
    TODO_RE.get_or_init(|| Regex::new(r"\b(?:TODO|FIXME)\b|^\s*[-*+]\s+\[ \]").unwrap())
}

fn decision_re() -> &'static Regex {
    DECISION_RE.get_or_init(|| Regex::new(r"\b(?:TBD|TBC)\b|\?\?\?").unwrap())
}

// ---------------------------------------------------------------------------
// Token classification
// ---------------------------------------------------------------------------

/// True when the text between `<` and `>` is an unresolved template slot.
pub fn is_placeholder_token(inner: &str) -> bool {
    let inner = inner.trim_end();
    if inner.is_empty() {
        return true;
    }
    if inner.starts_with('!') || inner.starts_with('?') {
        return false;
    }
    if autolink_re().is_match(inner) || email_re().is_match(inner) {
        return false;
    }
    !is_html_tag(inner)
}

fn is_html_tag(inner: &str) -> bool {
    let Some(caps) = tag_re().captures(inner) else {
        return false;
    };
    let closing = !caps[1].is_empty();
    let name = caps[2].to_ascii_lowercase();
    let attrs = caps[3].trim();
    let self_closing = !caps[4].is_empty();

    if !HTML_TAGS.contains(&name.as_str()) {
        return false;
    }
    if closing {
        return attrs.is_empty() && !self_closing;
    }
    attributes_look_real(attrs)
}

/// Bare words only count as attributes when they are boolean HTML attributes,
/// so `<a project name>` stays a placeholder while `<details open>` does not.
fn attributes_look_real(mut attrs: &str) -> bool {
    while !attrs.is_empty() {
        let Some(caps) = attr_re().captures(attrs) else {
            return false;
        };
        let name = caps[1].to_ascii_lowercase();
        let has_value = caps.get(2).is_some();
        if !has_value && !BOOLEAN_ATTRS.contains(&name.as_str()) {
            return false;
        }
        attrs = attrs[caps[0].len()..].trim_start();
    }
    true
}

// ---------------------------------------------------------------------------
// Fenced code
// ---------------------------------------------------------------------------

/// Tracks fenced code blocks line by line. A block only closes on the same
/// marker that opened it.
#[derive(Debug, Default)]
pub struct Fence {
    open: Option<&'static str>,
}

impl Fence {
    /// True when `line` is a fence delimiter or sits inside a block.
    pub fn is_code(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        if let Some(marker) = self.open {
            if trimmed.starts_with(marker) {
                self.open = None;
            }
            return true;
        }
        for marker in ["```", "~~~"] {
            if trimmed.starts_with(marker) {
                self.open = Some(marker);
                return true;
            }
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

pub fn scan(text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut fence = Fence::default();
    let mut in_comment = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        if fence.is_code(raw) {
            continue;
        }

        let visible = strip_comments(raw, &mut in_comment);
        let visible = inline_code_re().replace_all(&visible, " ");

        if list_standin_re().is_match(&visible) || label_standin_re().is_match(&visible) {
            findings.push(Finding {
                line: line_no,
                kind: FindingKind::Placeholder,
                text: visible.trim().to_string(),
            });
        }

        for m in angle_re().find_iter(&visible) {
            let token = m.as_str();
            if is_placeholder_token(&token[1..token.len() - 1]) {
                findings.push(Finding {
                    line: line_no,
                    kind: FindingKind::Placeholder,
                    text: token.to_string(),
                });
            }
        }

        if let Some(m) = todo_re().find(&visible) {
            findings.push(Finding {
                line: line_no,
                kind: FindingKind::OpenTodo,
                text: m.as_str().trim().to_string(),
            });
        }
        if let Some(m) = decision_re().find(&visible) {
            findings.push(Finding {
                line: line_no,
                kind: FindingKind::PendingDecision,
                text: m.as_str().to_string(),
            });
        }
    }

    findings
}

/// Drop `<!-- ... -->` regions, carrying an open comment across lines.
fn strip_comments(line: &str, in_comment: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        if *in_comment {
            match rest.find("-->") {
                Some(end) => {
                    rest = &rest[end + 3..];
                    *in_comment = false;
                }
                None => return out,
            }
        } else {
            match rest.find("<!--") {
                Some(start) => {
                    out.push_str(&rest[..start]);
                    rest = &rest[start + 4..];
                    *in_comment = true;
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
