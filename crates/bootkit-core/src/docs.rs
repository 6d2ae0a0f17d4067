//! Stage A: structural checks over the requirement document set.

use crate::fs::ProjectFs;
use crate::placeholder::{self, Fence, FindingKind};
use crate::report::{Strictness, ValidationReport};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy)]
pub struct RequiredDoc {
    pub file: &'static str,
    pub headings: &'static [&'static str],
}

pub const REQUIRED_DOCS: &[RequiredDoc] = &[
    RequiredDoc {
        file: "requirements.md",
        headings: &["Overview", "Users", "Functional Requirements", "Acceptance Criteria"],
    },
    RequiredDoc {
        file: "non-functional-requirements.md",
        headings: &["Performance", "Security", "Reliability", "Observability"],
    },
    RequiredDoc {
        file: "domain-glossary.md",
        headings: &["Terms"],
    },
    RequiredDoc {
        file: "risks-and-open-questions.md",
        headings: &["Risks", "Open Questions", "Decisions"],
    },
];

/// Result of checking the document set.
#[derive(Debug, Clone)]
pub struct DocCheck {
    pub report: ValidationReport,
    /// Requirement ids (`FR-1`, `NFR-2`, ...) found across the documents.
    pub requirement_ids: BTreeSet<String>,
}

static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static NUMBERING_RE: OnceLock<Regex> = OnceLock::new();
static REQ_ID_RE: OnceLock<Regex> = OnceLock::new();

fn heading_re() -> &'static Regex {
    HEADING_RE.get_or_init(|| Regex::new(r"^\s{0,3}#{1,6}\s+(.+?)\s*#*\s*$").unwrap())
}

fn numbering_re() -> &'static Regex {
    NUMBERING_RE.get_or_init(|| Regex::new(r"^\d+(?:\.\d+)*\.?\s+").unwrap())
}

fn req_id_re() -> &'static Regex {
    REQ_ID_RE.get_or_init(|| Regex::new(r"\b(?:FR|NFR)-\d+\b").unwrap())
}

fn normalize_heading(text: &str) -> String {
    let text = numbering_re().replace(text.trim(), "");
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// ATX headings outside fenced code, normalized for comparison.
pub fn headings(text: &str) -> BTreeSet<String> {
    let mut fence = Fence::default();
    let mut found = BTreeSet::new();
    for line in text.lines() {
        if fence.is_code(line) {
            continue;
        }
        if let Some(caps) = heading_re().captures(line) {
            found.insert(normalize_heading(&caps[1]));
        }
    }
    found
}

pub fn requirement_ids(text: &str) -> BTreeSet<String> {
    req_id_re()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Check every required document under `docs_dir`. Never fails: unreadable or
/// missing files are reported as errors.
pub fn check_docs(fs: &dyn ProjectFs, docs_dir: &Path, strictness: Strictness) -> DocCheck {
    let mut report = ValidationReport::new(strictness);
    let mut ids = BTreeSet::new();

    for doc in REQUIRED_DOCS {
        let rel = docs_dir.join(doc.file);
        let text = match fs.read(&rel) {
            Ok(Some(text)) => text,
            Ok(None) => {
                report.error(format!("{}: missing required document", doc.file));
                continue;
            }
            Err(e) => {
                report.error(format!("{}: cannot read ({e})", doc.file));
                continue;
            }
        };

        let present = headings(&text);
        for heading in doc.headings {
            if !present.contains(&normalize_heading(heading)) {
                report.error(format!("{}: missing required heading '{heading}'", doc.file));
            }
        }

        for finding in placeholder::scan(&text) {
            match finding.kind {
                FindingKind::Placeholder => report.error(format!(
                    "{}:{}: unresolved placeholder {}",
                    doc.file, finding.line, finding.text
                )),
                FindingKind::OpenTodo => report.warn(format!(
                    "{}:{}: open TODO marker ({})",
                    doc.file, finding.line, finding.text
                )),
                FindingKind::PendingDecision => report.warn(format!(
                    "{}:{}: unresolved decision marker ({})",
                    doc.file, finding.line, finding.text
                )),
            }
        }

        ids.extend(requirement_ids(&text));
    }

    tracing::debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "checked requirement documents"
    );

    DocCheck {
        report,
        requirement_ids: ids,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// A complete, valid document set rooted at `docs/requirements`.
#[cfg(test)]
pub(crate) fn complete_doc_set() -> crate::fs::MemFs {
    crate::fs::MemFs::new()
        .with_file(
            "docs/requirements/requirements.md",
            "# Requirements\n\n## Overview\nInvoice tracker.\n\n## Users\nAccountants.\n\n\
             ## Functional Requirements\n- FR-1: create invoices\n- FR-2: export CSV\n\n\
             ## Acceptance Criteria\nAll FRs demoed.\n",
        )
        .with_file(
            "docs/requirements/non-functional-requirements.md",
            "## 1. Performance\nNFR-1: p95 under 200ms\n## 2. Security\nSSO only.\n\
             ## 3. Reliability\n99.9%\n## 4. Observability\nStructured logs.\n",
        )
        .with_file(
            "docs/requirements/domain-glossary.md",
            "# Glossary\n## Terms\n- Invoice: a bill.\n",
        )
        .with_file(
            "docs/requirements/risks-and-open-questions.md",
            "## Risks\nVendor lock-in.\n## Open Questions\nNone.\n## Decisions\nPostgres.\n",
        )
}
