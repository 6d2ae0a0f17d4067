//! Stage B: the blueprint decision record and its validator.
//!
//! Validation walks the raw JSON so malformed input turns into report
//! entries instead of deserialization failures. Only a blueprint without
//! errors is handed to the planners as a typed [`Blueprint`].

use crate::error::{BootkitError, Result};
use crate::fs::ProjectFs;
use crate::packs;
use crate::report::{Strictness, ValidationReport};
use crate::types::{Capability, Layout};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

// ---------------------------------------------------------------------------
// Blueprint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoInfo {
    #[serde(default)]
    pub layout: String,
    #[serde(default)]
    pub language: String,
}

/// A capability is either a plain flag or an object with `enabled` plus
/// detail fields (`framework`, `engine`, `style`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilitySpec {
    Flag(bool),
    Detailed {
        #[serde(default)]
        enabled: bool,
        #[serde(flatten)]
        details: Map<String, Value>,
    },
}

impl CapabilitySpec {
    pub fn enabled(&self) -> bool {
        match self {
            CapabilitySpec::Flag(b) => *b,
            CapabilitySpec::Detailed { enabled, .. } => *enabled,
        }
    }

    pub fn detail(&self, field: &str) -> Option<&str> {
        match self {
            CapabilitySpec::Flag(_) => None,
            CapabilitySpec::Detailed { details, .. } => details
                .get(field)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend: Option<CapabilitySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<CapabilitySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<CapabilitySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<CapabilitySpec>,
}

impl Capabilities {
    pub fn get(&self, cap: Capability) -> Option<&CapabilitySpec> {
        match cap {
            Capability::Frontend => self.frontend.as_ref(),
            Capability::Backend => self.backend.as_ref(),
            Capability::Database => self.database.as_ref(),
            Capability::Api => self.api.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quality {
    #[serde(default)]
    pub testing: bool,
    #[serde(default)]
    pub ci: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_target: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Skills {
    #[serde(default)]
    pub packs: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub repo: RepoInfo,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub skills: Skills,
}

impl Blueprint {
    pub fn enabled(&self, cap: Capability) -> bool {
        self.capabilities
            .get(cap)
            .map(CapabilitySpec::enabled)
            .unwrap_or(false)
    }

    pub fn enabled_capabilities(&self) -> Vec<Capability> {
        Capability::all()
            .iter()
            .copied()
            .filter(|&c| self.enabled(c))
            .collect()
    }

    /// Layout of a validated blueprint. Unvalidated input falls back to single.
    pub fn layout(&self) -> Layout {
        Layout::parse(&self.repo.layout).unwrap_or(Layout::Single)
    }

    /// Read, validate and return the blueprint, refusing one with errors.
    pub fn load(fs: &dyn ProjectFs, path: &Path) -> Result<Self> {
        let text = read_blueprint(fs, path)?;
        let check = validate_text(&text, None);
        match check.blueprint {
            Some(bp) if check.report.errors.is_empty() => Ok(bp),
            _ => Err(BootkitError::BlueprintInvalid {
                path: path.to_path_buf(),
                reason: check.report.summary(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BlueprintCheck {
    pub report: ValidationReport,
    /// Present when the document had no structural errors.
    pub blueprint: Option<Blueprint>,
}

/// Missing blueprint is fatal; everything else is reported by [`validate_text`].
pub fn read_blueprint(fs: &dyn ProjectFs, path: &Path) -> Result<String> {
    fs.read(path)?
        .ok_or_else(|| BootkitError::BlueprintMissing(path.to_path_buf()))
}

pub fn check_blueprint(
    fs: &dyn ProjectFs,
    path: &Path,
    language: Option<&str>,
) -> Result<BlueprintCheck> {
    let text = read_blueprint(fs, path)?;
    Ok(validate_text(&text, language))
}

/// Validate blueprint JSON. `language` is the pipeline's chosen language,
/// compared against `repo.language` when set.
pub fn validate_text(text: &str, language: Option<&str>) -> BlueprintCheck {
    let mut report = ValidationReport::new(Strictness::Lenient);

    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            report.error(format!("blueprint is not valid JSON: {e}"));
            return BlueprintCheck {
                report,
                blueprint: None,
            };
        }
    };
    let Some(root) = value.as_object() else {
        report.error("blueprint must be a JSON object");
        return BlueprintCheck {
            report,
            blueprint: None,
        };
    };

    check_structure(root, &mut report);
    check_capabilities(root, &mut report);
    check_quality(root, &mut report);

    if let Some(lang) = language {
        let declared = str_at(root, &["repo", "language"]).unwrap_or("");
        if !declared.trim().is_empty() && !declared.trim().eq_ignore_ascii_case(lang) {
            report.warn(format!(
                "repo.language '{declared}' differs from the pipeline language '{lang}'"
            ));
        }
    }

    if !report.errors.is_empty() {
        return BlueprintCheck {
            report,
            blueprint: None,
        };
    }

    let blueprint: Blueprint = match serde_json::from_value(value) {
        Ok(bp) => bp,
        Err(e) => {
            report.error(format!("blueprint has a field of the wrong type: {e}"));
            return BlueprintCheck {
                report,
                blueprint: None,
            };
        }
    };

    check_packs(&blueprint, &mut report);

    BlueprintCheck {
        report,
        blueprint: Some(blueprint),
    }
}

fn str_at<'a>(root: &'a Map<String, Value>, path: &[&str]) -> Option<&'a str> {
    let mut node = root.get(path[0])?;
    for key in &path[1..] {
        node = node.as_object()?.get(*key)?;
    }
    node.as_str()
}

fn require_text(root: &Map<String, Value>, path: &[&str], report: &mut ValidationReport) {
    let dotted = path.join(".");
    match str_at(root, path) {
        Some(s) if !s.trim().is_empty() => {}
        Some(_) => report.error(format!("{dotted} must not be empty")),
        None => report.error(format!("{dotted} is required and must be a string")),
    }
}

fn check_structure(root: &Map<String, Value>, report: &mut ValidationReport) {
    match root.get("version").and_then(Value::as_u64) {
        Some(v) if v >= 1 => {}
        _ => report.error("version must be a positive integer"),
    }

    require_text(root, &["project", "name"], report);
    require_text(root, &["project", "description"], report);

    match str_at(root, &["repo", "layout"]) {
        Some(layout) if Layout::parse(layout).is_some() => {}
        Some(layout) => report.error(format!(
            "repo.layout '{layout}' is invalid: expected 'single' or 'monorepo'"
        )),
        None => report.error("repo.layout is required: expected 'single' or 'monorepo'"),
    }
    require_text(root, &["repo", "language"], report);

    if let Some(skills) = root.get("skills") {
        let Some(skills) = skills.as_object() else {
            report.error("skills must be an object");
            return;
        };
        if let Some(packs) = skills.get("packs") {
            let all_strings = packs
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string));
            if !all_strings {
                report.error("skills.packs must be a list of strings");
            }
        }
    }
}

fn check_capabilities(root: &Map<String, Value>, report: &mut ValidationReport) {
    let Some(caps) = root.get("capabilities") else {
        return;
    };
    let Some(caps) = caps.as_object() else {
        report.error("capabilities must be an object");
        return;
    };

    for key in caps.keys() {
        if !Capability::all().iter().any(|c| c.key() == key) {
            report.warn(format!("unknown capability '{key}' is ignored"));
        }
    }

    let enabled = |cap: Capability| -> bool {
        match caps.get(cap.key()) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Object(o)) => o.get("enabled").and_then(Value::as_bool).unwrap_or(false),
            _ => false,
        }
    };

    for &cap in Capability::all() {
        let key = cap.key();
        let field = cap.detail_field();
        match caps.get(key) {
            None | Some(Value::Bool(_)) => {}
            Some(Value::Object(obj)) => {
                if let Some(flag) = obj.get("enabled") {
                    if !flag.is_boolean() {
                        report.error(format!("capabilities.{key}.enabled must be a boolean"));
                        continue;
                    }
                }
                let detail = obj
                    .get(field)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty());
                match (enabled(cap), detail) {
                    (false, Some(d)) => report.warn(format!(
                        "capabilities.{key}.{field} is '{d}' but the capability is disabled"
                    )),
                    (true, None) if cap != Capability::Api => report.warn(format!(
                        "capabilities.{key} is enabled but {field} is not set"
                    )),
                    _ => {}
                }
            }
            Some(_) => report.error(format!(
                "capabilities.{key} must be a boolean or an object"
            )),
        }
    }

    if enabled(Capability::Api) && !enabled(Capability::Backend) {
        report.warn("capabilities.api is enabled without capabilities.backend");
    }
}

fn check_quality(root: &Map<String, Value>, report: &mut ValidationReport) {
    let Some(quality) = root.get("quality") else {
        return;
    };
    let Some(quality) = quality.as_object() else {
        report.error("quality must be an object");
        return;
    };
    for flag in ["testing", "ci"] {
        if quality.get(flag).is_some_and(|v| !v.is_boolean()) {
            report.error(format!("quality.{flag} must be a boolean"));
        }
    }
    match quality.get("coverageTarget") {
        None | Some(Value::Null) => {}
        Some(Value::Number(n)) => {
            let target = n.as_f64().unwrap_or_default();
            if !(0.0..=100.0).contains(&target) {
                report.warn(format!(
                    "quality.coverageTarget {target} is outside 0..=100"
                ));
            }
        }
        Some(_) => report.error("quality.coverageTarget must be a number"),
    }
}

fn check_packs(blueprint: &Blueprint, report: &mut ValidationReport) {
    let current = &blueprint.skills.packs;
    for pack in current {
        if !packs::is_known(pack) {
            report.warn(format!("unknown pack '{pack}' has no manifest prefixes"));
        }
    }
    let recommended = packs::recommend(blueprint);
    for pack in packs::missing(current, &recommended) {
        report.warn(format!(
            "recommended pack '{pack}' is missing (run 'bootkit suggest-packs --write')"
        ));
    }
}

// ---------------------------------------------------------------------------
// Safe pack write
// ---------------------------------------------------------------------------

/// Rewrite `skills.packs` in the blueprint text, leaving every other field
/// and the key order untouched.
pub fn with_packs(text: &str, new_packs: &[String]) -> Result<String> {
    let mut value: Value = serde_json::from_str(text)?;
    let root = value
        .as_object_mut()
        .ok_or_else(|| BootkitError::BlueprintInvalid {
            path: Path::new("blueprint").to_path_buf(),
            reason: "blueprint must be a JSON object".to_string(),
        })?;
    let skills = root
        .entry("skills")
        .or_insert_with(|| Value::Object(Map::new()));
    if !skills.is_object() {
        *skills = Value::Object(Map::new());
    }
    if let Some(obj) = skills.as_object_mut() {
        obj.insert(
            "packs".to_string(),
            Value::Array(new_packs.iter().cloned().map(Value::String).collect()),
        );
    }
    let mut out = serde_json::to_string_pretty(&value)?;
    out.push('\n');
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) const VALID_BLUEPRINT: &str = r#"{
  "version": 1,
  "project": {"name": "ledger", "description": "Invoice tracker"},
  "repo": {"layout": "single", "language": "rust"},
  "capabilities": {
    "backend": {"enabled": true, "framework": "axum"},
    "database": {"enabled": true, "engine": "postgres"}
  },
  "quality": {"testing": false},
  "skills": {"packs": ["workflows", "backend", "database"]}
}
"#;
