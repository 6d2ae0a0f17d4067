use serde::{Deserialize, Serialize};

/// How warnings count when deciding whether a check passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Only errors block.
    #[default]
    Lenient,
    /// Errors and warnings block.
    Strict,
}

impl Strictness {
    pub fn from_flag(strict: bool) -> Self {
        if strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        }
    }

    pub fn passes(self, errors: usize, warnings: usize) -> bool {
        match self {
            Strictness::Lenient => errors == 0,
            Strictness::Strict => errors == 0 && warnings == 0,
        }
    }
}

/// Outcome of a validator run. Validators report problems here instead of
/// returning errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub strictness: Strictness,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new(strictness: Strictness) -> Self {
        Self {
            ok: true,
            strictness,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.refresh();
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
        self.refresh();
    }

    /// Re-evaluate the same findings under another strictness.
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self.refresh();
        self
    }

    /// One-line description for error messages.
    pub fn summary(&self) -> String {
        if let Some(first) = self.errors.first() {
            let more = self.errors.len() - 1;
            if more == 0 {
                first.clone()
            } else {
                format!("{first} (+{more} more)")
            }
        } else if !self.ok {
            format!(
                "{} warning(s) under strict mode: {}",
                self.warnings.len(),
                self.warnings.first().map(String::as_str).unwrap_or("")
            )
        } else {
            "ok".to_string()
        }
    }

    fn refresh(&mut self) {
        self.ok = self.strictness.passes(self.errors.len(), self.warnings.len());
    }
}
