use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    A,
    B,
    C,
    #[serde(rename = "complete")]
    Complete,
}

impl Stage {
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::A => Some(Stage::B),
            Stage::B => Some(Stage::C),
            Stage::C => Some(Stage::Complete),
            Stage::Complete => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::A => "A",
            Stage::B => "B",
            Stage::C => "C",
            Stage::Complete => "complete",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::A => "requirements",
            Stage::B => "blueprint",
            Stage::C => "scaffold",
            Stage::Complete => "complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = crate::error::BootkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Stage::A),
            "b" => Ok(Stage::B),
            "c" => Ok(Stage::C),
            "complete" | "done" => Ok(Stage::Complete),
            _ => Err(crate::error::BootkitError::InvalidStage(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Single,
    Monorepo,
}

impl Layout {
    pub fn parse(s: &str) -> Option<Layout> {
        match s {
            "single" => Some(Layout::Single),
            "monorepo" => Some(Layout::Monorepo),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Single => "single",
            Layout::Monorepo => "monorepo",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Capability flags a blueprint can enable, in scaffold and pack order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Frontend,
    Backend,
    Database,
    Api,
}

impl Capability {
    pub fn all() -> &'static [Capability] {
        &[
            Capability::Frontend,
            Capability::Backend,
            Capability::Database,
            Capability::Api,
        ]
    }

    pub fn key(self) -> &'static str {
        match self {
            Capability::Frontend => "frontend",
            Capability::Backend => "backend",
            Capability::Database => "database",
            Capability::Api => "api",
        }
    }

    /// Sub-field that names the chosen technology for this capability.
    pub fn detail_field(self) -> &'static str {
        match self {
            Capability::Frontend | Capability::Backend => "framework",
            Capability::Database => "engine",
            Capability::Api => "style",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn stage_order_and_next() {
        assert!(Stage::A < Stage::B);
        assert!(Stage::C < Stage::Complete);
        assert_eq!(Stage::C.next(), Some(Stage::Complete));
        assert_eq!(Stage::Complete.next(), None);
    }

    #[test]
    fn stage_parse_is_case_insensitive() {
        assert_eq!(Stage::from_str("a").unwrap(), Stage::A);
        assert_eq!(Stage::from_str("B").unwrap(), Stage::B);
        assert_eq!(Stage::from_str("Complete").unwrap(), Stage::Complete);
        assert!(Stage::from_str("D").is_err());
    }

    #[test]
    fn stage_yaml_form() {
        assert_eq!(serde_yaml::to_string(&Stage::A).unwrap().trim(), "A");
        assert_eq!(
            serde_yaml::to_string(&Stage::Complete).unwrap().trim(),
            "complete"
        );
    }
}
