//! Target SQL dialects and their comment conventions.

use std::fmt;

/// SQL dialect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// PostgreSQL, the notation the diagrams are written in
    #[default]
    PostgreSQL,
    /// Oracle
    Oracle,
}

impl Dialect {
    /// Parse dialect from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::PostgreSQL),
            "oracle" => Some(Self::Oracle),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PostgreSQL => "postgresql",
            Self::Oracle => "oracle",
        }
    }

    /// Whether types need translating from the diagram's PostgreSQL vocabulary.
    pub fn is_native(self) -> bool {
        self == Self::PostgreSQL
    }

    /// Whether table and column comments are `COMMENT ON` statements rather
    /// than inline `--` comments.
    pub fn uses_comment_statements(self) -> bool {
        match self {
            Self::PostgreSQL => false,
            Self::Oracle => true,
        }
    }

    pub fn identity_clause(self) -> &'static str {
        "GENERATED ALWAYS AS IDENTITY"
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(Dialect::from_str("postgresql"), Some(Dialect::PostgreSQL));
        assert_eq!(Dialect::from_str("Postgres"), Some(Dialect::PostgreSQL));
        assert_eq!(Dialect::from_str("ORACLE"), Some(Dialect::Oracle));
        assert_eq!(Dialect::from_str("mysql"), None);
    }

    #[test]
    fn test_default_is_native() {
        assert!(Dialect::default().is_native());
        assert!(!Dialect::default().uses_comment_statements());
        assert!(Dialect::Oracle.uses_comment_statements());
    }
}
