//! Named recognizers for each declaration kind of the PlantUML model.
//!
//! Every extractor is independent of the others and returns either a
//! structured match or `None`; parsing decisions live in `parser`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::Attribute;

static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"!define\s+(\w+)\s+(\w+)\s+\[([^\]]+)\]\s+(\w+(?:\(\d+(?:\s*,\s*\d+)?\))?)(?:[ \t]+/'([^'\n]+)'/?)?",
    )
    .expect("valid attribute regex")
});

static TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"Table\((\w+),\s*"([^"]+)"\)[^{]*\{([^}]+)\}"#).expect("valid table regex")
});

static PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"primary_key\((\w+)\)").expect("valid primary key regex"));

static FOREIGN_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"foreign_key\((\w+)\)").expect("valid foreign key regex"));

static ATTRIBUTE_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\w+)\]").expect("valid attribute reference regex"));

static START_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@startuml[^\n]*\n").expect("valid start marker regex"));

static TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)(?:\(([^)]+)\))?").expect("valid data type regex"));

pub const END_MARKER: &str = "@enduml";
pub const GENERATED_MARKER: &str = "<<generated>>";

/// Relationship operators, in the order they are tried against a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `||-o{`
    OneToMany,
    /// `--|>`
    Inheritance,
    /// `--`
    Association,
    /// `o--o`
    Aggregation,
    /// `*--*`
    Composition,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::OneToMany,
        Operator::Inheritance,
        Operator::Association,
        Operator::Aggregation,
        Operator::Composition,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Operator::OneToMany => "||-o{",
            Operator::Inheritance => "--|>",
            Operator::Association => "--",
            Operator::Aggregation => "o--o",
            Operator::Composition => "*--*",
        }
    }
}

/// First relationship operator found in `line`.
pub fn relationship_operator(line: &str) -> Option<Operator> {
    Operator::ALL.into_iter().find(|op| line.contains(op.token()))
}

/// `Table(<name>, "<description>") { <body> }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableBlock<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub body: &'a str,
}

impl TableBlock<'_> {
    /// Second line of the description, if any.
    ///
    /// Both real line breaks and the PlantUML `\n` escape separate lines.
    pub fn display_name(&self) -> Option<String> {
        self.description
            .replace("\\n", "\n")
            .lines()
            .nth(1)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

pub fn table_blocks(document: &str) -> impl Iterator<Item = TableBlock<'_>> {
    TABLE_RE.captures_iter(document).map(|caps| {
        let (_, [name, description, body]) = caps.extract();
        TableBlock {
            name,
            description,
            body,
        }
    })
}

/// `!define <name> <code> [<display>] <TYPE>(<size>) /'<description>'/`
pub fn attribute_declarations(document: &str) -> impl Iterator<Item = Attribute> + '_ {
    ATTRIBUTE_RE.captures_iter(document).map(|caps| Attribute {
        name: caps[1].to_string(),
        code: caps[2].to_string(),
        display_name: caps[3].to_string(),
        data_type: caps[4].to_string(),
        description: caps.get(5).map(|m| m.as_str().to_string()),
    })
}

pub fn primary_key_column(line: &str) -> Option<&str> {
    first_group(&PRIMARY_KEY_RE, line)
}

pub fn foreign_key_column(line: &str) -> Option<&str> {
    first_group(&FOREIGN_KEY_RE, line)
}

/// `[<attribute>]` anywhere in the line.
pub fn attribute_reference(line: &str) -> Option<&str> {
    first_group(&ATTRIBUTE_REF_RE, line)
}

pub fn is_generated(line: &str) -> bool {
    line.contains(GENERATED_MARKER)
}

/// Comment lines start with a single quote.
pub fn is_comment(line: &str) -> bool {
    line.starts_with('\'')
}

/// Section separators inside a table body: `--`, `==`, `..`, `__`, or a
/// titled form such as `== audit ==`.
pub fn is_separator(line: &str) -> bool {
    ["--", "==", "..", "__"].iter().any(|sep| {
        line == *sep
            || line
                .strip_prefix(sep)
                .and_then(|rest| rest.strip_suffix(sep))
                .is_some_and(|title| {
                    title.len() > 1 && title.starts_with(' ') && title.ends_with(' ')
                })
    })
}

/// Remove `@startuml` lines and `@enduml` markers.
pub fn strip_envelope(content: &str) -> String {
    START_MARKER_RE
        .replace_all(content, "")
        .replace(END_MARKER, "")
        .trim()
        .to_string()
}

/// Split a type token into its base name and optional size, e.g. `VARCHAR(50)`.
pub fn type_parts(data_type: &str) -> Option<(&str, Option<&str>)> {
    let caps = TYPE_RE.captures(data_type)?;
    let base = caps.get(1)?.as_str();
    Some((base, caps.get(2).map(|m| m.as_str())))
}

fn first_group<'a>(re: &Regex, line: &'a str) -> Option<&'a str> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_declaration() {
        let doc = "!define EMAIL_ATTR email [メール] VARCHAR(255) /'連絡先アドレス'/";
        let attrs: Vec<_> = attribute_declarations(doc).collect();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].name, "EMAIL_ATTR");
        assert_eq!(attrs[0].code, "email");
        assert_eq!(attrs[0].display_name, "メール");
        assert_eq!(attrs[0].data_type, "VARCHAR(255)");
        assert_eq!(attrs[0].description.as_deref(), Some("連絡先アドレス"));
    }

    #[test]
    fn test_attribute_without_description_or_size() {
        let doc = "!define ID_ATTR id [ID] SERIAL\n!define PRICE price [価格] NUMERIC(10, 2)";
        let attrs: Vec<_> = attribute_declarations(doc).collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].data_type, "SERIAL");
        assert_eq!(attrs[0].description, None);
        assert_eq!(attrs[1].data_type, "NUMERIC(10, 2)");
    }

    #[test]
    fn test_description_does_not_span_lines() {
        let doc = "!define A a [A] TEXT\n/'stray'/";
        let attrs: Vec<_> = attribute_declarations(doc).collect();
        assert_eq!(attrs[0].description, None);
    }

    #[test]
    fn test_description_stops_at_line_break() {
        let doc = "!define A a [A] VARCHAR(10) /'line one\nDROP TABLE x;'/";
        let attrs: Vec<_> = attribute_declarations(doc).collect();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].description, None);
    }

    #[test]
    fn test_table_block() {
        let doc = "Table(users, \"Users\\nユーザー\") {\n  primary_key(id)\n}";
        let blocks: Vec<_> = table_blocks(doc).collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "users");
        assert_eq!(blocks[0].display_name().as_deref(), Some("ユーザー"));
        assert!(blocks[0].body.contains("primary_key(id)"));
    }

    #[test]
    fn test_table_block_single_line_description() {
        let doc = "Table(logs, \"Logs\") { message }";
        let block = table_blocks(doc).next().unwrap();
        assert_eq!(block.display_name(), None);
    }

    #[test]
    fn test_key_extractors() {
        assert_eq!(primary_key_column("primary_key(id) [ID_ATTR]"), Some("id"));
        assert_eq!(foreign_key_column("foreign_key(user_id)"), Some("user_id"));
        assert_eq!(primary_key_column("primary_key id"), None);
        assert_eq!(attribute_reference("name [NAME_ATTR] <<generated>>"), Some("NAME_ATTR"));
        assert_eq!(attribute_reference("name"), None);
        assert!(is_generated("id <<generated>>"));
    }

    #[test]
    fn test_separators_and_comments() {
        assert!(is_separator("--"));
        assert!(is_separator("== audit =="));
        assert!(!is_separator("code -- note"));
        assert!(!is_separator("__meta__"));
        assert!(!is_separator("--x--"));
        assert!(is_comment("' todo"));
    }

    #[test]
    fn test_relationship_operator_order() {
        assert_eq!(relationship_operator("a ||-o{ b"), Some(Operator::OneToMany));
        assert_eq!(relationship_operator("a --|> b"), Some(Operator::Inheritance));
        assert_eq!(relationship_operator("a o--o b"), Some(Operator::Association));
        assert_eq!(relationship_operator("a *-* b"), None);
    }

    #[test]
    fn test_strip_envelope() {
        let content = "@startuml attributes\n!define A a [A] TEXT\n@enduml\n";
        assert_eq!(strip_envelope(content), "!define A a [A] TEXT");
    }

    #[test]
    fn test_type_parts() {
        assert_eq!(type_parts("VARCHAR(50)"), Some(("VARCHAR", Some("50"))));
        assert_eq!(type_parts("serial"), Some(("serial", None)));
        assert_eq!(type_parts("(oops)"), None);
    }
}
