pub mod ast;
pub mod combiner;
pub mod parser;
pub mod patterns;
pub mod sql;
pub mod version;

use wasm_bindgen::prelude::*;

use ast::Model;
use parser::Parser;
use sql::{DdlGenerator, Dialect};

/// Raw text of the three source documents.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    pub attributes: &'a str,
    pub tables: &'a str,
    pub relationships: &'a str,
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Combined PlantUML document the model was parsed from
    pub combined: String,
    pub model: Model,
    pub ddl: String,
}

/// Combine, parse and generate DDL. Identical sources give identical output.
pub fn convert(sources: &Sources<'_>, dialect: Dialect) -> Conversion {
    let combined = combiner::combine(sources.attributes, sources.tables, sources.relationships);
    let model = Parser::new(&combined).parse();
    let ddl = DdlGenerator::new(dialect).generate(&model);

    Conversion {
        combined,
        model,
        ddl,
    }
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Generate DDL from the three PlantUML documents
#[wasm_bindgen(js_name = "pumlToDdl")]
pub fn render_ddl(
    attributes: &str,
    tables: &str,
    relationships: &str,
    dialect: Option<String>,
) -> Result<String, String> {
    let dialect = match dialect.as_deref() {
        Some(name) => Dialect::from_str(name).ok_or_else(|| format!("Unknown dialect: {name}"))?,
        None => Dialect::default(),
    };

    let sources = Sources {
        attributes,
        tables,
        relationships,
    };
    Ok(convert(&sources, dialect).ddl)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTRIBUTES: &str = "@startuml attributes\n!define EMAIL_ATTR email [メール] VARCHAR(255)\n@enduml\n";
    const TABLES: &str = "@startuml tables\n!include attributes.pu\nTable(users, \"Users\\nユーザー\") { primary_key(id) [EMAIL_ATTR] -- code }\n@enduml\n";

    fn sources<'a>(relationships: &'a str) -> Sources<'a> {
        Sources {
            attributes: ATTRIBUTES,
            tables: TABLES,
            relationships,
        }
    }

    #[test]
    fn test_end_to_end_users() {
        let output = convert(&sources(""), Dialect::PostgreSQL);

        assert!(output.ddl.contains("CREATE TABLE users ("));
        assert!(output.ddl.contains("    id VARCHAR(255), -- メール\n"));
        assert!(output.ddl.contains("CONSTRAINT pk_users PRIMARY KEY (id)"));
        assert!(!output.ddl.contains("ALTER TABLE"));
        assert!(output.combined.starts_with("@startuml tables\n!define EMAIL_ATTR"));
        assert!(output.combined.ends_with("@enduml"));
    }

    #[test]
    fn test_conversion_is_idempotent() {
        let er = "```plantuml\n@startuml\nusers ||-o{ orders\n@enduml\n```";
        let first = convert(&sources(er), Dialect::Oracle);
        let second = convert(&sources(er), Dialect::Oracle);
        assert_eq!(first.ddl, second.ddl);
        assert_eq!(first.combined, second.combined);
    }

    #[test]
    fn test_relationship_to_unknown_table_is_dropped() {
        let output = convert(&sources("users ||-o{ ghosts"), Dialect::PostgreSQL);
        assert!(
            output
                .model
                .relationships
                .iter()
                .any(|r| r.from_table == "users" && r.to_table == "ghosts")
        );
        assert!(!output.ddl.contains("ALTER TABLE"));
    }

    #[test]
    fn test_render_ddl_dialects() {
        let oracle = render_ddl(ATTRIBUTES, TABLES, "", Some("oracle".to_string())).unwrap();
        assert!(oracle.contains("id VARCHAR2(255)"));
        assert!(oracle.contains("COMMENT ON TABLE users IS 'ユーザー';"));

        let native = render_ddl(ATTRIBUTES, TABLES, "", None).unwrap();
        assert!(native.contains("id VARCHAR(255)"));

        assert!(render_ddl(ATTRIBUTES, TABLES, "", Some("sqlite".to_string())).is_err());
    }
}
