//! DDL generation from a parsed model.

use tracing::{debug, trace};

use super::Dialect;
use super::types::map_type;
use crate::ast::{Column, Model, Relationship, Table};

/// Renders `CREATE TABLE` and foreign key statements for one dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct DdlGenerator {
    dialect: Dialect,
}

impl DdlGenerator {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Generate the full DDL script, one blank line between statements.
    pub fn generate(&self, model: &Model) -> String {
        let mut blocks: Vec<String> = model
            .tables
            .values()
            .map(|table| self.create_table(table))
            .collect();

        let mut foreign_keys = 0;
        for rel in &model.relationships {
            let Some((from, to)) = model.resolve(rel) else {
                trace!(from = %rel.from_table, to = %rel.to_table, "dropping unresolved relationship");
                continue;
            };
            for statement in foreign_key_statements(rel, from, to) {
                blocks.push(statement);
                foreign_keys += 1;
            }
        }

        debug!(
            dialect = %self.dialect,
            tables = model.tables.len(),
            foreign_keys,
            "generated ddl"
        );

        if blocks.is_empty() {
            return String::new();
        }
        let mut output = blocks.join("\n\n");
        output.push('\n');
        output
    }

    fn create_table(&self, table: &Table) -> String {
        let mut lines = Vec::new();

        if let Some(display_name) = &table.display_name {
            if self.dialect.uses_comment_statements() {
                lines.push(format!(
                    "COMMENT ON TABLE {} IS {};",
                    table.name,
                    quote(display_name)
                ));
            } else {
                lines.push(format!("-- Table: {} ({})", table.name, display_name));
            }
        }

        lines.push(format!("CREATE TABLE {} (", table.name));

        // (definition, inline comment)
        let mut definitions: Vec<(String, Option<String>)> = table
            .columns
            .iter()
            .map(|column| (self.column_definition(column), self.inline_comment(column)))
            .collect();

        let primary_keys: Vec<&str> = table.primary_keys().map(|c| c.name.as_str()).collect();
        if !primary_keys.is_empty() {
            definitions.push((
                format!(
                    "    CONSTRAINT pk_{} PRIMARY KEY ({})",
                    table.name,
                    primary_keys.join(", ")
                ),
                None,
            ));
        }

        let last = definitions.len().saturating_sub(1);
        for (i, (definition, comment)) in definitions.into_iter().enumerate() {
            let mut line = definition;
            if i < last {
                line.push(',');
            }
            if let Some(comment) = comment {
                line.push_str(" -- ");
                line.push_str(&comment);
            }
            lines.push(line);
        }

        lines.push(");".to_string());

        if self.dialect.uses_comment_statements() {
            for column in &table.columns {
                if let Some(comment) = column.comment() {
                    lines.push(format!(
                        "COMMENT ON COLUMN {}.{} IS {};",
                        table.name,
                        column.name,
                        quote(&comment)
                    ));
                }
            }
        }

        lines.join("\n")
    }

    fn column_definition(&self, column: &Column) -> String {
        let data_type = map_type(&column.data_type, self.dialect);
        let mut definition = format!("    {} {}", column.name, data_type);

        let identity = self.dialect.identity_clause();
        if column.is_generated && !data_type.contains(identity) {
            definition.push(' ');
            definition.push_str(identity);
        }

        definition
    }

    fn inline_comment(&self, column: &Column) -> Option<String> {
        if self.dialect.uses_comment_statements() {
            None
        } else {
            column.comment()
        }
    }
}

/// One `ALTER TABLE` per foreign key column of the child table.
///
/// The parent is assumed to have a column of the same name.
fn foreign_key_statements(rel: &Relationship, from: &Table, to: &Table) -> Vec<String> {
    let columns: Vec<&Column> = to.foreign_keys().collect();
    let suffix_with_column = columns.len() > 1;

    columns
        .into_iter()
        .map(|column| {
            let mut constraint = format!("fk_{}_{}", to.name, from.name);
            if suffix_with_column {
                constraint.push('_');
                constraint.push_str(&column.name);
            }
            trace!(kind = %rel.kind, %constraint, "foreign key");
            format!(
                "ALTER TABLE {}\n    ADD CONSTRAINT {}\n    FOREIGN KEY ({})\n    REFERENCES {} ({});",
                to.name, constraint, column.name, from.name, column.name
            )
        })
        .collect()
}

/// SQL string literal.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
