use std::collections::HashMap;

use indexmap::IndexMap;

use crate::patterns::Operator;

/// Column type used when a column resolves to no attribute template.
pub const DEFAULT_DATA_TYPE: &str = "VARCHAR(255)";

/// Attribute templates keyed by identifier.
pub type AttributeCatalog = HashMap<String, Attribute>;

/// Reusable attribute template declared with `!define`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    /// Raw column code token, kept for provenance only.
    pub code: String,
    pub display_name: String,
    pub data_type: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub display_name: Option<String>,
    pub data_type: String,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub is_generated: bool,
    pub description: Option<String>,
}

impl Column {
    /// Build a column from its resolved template, falling back to defaults.
    pub fn resolved(name: impl Into<String>, template: Option<&Attribute>) -> Self {
        Self {
            name: name.into(),
            display_name: template.map(|a| a.display_name.clone()),
            data_type: template
                .map(|a| a.data_type.clone())
                .unwrap_or_else(|| DEFAULT_DATA_TYPE.to_string()),
            is_primary_key: false,
            is_foreign_key: false,
            is_generated: false,
            description: template.and_then(|a| a.description.clone()),
        }
    }

    /// Display name and description joined for a comment, if either exists.
    pub fn comment(&self) -> Option<String> {
        let parts: Vec<&str> = [self.display_name.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub display_name: Option<String>,
    pub columns: Vec<Column>,
    /// Resolved relationships touching this table, filled in when the model is finalized.
    pub relationships: Vec<Relationship>,
}

impl Table {
    pub fn primary_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_foreign_key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub from_table: String,
    pub to_table: String,
    /// Operator token exactly as written in the diagram.
    pub kind: String,
    pub operator: Operator,
}

/// Parsed diagram: the table mapping and the relationships between tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub tables: IndexMap<String, Table>,
    pub relationships: Vec<Relationship>,
}

impl Model {
    /// Finalize a model from a complete table mapping.
    ///
    /// Relationships are resolved only here, once every table is known. Each
    /// resolvable relationship is recorded on both of its endpoint tables.
    pub fn new(mut tables: IndexMap<String, Table>, relationships: Vec<Relationship>) -> Self {
        for rel in &relationships {
            if !(tables.contains_key(&rel.from_table) && tables.contains_key(&rel.to_table)) {
                continue;
            }
            if let Some(from) = tables.get_mut(&rel.from_table) {
                from.relationships.push(rel.clone());
            }
            if rel.to_table != rel.from_table {
                if let Some(to) = tables.get_mut(&rel.to_table) {
                    to.relationships.push(rel.clone());
                }
            }
        }

        Self {
            tables,
            relationships,
        }
    }

    /// Look up both endpoints of a relationship as `(from, to)`.
    pub fn resolve(&self, rel: &Relationship) -> Option<(&Table, &Table)> {
        let from = self.tables.get(&rel.from_table)?;
        let to = self.tables.get(&rel.to_table)?;
        Some((from, to))
    }
}
