use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::ast::*;
use crate::patterns::{self, TableBlock};

/// Parser over a combined PlantUML document.
///
/// The document is read in three passes: attribute templates, then tables,
/// then relationships. Lines that match no pattern are skipped.
pub struct Parser<'a> {
    document: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(document: &'a str) -> Self {
        Self { document }
    }

    pub fn parse(&self) -> Model {
        let catalog = self.parse_attributes();
        let tables = self.parse_tables(&catalog);
        let relationships = self.parse_relationships();

        debug!(
            attributes = catalog.len(),
            tables = tables.len(),
            relationships = relationships.len(),
            "parsed model"
        );

        Model::new(tables, relationships)
    }

    /// Collect attribute templates. A later declaration replaces an earlier one.
    pub fn parse_attributes(&self) -> AttributeCatalog {
        let mut catalog = AttributeCatalog::new();
        for attr in patterns::attribute_declarations(self.document) {
            catalog.insert(attr.name.clone(), attr);
        }
        catalog
    }

    pub fn parse_tables(&self, catalog: &AttributeCatalog) -> IndexMap<String, Table> {
        let mut tables = IndexMap::new();
        for block in patterns::table_blocks(self.document) {
            let table = parse_table(&block, catalog);
            tables.insert(table.name.clone(), table);
        }
        tables
    }

    pub fn parse_relationships(&self) -> Vec<Relationship> {
        self.document.lines().filter_map(parse_relationship).collect()
    }
}

fn parse_table(block: &TableBlock<'_>, catalog: &AttributeCatalog) -> Table {
    let columns = block
        .body
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && !patterns::is_separator(line) && !patterns::is_comment(line)
        })
        .filter_map(|line| parse_column(line, catalog))
        .collect();

    Table {
        name: block.name.to_string(),
        display_name: block.display_name(),
        columns,
        relationships: Vec::new(),
    }
}

fn parse_column(line: &str, catalog: &AttributeCatalog) -> Option<Column> {
    let is_primary_key = line.contains("primary_key");
    let is_foreign_key = line.contains("foreign_key");

    let name = if is_primary_key {
        patterns::primary_key_column(line)
    } else if is_foreign_key {
        patterns::foreign_key_column(line)
    } else {
        line.split_whitespace().next()
    };
    let Some(name) = name else {
        trace!(line, "skipping column without identifier");
        return None;
    };

    // A column named after a template uses that template, whatever it references.
    let template = catalog.get(name).or_else(|| {
        patterns::attribute_reference(line).and_then(|reference| catalog.get(reference))
    });

    let mut column = Column::resolved(name, template);
    column.is_primary_key = is_primary_key;
    column.is_foreign_key = is_foreign_key;
    column.is_generated = patterns::is_generated(line);
    Some(column)
}

fn parse_relationship(line: &str) -> Option<Relationship> {
    let operator = patterns::relationship_operator(line)?;
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        trace!(line, "skipping relationship with fewer than three tokens");
        return None;
    }

    Some(Relationship {
        from_table: parts[0].to_string(),
        to_table: parts[2].to_string(),
        kind: parts[1].to_string(),
        operator,
    })
}
