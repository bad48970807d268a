//! Combines the three source documents into one PlantUML document.

use crate::patterns::{self, END_MARKER};

pub const START_MARKER: &str = "@startuml tables";

/// Concatenate attributes, tables and relationship lines, in that order.
///
/// Each document loses its own `@startuml`/`@enduml` markers. From the
/// relationship document only lines carrying a relationship operator are
/// kept; prose and `!include` directives are dropped.
pub fn combine(attributes: &str, tables: &str, relationships: &str) -> String {
    let mut output = String::new();
    output.push_str(START_MARKER);
    output.push('\n');

    output.push_str(&patterns::strip_envelope(attributes));
    output.push('\n');

    output.push_str(&patterns::strip_envelope(tables));
    output.push('\n');

    for line in patterns::strip_envelope(relationships)
        .lines()
        .filter(|line| patterns::relationship_operator(line).is_some())
    {
        output.push_str(line);
        output.push('\n');
    }

    output.push_str(END_MARKER);
    output
}
