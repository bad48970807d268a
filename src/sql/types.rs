//! Diagram (PostgreSQL) type to target dialect type mapping.

use super::Dialect;
use crate::patterns::type_parts;

/// Target type for a PostgreSQL base type.
struct Mapping {
    target: &'static str,
    /// Whether the source size suffix carries over to the target.
    sized: bool,
}

const fn sized(target: &'static str) -> Mapping {
    Mapping {
        target,
        sized: true,
    }
}

const fn fixed(target: &'static str) -> Mapping {
    Mapping {
        target,
        sized: false,
    }
}

/// Translate a data type token for the given dialect.
///
/// Unknown types, and every type for the native dialect, pass through unchanged.
pub fn map_type(data_type: &str, dialect: Dialect) -> String {
    if dialect.is_native() {
        return data_type.to_string();
    }

    let Some((base, size)) = type_parts(data_type) else {
        return data_type.to_string();
    };
    let Some(mapping) = map_oracle_type(&base.to_uppercase()) else {
        return data_type.to_string();
    };

    match size {
        Some(size) if mapping.sized => format!("{}({})", mapping.target, size),
        _ => mapping.target.to_string(),
    }
}

fn map_oracle_type(base: &str) -> Option<Mapping> {
    let mapping = match base {
        // Identity
        "SERIAL" | "BIGSERIAL" => fixed("NUMBER GENERATED ALWAYS AS IDENTITY"),

        // Strings
        "VARCHAR" => sized("VARCHAR2"),
        "UUID" => fixed("VARCHAR2(36)"),

        // Large objects never take a size
        "TEXT" | "JSONB" => fixed("CLOB"),
        "BYTEA" => fixed("BLOB"),

        "BOOLEAN" => fixed("NUMBER(1)"),
        "TIMESTAMP" => sized("TIMESTAMP"),

        _ => return None,
    };
    Some(mapping)
}
