//! ERD model to SQL DDL conversion module.

mod dialect;
mod generator;
mod types;

pub use dialect::Dialect;
pub use generator::DdlGenerator;
pub use types::map_type;
