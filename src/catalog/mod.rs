//! Filterable record types of the catalog and their table mappings.

pub mod collection;
pub mod product;

use std::fmt;

use serde::Serialize;

use crate::filters::Schema;

pub use collection::Collection;
pub use product::Product;

/// A to-one relation stored as a foreign key column on the model's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToOneRelation {
    pub column: &'static str,
}

/// A to-many relation stored in a link table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToManyRelation {
    pub link_table: &'static str,
    /// Column in the link table pointing back at the model.
    pub local_key: &'static str,
    /// Column in the link table pointing at the related record.
    pub foreign_key: &'static str,
}

/// A schema bound to a SQLite table. Scalar fields map to columns of the
/// same name.
pub trait Model: Schema {
    type Row: Serialize + fmt::Debug;

    const TABLE: &'static str;

    /// Select list, qualified with the `t` alias.
    const COLUMNS: &'static str;

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self::Row>;

    fn to_one(field: Self::ToOne) -> ToOneRelation;

    fn to_many(field: Self::ToMany) -> ToManyRelation;
}

/// Models selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModelName {
    Product,
    Collection,
}

impl ModelName {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelName::Product => Product::MODEL,
            ModelName::Collection => Collection::MODEL,
        }
    }
}

/// Enum variants shared by products and collections.
pub const LEVELS: &[&str] = &["BESPOKE", "COUTURE", "HANDMADE", "RTW"];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FieldKind;
    use std::collections::HashSet;

    fn assert_unique_names<S: Schema>() {
        let fields = S::fields();
        let names: HashSet<_> = fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(names.len(), fields.len(), "duplicate field name in {}", S::MODEL);
        for reserved in ["AND", "OR", "NOT"] {
            assert!(!names.contains(reserved), "{} uses reserved name {reserved}", S::MODEL);
        }
    }

    #[test]
    fn field_names_are_unique_and_not_reserved() {
        assert_unique_names::<Product>();
        assert_unique_names::<Collection>();
    }

    #[test]
    fn field_kind_resolves_wire_names() {
        assert_eq!(Product::field_kind("price"), Some(FieldKind::Numeric));
        assert_eq!(Product::field_kind("brand"), Some(FieldKind::ToOne));
        assert_eq!(Collection::field_kind("season"), Some(FieldKind::Enum));
        assert_eq!(Collection::field_kind("created_at"), None);
    }
}
