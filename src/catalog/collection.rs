use serde::{Deserialize, Serialize};

use super::{Model, ToManyRelation, ToOneRelation, LEVELS};
use crate::filters::{EnumField, Field, NoField, Schema};

pub const SEASONS: &[&str] = &["RESORT", "SPRING", "PRE_FALL", "FALL"];
pub const SEXES: &[&str] = &["MAN", "WOMAN", "UNISEX"];

/// A brand's seasonal collection. Has no date fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionNumeric {
    Id,
    Year,
}

impl Field for CollectionNumeric {
    const ALL: &'static [Self] = &[CollectionNumeric::Id, CollectionNumeric::Year];

    fn name(self) -> &'static str {
        match self {
            CollectionNumeric::Id => "id",
            CollectionNumeric::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionText {
    Name,
}

impl Field for CollectionText {
    const ALL: &'static [Self] = &[CollectionText::Name];

    fn name(self) -> &'static str {
        match self {
            CollectionText::Name => "name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEnum {
    Season,
    Sex,
    Level,
}

impl Field for CollectionEnum {
    const ALL: &'static [Self] = &[
        CollectionEnum::Season,
        CollectionEnum::Sex,
        CollectionEnum::Level,
    ];

    fn name(self) -> &'static str {
        match self {
            CollectionEnum::Season => "season",
            CollectionEnum::Sex => "sex",
            CollectionEnum::Level => "level",
        }
    }
}

impl EnumField for CollectionEnum {
    fn variants(self) -> &'static [&'static str] {
        match self {
            CollectionEnum::Season => SEASONS,
            CollectionEnum::Sex => SEXES,
            CollectionEnum::Level => LEVELS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionToOne {
    Brand,
}

impl Field for CollectionToOne {
    const ALL: &'static [Self] = &[CollectionToOne::Brand];

    fn name(self) -> &'static str {
        match self {
            CollectionToOne::Brand => "brand",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionToMany {
    Products,
}

impl Field for CollectionToMany {
    const ALL: &'static [Self] = &[CollectionToMany::Products];

    fn name(self) -> &'static str {
        match self {
            CollectionToMany::Products => "products",
        }
    }
}

impl Schema for Collection {
    type Numeric = CollectionNumeric;
    type Text = CollectionText;
    type Enum = CollectionEnum;
    type Date = NoField;
    type ToOne = CollectionToOne;
    type ToMany = CollectionToMany;

    const MODEL: &'static str = "collection";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRow {
    pub id: i64,
    pub name: String,
    pub year: i64,
    pub season: String,
    pub sex: String,
    pub level: String,
    pub brand: Option<String>,
    pub products: i64,
}

impl Model for Collection {
    type Row = CollectionRow;

    const TABLE: &'static str = "collections";
    const COLUMNS: &'static str = "t.id, t.name, t.year, t.season, t.sex, t.level,
        (SELECT b.name FROM brands b WHERE b.id = t.brand_id),
        (SELECT COUNT(*) FROM collection_products cp WHERE cp.collection_id = t.id)";

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CollectionRow> {
        Ok(CollectionRow {
            id: row.get(0)?,
            name: row.get(1)?,
            year: row.get(2)?,
            season: row.get(3)?,
            sex: row.get(4)?,
            level: row.get(5)?,
            brand: row.get(6)?,
            products: row.get(7)?,
        })
    }

    fn to_one(field: CollectionToOne) -> ToOneRelation {
        match field {
            CollectionToOne::Brand => ToOneRelation {
                column: "brand_id",
            },
        }
    }

    fn to_many(field: CollectionToMany) -> ToManyRelation {
        match field {
            CollectionToMany::Products => ToManyRelation {
                link_table: "collection_products",
                local_key: "collection_id",
                foreign_key: "product_id",
            },
        }
    }
}
