use serde::{Deserialize, Serialize};

use super::{Model, ToManyRelation, ToOneRelation, LEVELS};
use crate::filters::{EnumField, Field, Schema};

/// Products: the main browsable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductNumeric {
    Id,
    Price,
}

impl Field for ProductNumeric {
    const ALL: &'static [Self] = &[ProductNumeric::Id, ProductNumeric::Price];

    fn name(self) -> &'static str {
        match self {
            ProductNumeric::Id => "id",
            ProductNumeric::Price => "price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductText {
    Name,
    Description,
}

impl Field for ProductText {
    const ALL: &'static [Self] = &[ProductText::Name, ProductText::Description];

    fn name(self) -> &'static str {
        match self {
            ProductText::Name => "name",
            ProductText::Description => "description",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductEnum {
    Level,
}

impl Field for ProductEnum {
    const ALL: &'static [Self] = &[ProductEnum::Level];

    fn name(self) -> &'static str {
        match self {
            ProductEnum::Level => "level",
        }
    }
}

impl EnumField for ProductEnum {
    fn variants(self) -> &'static [&'static str] {
        match self {
            ProductEnum::Level => LEVELS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductDate {
    CreatedAt,
}

impl Field for ProductDate {
    const ALL: &'static [Self] = &[ProductDate::CreatedAt];

    fn name(self) -> &'static str {
        match self {
            ProductDate::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductToOne {
    Brand,
}

impl Field for ProductToOne {
    const ALL: &'static [Self] = &[ProductToOne::Brand];

    fn name(self) -> &'static str {
        match self {
            ProductToOne::Brand => "brand",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductToMany {
    Styles,
    Collections,
}

impl Field for ProductToMany {
    const ALL: &'static [Self] = &[ProductToMany::Styles, ProductToMany::Collections];

    fn name(self) -> &'static str {
        match self {
            ProductToMany::Styles => "styles",
            ProductToMany::Collections => "collections",
        }
    }
}

impl Schema for Product {
    type Numeric = ProductNumeric;
    type Text = ProductText;
    type Enum = ProductEnum;
    type Date = ProductDate;
    type ToOne = ProductToOne;
    type ToMany = ProductToMany;

    const MODEL: &'static str = "product";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub level: String,
    pub brand: Option<String>,
    pub created_at: String,
}

impl Model for Product {
    type Row = ProductRow;

    const TABLE: &'static str = "products";
    const COLUMNS: &'static str = "t.id, t.name, t.description, t.price, t.level,
        (SELECT b.name FROM brands b WHERE b.id = t.brand_id), t.created_at";

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProductRow> {
        Ok(ProductRow {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price: row.get(3)?,
            level: row.get(4)?,
            brand: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn to_one(field: ProductToOne) -> ToOneRelation {
        match field {
            ProductToOne::Brand => ToOneRelation {
                column: "brand_id",
            },
        }
    }

    fn to_many(field: ProductToMany) -> ToManyRelation {
        match field {
            ProductToMany::Styles => ToManyRelation {
                link_table: "product_styles",
                local_key: "product_id",
                foreign_key: "style_id",
            },
            ProductToMany::Collections => ToManyRelation {
                link_table: "collection_products",
                local_key: "product_id",
                foreign_key: "collection_id",
            },
        }
    }
}
