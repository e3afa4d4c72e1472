use std::fmt;

use serde::Serialize;

/// Field categories. Each category owns its own condition vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Numeric,
    Text,
    Enum,
    Date,
    ToOne,
    ToMany,
}

impl FieldKind {
    pub const ALL: [FieldKind; 6] = [
        FieldKind::Numeric,
        FieldKind::Text,
        FieldKind::Enum,
        FieldKind::Date,
        FieldKind::ToOne,
        FieldKind::ToMany,
    ];

    /// Condition keywords legal for fields of this category.
    pub fn conditions(self) -> &'static [&'static str] {
        match self {
            FieldKind::Numeric => &["is", "gt", "gte", "lt", "lte", "in"],
            FieldKind::Text => &["is", "contains", "startsWith", "endsWith", "in"],
            FieldKind::Enum => &["is", "in"],
            FieldKind::Date => &["is", "gt", "gte", "lt", "lte"],
            FieldKind::ToOne => &["is", "isNot"],
            FieldKind::ToMany => &["some", "every", "none"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Numeric => "numeric",
            FieldKind::Text => "text",
            FieldKind::Enum => "enum",
            FieldKind::Date => "date",
            FieldKind::ToOne => "to-one",
            FieldKind::ToMany => "to-many",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed set of filterable field names of one category.
pub trait Field: Copy + Eq + fmt::Debug + 'static {
    const ALL: &'static [Self];

    /// Wire name of the field.
    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

/// Enum-typed fields additionally know their legal variants.
pub trait EnumField: Field {
    fn variants(self) -> &'static [&'static str];
}

/// Placeholder for categories a schema does not have. Uninhabited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoField {}

impl Field for NoField {
    const ALL: &'static [Self] = &[];

    fn name(self) -> &'static str {
        match self {}
    }
}

impl EnumField for NoField {
    fn variants(self) -> &'static [&'static str] {
        match self {}
    }
}

/// A record type that can be filtered.
///
/// The associated types partition the record's filterable fields by
/// category, so a filter can only pair a field with conditions of that
/// field's own category. Field names must be unique across categories and
/// may not collide with the group keywords `AND`, `OR` and `NOT`.
pub trait Schema: fmt::Debug + Clone + Copy + PartialEq + 'static {
    type Numeric: Field;
    type Text: Field;
    type Enum: EnumField;
    type Date: Field;
    type ToOne: Field;
    type ToMany: Field;

    /// Model name used in logs and error messages.
    const MODEL: &'static str;

    /// Resolve a wire name to its category.
    fn field_kind(name: &str) -> Option<FieldKind> {
        if Self::Numeric::from_name(name).is_some() {
            Some(FieldKind::Numeric)
        } else if Self::Text::from_name(name).is_some() {
            Some(FieldKind::Text)
        } else if Self::Enum::from_name(name).is_some() {
            Some(FieldKind::Enum)
        } else if Self::Date::from_name(name).is_some() {
            Some(FieldKind::Date)
        } else if Self::ToOne::from_name(name).is_some() {
            Some(FieldKind::ToOne)
        } else if Self::ToMany::from_name(name).is_some() {
            Some(FieldKind::ToMany)
        } else {
            None
        }
    }

    /// Every filterable field with its category, in declaration order.
    fn fields() -> Vec<(&'static str, FieldKind)> {
        let mut out = Vec::new();
        out.extend(Self::Numeric::ALL.iter().map(|f| (f.name(), FieldKind::Numeric)));
        out.extend(Self::Text::ALL.iter().map(|f| (f.name(), FieldKind::Text)));
        out.extend(Self::Enum::ALL.iter().map(|f| (f.name(), FieldKind::Enum)));
        out.extend(Self::Date::ALL.iter().map(|f| (f.name(), FieldKind::Date)));
        out.extend(Self::ToOne::ALL.iter().map(|f| (f.name(), FieldKind::ToOne)));
        out.extend(Self::ToMany::ALL.iter().map(|f| (f.name(), FieldKind::ToMany)));
        out
    }
}
