//! Descriptions of the models a schema is derived from.

use crate::{RelayError, RelayResult};
use async_graphql::dynamic::TypeRef;
use strum::{AsRefStr, Display, EnumString};

/// Scalar kinds a model field can hold. The string form is the GraphQL
/// scalar name.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, EnumString, Display, AsRefStr)]
pub enum ScalarKind {
    #[strum(serialize = "ID")]
    Id,
    String,
    Int,
    Float,
    Boolean,
    DateTime,
}

impl ScalarKind {
    /// Scalars that are not built into GraphQL and have to be registered.
    pub fn is_custom(&self) -> bool {
        matches!(self, ScalarKind::DateTime)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarKind::Id => TypeRef::ID,
            ScalarKind::String => TypeRef::STRING,
            ScalarKind::Int => TypeRef::INT,
            ScalarKind::Float => TypeRef::FLOAT,
            ScalarKind::Boolean => TypeRef::BOOLEAN,
            ScalarKind::DateTime => "DateTime",
        }
    }
}

#[derive(Clone, Hash, PartialEq, Eq, Debug)]
pub struct ModelField {
    pub name: String,
    pub kind: ScalarKind,
    pub required: bool,
}

impl ModelField {
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// A persisted model: a name and its ordered, snake_case fields.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Model {
    pub name: String,
    pub fields: Vec<ModelField>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: ModelField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, name: &str) -> RelayResult<&ModelField> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| RelayError::UnknownModelField(self.name.clone(), name.to_string()))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}
