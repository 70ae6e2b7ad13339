//! Opaque, reversible identifiers for Node objects.
//! See: https://graphql.org/learn/global-object-identification/

use crate::{RelayError, RelayResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::{fmt, str::FromStr};

pub type NodeTypeName = String;

pub type LocalId = String;

/// A decoded global ID: the node's type name and its id within that type.
#[derive(Clone, Hash, PartialEq, Eq, Debug)]
pub struct GlobalId(NodeTypeName, LocalId);

impl GlobalId {
    pub fn new(type_name: impl Into<NodeTypeName>, local_id: impl Into<LocalId>) -> Self {
        Self(type_name.into(), local_id.into())
    }

    pub fn type_name(&self) -> &str {
        &self.0
    }

    pub fn local_id(&self) -> &str {
        &self.1
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_global_id(&self.0, &self.1))
    }
}

impl FromStr for GlobalId {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_global_id(s)
    }
}

impl From<GlobalId> for String {
    fn from(id: GlobalId) -> String {
        id.to_string()
    }
}

/// Encode a type name and local id as base64 of `"{type}:{id}"`.
pub fn to_global_id(type_name: &str, local_id: &str) -> String {
    STANDARD.encode(format!("{type_name}:{local_id}"))
}

/// Reverse `to_global_id`. The local id keeps any further `:` characters.
pub fn from_global_id(global_id: &str) -> RelayResult<GlobalId> {
    let invalid = || RelayError::InvalidGlobalId(global_id.to_string());

    let bytes = STANDARD.decode(global_id).map_err(|_| invalid())?;
    let unbased = String::from_utf8(bytes).map_err(|_| invalid())?;
    let (type_name, local_id) = unbased.split_once(':').ok_or_else(invalid)?;
    if type_name.is_empty() {
        return Err(invalid());
    }

    Ok(GlobalId::new(type_name, local_id))
}
