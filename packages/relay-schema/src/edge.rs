//! Edge types pairing a cursor with a node.
//! See: https://graphql.org/learn/pagination/#pagination-and-edges
//! See: https://relay.dev/graphql/connections.htm#sec-Edge-Types

use crate::{node::NodeValue, paging::Cursor, paging::TypeRefPagingExt};
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, Object, TypeRef};

#[derive(Clone, PartialEq, Debug)]
pub struct EdgeValue {
    pub cursor: Cursor,
    pub node: NodeValue,
}

/// The `{Node}{Base}` edge type of one node type. Built once per
/// (base, node) pair by the `SchemaRegistry`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct EdgeType {
    name: String,
    base: String,
    node_type: String,
}

impl EdgeType {
    pub(crate) fn new(base: impl Into<String>, node_type: impl Into<String>) -> Self {
        let base = base.into();
        let node_type = node_type.into();
        Self {
            name: format!("{node_type}{base}"),
            base,
            node_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub(crate) fn object(&self) -> Object {
        Object::new(&self.name)
            .description("An edge in a connection.")
            .field(
                Field::new("node", TypeRef::named(&self.node_type), |ctx| {
                    FieldFuture::new(async move {
                        let parent = ctx.parent_value.try_downcast_ref::<EdgeValue>()?;
                        Ok(Some(FieldValue::borrowed_any(&parent.node)))
                    })
                })
                .description("The item at the end of the edge"),
            )
            .field(
                Field::new("cursor", TypeRef::named_nn(TypeRef::CURSOR), |ctx| {
                    FieldFuture::new(async move {
                        let parent = ctx.parent_value.try_downcast_ref::<EdgeValue>()?;
                        Ok(Some(FieldValue::value(parent.cursor.clone())))
                    })
                })
                .description("A cursor for use in pagination"),
            )
    }
}
