//! The Node capability: objects with a global ID that can be refetched by it.
//! See: https://graphql.org/learn/global-object-identification/#node-interface

use crate::{
    connection::ConnectionField, defaults, global_id::to_global_id, model::Model,
    model::ScalarKind, resolver::ResolveInfo, utils::to_camel_case, RelayResult,
};
use async_graphql::dynamic::{Interface, InterfaceField, SchemaBuilder, TypeRef};
use extension_trait::extension_trait;
use std::{fmt, sync::Arc};
use tracing::warn;

pub type NodeData = serde_json::Value;

/// A resolved Node: its type, its id within the type, and its field data.
#[derive(Clone, PartialEq, Debug)]
pub struct NodeValue {
    type_name: String,
    local_id: String,
    data: NodeData,
}

impl NodeValue {
    pub fn new(
        type_name: impl Into<String>,
        local_id: impl Into<String>,
        data: impl Into<NodeData>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            local_id: local_id.into(),
            data: data.into(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    pub fn to_global_id(&self) -> String {
        to_global_id(&self.type_name, &self.local_id)
    }
}

pub type GetNodeFn<C> =
    dyn Fn(&str, &C, &ResolveInfo) -> RelayResult<Option<NodeValue>> + Send + Sync;

/// Looks a node up by its local id, given the request context and the
/// resolve info of the field asking for it.
pub struct NodeLoader<C>(Arc<GetNodeFn<C>>);

impl<C> Clone for NodeLoader<C> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<C> fmt::Debug for NodeLoader<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NodeLoader")
    }
}

impl<C: 'static> NodeLoader<C> {
    pub fn new<F>(get_node: F) -> Self
    where
        F: Fn(&str, &C, &ResolveInfo) -> RelayResult<Option<NodeValue>>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(get_node))
    }

    /// Adapt a loader written against the older `(id, context)` signature.
    /// The resolve info is dropped on every call.
    pub fn legacy<F>(type_name: &str, get_node: F) -> Self
    where
        F: Fn(&str, &C) -> RelayResult<Option<NodeValue>> + Send + Sync + 'static,
    {
        warn!(
            "get_node of {type_name} does not take the resolve info argument; \
             it will receive it in future versions"
        );
        Self(Arc::new(move |id, ctx, _info| get_node(id, ctx)))
    }

    pub fn get_node(
        &self,
        id: &str,
        ctx: &C,
        info: &ResolveInfo,
    ) -> RelayResult<Option<NodeValue>> {
        (self.0)(id, ctx, info)
    }
}

/// A scalar field read from a node's data under `source`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ScalarField {
    pub name: String,
    pub source: String,
    pub kind: ScalarKind,
    pub required: bool,
    pub description: Option<String>,
}

impl ScalarField {
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        let name = name.into();
        Self {
            source: name.clone(),
            name,
            kind,
            required: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn type_ref(&self) -> TypeRef {
        if self.required {
            TypeRef::named_nn(self.kind.type_name())
        } else {
            TypeRef::named(self.kind.type_name())
        }
    }
}

pub enum ObjectField<C> {
    Scalar(ScalarField),
    Connection(ConnectionField<C>),
}

impl<C> ObjectField<C> {
    pub fn name(&self) -> &str {
        match self {
            ObjectField::Scalar(field) => &field.name,
            ObjectField::Connection(field) => field.name(),
        }
    }
}

/// Declaration of an object type, optionally with the Node capability.
pub struct ObjectDef<C> {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) is_node: bool,
    pub(crate) loader: Option<NodeLoader<C>>,
    pub(crate) fields: Vec<ObjectField<C>>,
    pub(crate) edge_base: String,
    pub(crate) connection_base: String,
}

impl<C: 'static> ObjectDef<C> {
    /// A plain object type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_node: false,
            loader: None,
            fields: Vec::new(),
            edge_base: defaults::EDGE_BASE.to_string(),
            connection_base: defaults::CONNECTION_BASE.to_string(),
        }
    }

    /// An object type implementing `Node`. It needs a `get_node` loader
    /// before it can be registered.
    pub fn node(name: impl Into<String>) -> Self {
        Self {
            is_node: true,
            ..Self::new(name)
        }
    }

    /// A Node type whose scalar fields mirror the model's fields.
    pub fn for_model(model: &Model) -> Self {
        model.fields.iter().fold(Self::node(&model.name), |object, field| {
            let mut scalar = ScalarField::new(to_camel_case(&field.name), field.kind)
                .source(&field.name);
            scalar.required = field.required;
            object.scalar(scalar)
        })
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn get_node<F>(mut self, get_node: F) -> Self
    where
        F: Fn(&str, &C, &ResolveInfo) -> RelayResult<Option<NodeValue>>
            + Send
            + Sync
            + 'static,
    {
        self.loader = Some(NodeLoader::new(get_node));
        self
    }

    pub fn legacy_get_node<F>(mut self, get_node: F) -> Self
    where
        F: Fn(&str, &C) -> RelayResult<Option<NodeValue>> + Send + Sync + 'static,
    {
        self.loader = Some(NodeLoader::legacy(&self.name, get_node));
        self
    }

    pub fn loader(mut self, loader: NodeLoader<C>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn scalar(mut self, field: ScalarField) -> Self {
        self.fields.push(ObjectField::Scalar(field));
        self
    }

    pub fn connection(mut self, field: ConnectionField<C>) -> Self {
        self.fields.push(ObjectField::Connection(field));
        self
    }

    /// Base name of this node's default edge type, `{Node}{base}`.
    pub fn edge_base(mut self, base: impl Into<String>) -> Self {
        self.edge_base = base.into();
        self
    }

    /// Base name of this node's default connection type, `{Node}{base}`.
    pub fn connection_base(mut self, base: impl Into<String>) -> Self {
        self.connection_base = base.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_node(&self) -> bool {
        self.is_node
    }
}

#[extension_trait]
pub impl TypeRefNodeExt for TypeRef {
    const NODE: &'static str = "Node";
}

#[extension_trait]
pub impl InterfaceNodeExt for Interface {
    fn new_node(name: impl Into<String>) -> Self {
        Self::new(name)
            .description("An object with an ID")
            .node_fields()
    }

    fn node_fields(self) -> Self {
        self.field(
            InterfaceField::new("id", TypeRef::named_nn(TypeRef::ID))
                .description("The ID of an object"),
        )
    }
}

#[extension_trait]
pub impl SchemaBuilderNodeExt for SchemaBuilder {
    fn register_node_types(self) -> Self {
        let node_interface = Interface::new_node(TypeRef::NODE);
        self.register(node_interface)
    }
}
