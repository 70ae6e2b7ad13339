//! The registry collecting relay types and building them into a dynamic
//! schema. Edge and connection types are memoized per registry, so asking
//! twice for the same type returns the same `Arc`.

use crate::{
    config::RelayConfig,
    connection::{ConnectionField, ConnectionType},
    defaults::{MUTATION_ROOT, QUERY_ROOT},
    edge::EdgeType,
    mutation::{ClientIdMutation, MutationDef, OutputFieldKind},
    node::{ObjectDef, ObjectField, SchemaBuilderNodeExt, TypeRefNodeExt},
    paging::{SchemaBuilderPagingExt, TypeRefPagingExt},
    resolver::{self, NodeLoaders},
    RelayError, RelayResult,
};
use async_graphql::dynamic::{Object, Scalar, Schema, SchemaBuilder, TypeRef};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};
use tracing::{debug, info};

type EdgeKey = (String, String);
type ConnectionKey = (String, String, String);

/// Names generated by the registry itself.
const RESERVED_TYPES: [&str; 5] = [
    QUERY_ROOT,
    MUTATION_ROOT,
    TypeRef::NODE,
    TypeRef::PAGE_INFO,
    "DateTime",
];

pub struct SchemaRegistry<C> {
    config: RelayConfig,
    objects: BTreeMap<String, ObjectDef<C>>,
    edges: HashMap<EdgeKey, Arc<EdgeType>>,
    connections: HashMap<ConnectionKey, Arc<ConnectionType>>,
    query_fields: Vec<ConnectionField<C>>,
    mutations: Vec<ClientIdMutation<C>>,
}

impl<C: Send + Sync + 'static> Default for SchemaRegistry<C> {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}

impl<C: Send + Sync + 'static> SchemaRegistry<C> {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            objects: BTreeMap::new(),
            edges: HashMap::new(),
            connections: HashMap::new(),
            query_fields: Vec::new(),
            mutations: Vec::new(),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    fn ensure_unregistered(&self, name: &str) -> RelayResult<()> {
        let generated = self.edges.values().any(|edge| edge.name() == name)
            || self.connections.values().any(|conn| conn.name() == name)
            || self.mutations.iter().any(|mutation| {
                mutation.input_type_name() == name || mutation.payload_type_name() == name
            });
        if RESERVED_TYPES.contains(&name) || self.objects.contains_key(name) || generated {
            return Err(RelayError::DuplicateType(name.to_string()));
        }
        Ok(())
    }

    /// Register an object type. Node types need a `get_node` loader.
    pub fn register_object(&mut self, object: ObjectDef<C>) -> RelayResult<()> {
        self.ensure_unregistered(&object.name)?;
        if object.is_node && object.loader.is_none() {
            return Err(RelayError::MissingGetNode(object.name));
        }

        debug!(
            "Registered {} type {}",
            if object.is_node { "Node" } else { "object" },
            object.name
        );
        self.objects.insert(object.name.clone(), object);
        Ok(())
    }

    /// Attach a connection field to an already registered object, e.g. one
    /// connecting a node type to itself.
    pub fn object_connection(
        &mut self,
        object: &str,
        field: ConnectionField<C>,
    ) -> RelayResult<()> {
        let object = self
            .objects
            .get_mut(object)
            .ok_or_else(|| RelayError::UnknownType(object.to_string()))?;
        object.fields.push(ObjectField::Connection(field));
        Ok(())
    }

    fn node_object(&self, node_type: &str) -> RelayResult<&ObjectDef<C>> {
        let object = self
            .objects
            .get(node_type)
            .ok_or_else(|| RelayError::UnknownType(node_type.to_string()))?;
        if !object.is_node {
            return Err(RelayError::NotANode(node_type.to_string()));
        }
        Ok(object)
    }

    /// The node type's default edge type.
    pub fn edge_for(&mut self, node_type: &str) -> RelayResult<Arc<EdgeType>> {
        let base = self.node_object(node_type)?.edge_base.clone();
        self.edge_for_base(&base, node_type)
    }

    /// The `{node_type}{base}` edge type, built on first use.
    pub fn edge_for_base(&mut self, base: &str, node_type: &str) -> RelayResult<Arc<EdgeType>> {
        self.node_object(node_type)?;

        let key = (base.to_string(), node_type.to_string());
        if let Some(edge) = self.edges.get(&key) {
            return Ok(edge.clone());
        }

        let edge = EdgeType::new(base, node_type);
        self.ensure_unregistered(edge.name())?;
        debug!("Built edge type {}", edge.name());
        let edge = Arc::new(edge);
        self.edges.insert(key, edge.clone());
        Ok(edge)
    }

    /// The node type's default connection type over its default edge.
    pub fn connection_for(&mut self, node_type: &str) -> RelayResult<Arc<ConnectionType>> {
        let base = self.node_object(node_type)?.connection_base.clone();
        self.connection_for_base(&base, node_type, None)
    }

    /// The `{node_type}{base}` connection type over `edge`, or over the
    /// node's default edge when `None`. Built on first use. A connection over
    /// any other edge is named `{node_type}{edge base}{base}`.
    pub fn connection_for_base(
        &mut self,
        base: &str,
        node_type: &str,
        edge: Option<Arc<EdgeType>>,
    ) -> RelayResult<Arc<ConnectionType>> {
        let default_edge_base = self.node_object(node_type)?.edge_base.clone();
        let edge = match edge {
            Some(edge) if edge.node_type() != node_type => {
                return Err(RelayError::NodeTypeMismatch {
                    expected: node_type.to_string(),
                    found: edge.node_type().to_string(),
                })
            }
            Some(edge) => edge,
            None => self.edge_for(node_type)?,
        };

        let key = (
            base.to_string(),
            node_type.to_string(),
            edge.name().to_string(),
        );
        if let Some(connection) = self.connections.get(&key) {
            return Ok(connection.clone());
        }

        let default_edge = edge.base() == default_edge_base;
        let mut connection =
            ConnectionType::new(base, node_type, edge, self.config.page_limits());
        if !default_edge {
            connection = connection.qualified_by_edge();
        }
        self.ensure_unregistered(connection.name())?;
        debug!("Built connection type {}", connection.name());
        let connection = Arc::new(connection);
        self.connections.insert(key, connection.clone());
        Ok(connection)
    }

    /// Add a connection field to the query root.
    pub fn query_connection(&mut self, field: ConnectionField<C>) -> RelayResult<()> {
        let taken = ["node", "nodes"].contains(&field.name())
            || self.query_fields.iter().any(|f| f.name() == field.name());
        if taken {
            return Err(RelayError::DuplicateType(format!(
                "{QUERY_ROOT}.{}",
                field.name()
            )));
        }
        self.query_fields.push(field);
        Ok(())
    }

    /// Validate a mutation and add it to the mutation root.
    pub fn register_mutation(&mut self, mutation: MutationDef<C>) -> RelayResult<()> {
        let mutation = mutation.build()?;
        self.ensure_unregistered(&mutation.input_type_name())?;
        self.ensure_unregistered(&mutation.payload_type_name())?;
        if self.mutations.iter().any(|m| m.name() == mutation.name()) {
            return Err(RelayError::DuplicateType(mutation.name().to_string()));
        }
        debug!("Registered mutation {}", mutation.name());
        self.mutations.push(mutation);
        Ok(())
    }

    fn connection_fields(&self) -> impl Iterator<Item = &ConnectionField<C>> {
        let object_fields = self.objects.values().flat_map(|object| {
            object.fields.iter().filter_map(|field| match field {
                ObjectField::Connection(connection) => Some(connection),
                ObjectField::Scalar(_) => None,
            })
        });
        object_fields.chain(self.query_fields.iter())
    }

    /// Custom scalars referenced anywhere in the registered types.
    fn custom_scalars(&self) -> BTreeSet<&'static str> {
        let object_scalars = self.objects.values().flat_map(|object| {
            object.fields.iter().filter_map(|field| match field {
                ObjectField::Scalar(scalar) => Some(scalar.kind),
                ObjectField::Connection(_) => None,
            })
        });
        let filter_scalars = self
            .connection_fields()
            .filter_map(|field| field.filterset())
            .flat_map(|filterset| filterset.filters().iter().map(|filter| filter.kind));
        let mutation_scalars = self.mutations.iter().flat_map(|mutation| {
            let inputs = mutation.input_fields().iter().map(|field| field.kind);
            let outputs = mutation
                .output_fields()
                .iter()
                .filter_map(|field| match field.kind {
                    OutputFieldKind::Scalar(kind) => Some(kind),
                    OutputFieldKind::Node(_) => None,
                });
            inputs.chain(outputs)
        });

        object_scalars
            .chain(filter_scalars)
            .chain(mutation_scalars)
            .filter(|kind| kind.is_custom())
            .map(|kind| kind.type_name())
            .collect()
    }

    fn validate(&self) -> RelayResult<()> {
        for field in self.connection_fields() {
            let connection = field.connection();
            let registered = self
                .connections
                .values()
                .any(|known| Arc::ptr_eq(known, connection));
            if !registered {
                return Err(RelayError::UnknownType(connection.name().to_string()));
            }
            if let Some(filterset) = field.filterset() {
                if filterset.model() != connection.node_type() {
                    return Err(RelayError::NodeTypeMismatch {
                        expected: connection.node_type().to_string(),
                        found: filterset.model().to_string(),
                    });
                }
            }
        }
        for mutation in &self.mutations {
            for output in mutation.output_fields() {
                if let OutputFieldKind::Node(node_type) = &output.kind {
                    self.node_object(node_type)?;
                }
            }
        }
        Ok(())
    }

    /// Build every registered type into a schema builder. Request data,
    /// including the `C` context the resolvers read, is added by the caller.
    pub fn finish(self) -> RelayResult<SchemaBuilder> {
        self.validate()?;
        let scalars = self.custom_scalars();
        let Self {
            config,
            objects,
            edges,
            connections,
            query_fields,
            mutations,
        } = self;

        let mutation_root = (!mutations.is_empty()).then_some(MUTATION_ROOT);
        let mut builder = Schema::build(QUERY_ROOT, mutation_root, None)
            .extension(resolver::NullableNodeItems)
            .register_node_types()
            .register_paging_types();

        if !config.introspection {
            builder = builder.disable_introspection();
        }
        if let Some(depth) = config.limit_depth {
            builder = builder.limit_depth(depth);
        }
        if let Some(complexity) = config.limit_complexity {
            builder = builder.limit_complexity(complexity);
        }

        for scalar in scalars {
            builder = builder.register(Scalar::new(scalar));
        }
        for edge in edges.values() {
            builder = builder.register(edge.object());
        }
        for connection in connections.values() {
            builder = builder.register(connection.object());
        }

        let loaders: NodeLoaders<C> = objects
            .values()
            .filter_map(|object| {
                let loader = object.loader.clone()?;
                Some((object.name.clone(), loader))
            })
            .collect();
        for object in objects.into_values() {
            builder = builder.register(resolver::object(object));
        }
        builder = builder.register(resolver::query_object(Arc::new(loaders), query_fields));

        if !mutations.is_empty() {
            let mut mutation_root = Object::new(MUTATION_ROOT);
            for mutation in mutations {
                let types = resolver::mutation_types(mutation);
                builder = builder.register(types.input).register(types.payload);
                mutation_root = mutation_root.field(types.field);
            }
            builder = builder.register(mutation_root);
        }

        info!(
            "Built relay schema with {} edge and {} connection types",
            edges.len(),
            connections.len()
        );
        Ok(builder)
    }

    /// Build the schema, serving `context` to every resolver.
    pub fn build(self, context: C) -> RelayResult<Schema> {
        let schema = self.finish()?.data(context).finish()?;
        Ok(schema)
    }
}
