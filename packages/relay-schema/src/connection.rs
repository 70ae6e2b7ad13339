//! Connection types and connection fields.
//! See: https://graphql.org/learn/pagination/#end-of-list-counts-and-connections
//! See: https://relay.dev/graphql/connections.htm#sec-Connection-Types

use crate::{
    edge::{EdgeType, EdgeValue},
    filtering::{FilterArgs, FilterSet},
    node::NodeValue,
    ordering::{OrderTerm, ORDERING_ARGUMENT},
    paging::*,
    resolver::ResolveInfo,
    RelayError, RelayResult,
};
use async_graphql::dynamic::{Field, FieldFuture, FieldValue, Object, TypeRef};
use std::sync::Arc;

/// A page of a connection, built by `ConnectionType::from_list`.
#[derive(Clone, PartialEq, Debug)]
pub struct ConnectionValue {
    pub edges: Vec<EdgeValue>,
    pub page_info: PageInfo,
    connection_data: Vec<NodeValue>,
}

impl ConnectionValue {
    /// The full sequence the page was cut from.
    pub fn connection_data(&self) -> &[NodeValue] {
        &self.connection_data
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeValue> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

/// The `{Node}{Base}` connection type of one node type. Built once per
/// (base, node, edge) triple by the `SchemaRegistry`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConnectionType {
    name: String,
    base: String,
    node_type: String,
    edge: Arc<EdgeType>,
    limits: PageLimits,
}

impl ConnectionType {
    pub(crate) fn new(
        base: impl Into<String>,
        node_type: impl Into<String>,
        edge: Arc<EdgeType>,
        limits: PageLimits,
    ) -> Self {
        let base = base.into();
        let node_type = node_type.into();
        Self {
            name: format!("{node_type}{base}"),
            base,
            node_type,
            edge,
            limits,
        }
    }

    /// Name the type after its edge too, as `{Node}{EdgeBase}{Base}`.
    pub(crate) fn qualified_by_edge(mut self) -> Self {
        self.name = format!("{}{}{}", self.node_type, self.edge.base(), self.base);
        self
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

    pub fn edge_type(&self) -> &Arc<EdgeType> {
        &self.edge
    }

    /// Cut one page out of `nodes` according to `args`. Every node has to be
    /// of this connection's node type.
    pub fn from_list(
        &self,
        nodes: impl IntoIterator<Item = NodeValue>,
        args: &ConnectionArgs,
    ) -> RelayResult<ConnectionValue> {
        let nodes = nodes.into_iter().collect::<Vec<_>>();
        if let Some(node) = nodes.iter().find(|node| node.type_name() != self.node_type) {
            return Err(RelayError::NodeTypeMismatch {
                expected: self.node_type.clone(),
                found: node.type_name().to_string(),
            });
        }

        let window = PageWindow::select(nodes.len(), args, &self.limits)?;
        let edges = nodes[window.range.clone()]
            .iter()
            .zip(window.range.clone())
            .map(|(node, offset)| EdgeValue {
                cursor: offset_to_cursor(offset),
                node: node.clone(),
            })
            .collect();

        Ok(ConnectionValue {
            edges,
            page_info: window.page_info(),
            connection_data: nodes,
        })
    }

    pub(crate) fn object(&self) -> Object {
        Object::new(&self.name)
            .description("A connection to a list of items.")
            .field(
                Field::new(
                    "pageInfo",
                    TypeRef::named_nn(TypeRef::PAGE_INFO),
                    |ctx| {
                        FieldFuture::new(async move {
                            let parent =
                                ctx.parent_value.try_downcast_ref::<ConnectionValue>()?;
                            Ok(Some(FieldValue::borrowed_any(&parent.page_info)))
                        })
                    },
                )
                .description("The Information to aid in pagination"),
            )
            .field(
                Field::new("edges", TypeRef::named_list(self.edge.name()), |ctx| {
                    FieldFuture::new(async move {
                        let parent =
                            ctx.parent_value.try_downcast_ref::<ConnectionValue>()?;
                        let edges = parent
                            .edges
                            .iter()
                            .map(|edge| FieldValue::borrowed_any(edge));
                        Ok(Some(FieldValue::list(edges)))
                    })
                })
                .description("Information to aid in pagination."),
            )
    }
}

/// Everything a connection resolver gets to produce its sequence.
pub struct ConnectionRequest<'a, C> {
    /// The node owning the field, `None` on the query root.
    pub parent: Option<&'a NodeValue>,
    pub args: &'a ConnectionArgs,
    /// Filter values keyed by filter name (`headline__icontains`).
    pub filters: &'a FilterArgs,
    pub order_by: &'a [OrderTerm],
    pub context: &'a C,
    pub info: &'a ResolveInfo,
}

pub type ResolveConnectionFn<C> =
    dyn Fn(&ConnectionRequest<'_, C>) -> RelayResult<Vec<NodeValue>> + Send + Sync;

/// A field returning a connection, optionally filtered by a filter set.
pub struct ConnectionField<C> {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) connection: Arc<ConnectionType>,
    pub(crate) filterset: Option<FilterSet>,
    pub(crate) resolver: Arc<ResolveConnectionFn<C>>,
}

impl<C> ConnectionField<C> {
    pub fn new<F>(name: impl Into<String>, connection: Arc<ConnectionType>, resolver: F) -> Self
    where
        F: Fn(&ConnectionRequest<'_, C>) -> RelayResult<Vec<NodeValue>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            description: None,
            connection,
            filterset: None,
            resolver: Arc::new(resolver),
        }
    }

    /// A connection field taking the filter set's arguments.
    pub fn filtered<F>(
        name: impl Into<String>,
        connection: Arc<ConnectionType>,
        filterset: FilterSet,
        resolver: F,
    ) -> Self
    where
        F: Fn(&ConnectionRequest<'_, C>) -> RelayResult<Vec<NodeValue>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            filterset: Some(filterset),
            ..Self::new(name, connection, resolver)
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &Arc<ConnectionType> {
        &self.connection
    }

    pub fn filterset(&self) -> Option<&FilterSet> {
        self.filterset.as_ref()
    }

    /// Names of every argument the field takes, pagination first.
    pub fn argument_names(&self) -> Vec<String> {
        let mut names = PAGINATION_ARGUMENTS
            .iter()
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        if let Some(filterset) = &self.filterset {
            names.extend(filterset.filters().iter().map(|filter| filter.argument_name()));
            if filterset.is_orderable() {
                names.push(ORDERING_ARGUMENT.to_string());
            }
        }
        names
    }

    pub(crate) fn type_ref(&self) -> TypeRef {
        TypeRef::named(self.connection.name())
    }

    pub(crate) fn resolve(&self, request: &ConnectionRequest<'_, C>) -> RelayResult<ConnectionValue> {
        let nodes = (self.resolver)(request)?;
        self.connection.from_list(nodes, request.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ship_connection(limits: PageLimits) -> ConnectionType {
        let edge = Arc::new(EdgeType::new("Edge", "Ship"));
        ConnectionType::new("Connection", "Ship", edge, limits)
    }

    fn ships(count: usize) -> Vec<NodeValue> {
        (0..count)
            .map(|i| NodeValue::new("Ship", i.to_string(), json!({ "name": format!("ship {i}") })))
            .collect()
    }

    #[test]
    fn from_list_keeps_connection_data() {
        let connection = ship_connection(PageLimits::default());
        let value = connection
            .from_list(ships(5), &ConnectionArgs::default().first(2))
            .unwrap();

        assert_eq!(value.connection_data().len(), 5);
        assert_eq!(
            value.nodes().map(|node| node.local_id()).collect::<Vec<_>>(),
            vec!["0", "1"]
        );
        assert_eq!(value.edges[1].cursor, offset_to_cursor(1));
        assert!(value.page_info.has_next_page);
        assert_eq!(value.page_info.end_cursor, Some(offset_to_cursor(1)));
    }

    #[test]
    fn from_list_accepts_any_iterator() {
        let connection = ship_connection(PageLimits::default());
        let value = connection
            .from_list(ships(4).into_iter().rev(), &ConnectionArgs::default().last(1))
            .unwrap();

        assert_eq!(value.edges.len(), 1);
        assert_eq!(value.edges[0].node.local_id(), "0");
        assert_eq!(value.edges[0].cursor, offset_to_cursor(3));
        assert!(value.page_info.has_previous_page);
    }

    #[test]
    fn from_list_rejects_foreign_nodes() {
        let connection = ship_connection(PageLimits::default());
        let mut nodes = ships(2);
        nodes.push(NodeValue::new("Faction", "1", json!({})));

        assert_matches!(
            connection.from_list(nodes, &ConnectionArgs::default()),
            Err(RelayError::NodeTypeMismatch { expected, found })
                if expected == "Ship" && found == "Faction"
        );
    }

    #[test]
    fn from_list_applies_page_limits() {
        let connection = ship_connection(PageLimits {
            default_page_size: Some(3),
            max_page_size: Some(3),
        });

        let value = connection.from_list(ships(10), &ConnectionArgs::default()).unwrap();
        assert_eq!(value.edges.len(), 3);

        assert_matches!(
            connection.from_list(ships(10), &ConnectionArgs::default().first(5)),
            Err(RelayError::InvalidPaginationArgument { .. })
        );
    }

    #[test]
    fn unfiltered_field_only_takes_pagination_arguments() {
        let connection = Arc::new(ship_connection(PageLimits::default()));
        let field = ConnectionField::<()>::new("ships", connection, |_| Ok(vec![]));

        assert_eq!(field.argument_names(), vec!["first", "after", "last", "before"]);
        assert_eq!(field.type_ref().to_string(), "ShipConnection");
    }

    #[test]
    fn edge_qualified_name() {
        let edge = Arc::new(EdgeType::new("Link", "Ship"));
        let connection = ConnectionType::new("Connection", "Ship", edge, PageLimits::default())
            .qualified_by_edge();

        assert_eq!(connection.name(), "ShipLinkConnection");
        assert_eq!(connection.base(), "Connection");
    }
}
