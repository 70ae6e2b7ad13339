//! `async_graphql::dynamic` objects and resolvers for registered relay types.

use crate::{
    connection::{ConnectionField, ConnectionRequest},
    defaults::QUERY_ROOT,
    filtering::{FilterArgs, FilterSet},
    global_id::from_global_id,
    mutation::{ClientIdMutation, MutationPayload, OutputFieldKind, CLIENT_MUTATION_ID},
    node::{NodeLoader, NodeValue, ObjectDef, ObjectField, ScalarField, TypeRefNodeExt},
    ordering::{parse_ordering, OrderTerm, ORDERING_ARGUMENT},
    paging::{ConnectionArgs, FieldPagingExt},
    RelayError, RelayResult,
};
use async_graphql::{
    dynamic::{
        Field, FieldFuture, FieldValue, InputObject, InputValue, Object, ObjectAccessor,
        TypeRef,
    },
    extensions::{
        Extension, ExtensionContext, ExtensionFactory, NextResolve,
        ResolveInfo as ExtensionResolveInfo,
    },
    ServerResult, Value,
};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

/// Where a resolver was invoked from: the type owning the field and the
/// field's name.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ResolveInfo {
    pub parent_type: String,
    pub field_name: String,
}

impl ResolveInfo {
    pub fn new(parent_type: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            parent_type: parent_type.into(),
            field_name: field_name.into(),
        }
    }
}

pub(crate) type NodeLoaders<C> = HashMap<String, NodeLoader<C>>;

/// Decode a global ID and fetch the node through its type's loader. Unknown
/// types and missing nodes resolve to `None`.
pub(crate) fn load_node<C: 'static>(
    loaders: &NodeLoaders<C>,
    global_id: &str,
    ctx: &C,
    info: &ResolveInfo,
) -> RelayResult<Option<NodeValue>> {
    let id = from_global_id(global_id)?;
    let Some(loader) = loaders.get(id.type_name()) else {
        debug!("No Node type {} to resolve {global_id}", id.type_name());
        return Ok(None);
    };

    match loader.get_node(id.local_id(), ctx, info)? {
        Some(node) if node.type_name() != id.type_name() => {
            Err(RelayError::NodeTypeMismatch {
                expected: id.type_name().to_string(),
                found: node.type_name().to_string(),
            })
        }
        node => Ok(node),
    }
}

fn node_field_value<'a>(node: NodeValue) -> FieldValue<'a> {
    let type_name = node.type_name().to_string();
    FieldValue::owned_any(node).with_type(type_name)
}

fn json_field_value<'a>(
    value: Option<&serde_json::Value>,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => Ok(Some(FieldValue::value(Value::from_json(value.clone())?))),
    }
}

fn int_argument(args: &ObjectAccessor<'_>, name: &str) -> async_graphql::Result<Option<i64>> {
    match args.get(name) {
        Some(value) if !value.is_null() => Ok(Some(value.i64()?)),
        _ => Ok(None),
    }
}

fn string_argument(
    args: &ObjectAccessor<'_>,
    name: &str,
) -> async_graphql::Result<Option<String>> {
    match args.get(name) {
        Some(value) if !value.is_null() => Ok(Some(value.string()?.to_string())),
        _ => Ok(None),
    }
}

fn connection_args(args: &ObjectAccessor<'_>) -> async_graphql::Result<ConnectionArgs> {
    Ok(ConnectionArgs {
        first: int_argument(args, "first")?,
        after: string_argument(args, "after")?,
        last: int_argument(args, "last")?,
        before: string_argument(args, "before")?,
    })
}

/// Map provided filter arguments back to their filter names, and parse `o`.
fn filter_args(
    filterset: Option<&FilterSet>,
    args: &ObjectAccessor<'_>,
) -> async_graphql::Result<(FilterArgs, Vec<OrderTerm>)> {
    let mut filters = FilterArgs::new();
    let mut order_by = Vec::new();
    let Some(filterset) = filterset else {
        return Ok((filters, order_by));
    };

    for filter in filterset.filters() {
        let provided = args
            .get(&filter.argument_name())
            .filter(|value| !value.is_null());
        if let Some(value) = provided {
            filters.insert(filter.name.clone(), value.deserialize::<serde_json::Value>()?);
        }
    }
    if filterset.is_orderable() {
        if let Some(ordering) = string_argument(args, ORDERING_ARGUMENT)? {
            order_by = parse_ordering(&ordering, filterset.orderable_fields())?;
        }
    }

    Ok((filters, order_by))
}

fn scalar_field(scalar: ScalarField) -> Field {
    let source = scalar.source.clone();
    let field = Field::new(&scalar.name, scalar.type_ref(), move |ctx| {
        let source = source.clone();
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<NodeValue>()?;
            json_field_value(parent.get(&source))
        })
    });
    match scalar.description {
        Some(description) => field.description(description),
        None => field,
    }
}

pub(crate) fn connection_field<C: Send + Sync + 'static>(
    parent_type: &str,
    connection: ConnectionField<C>,
) -> Field {
    let parent_type = parent_type.to_string();
    let name = connection.name().to_string();
    let type_ref = connection.type_ref();
    let description = connection.description.clone();
    let filterset = connection.filterset.clone();
    let connection = Arc::new(connection);

    let mut field = Field::new(name, type_ref, move |ctx| {
        let connection = connection.clone();
        let parent_type = parent_type.clone();
        FieldFuture::new(async move {
            let args = connection_args(&ctx.args)?;
            let (filters, order_by) = filter_args(connection.filterset(), &ctx.args)?;
            let info = ResolveInfo::new(parent_type, ctx.ctx.field().name());
            let request = ConnectionRequest {
                parent: ctx.parent_value.downcast_ref::<NodeValue>(),
                args: &args,
                filters: &filters,
                order_by: &order_by,
                context: ctx.ctx.data::<C>()?,
                info: &info,
            };
            let value = connection.resolve(&request)?;
            Ok(Some(FieldValue::owned_any(value)))
        })
    })
    .paging_arguments();

    if let Some(filterset) = filterset {
        for filter in filterset.filters() {
            field = field.argument(InputValue::new(filter.argument_name(), filter.type_ref()));
        }
        if filterset.is_orderable() {
            field = field.argument(
                InputValue::new(ORDERING_ARGUMENT, TypeRef::named(TypeRef::STRING))
                    .description("Ordering, as comma-separated fields. Prefix with `-` to descend."),
            );
        }
    }
    match description {
        Some(description) => field.description(description),
        None => field,
    }
}

pub(crate) fn object<C: Send + Sync + 'static>(def: ObjectDef<C>) -> Object {
    let mut object = Object::new(&def.name);
    if let Some(description) = def.description {
        object = object.description(description);
    }
    if def.is_node {
        object = object.implement(TypeRef::NODE).field(
            Field::new("id", TypeRef::named_nn(TypeRef::ID), |ctx| {
                FieldFuture::new(async move {
                    let parent = ctx.parent_value.try_downcast_ref::<NodeValue>()?;
                    Ok(Some(FieldValue::value(parent.to_global_id())))
                })
            })
            .description("The ID of an object"),
        );
    }
    for field in def.fields {
        object = object.field(match field {
            ObjectField::Scalar(scalar) => scalar_field(scalar),
            ObjectField::Connection(connection) => connection_field(&def.name, connection),
        });
    }
    object
}

fn node_root_field<C: Send + Sync + 'static>(loaders: Arc<NodeLoaders<C>>) -> Field {
    Field::new("node", TypeRef::named(TypeRef::NODE), move |ctx| {
        let loaders = loaders.clone();
        FieldFuture::new(async move {
            let id = ctx.args.try_get("id")?;
            let id = id.string()?;
            let info = ResolveInfo::new(QUERY_ROOT, ctx.ctx.field().name());
            let node = load_node(&loaders, id, ctx.ctx.data::<C>()?, &info)?;
            Ok(node.map(node_field_value))
        })
    })
    .description("Fetches an object given its ID")
    .argument(
        InputValue::new("id", TypeRef::named_nn(TypeRef::ID))
            .description("The ID of an object"),
    )
}

/// Raised by the executor for list items of an interface type that are not
/// tagged with a concrete object type, i.e. the `null` entries of `nodes`.
const UNTYPED_INTERFACE_ITEM: &str = "internal: invalid value for interface";

/// Resolves the missing entries of a `[Node]` list to `null` instead of
/// failing the whole list.
pub(crate) struct NullableNodeItems;

impl ExtensionFactory for NullableNodeItems {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(NullableNodeItems)
    }
}

#[async_trait]
impl Extension for NullableNodeItems {
    async fn resolve(
        &self,
        ctx: &ExtensionContext<'_>,
        info: ExtensionResolveInfo<'_>,
        next: NextResolve<'_>,
    ) -> ServerResult<Option<Value>> {
        let node_item =
            info.return_type == TypeRef::NODE && info.parent_type.starts_with('[');
        match next.run(ctx, info).await {
            Err(error) if node_item && error.message.starts_with(UNTYPED_INTERFACE_ITEM) => {
                Ok(None)
            }
            result => result,
        }
    }
}

fn nodes_root_field<C: Send + Sync + 'static>(loaders: Arc<NodeLoaders<C>>) -> Field {
    Field::new("nodes", TypeRef::named_list_nn(TypeRef::NODE), move |ctx| {
        let loaders = loaders.clone();
        FieldFuture::new(async move {
            let info = ResolveInfo::new(QUERY_ROOT, ctx.ctx.field().name());
            let context = ctx.ctx.data::<C>()?;
            let ids = ctx.args.try_get("ids")?;
            let mut nodes = Vec::new();
            for id in ids.list()?.iter() {
                let node = load_node(&loaders, id.string()?, context, &info)?;
                nodes.push(node.map(node_field_value).unwrap_or(FieldValue::NULL));
            }
            Ok(Some(FieldValue::list(nodes)))
        })
    })
    .description("Fetches objects given their IDs")
    .argument(
        InputValue::new("ids", TypeRef::named_nn_list_nn(TypeRef::ID))
            .description("The IDs of objects"),
    )
}

pub(crate) fn query_object<C: Send + Sync + 'static>(
    loaders: Arc<NodeLoaders<C>>,
    fields: Vec<ConnectionField<C>>,
) -> Object {
    let query = Object::new(QUERY_ROOT)
        .field(node_root_field(loaders.clone()))
        .field(nodes_root_field(loaders));
    fields.into_iter().fold(query, |query, field| {
        query.field(connection_field(QUERY_ROOT, field))
    })
}

fn client_mutation_id_field() -> Field {
    Field::new(CLIENT_MUTATION_ID, TypeRef::named_nn(TypeRef::STRING), |ctx| {
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<MutationPayload>()?;
            Ok(Some(FieldValue::value(parent.client_mutation_id.clone())))
        })
    })
}

/// The generated input object, payload object and root field of a mutation.
pub(crate) struct MutationTypes {
    pub input: InputObject,
    pub payload: Object,
    pub field: Field,
}

pub(crate) fn mutation_types<C: Send + Sync + 'static>(
    mutation: ClientIdMutation<C>,
) -> MutationTypes {
    let input_name = mutation.input_type_name();
    let payload_name = mutation.payload_type_name();

    let input = mutation.input_fields().iter().fold(
        InputObject::new(&input_name),
        |input, field| input.field(InputValue::new(&field.name, field.type_ref())),
    );
    let input = input.field(InputValue::new(
        CLIENT_MUTATION_ID,
        TypeRef::named_nn(TypeRef::STRING),
    ));

    let mut payload = Object::new(&payload_name);
    for output in mutation.output_fields() {
        let name = output.name.clone();
        let field = match &output.kind {
            OutputFieldKind::Scalar(_) => Field::new(&output.name, output.type_ref(), move |ctx| {
                let name = name.clone();
                FieldFuture::new(async move {
                    let parent = ctx.parent_value.try_downcast_ref::<MutationPayload>()?;
                    json_field_value(parent.payload.get_value(&name))
                })
            }),
            OutputFieldKind::Node(_) => Field::new(&output.name, output.type_ref(), move |ctx| {
                let name = name.clone();
                FieldFuture::new(async move {
                    let parent = ctx.parent_value.try_downcast_ref::<MutationPayload>()?;
                    Ok(parent
                        .payload
                        .get_node(&name)
                        .map(|node| FieldValue::borrowed_any(node)))
                })
            }),
        };
        payload = payload.field(field);
    }
    let payload = payload.field(client_mutation_id_field());

    let field_name = mutation.field_name();
    let description = mutation.description().map(str::to_string);
    let mutation = Arc::new(mutation);
    let mut field = Field::new(field_name, TypeRef::named(&payload_name), move |ctx| {
        let mutation = mutation.clone();
        FieldFuture::new(async move {
            let input = ctx.args.try_get("input")?;
            let input = input.deserialize::<serde_json::Value>()?;
            let payload = mutation.mutate(input, ctx.ctx.data::<C>()?)?;
            Ok(Some(FieldValue::owned_any(payload)))
        })
    })
    .argument(InputValue::new("input", TypeRef::named_nn(&input_name)));
    if let Some(description) = description {
        field = field.description(description);
    }

    MutationTypes {
        input,
        payload,
        field,
    }
}
