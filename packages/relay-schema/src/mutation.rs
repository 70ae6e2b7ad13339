//! Relay mutations: the input carries a `clientMutationId` that is echoed
//! back on the payload.
//! See: https://relay.dev/docs/guides/graphql-server-specification/#mutations

use crate::{model::ScalarKind, node::NodeValue, RelayError, RelayResult};
use async_graphql::dynamic::TypeRef;
use serde_json::{Map, Value};
use std::{collections::HashMap, sync::Arc};

pub const CLIENT_MUTATION_ID: &str = "clientMutationId";

/// A mutation's `input` argument with the correlation token split out.
#[derive(Clone, PartialEq, Debug)]
pub struct MutationInput {
    client_mutation_id: String,
    fields: Map<String, Value>,
}

impl MutationInput {
    pub fn from_json(input: Value) -> RelayResult<Self> {
        let mut fields = match input {
            Value::Object(fields) => fields,
            other => return Err(RelayError::InvalidMutationInput(other)),
        };
        let client_mutation_id = match fields.remove(CLIENT_MUTATION_ID) {
            Some(Value::String(id)) => id,
            _ => return Err(RelayError::MissingClientMutationId),
        };
        Ok(Self {
            client_mutation_id,
            fields,
        })
    }

    pub fn client_mutation_id(&self) -> &str {
        &self.client_mutation_id
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// What `mutate_and_get_payload` returns: scalar values and nodes keyed by
/// output field name.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Payload {
    values: Map<String, Value>,
    nodes: HashMap<String, NodeValue>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn node(mut self, name: impl Into<String>, node: NodeValue) -> Self {
        self.nodes.insert(name.into(), node);
        self
    }

    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_node(&self, name: &str) -> Option<&NodeValue> {
        self.nodes.get(name)
    }
}

/// The resolved mutation result, carrying the caller's token.
#[derive(Clone, PartialEq, Debug)]
pub struct MutationPayload {
    pub client_mutation_id: String,
    pub payload: Payload,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InputField {
    pub name: String,
    pub kind: ScalarKind,
    pub required: bool,
}

impl InputField {
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
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

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum OutputFieldKind {
    Scalar(ScalarKind),
    /// A node of the named type.
    Node(String),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct OutputField {
    pub name: String,
    pub kind: OutputFieldKind,
}

impl OutputField {
    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind: OutputFieldKind::Scalar(kind),
        }
    }

    pub fn node(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: OutputFieldKind::Node(node_type.into()),
        }
    }

    pub fn type_ref(&self) -> TypeRef {
        match &self.kind {
            OutputFieldKind::Scalar(kind) => TypeRef::named(kind.type_name()),
            OutputFieldKind::Node(node_type) => TypeRef::named(node_type),
        }
    }
}

pub type MutateAndGetPayloadFn<C> =
    dyn Fn(&MutationInput, &C) -> RelayResult<Payload> + Send + Sync;

/// Declaration of a mutation, validated into a `ClientIdMutation`.
pub struct MutationDef<C> {
    name: String,
    description: Option<String>,
    input_fields: Vec<InputField>,
    output_fields: Vec<OutputField>,
    mutate_and_get_payload: Option<Arc<MutateAndGetPayloadFn<C>>>,
}

impl<C> MutationDef<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_fields: Vec::new(),
            output_fields: Vec::new(),
            mutate_and_get_payload: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn input_field(mut self, field: InputField) -> Self {
        self.input_fields.push(field);
        self
    }

    pub fn output_field(mut self, field: OutputField) -> Self {
        self.output_fields.push(field);
        self
    }

    pub fn mutate_and_get_payload<F>(mut self, f: F) -> Self
    where
        F: Fn(&MutationInput, &C) -> RelayResult<Payload> + Send + Sync + 'static,
    {
        self.mutate_and_get_payload = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> RelayResult<ClientIdMutation<C>> {
        let mutate_and_get_payload = self
            .mutate_and_get_payload
            .ok_or_else(|| RelayError::MissingMutateAndGetPayload(self.name.clone()))?;
        Ok(ClientIdMutation {
            name: self.name,
            description: self.description,
            input_fields: self.input_fields,
            output_fields: self.output_fields,
            mutate_and_get_payload,
        })
    }
}

/// A validated mutation with generated `{Name}Input` and `{Name}Payload`
/// types.
pub struct ClientIdMutation<C> {
    name: String,
    description: Option<String>,
    input_fields: Vec<InputField>,
    output_fields: Vec<OutputField>,
    mutate_and_get_payload: Arc<MutateAndGetPayloadFn<C>>,
}

impl<C> ClientIdMutation<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Root field name: the type name with a lowercase first letter.
    pub fn field_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn input_type_name(&self) -> String {
        format!("{}Input", self.name)
    }

    pub fn payload_type_name(&self) -> String {
        format!("{}Payload", self.name)
    }

    pub fn input_fields(&self) -> &[InputField] {
        &self.input_fields
    }

    pub fn output_fields(&self) -> &[OutputField] {
        &self.output_fields
    }

    /// Run the mutation on a raw `input` object and attach its token to the
    /// payload. Payload nodes have to match their output field's node type.
    pub fn mutate(&self, input: Value, ctx: &C) -> RelayResult<MutationPayload> {
        let input = MutationInput::from_json(input)?;
        let payload = (self.mutate_and_get_payload)(&input, ctx)?;
        for output in &self.output_fields {
            let OutputFieldKind::Node(node_type) = &output.kind else {
                continue;
            };
            match payload.get_node(&output.name) {
                Some(node) if node.type_name() != node_type => {
                    return Err(RelayError::NodeTypeMismatch {
                        expected: node_type.clone(),
                        found: node.type_name().to_string(),
                    });
                }
                _ => {}
            }
        }
        Ok(MutationPayload {
            client_mutation_id: input.client_mutation_id,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn introduce_ship() -> MutationDef<AtomicUsize> {
        MutationDef::new("IntroduceShip")
            .input_field(InputField::new("shipName", ScalarKind::String).required())
            .output_field(OutputField::node("ship", "Ship"))
            .output_field(OutputField::scalar("total", ScalarKind::Int))
    }

    #[test]
    fn mutate_round_trips_client_mutation_id() {
        let mutation = introduce_ship()
            .mutate_and_get_payload(|input, counter| {
                let total = counter.fetch_add(1, Ordering::SeqCst) + 1;
                let name = input.get("shipName").cloned().unwrap_or_default();
                Ok(Payload::new()
                    .node("ship", NodeValue::new("Ship", "9", json!({ "name": name })))
                    .value("total", total))
            })
            .build()
            .unwrap();

        let counter = AtomicUsize::new(0);
        let result = mutation
            .mutate(json!({ "clientMutationId": "abc123", "shipName": "B-Wing" }), &counter)
            .unwrap();

        assert_eq!(result.client_mutation_id, "abc123");
        assert_eq!(result.payload.get_value("total"), Some(&json!(1)));
        assert_eq!(
            result.payload.get_node("ship").and_then(|ship| ship.get("name")),
            Some(&json!("B-Wing"))
        );
    }

    #[test]
    fn mutate_and_get_payload_is_required() {
        assert_matches!(
            introduce_ship().build().err(),
            Some(RelayError::MissingMutateAndGetPayload(name)) if name == "IntroduceShip"
        );
    }

    #[test]
    fn payload_nodes_keep_their_declared_type() {
        let mutation = introduce_ship()
            .mutate_and_get_payload(|_, _| {
                Ok(Payload::new().node("ship", NodeValue::new("Faction", "1", json!({}))))
            })
            .build()
            .unwrap();

        assert_matches!(
            mutation.mutate(json!({ "clientMutationId": "abc123" }), &AtomicUsize::new(0)),
            Err(RelayError::NodeTypeMismatch { expected, found })
                if expected == "Ship" && found == "Faction"
        );
    }

    #[test]
    fn input_needs_client_mutation_id() {
        assert_matches!(
            MutationInput::from_json(json!({ "shipName": "B-Wing" })),
            Err(RelayError::MissingClientMutationId)
        );
        assert_matches!(
            MutationInput::from_json(json!({ "clientMutationId": 7 })),
            Err(RelayError::MissingClientMutationId)
        );
        assert_matches!(
            MutationInput::from_json(json!(["abc123"])),
            Err(RelayError::InvalidMutationInput(_))
        );

        let input = MutationInput::from_json(json!({ "clientMutationId": "x", "a": 1 })).unwrap();
        assert_eq!(input.client_mutation_id(), "x");
        assert_eq!(input.get(CLIENT_MUTATION_ID), None);
        assert_eq!(input.fields().len(), 1);
    }

    #[test]
    fn generated_type_names() {
        let mutation = introduce_ship()
            .mutate_and_get_payload(|_, _| Ok(Payload::new()))
            .build()
            .unwrap();

        assert_eq!(mutation.field_name(), "introduceShip");
        assert_eq!(mutation.input_type_name(), "IntroduceShipInput");
        assert_eq!(mutation.payload_type_name(), "IntroduceShipPayload");
    }
}
