//! Relay primitives for `async_graphql::dynamic` schemas: the `Node` capability
//! with global IDs, memoized `Edge`/`Connection` types with cursor pagination,
//! client-id mutations, and filter-set argument derivation for connection fields.
//!
//! See: https://relay.dev/graphql/connections.htm

pub mod config;
pub mod connection;
pub mod defaults;
pub mod edge;
pub mod filtering;
pub mod global_id;
pub mod model;
pub mod mutation;
pub mod node;
pub mod ordering;
pub mod paging;
pub mod registry;
pub mod resolver;
pub mod utils;

pub use config::RelayConfig;
pub use connection::*;
pub use edge::*;
pub use filtering::*;
pub use global_id::*;
pub use model::*;
pub use mutation::*;
pub use node::*;
pub use ordering::*;
pub use paging::*;
pub use registry::SchemaRegistry;
pub use resolver::ResolveInfo;

use thiserror::Error;

pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("get_node not found in {0:?} Node")]
    MissingGetNode(String),
    #[error("You have to implement mutate_and_get_payload for {0:?}")]
    MissingMutateAndGetPayload(String),
    #[error("ObjectTypes in an edge or connection have to be Nodes: {0:?}")]
    NotANode(String),
    #[error("Unrecognized Type: {0:?}")]
    UnknownType(String),
    #[error("Type already registered: {0:?}")]
    DuplicateType(String),
    #[error("Expected a node of type {expected:?}, got {found:?}")]
    NodeTypeMismatch { expected: String, found: String },
    #[error("Invalid global ID: {0:?}")]
    InvalidGlobalId(String),
    #[error("Argument {argument:?} {reason}")]
    InvalidPaginationArgument {
        argument: &'static str,
        reason: String,
    },
    #[error("Mutation input requires a clientMutationId string")]
    MissingClientMutationId,
    #[error("Mutation input has to be an object, got: {0}")]
    InvalidMutationInput(serde_json::Value),
    #[error("Unrecognized field {1:?} on model {0:?}")]
    UnknownModelField(String, String),
    #[error("Filter argument {0:?} collides with a connection argument")]
    ReservedArgument(String),
    #[error("Field {0:?} cannot be used for ordering")]
    UnknownOrderingField(String),
    #[error("Error building dynamic schema: {0:?}")]
    DynamicSchemaBuildError(#[from] async_graphql::dynamic::SchemaError),
    #[error("Could not convert JSON value: {0:?}")]
    JsonError(#[from] serde_json::Error),
    #[error("Error processing file: {0:?}")]
    ConfigFileError(#[from] std::io::Error),
    #[error("Error processing YAML file: {0:?}")]
    SerdeYamlError(#[from] serde_yaml::Error),
}
