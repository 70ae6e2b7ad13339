pub const MAX_PAGE_SIZE: usize = 100;

pub const INTROSPECTION: bool = true;

pub const VERBOSE_LOGGING: bool = false;

pub const CONNECTION_BASE: &str = "Connection";
pub const EDGE_BASE: &str = "Edge";

pub const QUERY_ROOT: &str = "Query";
pub const MUTATION_ROOT: &str = "Mutation";
