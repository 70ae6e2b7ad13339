use crate::{defaults, paging::PageLimits, RelayResult};
use serde::Deserialize;
use std::{fs::File, path::Path};

/// Settings applied by the `SchemaRegistry` to pagination and to the
/// underlying `async_graphql` schema.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RelayConfig {
    /// Page size used when a connection is queried without `first` or `last`.
    pub default_page_size: Option<usize>,

    /// Upper bound accepted for `first` and `last`.
    pub max_page_size: Option<usize>,

    /// Whether the schema answers introspection queries.
    pub introspection: bool,

    /// Maximum query depth.
    pub limit_depth: Option<usize>,

    /// Maximum query complexity.
    pub limit_complexity: Option<usize>,

    /// Log at `debug` instead of `info` when no `RUST_LOG` is set.
    pub verbose: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_page_size: None,
            max_page_size: Some(defaults::MAX_PAGE_SIZE),
            introspection: defaults::INTROSPECTION,
            limit_depth: None,
            limit_complexity: None,
            verbose: defaults::VERBOSE_LOGGING,
        }
    }
}

impl RelayConfig {
    /// Load a config from a YAML file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> RelayResult<Self> {
        let file = File::open(path)?;
        let config: RelayConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }
}
