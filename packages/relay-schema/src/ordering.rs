//! The `o` ordering argument of filtered connections.

use crate::{utils::to_camel_case, RelayError, RelayResult};

pub const ORDERING_ARGUMENT: &str = "o";

/// Which fields a filter set lets callers order by.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    Disabled,
    AllFields,
    Fields(Vec<String>),
}

impl OrderBy {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, OrderBy::Disabled)
    }

    /// Resolve to the concrete orderable field names.
    pub(crate) fn fields<'a>(&self, model_fields: impl Iterator<Item = &'a str>) -> Vec<String> {
        match self {
            OrderBy::Disabled => Vec::new(),
            OrderBy::AllFields => model_fields.map(str::to_string).collect(),
            OrderBy::Fields(fields) => fields.clone(),
        }
    }
}

impl From<bool> for OrderBy {
    fn from(enabled: bool) -> Self {
        if enabled {
            OrderBy::AllFields
        } else {
            OrderBy::Disabled
        }
    }
}

impl<S: Into<String>> From<Vec<S>> for OrderBy {
    fn from(fields: Vec<S>) -> Self {
        OrderBy::Fields(fields.into_iter().map(Into::into).collect())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: String,
    pub descending: bool,
}

/// Parse an `o` value such as `"-pubDate,headline"` into terms over the
/// allowed snake_case fields. Fields may be given in either case.
pub fn parse_ordering(value: &str, allowed: &[String]) -> RelayResult<Vec<OrderTerm>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| {
            let (descending, name) = match term.strip_prefix('-') {
                Some(name) => (true, name),
                None => (false, term),
            };
            let field = allowed
                .iter()
                .find(|field| *field == name || to_camel_case(field) == name)
                .ok_or_else(|| RelayError::UnknownOrderingField(name.to_string()))?;
            Ok(OrderTerm {
                field: field.clone(),
                descending,
            })
        })
        .collect()
}
