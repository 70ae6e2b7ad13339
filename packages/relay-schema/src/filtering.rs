//! Filter sets and the connection arguments derived from them.
//!
//! A filter set maps model fields to permitted lookups. Each (field, lookup)
//! pair becomes one argument of a filtered connection field, named by
//! camel-casing the filter name: `headline__icontains` is exposed as
//! `headlineIcontains`. Evaluating the filters is left to the connection
//! resolver, which receives the provided values keyed by filter name.

use crate::{
    model::{Model, ScalarKind},
    ordering::{OrderBy, ORDERING_ARGUMENT},
    paging::PAGINATION_ARGUMENTS,
    utils::to_camel_case,
    RelayError, RelayResult,
};
use async_graphql::dynamic::TypeRef;
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumString};

/// Filter values provided to a connection field, keyed by filter name.
pub type FilterArgs = BTreeMap<String, serde_json::Value>;

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Lookup {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    IsNull,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Filter {
    /// `field` for exact lookups, `field__lookup` otherwise.
    pub name: String,
    pub field: String,
    pub lookup: Lookup,
    pub kind: ScalarKind,
}

impl Filter {
    fn new(field: &str, lookup: Lookup, kind: ScalarKind) -> Self {
        let name = match lookup {
            Lookup::Exact => field.to_string(),
            lookup => format!("{field}__{lookup}"),
        };
        Self {
            name,
            field: field.to_string(),
            lookup,
            kind,
        }
    }

    pub fn argument_name(&self) -> String {
        to_camel_case(&self.name)
    }

    pub fn type_ref(&self) -> TypeRef {
        match self.lookup {
            Lookup::In => TypeRef::named_nn_list(self.kind.type_name()),
            Lookup::IsNull => TypeRef::named(TypeRef::BOOLEAN),
            _ => TypeRef::named(self.kind.type_name()),
        }
    }
}

/// The filters and ordering a filtered connection field accepts.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FilterSet {
    model: String,
    filters: Vec<Filter>,
    ordering: Vec<String>,
    orderable: bool,
}

impl FilterSet {
    pub fn builder(model: &Model) -> FilterSetBuilder<'_> {
        FilterSetBuilder {
            model,
            lookups: Vec::new(),
            order_by: OrderBy::Disabled,
            exclude: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_orderable(&self) -> bool {
        self.orderable
    }

    /// Snake_case fields accepted by the `o` argument.
    pub fn orderable_fields(&self) -> &[String] {
        &self.ordering
    }

    pub fn filter_for_argument(&self, argument: &str) -> Option<&Filter> {
        self.filters
            .iter()
            .find(|filter| filter.argument_name() == argument)
    }
}

pub struct FilterSetBuilder<'a> {
    model: &'a Model,
    lookups: Vec<(String, Vec<Lookup>)>,
    order_by: OrderBy,
    exclude: Vec<String>,
}

impl<'a> FilterSetBuilder<'a> {
    pub fn lookups(
        mut self,
        field: impl Into<String>,
        lookups: impl IntoIterator<Item = Lookup>,
    ) -> Self {
        self.lookups
            .push((field.into(), lookups.into_iter().collect()));
        self
    }

    /// Shortcut for an `exact` lookup on each field.
    pub fn fields<S: Into<String>>(self, fields: impl IntoIterator<Item = S>) -> Self {
        fields
            .into_iter()
            .fold(self, |builder, field| builder.lookups(field, [Lookup::Exact]))
    }

    pub fn order_by(mut self, order_by: impl Into<OrderBy>) -> Self {
        self.order_by = order_by.into();
        self
    }

    pub fn exclude<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> RelayResult<FilterSet> {
        let lookups = if self.lookups.is_empty() {
            self.model
                .field_names()
                .map(|field| (field.to_string(), vec![Lookup::Exact]))
                .collect()
        } else {
            self.lookups
        };

        let mut filters = Vec::new();
        for (field, lookups) in lookups {
            if self.exclude.contains(&field) {
                continue;
            }
            let kind = self.model.get_field(&field)?.kind;
            for lookup in lookups {
                let filter = Filter::new(&field, lookup, kind);
                let argument = filter.argument_name();
                let reserved = PAGINATION_ARGUMENTS.contains(&argument.as_str())
                    || argument == ORDERING_ARGUMENT;
                if reserved {
                    return Err(RelayError::ReservedArgument(argument));
                }
                filters.push(filter);
            }
        }

        let ordering = self.order_by.fields(self.model.field_names());
        for field in &ordering {
            self.model.get_field(field)?;
        }

        Ok(FilterSet {
            model: self.model.name.clone(),
            filters,
            ordering,
            orderable: self.order_by.is_enabled(),
        })
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FilterFields {
    /// Field names, each filtered with `exact`.
    List(Vec<String>),
    /// Field names with their permitted lookups.
    Lookups(Vec<(String, Vec<Lookup>)>),
}

/// Extra options merged into a generated filter set.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct FilterMeta {
    pub ordering: Option<OrderBy>,
    pub exclude: Vec<String>,
}

/// How a filtered connection field gets its filter set.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct FilterSetOptions {
    /// Used as-is when given.
    pub filterset: Option<FilterSet>,
    pub fields: Option<FilterFields>,
    pub order_by: OrderBy,
    pub extra_meta: FilterMeta,
}

/// Resolve the filter set for a model: the explicit one if given, otherwise
/// one generated from the shortcut fields (all model fields by default).
pub fn filterset_factory(model: &Model, options: FilterSetOptions) -> RelayResult<FilterSet> {
    if let Some(filterset) = options.filterset {
        return Ok(filterset);
    }

    let order_by = match (options.order_by, options.extra_meta.ordering) {
        (OrderBy::Disabled, Some(ordering)) => ordering,
        (order_by, _) => order_by,
    };
    let builder = FilterSet::builder(model)
        .order_by(order_by)
        .exclude(options.extra_meta.exclude);

    let builder = match options.fields {
        Some(FilterFields::List(fields)) => builder.fields(fields),
        Some(FilterFields::Lookups(lookups)) => lookups
            .into_iter()
            .fold(builder, |builder, (field, lookups)| builder.lookups(field, lookups)),
        None => builder,
    };
    builder.build()
}
